use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rebridge_core::{
    CompactStrategy, Encoding, Match, Options, Pattern, PatternBuilder, RegexError, WrappedText,
};
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser)]
#[command(name = "rebridge")]
#[command(about = "Rebridge - encoding-aware pattern search")]
#[command(version)]
struct Cli {
    /// Log level for diagnostics written to stderr
    #[arg(long, global = true, default_value = "warn")]
    log_level: Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SearchArgs {
    /// The regex pattern
    pattern: String,
    /// The input string
    input: String,
    /// Character offset to start searching from
    #[arg(long, default_value_t = 0)]
    start: usize,
    /// Native encoding of the input, e.g. UTF-16LE
    #[arg(long)]
    encoding: Option<Encoding>,
    /// Engine options, e.g. "im" or "ignorecase|find_not_empty"
    #[arg(long, default_value = "")]
    flags: Options,
    /// Hold pattern and input in their narrowest encoding
    #[arg(long)]
    compact: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the first match
    Search {
        #[command(flatten)]
        args: SearchArgs,
        /// Show every group with character and byte regions
        #[arg(short, long)]
        verbose: bool,
    },
    /// Find all matches
    Find {
        #[command(flatten)]
        args: SearchArgs,
    },
    /// List supported encodings
    Encodings,
    /// Show the bytes of the input in an encoding
    Encode {
        /// The input string
        input: String,
        /// Target encoding
        #[arg(long)]
        encoding: Encoding,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    let outcome = match cli.command {
        Commands::Search { args, verbose } => cmd_search(&args, verbose),
        Commands::Find { args } => cmd_find(&args),
        Commands::Encodings => {
            cmd_encodings();
            Ok(true)
        }
        Commands::Encode { input, encoding } => cmd_encode(&input, encoding),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn build(args: &SearchArgs) -> Result<(Pattern, WrappedText), RegexError> {
    let mut builder = PatternBuilder::new(&args.pattern).options(args.flags);
    if args.compact {
        builder = builder.strategy(CompactStrategy);
    }
    let pattern = builder.build()?;
    let subject = match args.encoding {
        Some(encoding) => WrappedText::with_native_encoding(args.input.as_str(), encoding)?,
        None => pattern.wrap(&args.input),
    };
    Ok((pattern, subject))
}

fn print_header(pattern: &Pattern, subject: &WrappedText) {
    println!("  Pattern: {} ({})", pattern.as_str().cyan(), pattern.native_encoding());
    println!("  Input:   {} ({})", subject.text().yellow(), subject.native_encoding());
    println!("  Search:  {}", pattern.negotiate_encoding(subject));
    println!();
}

fn cmd_search(args: &SearchArgs, verbose: bool) -> Result<bool, RegexError> {
    let (pattern, subject) = build(args)?;
    print_header(&pattern, &subject);

    let Some(m) = pattern.search_wrapped(&subject, args.start)? else {
        println!("{}", "✗ No match".red());
        return Ok(false);
    };

    println!("{}", "✓ Match found!".green().bold());
    println!("  Region: {}", m.region());
    println!("  Match:  {}", m.as_str().green());

    if verbose {
        print_groups(&m);
    }
    Ok(true)
}

fn print_groups(m: &Match<'_>) {
    println!();
    println!("{} ({})", "Groups:".bold(), m.encoding());
    for (index, (chars, bytes)) in m.regions().iter().zip(m.byte_regions()).enumerate() {
        match (chars, bytes) {
            (Some(chars), Some(bytes)) => println!(
                "  Group {}: chars {} bytes {} = {}",
                index,
                chars,
                bytes,
                m.group(index).unwrap_or_default().green()
            ),
            _ => println!("  Group {}: {}", index, "unmatched".dimmed()),
        }
    }
}

fn cmd_find(args: &SearchArgs) -> Result<bool, RegexError> {
    let (pattern, subject) = build(args)?;
    print_header(&pattern, &subject);

    let matches = pattern
        .find_iter_wrapped(&subject, args.start)?
        .collect::<Result<Vec<_>, _>>()?;

    if matches.is_empty() {
        println!("{}", "No matches found".red());
        return Ok(true);
    }

    println!(
        "{} {}",
        "Found".bold(),
        format!("{} match(es)", matches.len()).green()
    );
    println!();
    for (i, m) in matches.iter().enumerate() {
        println!("  [{}] {} = {}", i + 1, m.region(), m.as_str().green());
    }
    Ok(true)
}

fn cmd_encodings() {
    println!("{}", "Supported encodings:".bold());
    for encoding in Encoding::ALL {
        let width = match encoding.unit_width() {
            Some(width) => format!("{width}-byte units"),
            None => "variable width".to_string(),
        };
        println!(
            "  {} rank {}  tag {}  {}",
            format!("{:<11}", encoding.name()).cyan(),
            encoding.rank(),
            encoding.tag().value(),
            width
        );
    }
}

fn cmd_encode(input: &str, encoding: Encoding) -> Result<bool, RegexError> {
    let view = encoding.encode(input)?;
    let hex: Vec<String> = view.bytes().iter().map(|b| format!("{b:02x}")).collect();

    println!("  Encoding: {}", encoding.name().cyan());
    println!("  Chars:    {}", view.char_len());
    println!("  Bytes:    {}", view.len());
    println!("  {}", hex.join(" ").green());
    Ok(true)
}
