//! Regex backend
//!
//! [`RustRegexEngine`] implements [`NativeRegexEngine`] on top of
//! `regex::bytes`. UTF-8 and ASCII buffers are searched in place. Buffers in
//! every other encoding are transcoded to UTF-8 once per subject (in
//! [`NativeRegexEngine::prepare`]), and the reported offsets are mapped back
//! into the subject's own byte offsets, so callers see exactly what a
//! natively multi-encoding engine would report.
//!
//! Option mapping follows Ruby-syntax Oniguruma: `^`/`$` are line anchors
//! unless SINGLELINE is set, and MULTILINE lets `.` match a newline.
//! FIND_NOT_EMPTY rejects an empty match in favour of a non-empty one at
//! the same start, falling back to the longest such match.

use crate::encoding::{Encoding, UnitLayout};
use crate::error::{RegexError, Result};
use crate::matches::Region;
use crate::native::{ByteRegions, Engine, NativeRegexEngine, Options};
use regex::bytes::{Regex, RegexBuilder};
use regex_automata::util::syntax;
use regex_automata::{Anchored, Input, MatchKind, meta};
use std::sync::{Arc, LazyLock, OnceLock};
use tracing::{debug, trace};

static GLOBAL: LazyLock<Arc<Engine<RustRegexEngine>>> =
    LazyLock::new(|| Engine::new(RustRegexEngine));

/// The bundled engine, backed by the `regex` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct RustRegexEngine;

impl Engine<RustRegexEngine> {
    /// The process-wide regex backend host
    ///
    /// Encodings are registered with it once per process.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }
}

/// A pattern compiled for one encoding
#[derive(Debug)]
pub struct CompiledRegex {
    regex: Regex,
    encoding: Encoding,
    syntax: syntax::Config,
    not_empty: bool,
    longest: OnceLock<meta::Regex>,
}

impl CompiledRegex {
    /// The encoding this handle was compiled for
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The pattern source as seen by `regex`
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Number of groups, including group 0
    pub fn group_count(&self) -> usize {
        self.regex.captures_len()
    }

    /// Same pattern, reporting the longest match instead of the first
    fn longest(&self) -> Result<&meta::Regex> {
        if let Some(regex) = self.longest.get() {
            return Ok(regex);
        }
        let regex = meta::Regex::builder()
            .configure(
                meta::Config::new()
                    .match_kind(MatchKind::All)
                    .utf8_empty(false),
            )
            .syntax(self.syntax)
            .build(self.regex.as_str())
            .map_err(|e| RegexError::Engine(e.to_string()))?;
        Ok(self.longest.get_or_init(|| regex))
    }

    /// The longest non-empty match starting exactly at `at`
    fn non_empty_at(&self, bytes: &[u8], at: usize) -> Result<Option<Vec<Option<(usize, usize)>>>> {
        let longest = self.longest()?;
        let input = Input::new(bytes).range(at..).anchored(Anchored::Yes);
        let mut caps = longest.create_captures();
        longest.search_captures(&input, &mut caps);
        match caps.get_match() {
            Some(whole) if !whole.is_empty() => Ok(Some(
                (0..caps.group_len())
                    .map(|index| caps.get_group(index).map(|span| (span.start, span.end)))
                    .collect(),
            )),
            _ => Ok(None),
        }
    }
}

/// A subject transcoded to UTF-8, with parallel character-start tables
#[derive(Debug)]
pub struct Transcoded {
    utf8: Vec<u8>,
    source_offsets: Vec<usize>,
    utf8_offsets: Vec<usize>,
}

impl Transcoded {
    fn new(encoding: Encoding, subject: &[u8]) -> Result<Self> {
        let text = encoding
            .decode(subject)
            .map_err(|e| RegexError::Engine(e.to_string()))?;
        trace!(%encoding, bytes = subject.len(), "transcoding subject");

        let chars = text.chars().count();
        let mut source_offsets = Vec::with_capacity(chars + 1);
        let mut utf8_offsets = Vec::with_capacity(chars + 1);
        let mut source = 0;
        for (utf8, c) in text.char_indices() {
            source_offsets.push(source);
            utf8_offsets.push(utf8);
            source += match encoding.layout() {
                UnitLayout::SingleByte => 1,
                UnitLayout::Utf8 => c.len_utf8(),
                UnitLayout::Utf16 => c.len_utf16() * 2,
                UnitLayout::Utf32 => 4,
            };
        }
        source_offsets.push(source);
        utf8_offsets.push(text.len());

        Ok(Transcoded {
            utf8: text.into_bytes(),
            source_offsets,
            utf8_offsets,
        })
    }
}

fn searched_in_place(encoding: Encoding) -> bool {
    matches!(encoding, Encoding::Utf8 | Encoding::Ascii)
}

impl NativeRegexEngine for RustRegexEngine {
    type Compiled = CompiledRegex;
    type Scratch = Option<Transcoded>;

    fn register_encodings(&self, encodings: &[Encoding]) -> Result<()> {
        // every encoding is transcoded on demand, nothing to install
        debug!(count = encodings.len(), "regex backend ready");
        Ok(())
    }

    fn compile(
        &self,
        pattern: &[u8],
        encoding: Encoding,
        options: Options,
    ) -> Result<CompiledRegex> {
        if options.contains(Options::FIND_LONGEST) {
            return Err(RegexError::compile(
                "FIND_LONGEST is not supported by the regex backend",
            ));
        }
        let source = encoding
            .decode(pattern)
            .map_err(|e| RegexError::compile(e.to_string()))?;
        let singleline =
            options.contains(Options::SINGLELINE) && !options.contains(Options::NEGATE_SINGLELINE);
        let multi_line = !singleline;
        let dot_all = options.contains(Options::MULTILINE);
        let ignore_case = options.contains(Options::IGNORECASE);
        let extended = options.contains(Options::EXTEND);

        let regex = RegexBuilder::new(&source)
            .multi_line(multi_line)
            .dot_matches_new_line(dot_all)
            .case_insensitive(ignore_case)
            .ignore_whitespace(extended)
            .build()
            .map_err(|e| RegexError::compile(e.to_string()))?;
        let syntax = syntax::Config::new()
            .multi_line(multi_line)
            .dot_matches_new_line(dot_all)
            .case_insensitive(ignore_case)
            .ignore_whitespace(extended)
            .utf8(false);

        Ok(CompiledRegex {
            regex,
            encoding,
            syntax,
            not_empty: options.contains(Options::FIND_NOT_EMPTY),
            longest: OnceLock::new(),
        })
    }

    fn prepare(&self, compiled: &CompiledRegex, subject: &[u8]) -> Result<Option<Transcoded>> {
        if searched_in_place(compiled.encoding) {
            return Ok(None);
        }
        Transcoded::new(compiled.encoding, subject).map(Some)
    }

    fn search(
        &self,
        compiled: &CompiledRegex,
        subject: &[u8],
        scratch: &Option<Transcoded>,
        start: usize,
        options: Options,
    ) -> Result<Option<ByteRegions>> {
        if start > subject.len() {
            return Ok(None);
        }
        let haystack = match scratch {
            Some(transcoded) => Haystack::Transcoded(transcoded),
            None if searched_in_place(compiled.encoding) => Haystack::Direct(subject),
            None => {
                return Err(RegexError::Engine(format!(
                    "{} subject searched without preparation",
                    compiled.encoding
                )));
            }
        };
        let bytes = haystack.utf8();
        let not_empty = compiled.not_empty || options.contains(Options::FIND_NOT_EMPTY);
        let mut at = haystack.to_utf8(start);

        loop {
            let Some(caps) = compiled.regex.captures_at(bytes, at) else {
                return Ok(None);
            };
            let Some(whole) = caps.get(0) else {
                return Ok(None);
            };
            let spans: Vec<Option<(usize, usize)>> = if not_empty && whole.is_empty() {
                match compiled.non_empty_at(bytes, whole.start())? {
                    Some(spans) => spans,
                    None if whole.start() >= bytes.len() => return Ok(None),
                    None => {
                        at = next_utf8_boundary(bytes, whole.start());
                        trace!(at, "skipping empty match");
                        continue;
                    }
                }
            } else {
                caps.iter()
                    .map(|group| group.map(|m| (m.start(), m.end())))
                    .collect()
            };

            let regions = spans
                .into_iter()
                .map(|span| {
                    span.map(|(begin, end)| {
                        Region::new(haystack.to_source(begin), haystack.to_source(end))
                    })
                })
                .collect();
            return Ok(Some(regions));
        }
    }

    fn group_numbers(&self, compiled: &CompiledRegex, name: &[u8]) -> Vec<usize> {
        let Ok(name) = compiled.encoding.decode(name) else {
            return Vec::new();
        };
        compiled
            .regex
            .capture_names()
            .enumerate()
            .filter_map(|(index, group)| (group == Some(name.as_str())).then_some(index))
            .collect()
    }

    fn release(&self, compiled: CompiledRegex) {
        trace!(encoding = %compiled.encoding, "releasing compiled regex");
        drop(compiled);
    }
}

/// A subject buffer as `regex` sees it
enum Haystack<'a> {
    /// Already UTF-8 compatible
    Direct(&'a [u8]),
    /// Transcoded during preparation
    Transcoded(&'a Transcoded),
}

impl Haystack<'_> {
    fn utf8(&self) -> &[u8] {
        match self {
            Haystack::Direct(bytes) => bytes,
            Haystack::Transcoded(t) => &t.utf8,
        }
    }

    fn to_utf8(&self, offset: usize) -> usize {
        match self {
            Haystack::Direct(_) => offset,
            Haystack::Transcoded(t) => translate(&t.source_offsets, &t.utf8_offsets, offset),
        }
    }

    fn to_source(&self, offset: usize) -> usize {
        match self {
            Haystack::Direct(_) => offset,
            Haystack::Transcoded(t) => translate(&t.utf8_offsets, &t.source_offsets, offset),
        }
    }
}

/// Map `offset` from one boundary table to the parallel one
fn translate(from: &[usize], to: &[usize], offset: usize) -> usize {
    let index = match from.binary_search(&offset) {
        Ok(index) => index,
        Err(index) => index.min(from.len() - 1),
    };
    to[index]
}

fn next_utf8_boundary(bytes: &[u8], at: usize) -> usize {
    let mut next = at + 1;
    while next < bytes.len() && bytes[next] & 0xC0 == 0x80 {
        next += 1;
    }
    next.min(bytes.len())
}
