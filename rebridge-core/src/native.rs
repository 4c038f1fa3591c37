//! Native engine capability
//!
//! The bridge never matches anything itself. Matching is delegated to a
//! [`NativeRegexEngine`], which only understands byte buffers and a fixed
//! encoding per compiled pattern. [`Engine`] hosts one engine instance and
//! guarantees that the encoding registry is registered with it exactly once
//! before the first compile.

use crate::encoding::Encoding;
use crate::error::{RegexError, Result};
use crate::matches::Region;
use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use tracing::debug;

bitflags! {
    /// Match options passed through to the engine unchanged
    ///
    /// Bit values follow Oniguruma's `ONIG_OPTION_*` constants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Options: u32 {
        /// Case-insensitive matching
        const IGNORECASE = 1;
        /// Ignore whitespace and allow `#` comments in the pattern
        const EXTEND = 1 << 1;
        /// `.` also matches newline
        const MULTILINE = 1 << 2;
        /// `^` and `$` anchor to the whole text only
        const SINGLELINE = 1 << 3;
        /// Report the longest match
        const FIND_LONGEST = 1 << 4;
        /// Ignore empty matches
        const FIND_NOT_EMPTY = 1 << 5;
        /// Clear `SINGLELINE`
        const NEGATE_SINGLELINE = 1 << 6;
    }
}

impl Options {
    /// No options set
    pub const NONE: Options = Options::empty();

    /// Parse a flag string like `"imsx"` or `"ignorecase|find_not_empty"`
    ///
    /// Short flags: `i` IGNORECASE, `m` MULTILINE, `s` SINGLELINE,
    /// `x` EXTEND, `l` FIND_LONGEST, `n` FIND_NOT_EMPTY. Long names are the
    /// constant names in any case, `none` included.
    pub fn parse(flags: &str) -> std::result::Result<Self, String> {
        let mut options = Options::NONE;
        for word in flags.split(['|', ',']).map(str::trim).filter(|w| !w.is_empty()) {
            if word.eq_ignore_ascii_case("none") {
                continue;
            }
            if let Some(named) = Options::from_name(&word.to_ascii_uppercase()) {
                options |= named;
                continue;
            }
            for c in word.chars() {
                options |= match c {
                    'i' => Options::IGNORECASE,
                    'm' => Options::MULTILINE,
                    's' => Options::SINGLELINE,
                    'x' => Options::EXTEND,
                    'l' => Options::FIND_LONGEST,
                    'n' => Options::FIND_NOT_EMPTY,
                    _ => return Err(format!("unknown option '{word}'")),
                };
            }
        }
        Ok(options)
    }
}

impl FromStr for Options {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        Options::parse(s)
    }
}

impl fmt::Display for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        f.write_str(&names.join("|"))
    }
}

/// Byte regions reported by one successful search
///
/// Index 0 is the overall match; `None` marks a group that did not
/// participate.
pub type ByteRegions = Vec<Option<Region>>;

/// A regex engine that works on byte buffers in a fixed encoding
pub trait NativeRegexEngine: Send + Sync {
    /// The engine's compiled pattern handle
    type Compiled: Send + Sync;

    /// Per-subject state reused by every search over one buffer
    type Scratch;

    /// Register every encoding's tag; called once per engine host
    fn register_encodings(&self, encodings: &[Encoding]) -> Result<()>;

    /// Compile `pattern`, given as bytes in `encoding`
    ///
    /// Rejections must come back as [`RegexError::PatternCompile`] with the
    /// engine's own diagnostic.
    fn compile(&self, pattern: &[u8], encoding: Encoding, options: Options)
    -> Result<Self::Compiled>;

    /// Prepare `subject` for searching with `compiled`
    ///
    /// Called once per subject buffer; the result is handed back to every
    /// [`NativeRegexEngine::search`] over that same buffer.
    fn prepare(&self, compiled: &Self::Compiled, subject: &[u8]) -> Result<Self::Scratch>;

    /// Search `subject` from byte offset `start`; `Ok(None)` is no match
    fn search(
        &self,
        compiled: &Self::Compiled,
        subject: &[u8],
        scratch: &Self::Scratch,
        start: usize,
        options: Options,
    ) -> Result<Option<ByteRegions>>;

    /// Group numbers carrying `name` (given in the handle's encoding)
    fn group_numbers(&self, compiled: &Self::Compiled, name: &[u8]) -> Vec<usize>;

    /// Release a compiled handle
    fn release(&self, compiled: Self::Compiled);
}

/// Hosts a [`NativeRegexEngine`] and performs its one-time registration
pub struct Engine<E: NativeRegexEngine> {
    native: E,
    registration: OnceLock<Result<()>>,
}

impl<E: NativeRegexEngine> Engine<E> {
    /// Wrap an engine; registration happens lazily before the first compile
    pub fn new(native: E) -> Arc<Self> {
        Arc::new(Engine {
            native,
            registration: OnceLock::new(),
        })
    }

    /// The hosted engine
    pub fn native(&self) -> &E {
        &self.native
    }

    /// Register all encodings with the engine, at most once
    ///
    /// A failed registration is memoized and reported to every caller.
    pub fn ensure_registered(&self) -> Result<()> {
        self.registration
            .get_or_init(|| {
                debug!(encodings = Encoding::COUNT, "registering encodings with engine");
                self.native.register_encodings(&Encoding::ALL)
            })
            .clone()
    }

    /// Whether registration has already run
    pub fn is_registered(&self) -> bool {
        self.registration.get().is_some()
    }

    pub(crate) fn compile(
        &self,
        pattern: &[u8],
        encoding: Encoding,
        options: Options,
    ) -> Result<E::Compiled> {
        self.ensure_registered()?;
        self.native.compile(pattern, encoding, options)
    }
}

impl<E: NativeRegexEngine + fmt::Debug> fmt::Debug for Engine<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("native", &self.native)
            .field("registered", &self.is_registered())
            .finish()
    }
}

pub(crate) fn missing_overall_match() -> RegexError {
    RegexError::Engine("engine reported a match without region 0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RegistrationCounter {
        registrations: AtomicUsize,
        fail: bool,
    }

    impl NativeRegexEngine for RegistrationCounter {
        type Compiled = ();
        type Scratch = ();

        fn register_encodings(&self, encodings: &[Encoding]) -> Result<()> {
            assert_eq!(encodings.len(), Encoding::COUNT);
            self.registrations.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(RegexError::Engine("no tables".to_string()))
            } else {
                Ok(())
            }
        }

        fn compile(&self, _: &[u8], _: Encoding, _: Options) -> Result<()> {
            Ok(())
        }

        fn prepare(&self, _: &(), _: &[u8]) -> Result<()> {
            Ok(())
        }

        fn search(
            &self,
            _: &(),
            _: &[u8],
            _: &(),
            _: usize,
            _: Options,
        ) -> Result<Option<ByteRegions>> {
            Ok(None)
        }

        fn group_numbers(&self, _: &(), _: &[u8]) -> Vec<usize> {
            Vec::new()
        }

        fn release(&self, _: ()) {}
    }

    #[test]
    fn test_options_bit_values() {
        assert_eq!(Options::NONE.bits(), 0);
        assert_eq!(Options::IGNORECASE.bits(), 1);
        assert_eq!(Options::MULTILINE.bits(), 4);
        assert_eq!(Options::NEGATE_SINGLELINE.bits(), 64);
    }

    #[test]
    fn test_options_parse() {
        assert_eq!(
            Options::parse("im").unwrap(),
            Options::IGNORECASE | Options::MULTILINE
        );
        assert_eq!(
            Options::parse("extend|find_not_empty").unwrap(),
            Options::EXTEND | Options::FIND_NOT_EMPTY
        );
        assert_eq!(Options::parse("").unwrap(), Options::NONE);
        assert_eq!(Options::parse("none").unwrap(), Options::NONE);
        assert_eq!(
            Options::parse("NONE|ignorecase").unwrap(),
            Options::IGNORECASE
        );
        assert_eq!(
            Options::parse(&Options::NONE.to_string()).unwrap(),
            Options::NONE
        );
        assert!(Options::parse("q").is_err());
    }

    #[test]
    fn test_options_display() {
        assert_eq!(Options::NONE.to_string(), "NONE");
        assert_eq!(
            (Options::IGNORECASE | Options::EXTEND).to_string(),
            "IGNORECASE|EXTEND"
        );
    }

    #[test]
    fn test_registration_runs_once() {
        let engine = Engine::new(RegistrationCounter::default());
        assert!(!engine.is_registered());
        engine.compile(b"a", Encoding::Utf8, Options::NONE).unwrap();
        engine.compile(b"b", Encoding::Utf16Le, Options::NONE).unwrap();
        engine.ensure_registered().unwrap();
        assert_eq!(engine.native().registrations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_registration_is_not_retried() {
        let engine = Engine::new(RegistrationCounter {
            fail: true,
            ..Default::default()
        });
        assert!(engine.compile(b"a", Encoding::Utf8, Options::NONE).is_err());
        assert!(engine.ensure_registered().is_err());
        assert_eq!(engine.native().registrations.load(Ordering::SeqCst), 1);
    }
}
