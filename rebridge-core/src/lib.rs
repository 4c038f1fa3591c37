//! Rebridge Core Library
//!
//! Encoding-aware pattern search on top of regex engines that only
//! understand byte buffers in one fixed encoding per compiled pattern.
//!
//! A [`Pattern`] compiles itself once per encoding it meets, a
//! [`WrappedText`] materializes each encoding of a subject at most once, and
//! every offset the engine reports in bytes comes back to the caller as a
//! character offset.
//!
//! ```
//! use rebridge_core::{Options, Pattern};
//!
//! let pattern = Pattern::new("a+", Options::NONE).unwrap();
//! let found = pattern.search("baaab").unwrap().unwrap();
//! assert_eq!((found.start(), found.end()), (1, 4));
//! assert_eq!(found.group(0).unwrap(), "aaa");
//! ```

pub mod backend;
pub mod encoding;
pub mod error;
pub mod matches;
pub mod native;
pub mod pattern;
pub mod view;
pub mod wrapped;

pub use backend::{CompiledRegex, RustRegexEngine, Transcoded};
pub use encoding::{Encoding, EncodingMap, EngineTag, UnitLayout};
pub use error::{RegexError, Result};
pub use matches::{Match, MatchCursor, Matches, Region};
pub use native::{ByteRegions, Engine, NativeRegexEngine, Options};
pub use pattern::{Pattern, PatternBuilder};
pub use view::EncodedView;
pub use wrapped::{CompactStrategy, EncodingStrategy, Utf8Default, WrappedText};

/// Wrap `text` for searching, using the default UTF-8 native encoding
pub fn wrap(text: &str) -> WrappedText {
    WrappedText::new(text)
}
