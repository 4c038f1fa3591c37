//! Wrapped text
//!
//! A [`WrappedText`] owns one logical text value and hands out its encoded
//! views, computing each at most once.

use crate::encoding::{Encoding, EncodingMap};
use crate::error::Result;
use crate::view::EncodedView;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::trace;

/// Picks the most natural encoding for a text, if it can tell
///
/// A strategy is a pure performance hint. Returning `None` always leaves
/// the text correct, falling back to UTF-8 as its native encoding.
pub trait EncodingStrategy: Send + Sync {
    /// A ready-made view in the text's natural encoding
    fn guess(&self, text: &Arc<str>) -> Option<EncodedView>;
}

/// Never guesses; every text is native UTF-8
#[derive(Debug, Default, Clone, Copy)]
pub struct Utf8Default;

impl EncodingStrategy for Utf8Default {
    fn guess(&self, _text: &Arc<str>) -> Option<EncodedView> {
        None
    }
}

/// Chooses the narrowest fixed-width encoding that holds every character
///
/// ASCII, then ISO-8859-1, then native-endian UTF-16 for BMP-only text,
/// else native-endian UTF-32.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompactStrategy;

impl EncodingStrategy for CompactStrategy {
    fn guess(&self, text: &Arc<str>) -> Option<EncodedView> {
        let widest = text.chars().map(u32::from).max().unwrap_or(0);
        let big = cfg!(target_endian = "big");
        let encoding = match widest {
            0..=0x7F => Encoding::Ascii,
            0x80..=0xFF => Encoding::Iso8859_1,
            0x100..=0xFFFF if big => Encoding::Utf16Be,
            0x100..=0xFFFF => Encoding::Utf16Le,
            _ if big => Encoding::Utf32Be,
            _ => Encoding::Utf32Le,
        };
        encoding.encode(Arc::clone(text)).ok()
    }
}

/// A text value plus its lazily computed encoded views
pub struct WrappedText {
    text: Arc<str>,
    native: Encoding,
    views: EncodingMap<OnceLock<Arc<EncodedView>>>,
}

impl WrappedText {
    /// Wrap `text` with UTF-8 as its native encoding
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        WrappedText {
            text: text.into(),
            native: Encoding::Utf8,
            views: EncodingMap::default(),
        }
    }

    /// Wrap `text` whose natural representation is `encoding`
    ///
    /// The view is computed now, so an encoding that cannot hold the text
    /// fails here rather than at search time.
    pub fn with_native_encoding(text: impl Into<Arc<str>>, encoding: Encoding) -> Result<Self> {
        let view = encoding.encode(text)?;
        Ok(WrappedText::from_view(view))
    }

    /// Wrap text that arrived as `bytes` in `encoding`, keeping those bytes
    pub fn from_encoded(bytes: Vec<u8>, encoding: Encoding) -> Result<Self> {
        let view = EncodedView::from_bytes(encoding, bytes)?;
        Ok(WrappedText::from_view(view))
    }

    /// Wrap `text`, letting `strategy` pick and pre-populate its native view
    pub fn wrap_with(text: impl Into<Arc<str>>, strategy: &dyn EncodingStrategy) -> Self {
        let text = text.into();
        match strategy.guess(&text) {
            Some(view) => WrappedText::from_view(view),
            None => WrappedText::new(text),
        }
    }

    fn from_view(view: EncodedView) -> Self {
        let native = view.encoding();
        let wrapped = WrappedText {
            text: Arc::clone(view.shared_text()),
            native,
            views: EncodingMap::default(),
        };
        let _ = wrapped.views[native].set(Arc::new(view));
        wrapped
    }

    /// The wrapped text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The encoding this text was most efficiently obtained in
    pub fn native_encoding(&self) -> Encoding {
        self.native
    }

    /// Whether a view for `encoding` has already been computed
    pub fn is_cached(&self, encoding: Encoding) -> bool {
        self.views[encoding].get().is_some()
    }

    /// The view for `encoding`, computed on first request
    ///
    /// Every call for the same encoding returns the same `Arc`.
    pub fn encode(&self, encoding: Encoding) -> Result<Arc<EncodedView>> {
        let slot = &self.views[encoding];
        if let Some(view) = slot.get() {
            return Ok(Arc::clone(view));
        }
        trace!(%encoding, chars = self.text.len(), "encoding text");
        let view = Arc::new(encoding.encode(Arc::clone(&self.text))?);
        Ok(Arc::clone(slot.get_or_init(|| view)))
    }
}

impl fmt::Debug for WrappedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached: Vec<Encoding> = self
            .views
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(encoding, _)| encoding)
            .collect();
        f.debug_struct("WrappedText")
            .field("text", &self.text)
            .field("native", &self.native)
            .field("cached", &cached)
            .finish()
    }
}
