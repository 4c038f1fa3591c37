//! Encoded views
//!
//! An [`EncodedView`] is one encoding's materialized byte representation of
//! a text value. Engines see only the bytes; everything they report comes
//! back through the offset translation defined here.
//!
//! Offsets handed to the translation functions are expected to sit on unit
//! boundaries (0, the buffer length, or a value reported by the engine).
//! Offsets past the end are clamped.

use crate::encoding::{Encoding, UnitLayout};
use crate::error::Result;
use std::sync::Arc;

/// One encoding's byte representation of a text value
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedView {
    encoding: Encoding,
    text: Arc<str>,
    bytes: Vec<u8>,
    chars: usize,
    /// Every character occupies exactly one code unit
    narrow: bool,
}

impl EncodedView {
    pub(crate) fn from_parts(encoding: Encoding, text: Arc<str>, bytes: Vec<u8>) -> Self {
        let chars = text.chars().count();
        let narrow = match encoding.layout() {
            UnitLayout::SingleByte | UnitLayout::Utf32 => true,
            UnitLayout::Utf8 => chars == text.len(),
            UnitLayout::Utf16 => chars * 2 == bytes.len(),
        };
        EncodedView {
            encoding,
            text,
            bytes,
            chars,
            narrow,
        }
    }

    /// Adopt a buffer that is already in `encoding`, decoding it once
    pub fn from_bytes(encoding: Encoding, bytes: Vec<u8>) -> Result<Self> {
        let text: Arc<str> = encoding.decode(&bytes)?.into();
        Ok(EncodedView::from_parts(encoding, text, bytes))
    }

    /// The encoding of [`EncodedView::bytes`]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The text this view encodes
    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn shared_text(&self) -> &Arc<str> {
        &self.text
    }

    /// The encoded bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length of the byte buffer
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the text is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of characters in the text
    pub fn char_len(&self) -> usize {
        self.chars
    }

    /// Translate a byte offset into a character offset
    pub fn byte_offset_to_char_offset(&self, offset: usize) -> usize {
        let offset = offset.min(self.bytes.len());
        match self.encoding.layout() {
            UnitLayout::SingleByte => offset,
            UnitLayout::Utf32 => offset / 4,
            UnitLayout::Utf8 if self.narrow => offset,
            UnitLayout::Utf8 => self
                .text
                .char_indices()
                .take_while(|&(i, _)| i < offset)
                .count(),
            UnitLayout::Utf16 if self.narrow => offset / 2,
            UnitLayout::Utf16 => {
                let target = offset / 2;
                let mut units = 0;
                let mut chars = 0;
                for c in self.text.chars() {
                    units += c.len_utf16();
                    if units > target {
                        break;
                    }
                    chars += 1;
                }
                chars
            }
        }
    }

    /// Translate a character offset into a byte offset
    pub fn char_offset_to_byte_offset(&self, offset: usize) -> usize {
        let len = self.bytes.len();
        match self.encoding.layout() {
            UnitLayout::SingleByte => offset.min(len),
            UnitLayout::Utf32 => offset.saturating_mul(4).min(len),
            UnitLayout::Utf8 if self.narrow => offset.min(len),
            UnitLayout::Utf8 => self.str_offset(offset),
            UnitLayout::Utf16 if self.narrow => offset.saturating_mul(2).min(len),
            UnitLayout::Utf16 => {
                self.text
                    .chars()
                    .take(offset)
                    .map(char::len_utf16)
                    .sum::<usize>()
                    * 2
            }
        }
    }

    /// Substring between two byte offsets
    ///
    /// UTF-8 views slice their own buffer, which is exact regardless of
    /// which character boundaries were previously known. Other layouts go
    /// through character offsets.
    pub fn substring_by_byte_offset(&self, start: usize, end: usize) -> &str {
        if self.encoding.layout() == UnitLayout::Utf8 {
            if let Some(slice) = self.text.get(start..end) {
                return slice;
            }
        }
        self.substring_by_char_offset(
            self.byte_offset_to_char_offset(start),
            self.byte_offset_to_char_offset(end),
        )
    }

    /// Substring between two character offsets
    pub fn substring_by_char_offset(&self, start: usize, end: usize) -> &str {
        let start = self.str_offset(start);
        let end = self.str_offset(end).max(start);
        &self.text[start..end]
    }

    /// Byte offset of the character start following `offset`
    pub fn next_char_boundary(&self, offset: usize) -> usize {
        let len = self.bytes.len();
        if offset >= len {
            return len;
        }
        let next = match self.encoding.layout() {
            UnitLayout::SingleByte => offset + 1,
            UnitLayout::Utf32 => offset - offset % 4 + 4,
            UnitLayout::Utf8 => {
                let mut next = offset + 1;
                while next < len && self.bytes[next] & 0xC0 == 0x80 {
                    next += 1;
                }
                next
            }
            UnitLayout::Utf16 => {
                let at = offset - offset % 2;
                let pair = [self.bytes[at], self.bytes.get(at + 1).copied().unwrap_or(0)];
                let unit = if self.encoding == Encoding::Utf16Be {
                    u16::from_be_bytes(pair)
                } else {
                    u16::from_le_bytes(pair)
                };
                if (0xD800..0xDC00).contains(&unit) { at + 4 } else { at + 2 }
            }
        };
        next.min(len)
    }

    /// Offset into the UTF-8 `text` of character `offset`
    fn str_offset(&self, offset: usize) -> usize {
        if self.chars == self.text.len() {
            return offset.min(self.text.len());
        }
        self.text
            .char_indices()
            .nth(offset)
            .map_or(self.text.len(), |(i, _)| i)
    }
}
