//! Encoding registry
//!
//! The closed set of byte encodings the bridge can hand to an engine. Each
//! encoding knows its canonical name, the opaque tag registered with the
//! engine, its width rank (used to negotiate a shared encoding between a
//! pattern and a subject), and the unit layout that drives offset
//! translation in [`EncodedView`].

use crate::error::{RegexError, Result};
use crate::view::EncodedView;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;
use std::sync::Arc;

/// A supported byte encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// 7-bit ASCII, one byte per character
    Ascii,
    /// Latin-1, one byte per character
    Iso8859_1,
    /// UTF-8, one to four bytes per character
    Utf8,
    /// UTF-16 little endian
    Utf16Le,
    /// UTF-16 big endian
    Utf16Be,
    /// UTF-32 little endian
    Utf32Le,
    /// UTF-32 big endian
    Utf32Be,
}

/// Opaque identifier an engine associates with an encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineTag(u8);

impl EngineTag {
    /// Raw tag value, stable for the lifetime of the process
    pub fn value(self) -> u8 {
        self.0
    }
}

/// How an encoding lays characters out as bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitLayout {
    /// One byte per character
    SingleByte,
    /// Variable width, one to four bytes
    Utf8,
    /// Two-byte code units, astral characters take a surrogate pair
    Utf16,
    /// One four-byte unit per character
    Utf32,
}

impl Encoding {
    /// Every supported encoding, in rank order
    pub const ALL: [Encoding; 7] = [
        Encoding::Ascii,
        Encoding::Iso8859_1,
        Encoding::Utf8,
        Encoding::Utf16Le,
        Encoding::Utf16Be,
        Encoding::Utf32Le,
        Encoding::Utf32Be,
    ];

    /// Number of supported encodings
    pub const COUNT: usize = Self::ALL.len();

    /// Canonical name
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Ascii => "ASCII",
            Encoding::Iso8859_1 => "ISO-8859-1",
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Utf16Be => "UTF-16BE",
            Encoding::Utf32Le => "UTF-32LE",
            Encoding::Utf32Be => "UTF-32BE",
        }
    }

    /// Width rank; a higher rank represents anything a lower rank can
    pub fn rank(self) -> u8 {
        match self {
            Encoding::Ascii => 0,
            Encoding::Iso8859_1 => 1,
            Encoding::Utf8 => 2,
            Encoding::Utf16Le | Encoding::Utf16Be => 3,
            Encoding::Utf32Le | Encoding::Utf32Be => 4,
        }
    }

    /// The tag registered with the engine for this encoding
    pub fn tag(self) -> EngineTag {
        EngineTag(self as u8)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Unit layout of the byte representation
    pub fn layout(self) -> UnitLayout {
        match self {
            Encoding::Ascii | Encoding::Iso8859_1 => UnitLayout::SingleByte,
            Encoding::Utf8 => UnitLayout::Utf8,
            Encoding::Utf16Le | Encoding::Utf16Be => UnitLayout::Utf16,
            Encoding::Utf32Le | Encoding::Utf32Be => UnitLayout::Utf32,
        }
    }

    /// Bytes per code unit, `None` for variable-width UTF-8
    pub fn unit_width(self) -> Option<usize> {
        match self.layout() {
            UnitLayout::SingleByte => Some(1),
            UnitLayout::Utf8 => None,
            UnitLayout::Utf16 => Some(2),
            UnitLayout::Utf32 => Some(4),
        }
    }

    fn is_big_endian(self) -> bool {
        matches!(self, Encoding::Utf16Be | Encoding::Utf32Be)
    }

    /// Look up an encoding by canonical name, ignoring ASCII case
    pub fn get_by_name(name: &str) -> Result<Encoding> {
        Self::ALL
            .into_iter()
            .find(|encoding| encoding.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| RegexError::UnknownEncoding(name.to_string()))
    }

    /// Materialize `text` as an [`EncodedView`] in this encoding
    pub fn encode(self, text: impl Into<Arc<str>>) -> Result<EncodedView> {
        let text = text.into();
        let bytes = self.encode_bytes(&text)?;
        Ok(EncodedView::from_parts(self, text, bytes))
    }

    /// Convert `text` to this encoding's bytes
    pub fn encode_bytes(self, text: &str) -> Result<Vec<u8>> {
        let big = self.is_big_endian();
        match self.layout() {
            UnitLayout::SingleByte => {
                let max = if self == Encoding::Ascii { 0x7F } else { 0xFF };
                text.chars()
                    .enumerate()
                    .map(|(position, character)| {
                        let code = u32::from(character);
                        if code <= max {
                            Ok(code as u8)
                        } else {
                            Err(RegexError::Encoding {
                                encoding: self,
                                character,
                                position,
                            })
                        }
                    })
                    .collect()
            }
            UnitLayout::Utf8 => Ok(text.as_bytes().to_vec()),
            UnitLayout::Utf16 => Ok(text
                .encode_utf16()
                .flat_map(|unit| if big { unit.to_be_bytes() } else { unit.to_le_bytes() })
                .collect()),
            UnitLayout::Utf32 => Ok(text
                .chars()
                .flat_map(|c| {
                    let code = u32::from(c);
                    if big { code.to_be_bytes() } else { code.to_le_bytes() }
                })
                .collect()),
        }
    }

    /// Convert bytes in this encoding back to text
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        let malformed = |offset| RegexError::MalformedBytes {
            encoding: self,
            offset,
        };
        let big = self.is_big_endian();

        match self.layout() {
            UnitLayout::SingleByte => {
                if self == Encoding::Ascii {
                    if let Some(offset) = bytes.iter().position(|b| !b.is_ascii()) {
                        return Err(malformed(offset));
                    }
                }
                Ok(bytes.iter().map(|&b| char::from(b)).collect())
            }
            UnitLayout::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| malformed(e.valid_up_to())),
            UnitLayout::Utf16 => {
                let units = bytes.chunks_exact(2).map(|pair| {
                    let pair = [pair[0], pair[1]];
                    if big {
                        u16::from_be_bytes(pair)
                    } else {
                        u16::from_le_bytes(pair)
                    }
                });
                let mut text = String::with_capacity(bytes.len() / 2);
                let mut offset = 0;
                for decoded in char::decode_utf16(units) {
                    let c = decoded.map_err(|_| malformed(offset))?;
                    offset += c.len_utf16() * 2;
                    text.push(c);
                }
                if bytes.len() % 2 != 0 {
                    return Err(malformed(offset));
                }
                Ok(text)
            }
            UnitLayout::Utf32 => {
                let mut text = String::with_capacity(bytes.len() / 4);
                for (i, quad) in bytes.chunks_exact(4).enumerate() {
                    let quad = [quad[0], quad[1], quad[2], quad[3]];
                    let code = if big {
                        u32::from_be_bytes(quad)
                    } else {
                        u32::from_le_bytes(quad)
                    };
                    text.push(char::from_u32(code).ok_or_else(|| malformed(i * 4))?);
                }
                if bytes.len() % 4 != 0 {
                    return Err(malformed(bytes.len() - bytes.len() % 4));
                }
                Ok(text)
            }
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = RegexError;

    fn from_str(s: &str) -> Result<Self> {
        Encoding::get_by_name(s)
    }
}

/// Fixed-size storage holding one value per [`Encoding`]
#[derive(Debug, Clone)]
pub struct EncodingMap<T>([T; Encoding::COUNT]);

impl<T> EncodingMap<T> {
    /// Build a map by calling `f` for every encoding
    pub fn from_fn(mut f: impl FnMut(Encoding) -> T) -> Self {
        EncodingMap(std::array::from_fn(|i| f(Encoding::ALL[i])))
    }

    /// Iterate over `(encoding, value)` pairs in rank order
    pub fn iter(&self) -> impl Iterator<Item = (Encoding, &T)> {
        Encoding::ALL.into_iter().zip(self.0.iter())
    }

    /// Mutable variant of [`EncodingMap::iter`]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Encoding, &mut T)> {
        Encoding::ALL.into_iter().zip(self.0.iter_mut())
    }
}

impl<T: Default> Default for EncodingMap<T> {
    fn default() -> Self {
        EncodingMap::from_fn(|_| T::default())
    }
}

impl<T> Index<Encoding> for EncodingMap<T> {
    type Output = T;

    fn index(&self, encoding: Encoding) -> &T {
        &self.0[encoding.index()]
    }
}

impl<T> IndexMut<Encoding> for EncodingMap<T> {
    fn index_mut(&mut self, encoding: Encoding) -> &mut T {
        &mut self.0[encoding.index()]
    }
}
