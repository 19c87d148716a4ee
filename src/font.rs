use super::cache::CacheKey;
use super::error::ParseError;
use super::internal::{self, head, raw_data, Bytes, RawFont};
use super::Tag;
use tracing::debug;

/// Reference to the content of a font file.
#[derive(Copy, Clone)]
pub struct FontDataRef<'a> {
    data: &'a [u8],
    len: usize,
}

impl<'a> FontDataRef<'a> {
    /// Creates font data from the specified bytes. Returns `None` if the
    /// bytes cannot trivially be determined to represent a font.
    pub fn new(data: &'a [u8]) -> Option<Self> {
        if !raw_data::is_font(data, 0) && !raw_data::is_collection(data) {
            None
        } else {
            Some(Self {
                data,
                len: raw_data::count(data) as usize,
            })
        }
    }

    /// Returns true if the data represents a font collection.
    pub fn is_collection(&self) -> bool {
        raw_data::is_collection(self.data)
    }

    /// Returns the underlying data.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the number of available fonts.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if there are no available fonts.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the font at the specified index.
    pub fn get(&self, index: usize) -> Option<FontRef<'a>> {
        FontRef::from_offset(self.data, raw_data::offset(self.data, index as u32)?)
    }

    /// Returns an iterator over the available fonts.
    pub fn fonts(&self) -> Fonts<'a> {
        Fonts {
            data: *self,
            pos: 0,
        }
    }
}

/// Reference to a font.
///
/// Wraps the full content of a font file together with the byte offset of
/// the table directory for the selected font (zero unless the file is a
/// collection) and a key for identifying the font in caches. Internal
/// offsets are relative to the base of the file, so the entire file must
/// be kept in memory and it is an error to slice the data at the offset.
#[derive(Copy, Clone)]
pub struct FontRef<'a> {
    /// Full content of a file containing the font.
    pub data: &'a [u8],
    /// Offset to the table directory of the font.
    pub offset: u32,
    /// Key for identifying the font in various caches.
    pub key: CacheKey,
}

impl<'a> FontRef<'a> {
    /// Creates a new font from the specified data, validating the table
    /// directory and the presence of the tables required for shaping.
    pub fn load(data: &'a [u8]) -> Result<Self, ParseError> {
        let font = Self::from_index(data, 0).ok_or(ParseError::UnknownTableFormat)?;
        font.validate()?;
        Ok(font)
    }

    /// Creates a new font from the specified font data and the index of
    /// the desired font. Returns `None` if the data does not represent a
    /// font file or the index is out of bounds.
    pub fn from_index(data: &'a [u8], index: usize) -> Option<Self> {
        FontDataRef::new(data)?.get(index)
    }

    /// Creates a new font from the specified font data and offset to the
    /// table directory. Returns `None` if the offset is out of bounds or
    /// the data at the offset does not represent a table directory.
    pub fn from_offset(data: &'a [u8], offset: u32) -> Option<Self> {
        if !raw_data::is_font(data, offset) {
            None
        } else {
            Some(Self {
                data,
                offset,
                key: CacheKey::new(),
            })
        }
    }

    /// Checks the table directory and required tables.
    fn validate(&self) -> Result<(), ParseError> {
        let b = Bytes::new(self.data);
        let base = self.offset as usize;
        let count = b.read_u16(base + 4).ok_or(ParseError::OutOfBounds)? as usize;
        b.ensure_range(base + 12, count * 16)
            .ok_or(ParseError::OutOfBounds)?;
        for i in 0..count {
            let (tag, start, len) = self
                .table_record(i as u16)
                .ok_or(ParseError::OutOfBounds)?;
            let end = start.checked_add(len).ok_or(ParseError::BadOffset)?;
            if end as usize > self.data.len() {
                debug!(
                    tag = %debug_tag(tag),
                    "rejecting font: table extends past end of data"
                );
                return Err(ParseError::BadOffset);
            }
        }
        let head = self
            .head()
            .ok_or(ParseError::MissingRequiredTable("head"))?;
        if head.magic() != head::Head::MAGIC {
            return Err(ParseError::UnknownTableFormat);
        }
        if self.maxp().is_none() {
            return Err(ParseError::MissingRequiredTable("maxp"));
        }
        if self.table_offset(internal::cmap::CMAP) == 0 {
            return Err(ParseError::MissingRequiredTable("cmap"));
        }
        if self.hhea().is_none() {
            return Err(ParseError::MissingRequiredTable("hhea"));
        }
        if self.table_offset(internal::xmtx::HMTX) == 0 {
            return Err(ParseError::MissingRequiredTable("hmtx"));
        }
        Ok(())
    }

    /// Returns the table data for the specified tag.
    pub fn table(&self, tag: Tag) -> Option<&'a [u8]> {
        self.table_data(tag)
    }
}

impl<'a> RawFont<'a> for FontRef<'a> {
    fn data(&self) -> &'a [u8] {
        self.data
    }

    fn offset(&self) -> u32 {
        self.offset
    }
}

fn debug_tag(tag: Tag) -> String {
    let bytes = tag.to_be_bytes();
    core::str::from_utf8(&bytes).unwrap_or("????").to_string()
}

/// Iterator over a collection of fonts.
pub struct Fonts<'a> {
    data: FontDataRef<'a>,
    pos: usize,
}

impl<'a> Iterator for Fonts<'a> {
    type Item = FontRef<'a>;

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.data.len - self.pos;
        (remaining, Some(remaining))
    }

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len {
            None
        } else {
            let pos = self.pos;
            self.pos += 1;
            self.data.get(pos)
        }
    }
}

impl<'a> ExactSizeIterator for Fonts<'a> {
    fn len(&self) -> usize {
        self.data.len - self.pos
    }
}

impl<'a> IntoIterator for FontDataRef<'a> {
    type IntoIter = Fonts<'a>;
    type Item = FontRef<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.fonts()
    }
}
