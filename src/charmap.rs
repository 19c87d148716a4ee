/*!
Mapping characters to nominal glyph identifiers.
*/

use super::internal::{cmap, RawFont};
use super::{FontRef, GlyphId};

pub use cmap::MapVariant;

/// Proxy for rematerializing a character map.
#[derive(Copy, Clone, Default, Debug)]
pub struct CharmapProxy(cmap::SubtableInfo);

impl CharmapProxy {
    /// Creates a character map proxy from the specified font.
    pub fn from_font(font: &FontRef) -> Self {
        let offset = font.table_offset(cmap::CMAP);
        Self(cmap::subtable(font.data, offset).unwrap_or_default())
    }

    /// Materializes a character map from the specified font. This proxy
    /// must have been created from the same font.
    pub fn materialize<'a>(&self, font: &FontRef<'a>) -> Charmap<'a> {
        Charmap {
            data: font.data,
            proxy: *self,
        }
    }
}

/// Maps characters to nominal glyph identifiers.
#[derive(Copy, Clone)]
pub struct Charmap<'a> {
    data: &'a [u8],
    proxy: CharmapProxy,
}

impl<'a> Charmap<'a> {
    /// Creates a character map from the specified font.
    pub fn from_font(font: &FontRef<'a>) -> Self {
        Self {
            data: font.data,
            proxy: CharmapProxy::from_font(font),
        }
    }

    /// Returns a nominal glyph identifier for the specified codepoint.
    /// Unmapped codepoints return glyph zero.
    pub fn map(&self, codepoint: impl Into<u32>) -> GlyphId {
        let codepoint = codepoint.into();
        let info = &self.proxy.0;
        let mut glyph_id = cmap::map(self.data, info.offset, info.format, codepoint).unwrap_or(0);
        // Remap U+0000..=U+00FF to U+F000..=U+F0FF for symbol encodings.
        if glyph_id == 0 && info.is_symbol && codepoint <= 0x00FF {
            glyph_id =
                cmap::map(self.data, info.offset, info.format, codepoint + 0xF000).unwrap_or(0);
        }
        glyph_id
    }

    /// Maps a codepoint with a variation selector using the format 14
    /// subtable, if present.
    pub fn map_variant(&self, codepoint: u32, variation_selector: u32) -> Option<MapVariant> {
        cmap::map_variant(
            self.data,
            self.proxy.0.variations,
            codepoint,
            variation_selector,
        )
    }
}
