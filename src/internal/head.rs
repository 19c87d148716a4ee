//! Font header tables.

use super::{raw_tag, Bytes, RawFont, RawTag};

pub const HEAD: RawTag = raw_tag(b"head");
pub const OS_2: RawTag = raw_tag(b"OS/2");
pub const POST: RawTag = raw_tag(b"post");
pub const MAXP: RawTag = raw_tag(b"maxp");
pub const HHEA: RawTag = raw_tag(b"hhea");
pub const VHEA: RawTag = raw_tag(b"vhea");

/// Font header table.
#[derive(Copy, Clone)]
pub struct Head<'a>(Bytes<'a>);

impl<'a> Head<'a> {
    /// The expected value of the 'magic' field in the header table.
    pub const MAGIC: u32 = 0x5F0F3CF5;

    /// Creates a font header table wrapping the specified data.
    pub fn new(data: &'a [u8]) -> Self {
        Self(Bytes::new(data))
    }

    /// Creates a font header table from the specified font. Returns `None`
    /// if the font does not contain a `head` table.
    pub fn from_font(font: impl RawFont<'a>) -> Option<Self> {
        Some(Self::new(font.table_data(HEAD)?))
    }

    /// Returns a magic number for validation. Set to 0x5F0F3CF5.
    pub fn magic(&self) -> u32 {
        self.0.read_or_default(12)
    }

    /// Returns a set of header bit flags.
    pub fn flags(&self) -> u16 {
        self.0.read_or_default(16)
    }

    /// Returns the design units per em. Valid values are 16..=16384.
    pub fn units_per_em(&self) -> u16 {
        self.0.read_or_default(18)
    }

    /// Returns the union of all glyph bounding boxes.
    pub fn bounds(&self) -> [(i16, i16); 2] {
        [
            (self.0.read_or_default(36), self.0.read_or_default(38)),
            (self.0.read_or_default(40), self.0.read_or_default(42)),
        ]
    }

    /// Returns the format of the offset array in the 'loca' table.
    pub fn index_to_location_format(&self) -> u16 {
        self.0.read_or_default(50)
    }
}

/// Maximum profile table.
#[derive(Copy, Clone)]
pub struct Maxp<'a>(Bytes<'a>);

impl<'a> Maxp<'a> {
    /// Creates a maximum profile table wrapping the specified data.
    pub fn new(data: &'a [u8]) -> Self {
        Self(Bytes::new(data))
    }

    /// Creates a maximum profile table from the specified font. Returns
    /// `None` if the font does not contain a `maxp` table.
    pub fn from_font(font: impl RawFont<'a>) -> Option<Self> {
        Some(Self::new(font.table_data(MAXP)?))
    }

    /// Returns the number of glyphs in the font.
    pub fn glyph_count(&self) -> u16 {
        self.0.read_or_default(4)
    }
}

/// Horizontal header table.
#[derive(Copy, Clone)]
pub struct Hhea<'a>(Bytes<'a>);

impl<'a> Hhea<'a> {
    /// Creates a horizontal header table wrapping the specified data.
    pub fn new(data: &'a [u8]) -> Self {
        Self(Bytes::new(data))
    }

    /// Creates a horizontal header table from the specified font. Returns
    /// `None` if the font does not contain an `hhea` table.
    pub fn from_font(font: impl RawFont<'a>) -> Option<Self> {
        Some(Self::new(font.table_data(HHEA)?))
    }

    /// Returns the typographic ascender.
    pub fn ascender(&self) -> i16 {
        self.0.read_or_default(4)
    }

    /// Returns the typographic descender.
    pub fn descender(&self) -> i16 {
        self.0.read_or_default(6)
    }

    /// Returns the typographic line gap.
    pub fn line_gap(&self) -> i16 {
        self.0.read_or_default(8)
    }

    /// Returns the maximum advance width.
    pub fn max_advance(&self) -> u16 {
        self.0.read_or_default(10)
    }

    /// Returns the number of long metric entries in the `hmtx` table.
    pub fn num_long_metrics(&self) -> u16 {
        self.0.read_or_default(34)
    }
}

/// Vertical header table.
#[derive(Copy, Clone)]
pub struct Vhea<'a>(Bytes<'a>);

impl<'a> Vhea<'a> {
    /// Creates a vertical header table wrapping the specified data.
    pub fn new(data: &'a [u8]) -> Self {
        Self(Bytes::new(data))
    }

    /// Creates a vertical header table from the specified font. Returns
    /// `None` if the font does not contain a `vhea` table.
    pub fn from_font(font: impl RawFont<'a>) -> Option<Self> {
        Some(Self::new(font.table_data(VHEA)?))
    }

    /// Returns the typographic ascender.
    pub fn ascender(&self) -> i16 {
        self.0.read_or_default(4)
    }

    /// Returns the typographic descender.
    pub fn descender(&self) -> i16 {
        self.0.read_or_default(6)
    }

    /// Returns the typographic line gap.
    pub fn line_gap(&self) -> i16 {
        self.0.read_or_default(8)
    }

    /// Returns the number of long metric entries in the `vmtx` table.
    pub fn num_long_metrics(&self) -> u16 {
        self.0.read_or_default(34)
    }
}

/// OS/2 and Windows metrics table.
#[derive(Copy, Clone)]
pub struct Os2<'a>(Bytes<'a>);

impl<'a> Os2<'a> {
    /// Creates an OS/2 table wrapping the specified data.
    pub fn new(data: &'a [u8]) -> Self {
        Self(Bytes::new(data))
    }

    /// Creates an OS/2 table from the specified font. Returns `None` if the
    /// font does not contain an `OS/2` table.
    pub fn from_font(font: impl RawFont<'a>) -> Option<Self> {
        Some(Self::new(font.table_data(OS_2)?))
    }

    /// Returns the version number for the OS/2 table: 0x0000 to 0x0005.
    pub fn version(&self) -> u16 {
        self.0.read_or_default(0)
    }

    /// Returns the average advance width of all non-zero width glyphs.
    pub fn average_char_width(&self) -> i16 {
        self.0.read_or_default(2)
    }

    /// Returns the font selection bit flags.
    pub fn selection_flags(&self) -> u16 {
        self.0.read_or_default(62)
    }

    /// Returns true if line metrics should be taken from the typographic
    /// fields rather than `hhea`.
    pub fn use_typographic_metrics(&self) -> bool {
        self.selection_flags() & (1 << 7) != 0
    }

    /// Returns the typographic ascender.
    pub fn typographic_ascender(&self) -> i16 {
        self.0.read_or_default(68)
    }

    /// Returns the typographic descender.
    pub fn typographic_descender(&self) -> i16 {
        self.0.read_or_default(70)
    }

    /// Returns the typographic line gap.
    pub fn typographic_line_gap(&self) -> i16 {
        self.0.read_or_default(72)
    }

    /// Returns the x-height. Only available in version 2 and above.
    pub fn x_height(&self) -> i16 {
        if self.version() < 2 {
            0
        } else {
            self.0.read_or_default(86)
        }
    }

    /// Returns the cap height. Only available in version 2 and above.
    pub fn cap_height(&self) -> i16 {
        if self.version() < 2 {
            0
        } else {
            self.0.read_or_default(88)
        }
    }

    /// Returns the suggested position of the top of the strikeout stroke.
    pub fn strikeout_position(&self) -> i16 {
        self.0.read_or_default(28)
    }

    /// Returns the suggested thickness of the strikeout stroke.
    pub fn strikeout_size(&self) -> i16 {
        self.0.read_or_default(26)
    }
}

/// PostScript table.
#[derive(Copy, Clone)]
pub struct Post<'a>(Bytes<'a>);

impl<'a> Post<'a> {
    /// Creates a PostScript table wrapping the specified data.
    pub fn new(data: &'a [u8]) -> Self {
        Self(Bytes::new(data))
    }

    /// Creates a PostScript table from the specified font. Returns `None`
    /// if the font does not contain a `post` table.
    pub fn from_font(font: impl RawFont<'a>) -> Option<Self> {
        Some(Self::new(font.table_data(POST)?))
    }

    /// Returns the suggested distance from the baseline to the top of the
    /// underline.
    pub fn underline_position(&self) -> i16 {
        self.0.read_or_default(8)
    }

    /// Returns the suggested thickness of the underline.
    pub fn underline_size(&self) -> i16 {
        self.0.read_or_default(10)
    }

    /// Returns true if the font is monospace.
    pub fn is_fixed_pitch(&self) -> bool {
        self.0.read_or_default::<u32>(12) != 0
    }
}
