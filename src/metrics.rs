/*!
Font and glyph metrics.
*/

use super::internal::{aat, var, xmtx, RawFont};
use super::{FontRef, GlyphId, NormalizedCoord};

/// Proxy for rematerializing metrics.
#[derive(Copy, Clone, Default)]
pub struct MetricsProxy {
    units_per_em: u16,
    glyph_count: u16,
    is_monospace: bool,
    ascent: i16,
    descent: i16,
    leading: i16,
    cap_height: i16,
    x_height: i16,
    average_width: u16,
    max_width: u16,
    underline_offset: i16,
    strikeout_offset: i16,
    stroke_size: i16,
    mvar: u32,
    hmtx: u32,
    hvar: u32,
    hmtx_count: u16,
    vmtx: u32,
    vvar: u32,
    vmtx_count: u16,
    trak: u32,
}

impl MetricsProxy {
    /// Creates a metrics proxy for the specified font.
    pub fn from_font(font: &FontRef) -> Self {
        let mut proxy = Self {
            units_per_em: 1,
            ..Self::default()
        };
        proxy.fill(font);
        proxy
    }

    /// Returns the number of font design units per em unit.
    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// Returns the number of glyphs in the font.
    pub fn glyph_count(&self) -> u16 {
        self.glyph_count
    }

    /// Materializes font wide metrics for the specified font and
    /// normalized variation coordinates. This proxy must have been created
    /// from the same font.
    pub fn materialize_metrics(&self, font: &FontRef, coords: &[NormalizedCoord]) -> Metrics {
        let mut m = Metrics {
            units_per_em: self.units_per_em,
            glyph_count: self.glyph_count,
            is_monospace: self.is_monospace,
            ascent: self.ascent as f32,
            descent: self.descent as f32,
            leading: self.leading as f32,
            cap_height: self.cap_height as f32,
            x_height: self.x_height as f32,
            average_width: self.average_width as f32,
            max_width: self.max_width as f32,
            underline_offset: self.underline_offset as f32,
            strikeout_offset: self.strikeout_offset as f32,
            stroke_size: self.stroke_size as f32,
        };
        if self.mvar != 0 && !coords.is_empty() {
            if let Some(v) = var::Mvar::new(font.data, self.mvar, coords) {
                use var::mvar_tags::*;
                m.ascent += v.delta(HASC);
                m.descent += v.delta(HDSC);
                m.leading += v.delta(HLGP);
                m.cap_height += v.delta(CPHT);
                m.x_height += v.delta(XHGT);
                m.underline_offset += v.delta(UNDO);
                m.strikeout_offset += v.delta(STRO);
                m.stroke_size += v.delta(UNDS);
            }
        }
        m
    }

    /// Materializes glyph metrics for the specified font and normalized
    /// variation coordinates. This proxy must have been created from the
    /// same font.
    pub fn materialize_glyph_metrics<'a>(
        &self,
        font: &FontRef<'a>,
        coords: &'a [NormalizedCoord],
    ) -> GlyphMetrics<'a> {
        GlyphMetrics {
            data: font.data,
            coords,
            units_per_em: self.units_per_em,
            glyph_count: self.glyph_count,
            hmtx: self.hmtx,
            hvar: self.hvar,
            hmtx_count: self.hmtx_count,
            vmtx: self.vmtx,
            vvar: self.vvar,
            vmtx_count: self.vmtx_count,
            trak: self.trak,
        }
    }

    fn fill(&mut self, font: &FontRef) -> Option<()> {
        let head = font.head()?;
        self.units_per_em = head.units_per_em();
        self.glyph_count = font.maxp()?.glyph_count();
        let mut have_line_metrics = false;
        if let Some(os2) = font.os2() {
            self.average_width = os2.average_char_width() as u16;
            self.strikeout_offset = os2.strikeout_position();
            self.stroke_size = os2.strikeout_size();
            self.x_height = os2.x_height();
            self.cap_height = os2.cap_height();
            if os2.use_typographic_metrics() {
                self.ascent = os2.typographic_ascender();
                self.descent = -os2.typographic_descender();
                self.leading = os2.typographic_line_gap();
                have_line_metrics = self.ascent != 0;
            }
        }
        let hhea = font.hhea();
        if let Some(hhea) = &hhea {
            self.max_width = hhea.max_advance();
            if !have_line_metrics {
                self.ascent = hhea.ascender();
                self.descent = -hhea.descender();
                self.leading = hhea.line_gap();
            }
        }
        if let Some(post) = font.post() {
            self.underline_offset = post.underline_position();
            self.stroke_size = post.underline_size();
            self.is_monospace = post.is_fixed_pitch();
        }
        self.mvar = font.table_offset(var::MVAR);
        self.hmtx = font.table_offset(xmtx::HMTX);
        self.hvar = font.table_offset(var::HVAR);
        self.hmtx_count = hhea.map(|t| t.num_long_metrics()).unwrap_or(1);
        self.vmtx = font.table_offset(xmtx::VMTX);
        self.vvar = font.table_offset(var::VVAR);
        self.vmtx_count = font.vhea().map(|t| t.num_long_metrics()).unwrap_or(0);
        self.trak = font.table_offset(aat::TRAK);
        Some(())
    }
}

/// Global font metrics in font units.
#[derive(Copy, Clone, Default, Debug)]
pub struct Metrics {
    pub units_per_em: u16,
    pub glyph_count: u16,
    pub is_monospace: bool,
    pub ascent: f32,
    pub descent: f32,
    pub leading: f32,
    pub cap_height: f32,
    pub x_height: f32,
    pub average_width: f32,
    pub max_width: f32,
    pub underline_offset: f32,
    pub strikeout_offset: f32,
    pub stroke_size: f32,
}

/// Per glyph metrics with variation deltas applied.
#[derive(Copy, Clone)]
pub struct GlyphMetrics<'a> {
    data: &'a [u8],
    coords: &'a [NormalizedCoord],
    units_per_em: u16,
    glyph_count: u16,
    hmtx: u32,
    hvar: u32,
    hmtx_count: u16,
    vmtx: u32,
    vvar: u32,
    vmtx_count: u16,
    trak: u32,
}

impl<'a> GlyphMetrics<'a> {
    /// Creates glyph metrics from the specified font and normalized
    /// variation coordinates.
    pub fn from_font(font: &FontRef<'a>, coords: &'a [NormalizedCoord]) -> Self {
        MetricsProxy::from_font(font).materialize_glyph_metrics(font, coords)
    }

    /// Returns the number of font design units per em unit.
    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// Returns the advance width of the specified glyph in font units,
    /// including the `HVAR` delta at the current coordinates.
    pub fn advance_width(&self, glyph_id: GlyphId) -> i32 {
        if glyph_id >= self.glyph_count {
            return 0;
        }
        let advance = xmtx::advance(self.data, self.hmtx, self.hmtx_count, glyph_id) as f32;
        let delta = if self.hvar != 0 && !self.coords.is_empty() {
            var::advance_delta(self.data, self.hvar, glyph_id, self.coords)
        } else {
            0.
        };
        (advance + delta).round() as i32
    }

    /// Returns the left side bearing of the specified glyph in font units,
    /// including the `HVAR` delta at the current coordinates.
    pub fn lsb(&self, glyph_id: GlyphId) -> i32 {
        if glyph_id >= self.glyph_count {
            return 0;
        }
        let sb = xmtx::sb(self.data, self.hmtx, self.hmtx_count, glyph_id) as f32;
        let delta = if self.hvar != 0 && !self.coords.is_empty() {
            var::sb_delta(self.data, self.hvar, glyph_id, self.coords)
        } else {
            0.
        };
        (sb + delta).round() as i32
    }

    /// Returns the advance height of the specified glyph in font units,
    /// including the `VVAR` delta at the current coordinates. Fonts
    /// without vertical metrics synthesize an advance of one em.
    pub fn advance_height(&self, glyph_id: GlyphId) -> i32 {
        if glyph_id >= self.glyph_count {
            return 0;
        }
        if self.vmtx == 0 || self.vmtx_count == 0 {
            return self.units_per_em as i32;
        }
        let advance = xmtx::advance(self.data, self.vmtx, self.vmtx_count, glyph_id) as f32;
        let delta = if self.vvar != 0 && !self.coords.is_empty() {
            var::advance_delta(self.data, self.vvar, glyph_id, self.coords)
        } else {
            0.
        };
        (advance + delta).round() as i32
    }

    /// Returns the horizontal tracking adjustment from the `trak` table
    /// for the specified track and size in points, if present.
    pub fn tracking(&self, track: f32, size: f32) -> Option<f32> {
        aat::trak::Trak::new(self.data, self.trak)?.horizontal_tracking(track, size)
    }
}
