//! Shaping engine assembly: which tables drive substitution and
//! positioning for a font.

use super::{aat, at, buffer::Buffer, plan::ShapePlan};
use crate::font::FontRef;
use crate::internal::{aat as aat_tables, at::*, raw_tag, Bytes, RawFont, RawTag};
use crate::text::{Language, Script};

/// The substitution mode supported by the engine.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SubMode {
    None,
    Gsub,
    Morx,
}

/// The positioning mode supported by the engine.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PosMode {
    None,
    Gpos,
    Kern,
}

/// Table offsets and modes for a font, captured once per font entry.
#[derive(Copy, Clone)]
pub struct EngineMetadata {
    pub gdef: u32,
    pub gsub: u32,
    pub gpos: u32,
    pub morx: u32,
    pub kern: u32,
    pub sub_mode: SubMode,
    pub pos_mode: PosMode,
}

impl EngineMetadata {
    pub fn from_font(font: &FontRef) -> Self {
        let mut this = Self {
            gdef: font.table_offset(raw_tag(b"GDEF")),
            gsub: font.table_offset(raw_tag(b"GSUB")),
            gpos: font.table_offset(raw_tag(b"GPOS")),
            morx: font.table_offset(raw_tag(b"morx")),
            kern: font.table_offset(raw_tag(b"kern")),
            sub_mode: SubMode::None,
            pos_mode: PosMode::None,
        };
        if this.gsub != 0 {
            this.sub_mode = SubMode::Gsub;
        } else if this.morx != 0 {
            this.sub_mode = SubMode::Morx;
        }
        if this.gpos != 0 {
            this.pos_mode = PosMode::Gpos;
        } else if this.kern != 0 {
            this.pos_mode = PosMode::Kern;
        }
        this
    }
}

/// Shaping engine bound to a font, script and language.
pub struct Engine<'a> {
    pub data: Bytes<'a>,
    pub gdef: Gdef<'a>,
    pub gsub: StageOffsets,
    pub gpos: StageOffsets,
    pub morx: u32,
    pub kern: u32,
    pub storage: at::Storage,
    pub coords: &'a [i16],
    pub script: Script,
    pub tags: [RawTag; 4],
    pub sub_mode: SubMode,
    pub pos_mode: PosMode,
}

impl<'a> Engine<'a> {
    /// Creates a new shaping engine from precreated metadata.
    pub fn new(
        metadata: &EngineMetadata,
        font_data: &'a [u8],
        coords: &'a [i16],
        script: Script,
        lang: Option<Language>,
    ) -> Self {
        let data = Bytes::new(font_data);
        let gdef = Gdef::from_offset(font_data, metadata.gdef).unwrap_or_else(Gdef::empty);
        let script_tag = script.to_opentype();
        let lang_tag = lang.and_then(|l| l.to_opentype());
        let (gsub, stags) = if metadata.sub_mode == SubMode::Gsub {
            StageOffsets::new(&data, metadata.gsub, script_tag, lang_tag).unwrap_or_default()
        } else {
            (StageOffsets::default(), [0, 0])
        };
        let (gpos, ptags) = if metadata.pos_mode == PosMode::Gpos {
            StageOffsets::new(&data, metadata.gpos, script_tag, lang_tag).unwrap_or_default()
        } else {
            (StageOffsets::default(), [0, 0])
        };
        let tags = [stags[0], stags[1], ptags[0], ptags[1]];
        let mut sub_mode = metadata.sub_mode;
        let mut pos_mode = metadata.pos_mode;
        if sub_mode == SubMode::Gsub && gsub.lang == 0 {
            sub_mode = if metadata.morx != 0 {
                SubMode::Morx
            } else {
                SubMode::None
            };
        }
        if pos_mode == PosMode::Gpos && gpos.lang == 0 {
            pos_mode = if metadata.kern != 0 {
                PosMode::Kern
            } else {
                PosMode::None
            };
        }
        Self {
            data,
            gdef,
            gsub,
            gpos,
            morx: metadata.morx,
            kern: metadata.kern,
            storage: at::Storage::default(),
            coords,
            script,
            tags,
            sub_mode,
            pos_mode,
        }
    }

    /// Returns true if either stage carries feature variations.
    pub fn has_feature_vars(&self) -> bool {
        self.gsub.var != 0 || self.gpos.var != 0
    }

    /// Sets glyph and mark attachment classes from GDEF, or synthesizes
    /// them from the codepoints when the font has no GDEF classes.
    pub fn set_classes(&self, buffer: &mut Buffer) {
        if !self.gdef.ok() || !self.gdef.has_classes() {
            buffer.synthesize_classes();
            return;
        }
        let gdef = &self.gdef;
        if gdef.has_mark_classes() {
            for g in buffer.glyphs.iter_mut() {
                g.class = gdef.class(g.id) as u8;
                g.mark_type = gdef.mark_class(g.id) as u8;
            }
        } else {
            for g in buffer.glyphs.iter_mut() {
                g.class = gdef.class(g.id) as u8;
            }
        }
    }

    /// Applies the plan's GSUB lookups.
    pub fn gsub(&mut self, plan: &ShapePlan, buffer: &mut Buffer) -> bool {
        at::apply(
            0,
            &self.data,
            self.gsub.base,
            self.coords,
            &self.gdef,
            &mut self.storage,
            plan,
            buffer,
        )
    }

    /// Applies the plan's GPOS lookups.
    pub fn gpos(&mut self, plan: &ShapePlan, buffer: &mut Buffer) -> bool {
        at::apply(
            1,
            &self.data,
            self.gpos.base,
            self.coords,
            &self.gdef,
            &mut self.storage,
            plan,
            buffer,
        )
    }

    /// Converts a feature list into a sorted collection of AAT selectors.
    pub fn collect_selectors(&self, features: &[(RawTag, u16)], selectors: &mut Vec<(u16, u16)>) {
        use aat_tables::morx::feature_from_tag;
        selectors.clear();
        for (tag, value) in features {
            if let Some((selector, [on, off])) = feature_from_tag(*tag) {
                let setting = if *value == 0 { off } else { on };
                selectors.push((selector, setting));
            }
        }
        selectors.sort_unstable();
    }

    /// Applies the extended metamorphosis table.
    pub fn morx(&self, buffer: &mut Buffer, selectors: &[(u16, u16)]) {
        if self.morx != 0 {
            aat::apply_morx(self.data.data(), self.morx, buffer, selectors);
            buffer.ensure_order(false);
        }
    }

    /// Applies the legacy kerning table.
    pub fn kern(&self, buffer: &mut Buffer) {
        if self.kern != 0 {
            aat::apply_kern(self.data.data(), self.kern, buffer);
        }
    }
}
