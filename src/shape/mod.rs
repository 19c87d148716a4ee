/*!
Mapping text to a sequence of positioned glyphs.

Shaping converts a sequence of Unicode codepoints plus a font into
positioned glyphs with respect to the rules of a writing system and the
typographic features of the font. The shaper operates on one run at a
time: a stretch of text with a single script, language, direction and set
of feature/variation settings.

```no_run
use gavea::{shape, Face, FontRef, ShapeOptions, UnicodeBuffer};

let data = std::fs::read("font.ttf").unwrap();
let font = FontRef::load(&data).unwrap();
let mut face = Face::new(font);
let mut buffer = UnicodeBuffer::new();
buffer.add_str("ffi", 0);
let output = shape(&mut face, buffer, &ShapeOptions::default());
for (info, pos) in output.iter() {
    println!("{} @ {},{}+{}", info.glyph_id, pos.x_offset, pos.y_offset, pos.x_advance);
}
```

Glyphs come out in visual order: right-to-left runs are reversed as the
final step of the pipeline, with cursive attachments reindexed to match.
*/

mod aat;
mod at;
mod buffer;
mod complex;
mod engine;
mod feature;
mod plan;

pub use buffer::Digest;
pub use plan::{PlanKey, ShapePlan};

use crate::face::Face;
use crate::setting::Setting;
use crate::text::{Language, Script};
use crate::{GlyphId, Tag};
use buffer::*;
use engine::{Engine, PosMode, SubMode};
use smallvec::SmallVec;
use tracing::debug;

pub(crate) use buffer::Buffer;
pub(crate) use engine::EngineMetadata;
pub(crate) use plan::{PlanBuilder, PlanCache};

/// Text direction.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
}

impl Direction {
    /// Returns true for the horizontal directions.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftToRight | Self::RightToLeft)
    }

    /// Returns true if glyphs are laid out against logical order.
    pub fn is_backward(self) -> bool {
        matches!(self, Self::RightToLeft | Self::BottomToTop)
    }
}

/// Granularity of cluster merging.
///
/// Ligature merges treat the two monotone levels identically; the level
/// is carried so callers can interpret cluster values accordingly.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum ClusterLevel {
    #[default]
    MonotoneGraphemes,
    MonotoneCharacters,
    Characters,
}

/// Input buffer: codepoints with cluster values plus run properties.
#[derive(Clone, Default)]
pub struct UnicodeBuffer {
    chars: Vec<(u32, u32)>,
    direction: Option<Direction>,
    script: Option<Script>,
    language: Option<Language>,
    cluster_level: ClusterLevel,
    pre_context: Vec<u32>,
    post_context: Vec<u32>,
}

impl UnicodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a string, assigning clusters from `cluster_start` by
    /// character index.
    pub fn add_str(&mut self, text: &str, cluster_start: u32) {
        for (i, ch) in text.chars().enumerate() {
            self.chars.push((ch as u32, cluster_start + i as u32));
        }
    }

    /// Appends a single character with an explicit cluster value.
    pub fn add(&mut self, ch: char, cluster: u32) {
        self.chars.push((ch as u32, cluster));
    }

    /// Sets the direction of the run. Unset directions resolve from the
    /// script.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = Some(direction);
    }

    /// Sets the script of the run. Unset scripts resolve from the first
    /// strong character.
    pub fn set_script(&mut self, script: Script) {
        self.script = Some(script);
    }

    /// Sets the language of the run.
    pub fn set_language(&mut self, language: Language) {
        self.language = Some(language);
    }

    /// Sets the cluster merging granularity.
    pub fn set_cluster_level(&mut self, level: ClusterLevel) {
        self.cluster_level = level;
    }

    /// Returns the cluster merging granularity.
    pub fn cluster_level(&self) -> ClusterLevel {
        self.cluster_level
    }

    /// Sets the text logically preceding this run, for lookups that match
    /// across the run boundary.
    pub fn set_pre_context(&mut self, text: &str) {
        self.pre_context.clear();
        self.pre_context.extend(text.chars().map(|ch| ch as u32));
    }

    /// Sets the text logically following this run.
    pub fn set_post_context(&mut self, text: &str) {
        self.post_context.clear();
        self.post_context.extend(text.chars().map(|ch| ch as u32));
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Clears the text and context, retaining the run properties.
    pub fn clear(&mut self) {
        self.chars.clear();
        self.pre_context.clear();
        self.post_context.clear();
    }

    /// Full reset for pool reuse: clears the text and the run properties.
    pub(crate) fn reset(&mut self) {
        self.clear();
        self.direction = None;
        self.script = None;
        self.language = None;
        self.cluster_level = ClusterLevel::default();
    }
}

/// Information about a shaped glyph.
#[derive(Copy, Clone, Default, Debug)]
pub struct GlyphInfo {
    /// Font glyph identifier.
    pub glyph_id: GlyphId,
    /// Originating input cluster.
    pub cluster: u32,
    /// Feature application mask the glyph carried through shaping.
    pub mask: u32,
    /// Originating codepoint; zero for glyphs created by shaping.
    pub codepoint: u32,
    /// GDEF glyph class: 1 base, 2 ligature, 3 mark, 4 component, 0
    /// unassigned.
    pub glyph_class: u8,
    /// Ligature identity for glyphs produced by or attached to a
    /// ligature; zero otherwise.
    pub lig_id: u8,
    /// Ligature component a mark attaches to; 0xFF when not applicable.
    pub lig_component: u8,
}

/// Position of a shaped glyph, in font units. Offsets are additive.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct GlyphPosition {
    pub x_advance: i32,
    pub y_advance: i32,
    pub x_offset: i32,
    pub y_offset: i32,
    /// Signed index offset to the attachment parent, or zero.
    pub attach_chain: i16,
    /// Attachment kind: 0 none, 1 mark, 2 cursive.
    pub attach_type: u8,
}

/// Options for a shape call. Set fields override the buffer's run
/// properties.
#[derive(Clone, Default)]
pub struct ShapeOptions<'a> {
    pub direction: Option<Direction>,
    pub script: Option<Script>,
    pub language: Option<Language>,
    pub features: &'a [Setting<u16>],
}

/// Result of shaping: parallel glyph info and position arrays in visual
/// order.
#[derive(Clone, Default)]
pub struct OutputBuffer {
    infos: Vec<GlyphInfo>,
    positions: Vec<GlyphPosition>,
    direction: Direction,
    digest: Digest,
}

impl OutputBuffer {
    /// Returns the glyph information array.
    pub fn glyph_infos(&self) -> &[GlyphInfo] {
        &self.infos
    }

    /// Returns the glyph position array.
    pub fn glyph_positions(&self) -> &[GlyphPosition] {
        &self.positions
    }

    /// Returns an iterator over the glyphs with their positions.
    pub fn iter(&self) -> impl Iterator<Item = (&GlyphInfo, &GlyphPosition)> + '_ {
        self.infos.iter().zip(&self.positions)
    }

    /// Returns the glyph identifiers.
    pub fn glyph_ids(&self) -> impl Iterator<Item = GlyphId> + '_ {
        self.infos.iter().map(|info| info.glyph_id)
    }

    /// Returns the cluster values.
    pub fn clusters(&self) -> impl Iterator<Item = u32> + '_ {
        self.infos.iter().map(|info| info.cluster)
    }

    /// Returns the number of glyphs.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Returns the conservative digest of the output glyph set.
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Returns the summed advance along the main axis of the run.
    pub fn total_advance(&self) -> i32 {
        if self.direction.is_horizontal() {
            self.positions.iter().map(|p| p.x_advance).sum()
        } else {
            self.positions.iter().map(|p| p.y_advance).sum()
        }
    }

    /// Serializes the buffer into a diagnostic string in the form
    /// `[gid=cluster+advance@dx,dy, ...]`.
    pub fn serialize(&self) -> String {
        use core::fmt::Write;
        let mut s = String::from("[");
        for (i, (info, pos)) in self.iter().enumerate() {
            if i > 0 {
                s.push_str(", ");
            }
            let advance = if self.direction.is_horizontal() {
                pos.x_advance
            } else {
                pos.y_advance
            };
            let _ = write!(s, "{}={}+{}", info.glyph_id, info.cluster, advance);
            if pos.x_offset != 0 || pos.y_offset != 0 {
                let _ = write!(s, "@{},{}", pos.x_offset, pos.y_offset);
            }
        }
        s.push(']');
        s
    }
}

/// Shapes the buffer against the face, returning positioned glyphs.
///
/// Never fails: unknown scripts fall back to Latin layout, unmapped
/// codepoints map to the missing glyph, and malformed lookups are
/// skipped.
pub fn shape(face: &mut Face, input: UnicodeBuffer, options: &ShapeOptions) -> OutputBuffer {
    let mut features: SmallVec<[(Tag, u16); 8]> = SmallVec::new();
    for setting in options.features {
        match features.iter_mut().find(|f| f.0 == setting.tag) {
            Some(slot) => slot.1 = setting.value,
            None => features.push((setting.tag, setting.value)),
        }
    }
    features.sort_unstable_by_key(|f| f.0);
    // Script, direction and language resolution.
    let script = options
        .script
        .or(input.script)
        .or_else(|| Script::resolve(input.chars.iter().map(|c| c.0)))
        .unwrap_or_else(|| {
            debug!("no strong script in run; shaping as Latin");
            Script::Latin
        });
    let direction = options.direction.or(input.direction).unwrap_or({
        if script.is_rtl() {
            Direction::RightToLeft
        } else {
            Direction::LeftToRight
        }
    });
    let language = options.language.or(input.language);
    let output = shape_run(face, &input, script, direction, language, &features);
    face.recycle(input);
    output
}

fn shape_run(
    face: &mut Face,
    input: &UnicodeBuffer,
    script: Script,
    direction: Direction,
    language: Option<Language>,
    features: &[(Tag, u16)],
) -> OutputBuffer {
    let font = face.font;
    let mut engine = Engine::new(
        &face.metadata,
        font.data,
        &face.coords,
        script,
        language,
    );
    let use_plan = engine.sub_mode == SubMode::Gsub || engine.pos_mode == PosMode::Gpos;
    let plan = if use_plan {
        let key = PlanKey {
            script,
            language: language.and_then(|l| l.to_opentype()),
            direction,
            coords: face.coords.as_slice().into(),
            features: features.into(),
        };
        let builder = &mut face.builder;
        let data = engine.data;
        let gdef = &engine.gdef;
        let gsub = &engine.gsub;
        let gpos = &engine.gpos;
        let tags = engine.tags;
        let coords = engine.coords;
        Some(face.plans.get(key, || {
            builder.build(data.data(), gdef, gsub, gpos, script, tags, coords, features)
        }))
    } else {
        None
    };
    let global_mask = plan.as_ref().map(|p| p.global_mask).unwrap_or(!0);

    // Map codepoints to nominal glyphs; unmapped codepoints become the
    // missing glyph with their cluster preserved.
    let charmap = face.charmap.materialize(&font);
    let buf = &mut face.scratch;
    buf.clear();
    buf.is_rtl = direction == Direction::RightToLeft;
    buf.vertical = !direction.is_horizontal();
    for &(codepoint, cluster) in &input.chars {
        buf.push(codepoint, cluster, charmap.map(codepoint), global_mask);
    }
    for &ch in &input.pre_context {
        let id = charmap.map(ch);
        buf.pre_context.push(id);
    }
    for &ch in &input.post_context {
        let id = charmap.map(ch);
        buf.post_context.push(id);
    }
    engine.set_classes(buf);

    // Script specific preprocessing: joining analysis for the Arabic
    // family, syllable reordering for the Indic family.
    if let Some(plan) = &plan {
        if script.is_joined() {
            buf.set_join_masks(&plan.joining_masks);
        }
    }
    if script.is_complex() {
        complex::reorder_syllables(buf, script);
    }

    // Substitution.
    match engine.sub_mode {
        SubMode::Gsub => {
            if let Some(plan) = &plan {
                engine.gsub(plan, buf);
            }
        }
        SubMode::Morx => {
            let mut selectors = core::mem::take(&mut face.selectors);
            engine.collect_selectors(features, &mut selectors);
            engine.morx(buf, &selectors);
            face.selectors = selectors;
        }
        SubMode::None => {}
    }

    // Positioning: advances from the metrics tables with variation
    // deltas, then GPOS or the legacy kerning fallback.
    buf.setup_positions(engine.sub_mode == SubMode::Morx);
    let glyph_metrics = face.metrics.materialize_glyph_metrics(&font, &face.coords);
    if direction.is_horizontal() {
        for (g, p) in buf.glyphs.iter().zip(buf.positions.iter_mut()) {
            p.x_advance = glyph_metrics.advance_width(g.id);
        }
    } else {
        for (g, p) in buf.glyphs.iter().zip(buf.positions.iter_mut()) {
            p.y_advance = glyph_metrics.advance_height(g.id);
        }
    }
    match engine.pos_mode {
        PosMode::Gpos => {
            if let Some(plan) = &plan {
                engine.gpos(plan, buf);
            }
        }
        PosMode::Kern => {
            let disable_kern = features
                .iter()
                .any(|&(tag, value)| tag == feature::KERN && value == 0);
            if !disable_kern {
                engine.kern(buf);
            }
            aat::synthesize_marks(buf);
        }
        PosMode::None => {
            aat::synthesize_marks(buf);
        }
    }

    // Visual ordering: backward runs reverse the arrays and reindex
    // attachments; offsets then resolve in visual order.
    if direction.is_backward() {
        buf.glyphs.reverse();
        buf.positions.reverse();
        for p in buf.positions.iter_mut() {
            p.attach_chain = -p.attach_chain;
        }
    }
    if buf.has_marks || buf.has_cursive {
        resolve_attachments(&mut buf.positions);
    }

    let mut output = OutputBuffer {
        infos: Vec::with_capacity(buf.len()),
        positions: Vec::with_capacity(buf.len()),
        direction,
        digest: Digest::default(),
    };
    for (g, p) in buf.glyphs.iter().zip(&buf.positions) {
        if g.flags & IGNORABLE != 0 && g.flags & SUBSTITUTED == 0 {
            continue;
        }
        output.infos.push(GlyphInfo {
            glyph_id: g.id,
            cluster: g.cluster,
            mask: g.mask,
            codepoint: g.codepoint,
            glyph_class: if g.class <= 4 { g.class } else { 0 },
            lig_id: g.lig_id,
            lig_component: g.component,
        });
        output.positions.push(GlyphPosition {
            x_advance: p.x_advance,
            y_advance: p.y_advance,
            x_offset: p.x_offset,
            y_offset: p.y_offset,
            attach_chain: p.attach_chain,
            attach_type: p.attach_type,
        });
        output.digest.insert(g.id);
    }
    output
}

/// Resolves mark and cursive attachment offsets in visual order, parents
/// first. Cursive chains propagate the cross axis offset; marks collect
/// the base offset minus the advances between the base and the mark.
fn resolve_attachments(positions: &mut [PositionData]) {
    let len = positions.len();
    let mut resolved = vec![false; len];
    for i in 0..len {
        resolve_one(positions, &mut resolved, i, 0);
    }
}

fn resolve_one(positions: &mut [PositionData], resolved: &mut [bool], i: usize, depth: u8) {
    if depth > 64 || resolved[i] {
        return;
    }
    resolved[i] = true;
    let p = positions[i];
    if p.attach_type == 0 || p.attach_chain == 0 {
        return;
    }
    let j = i as i64 + p.attach_chain as i64;
    if j < 0 || j >= positions.len() as i64 {
        return;
    }
    let j = j as usize;
    resolve_one(positions, resolved, j, depth + 1);
    if p.attach_type == ATTACH_CURSIVE {
        positions[i].y_offset += positions[j].y_offset;
    } else {
        positions[i].x_offset += positions[j].x_offset;
        positions[i].y_offset += positions[j].y_offset;
        if j < i {
            for k in j..i {
                positions[i].x_offset -= positions[k].x_advance;
            }
        } else {
            for k in i + 1..=j {
                positions[i].x_offset += positions[k].x_advance;
            }
        }
    }
}
