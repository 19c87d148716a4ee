//! OpenType advanced typography tables.

use super::{raw_tag, Bytes, RawTag};

pub const GDEF: RawTag = raw_tag(b"GDEF");
pub const GSUB: RawTag = raw_tag(b"GSUB");
pub const GPOS: RawTag = raw_tag(b"GPOS");

pub const DFLT: RawTag = raw_tag(b"DFLT");

/// Glyph definition table.
#[derive(Copy, Clone)]
pub struct Gdef<'a> {
    data: Bytes<'a>,
    classes: u16,
    mark_classes: u16,
    mark_sets: u16,
    var_store: u32,
}

impl<'a> Gdef<'a> {
    pub fn new(data: &'a [u8]) -> Option<Self> {
        let b = Bytes::new(data);
        let major = b.read::<u16>(0)?;
        let minor = b.read::<u16>(2)?;
        let classes = b.read::<u16>(4)?;
        let mark_classes = b.read::<u16>(10)?;
        let mark_sets = if major > 1 || minor >= 2 {
            b.read_or_default::<u16>(12)
        } else {
            0
        };
        let var_store = if major > 1 || minor >= 3 {
            b.read_or_default::<u32>(14)
        } else {
            0
        };
        Some(Self {
            data: b,
            classes,
            mark_classes,
            mark_sets,
            var_store,
        })
    }

    pub fn from_offset(data: &'a [u8], offset: u32) -> Option<Self> {
        if offset == 0 {
            return None;
        }
        Self::new(data.get(offset as usize..)?)
    }

    pub fn empty() -> Self {
        Self {
            data: Bytes::new(&[]),
            classes: 0,
            mark_classes: 0,
            mark_sets: 0,
            var_store: 0,
        }
    }

    pub fn ok(&self) -> bool {
        !self.data.is_empty()
    }

    /// Returns true if glyph classes are available.
    pub fn has_classes(&self) -> bool {
        self.classes != 0
    }

    /// Returns the class for the specified glyph id.
    pub fn class(&self, glyph_id: u16) -> u16 {
        classdef(&self.data, self.classes as u32, glyph_id)
    }

    /// Returns true if mark attachment classes are available.
    pub fn has_mark_classes(&self) -> bool {
        self.mark_classes != 0
    }

    /// Returns the mark attachment class for the specified glyph id.
    pub fn mark_class(&self, glyph_id: u16) -> u16 {
        classdef(&self.data, self.mark_classes as u32, glyph_id)
    }

    /// Returns the coverage index of the glyph in the mark filtering set at
    /// the specified offset.
    pub fn mark_set_coverage(&self, set_offset: u32, glyph_id: u16) -> Option<u16> {
        if set_offset == 0 {
            return None;
        }
        coverage(&self.data, set_offset, glyph_id)
    }

    /// Resolves the offset of the mark filtering set at the specified index.
    pub fn mark_set_offset(&self, set_index: u16) -> Option<u32> {
        if self.mark_sets == 0 {
            return None;
        }
        let b = &self.data;
        let sets_base = self.mark_sets as usize;
        let len = b.read::<u16>(sets_base + 2)? as usize;
        if set_index as usize >= len {
            return None;
        }
        let offset = b.read::<u32>(sets_base + 4 + set_index as usize * 4)?;
        if offset == 0 {
            return None;
        }
        let set_offset = self.mark_sets as u32 + offset;
        validate_coverage(b, set_offset).then_some(set_offset)
    }

    pub fn has_var_store(&self) -> bool {
        self.var_store != 0
    }

    /// Returns an item variation delta from the GDEF variation store.
    pub fn delta(&self, outer: u16, inner: u16, coords: &[i16]) -> f32 {
        if self.var_store == 0 {
            return 0.;
        }
        super::var::item_delta(self.data.data(), self.var_store, outer, inner, coords)
            .map(|d| d.to_f32())
            .unwrap_or(0.)
    }
}

/// Returns the coverage index for the specified glyph id, or `None` if the
/// glyph is not covered.
pub fn coverage(b: &Bytes, coverage_offset: u32, glyph_id: u16) -> Option<u16> {
    if coverage_offset == 0 {
        return None;
    }
    let base = coverage_offset as usize;
    let fmt = b.read::<u16>(base)?;
    let len = b.read::<u16>(base + 2)? as usize;
    let arr = base + 4;
    if fmt == 1 {
        b.ensure_range(arr, len * 2)?;
        let mut lo = 0;
        let mut hi = len;
        while lo < hi {
            use core::cmp::Ordering::*;
            let i = (lo + hi) / 2;
            let g = b.read::<u16>(arr + i * 2)?;
            match glyph_id.cmp(&g) {
                Less => hi = i,
                Greater => lo = i + 1,
                Equal => return Some(i as u16),
            }
        }
    } else if fmt == 2 {
        b.ensure_range(arr, len * 6)?;
        let mut lo = 0;
        let mut hi = len;
        while lo < hi {
            let i = (lo + hi) / 2;
            let rec = arr + i * 6;
            let start = b.read::<u16>(rec)?;
            if glyph_id < start {
                hi = i;
            } else if glyph_id > b.read::<u16>(rec + 2)? {
                lo = i + 1;
            } else {
                let index = b.read::<u16>(rec + 4)?;
                return Some(index + (glyph_id - start));
            }
        }
    }
    None
}

/// Returns true if the coverage table at the specified offset is well
/// formed and non-empty.
pub fn validate_coverage(b: &Bytes, coverage_offset: u32) -> bool {
    if coverage_offset == 0 {
        return false;
    }
    let base = coverage_offset as usize;
    let arr = base + 4;
    match (b.read::<u16>(base), b.read::<u16>(base + 2)) {
        // Empty coverage can never match; treat the subtable as invalid.
        (Some(_), Some(0)) => false,
        (Some(1), Some(len)) => b.check_range(arr, len as usize * 2),
        (Some(2), Some(len)) => b.check_range(arr, len as usize * 6),
        _ => false,
    }
}

/// Invokes the specified closure for every glyph in the coverage table at
/// the specified offset.
pub fn enumerate_coverage(b: &Bytes, coverage_offset: u32, mut f: impl FnMut(u16)) -> Option<()> {
    let base = coverage_offset as usize;
    let fmt = b.read::<u16>(base)?;
    let len = b.read::<u16>(base + 2)? as usize;
    let arr = base + 4;
    if fmt == 1 {
        for g in b.read_array::<u16>(arr, len)?.iter() {
            f(g);
        }
    } else if fmt == 2 {
        for i in 0..len {
            let rec = arr + i * 6;
            let first = b.read::<u16>(rec)?;
            let last = b.read::<u16>(rec + 2)?;
            if last < first {
                return None;
            }
            for g in first..=last {
                f(g);
            }
        }
    } else {
        return None;
    }
    Some(())
}

/// Returns the class for the specified glyph id; glyphs not assigned to any
/// class belong to class 0.
pub fn classdef(b: &Bytes, classdef_offset: u32, glyph_id: u16) -> u16 {
    if classdef_offset == 0 {
        return 0;
    }
    let base = classdef_offset as usize;
    let fmt = b.read_or_default::<u16>(base);
    if fmt == 1 {
        let start = b.read_or_default::<u16>(base + 2);
        let len = b.read_or_default::<u16>(base + 4);
        if let Some(index) = glyph_id.checked_sub(start) {
            if index < len {
                return b.read_or_default::<u16>(base + 6 + index as usize * 2);
            }
        }
    } else if fmt == 2 {
        let len = b.read_or_default::<u16>(base + 2) as usize;
        let arr = base + 4;
        if !b.check_range(arr, len * 6) {
            return 0;
        }
        let mut lo = 0;
        let mut hi = len;
        while lo < hi {
            let i = (lo + hi) / 2;
            let rec = arr + i * 6;
            let start = b.read_or_default::<u16>(rec);
            if glyph_id < start {
                hi = i;
            } else if glyph_id > b.read_or_default::<u16>(rec + 2) {
                lo = i + 1;
            } else {
                return b.read_or_default::<u16>(rec + 4);
            }
        }
    }
    0
}

/// Resolved script and language system offsets for one layout stage
/// together with the feature variations offset.
#[derive(Copy, Clone, Default)]
pub struct StageOffsets {
    pub base: u32,
    pub lang: u32,
    pub var: u32,
}

impl StageOffsets {
    /// Resolves the language system for the specified script and language
    /// tags, returning the offsets and the actually selected tags.
    pub fn new(b: &Bytes, base: u32, script: RawTag, lang: Option<RawTag>) -> Option<(Self, [RawTag; 2])> {
        let (lang_offset, tags) = language_or_default_by_tags(b, base, script, lang)?;
        let var = feature_var_offset(b, base);
        Some((
            Self {
                base,
                lang: lang_offset,
                var,
            },
            tags,
        ))
    }
}

/// Returns the offset of the script table with the specified tag.
pub fn script_by_tag(b: &Bytes, gsubgpos_offset: u32, script: RawTag) -> Option<u32> {
    if gsubgpos_offset == 0 {
        return None;
    }
    let base = gsubgpos_offset as usize;
    let sbase = base + b.read::<u16>(base + 4)? as usize;
    let mut lo = 0;
    let mut hi = b.read::<u16>(sbase)? as usize;
    while lo < hi {
        use core::cmp::Ordering::*;
        let i = (lo + hi) / 2;
        let rec = sbase + 2 + i * 6;
        let t = b.read::<u32>(rec)?;
        match script.cmp(&t) {
            Less => hi = i,
            Greater => lo = i + 1,
            Equal => return Some(sbase as u32 + b.read::<u16>(rec + 4)? as u32),
        }
    }
    None
}

/// Returns the language system offset for the specified script offset and
/// language tag, falling back to the default language system. The second
/// value reports whether the default was selected.
pub fn script_language_by_tag(
    b: &Bytes,
    script_offset: u32,
    language: Option<RawTag>,
) -> Option<(u32, bool)> {
    if script_offset == 0 {
        return None;
    }
    let base = script_offset as usize;
    if let Some(lang) = language {
        let mut lo = 0;
        let mut hi = b.read::<u16>(base + 2)? as usize;
        while lo < hi {
            use core::cmp::Ordering::*;
            let i = (lo + hi) / 2;
            let rec = base + 4 + i * 6;
            let t = b.read::<u32>(rec)?;
            match lang.cmp(&t) {
                Less => hi = i,
                Greater => lo = i + 1,
                Equal => {
                    let lang_offset = b.read::<u16>(rec + 4)? as u32;
                    if lang_offset == 0 {
                        return None;
                    }
                    return Some((script_offset + lang_offset, false));
                }
            }
        }
    }
    let default = b.read::<u16>(base)? as u32;
    if default == 0 {
        return None;
    }
    Some((script_offset + default, true))
}

/// Resolves a language system, falling back from the requested script to
/// `DFLT` and then `latn`, and from the requested language to the default
/// language system. Returns the selected language system offset and the
/// script/language tags actually chosen.
pub fn language_or_default_by_tags(
    b: &Bytes,
    gsubgpos_offset: u32,
    script: RawTag,
    lang: Option<RawTag>,
) -> Option<(u32, [RawTag; 2])> {
    const LATN: RawTag = raw_tag(b"latn");
    let mut selected = None;
    for tag in [script, DFLT, LATN] {
        if let Some(offset) = script_by_tag(b, gsubgpos_offset, tag) {
            selected = Some((tag, offset));
            break;
        }
    }
    let (script_tag, script_offset) = selected?;
    let (lang_offset, is_default) = script_language_by_tag(b, script_offset, lang)?;
    let lang_tag = if is_default { DFLT } else { lang.unwrap_or(DFLT) };
    Some((lang_offset, [script_tag, lang_tag]))
}

/// Returns the required feature index for a language system, or `None` when
/// the sentinel 0xFFFF is present.
pub fn required_feature(b: &Bytes, language_offset: u32) -> Option<u16> {
    if language_offset == 0 {
        return None;
    }
    let index = b.read::<u16>(language_offset as usize + 2)?;
    (index != 0xFFFF).then_some(index)
}

/// Returns the number of features referenced by a language system.
pub fn language_feature_count(b: &Bytes, language_offset: u32) -> u16 {
    if language_offset == 0 {
        return 0;
    }
    b.read_or_default(language_offset as usize + 4)
}

/// Returns the feature index at the specified position in a language
/// system.
pub fn language_feature_at(b: &Bytes, language_offset: u32, index: u16) -> Option<u16> {
    b.read(language_offset as usize + 6 + index as usize * 2)
}

/// Returns the tag and offset of the feature at the specified index in the
/// feature list.
pub fn feature_at(b: &Bytes, gsubgpos_offset: u32, index: u16) -> Option<(RawTag, u32)> {
    if gsubgpos_offset == 0 {
        return None;
    }
    let base = gsubgpos_offset as usize;
    let fbase = b.read::<u16>(base + 6)? as usize;
    if fbase == 0 {
        return None;
    }
    let fbase = base + fbase;
    let count = b.read::<u16>(fbase)?;
    if index >= count {
        return None;
    }
    let rec = fbase + 2 + index as usize * 6;
    let tag = b.read::<u32>(rec)?;
    let offset = b.read::<u16>(rec + 4)?;
    if offset == 0 {
        return None;
    }
    Some((tag, fbase as u32 + offset as u32))
}

/// Returns the number of lookups referenced by the feature table at the
/// specified offset.
pub fn feature_lookup_count(b: &Bytes, feature_offset: u32) -> u16 {
    b.read_or_default(feature_offset as usize + 2)
}

/// Returns the lookup index at the specified position in a feature table.
pub fn feature_lookup_at(b: &Bytes, feature_offset: u32, index: u16) -> Option<u16> {
    b.read(feature_offset as usize + 4 + index as usize * 2)
}

/// Returns the offset of the feature variations table for a stage, or zero.
pub fn feature_var_offset(b: &Bytes, gsubgpos_offset: u32) -> u32 {
    if gsubgpos_offset == 0 {
        return 0;
    }
    let base = gsubgpos_offset as usize;
    let major = b.read_or_default::<u16>(base);
    let minor = b.read_or_default::<u16>(base + 2);
    if major > 1 || (major == 1 && minor >= 1) {
        let offset = b.read_or_default::<u32>(base + 10);
        if offset != 0 {
            return gsubgpos_offset + offset;
        }
    }
    0
}

/// Feature substitutions for variable fonts: the feature table substitution
/// record whose condition set matched the current coordinates.
#[derive(Copy, Clone)]
pub struct FeatureSubsts(u32);

impl FeatureSubsts {
    /// Evaluates the condition sets of the feature variations table against
    /// the specified normalized coordinates. Every condition in a set must
    /// hold; the first matching record wins.
    pub fn new(b: &Bytes, offset: u32, coords: &[i16]) -> Option<Self> {
        if offset == 0 || coords.is_empty() {
            return None;
        }
        let base = offset as usize;
        let count = b.read::<u32>(base + 4)? as usize;
        for i in 0..count {
            let rec = base + 8 + i * 8;
            let condset = base + b.read::<u32>(rec)? as usize;
            let cond_count = b.read::<u16>(condset)? as usize;
            let mut matched = 0;
            for j in 0..cond_count {
                let cond = condset + b.read::<u32>(condset + 2 + j * 4)? as usize;
                if b.read::<u16>(cond)? != 1 {
                    break;
                }
                let axis = b.read::<u16>(cond + 2)? as usize;
                if axis >= coords.len() {
                    break;
                }
                let coord = coords[axis];
                let min = b.read::<i16>(cond + 4)?;
                let max = b.read::<i16>(cond + 6)?;
                if coord < min || coord > max {
                    break;
                }
                matched += 1;
            }
            if matched == cond_count {
                return Some(Self(offset + b.read::<u32>(rec + 4)?));
            }
        }
        None
    }

    /// Returns the substituted feature table offset for the specified
    /// feature index, if the matched record replaces it.
    pub fn apply(self, b: &Bytes, index: u16) -> Option<u32> {
        let base = self.0 as usize;
        let count = b.read::<u16>(base + 4)? as usize;
        let arr = base + 6;
        let mut lo = 0;
        let mut hi = count;
        while lo < hi {
            use core::cmp::Ordering::*;
            let i = (lo + hi) / 2;
            let rec = arr + i * 6;
            let idx = b.read::<u16>(rec)?;
            match index.cmp(&idx) {
                Less => hi = i,
                Greater => lo = i + 1,
                Equal => return Some(self.0 + b.read::<u32>(rec + 2)?),
            }
        }
        None
    }
}

/// Feature lookup kind.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum LookupKind {
    SingleSub,
    MultiSub,
    AltSub,
    LigSub,
    SingleAdj,
    PairAdj,
    Cursive,
    MarkToBase,
    MarkToLig,
    MarkToMark,
    Context,
    ChainContext,
    RevChainContext,
}

/// Lookup flag bits.
pub const RIGHT_TO_LEFT: u16 = 0x0001;
pub const USE_MARK_FILTERING_SET: u16 = 0x0010;

/// Data associated with a feature lookup.
#[derive(Copy, Clone, Debug)]
pub struct LookupData {
    pub index: u16,
    pub stage: u8,
    pub kind: LookupKind,
    pub is_ext: bool,
    /// True if the RightToLeft flag is set; only meaningful for cursive
    /// attachment.
    pub rtl: bool,
    pub offset: u32,
    pub count: u16,
    /// Skip flags: one bit per glyph class, bit 5 reserved for consumed
    /// ligature components.
    pub ignored: u8,
    pub mark_check: u8,
    pub mark_class: u8,
    pub mark_set: u32,
}

impl Default for LookupData {
    fn default() -> Self {
        Self {
            index: 0,
            stage: 0,
            kind: LookupKind::SingleSub,
            is_ext: false,
            rtl: false,
            offset: 0,
            count: 0,
            ignored: 0,
            mark_check: 0,
            mark_class: 0,
            mark_set: 0,
        }
    }
}

/// Returns the offset of the lookup list for a stage.
pub fn lookup_list_offset(b: &Bytes, gsubgpos_offset: u32) -> Option<u32> {
    if gsubgpos_offset == 0 {
        return None;
    }
    let offset = b.read::<u16>(gsubgpos_offset as usize + 8)? as u32;
    if offset == 0 {
        return None;
    }
    Some(gsubgpos_offset + offset)
}

/// Returns the number of lookups in the lookup list at the specified
/// offset.
pub fn lookup_count(b: &Bytes, list_base: u32) -> u16 {
    if list_base == 0 {
        return 0;
    }
    b.read_or_default(list_base as usize)
}

/// Parses the header of the lookup at the specified index, resolving
/// Extension lookups (GSUB 7 / GPOS 9) to the wrapped kind.
pub fn lookup_data(
    b: &Bytes,
    stage: u8,
    list_base: u32,
    index: u16,
    gdef: Option<&Gdef>,
) -> Option<LookupData> {
    if list_base == 0 {
        return None;
    }
    let list = list_base as usize;
    if index >= b.read::<u16>(list)? {
        return None;
    }
    let offset = b.read::<u16>(list + 2 + index as usize * 2)?;
    let base = list + offset as usize;
    let mut kind = b.read::<u16>(base)?;
    let flag = b.read::<u16>(base + 2)?;
    let count = b.read::<u16>(base + 4)?;
    let mark_class = (flag >> 8) as u8;
    let ignore_marks = flag & 0x0008 != 0;
    let mut mark_check = 0;
    let mut mark_set = 0;
    if !ignore_marks {
        if let Some(gdef) = gdef {
            mark_check = (mark_class != 0 && gdef.has_mark_classes()) as u8;
            if gdef.ok() && flag & USE_MARK_FILTERING_SET != 0 {
                let set_index = b.read::<u16>(base + 6 + count as usize * 2)?;
                mark_check = 1;
                mark_set = gdef.mark_set_offset(set_index).unwrap_or(0);
            }
        }
    }
    let is_sub = stage == 0;
    let is_ext = (is_sub && kind == 7) || (!is_sub && kind == 9);
    if is_ext && count > 0 {
        let first = base + b.read::<u16>(base + 6)? as usize;
        kind = b.read::<u16>(first + 2)?;
    }
    use LookupKind::*;
    let kind = if is_sub {
        match kind {
            1 => SingleSub,
            2 => MultiSub,
            3 => AltSub,
            4 => LigSub,
            5 => Context,
            6 => ChainContext,
            8 => RevChainContext,
            _ => return None,
        }
    } else {
        match kind {
            1 => SingleAdj,
            2 => PairAdj,
            3 => Cursive,
            4 => MarkToBase,
            5 => MarkToLig,
            6 => MarkToMark,
            7 => Context,
            8 => ChainContext,
            _ => return None,
        }
    };
    // Skip flag layout: IgnoreBaseGlyphs/IgnoreLigatures/IgnoreMarks map to
    // class bits 1..3; bit 5 always skips consumed ligature components.
    let ignored = (flag & 0b1110) as u8 | 1 << 5;
    Some(LookupData {
        index,
        stage,
        kind,
        is_ext,
        rtl: flag & RIGHT_TO_LEFT != 0,
        offset: base as u32,
        count,
        ignored,
        mark_check,
        mark_class,
        mark_set,
    })
}

/// Lookup subtable kind, flattened to include the associated format.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum SubtableKind {
    SingleSub1,
    SingleSub2,
    MultiSub1,
    AltSub1,
    LigSub1,
    SingleAdj1,
    SingleAdj2,
    PairAdj1,
    PairAdj2,
    Cursive1,
    MarkToBase1,
    MarkToLig1,
    MarkToMark1,
    Context1,
    Context2,
    Context3,
    ChainContext1,
    ChainContext2,
    ChainContext3,
    RevChainContext1,
}

/// Data associated with a lookup subtable.
#[derive(Copy, Clone, Debug)]
pub struct SubtableData {
    pub offset: u32,
    pub kind: SubtableKind,
    pub coverage: u16,
}

impl SubtableData {
    /// Returns the coverage index for the specified glyph id against this
    /// subtable's primary coverage.
    pub fn coverage(&self, b: &Bytes, glyph_id: u16) -> Option<u16> {
        coverage(b, self.offset + self.coverage as u32, glyph_id)
    }
}

/// Parses the header of a lookup subtable at the specified offset,
/// returning its flattened kind and validated coverage offset.
pub fn subtable_data(b: &Bytes, offset: u32, kind: LookupKind, fmt: u16) -> Option<SubtableData> {
    use LookupKind::*;
    use SubtableKind::*;
    let base = offset as usize;
    // Primary coverage lives at offset 2 for every subtable except the
    // coverage-array contextual formats.
    let (kind, coverage_field) = match (kind, fmt) {
        (SingleSub, 1) => (SingleSub1, 2),
        (SingleSub, 2) => (SingleSub2, 2),
        (MultiSub, 1) => (MultiSub1, 2),
        (AltSub, 1) => (AltSub1, 2),
        (LigSub, 1) => (LigSub1, 2),
        (SingleAdj, 1) => (SingleAdj1, 2),
        (SingleAdj, 2) => (SingleAdj2, 2),
        (PairAdj, 1) => (PairAdj1, 2),
        (PairAdj, 2) => (PairAdj2, 2),
        (Cursive, 1) => (Cursive1, 2),
        (MarkToBase, 1) => (MarkToBase1, 2),
        (MarkToLig, 1) => (MarkToLig1, 2),
        (MarkToMark, 1) => (MarkToMark1, 2),
        (Context, 1) => (Context1, 2),
        (Context, 2) => (Context2, 2),
        (Context, 3) => (Context3, 6),
        (ChainContext, 1) => (ChainContext1, 2),
        (ChainContext, 2) => (ChainContext2, 2),
        (ChainContext, 3) => {
            let backtrack_len = b.read::<u16>(base + 2)? as usize * 2;
            let input_len = b.read::<u16>(base + backtrack_len + 4)?;
            if input_len == 0 {
                return None;
            }
            (ChainContext3, backtrack_len + 6)
        }
        (RevChainContext, 1) => (RevChainContext1, 2),
        _ => return None,
    };
    let coverage = b.read::<u16>(base + coverage_field)?;
    if !validate_coverage(b, offset + coverage as u32) {
        return None;
    }
    Some(SubtableData {
        offset,
        kind,
        coverage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_format1() {
        let mut t = Vec::new();
        t.extend_from_slice(&1u16.to_be_bytes());
        t.extend_from_slice(&3u16.to_be_bytes());
        for g in [2u16, 9, 40] {
            t.extend_from_slice(&g.to_be_bytes());
        }
        let b = Bytes::new(&t);
        assert_eq!(coverage(&b, 0, 9), Some(1));
        assert_eq!(coverage(&b, 0, 40), Some(2));
        assert_eq!(coverage(&b, 0, 3), None);
        assert!(validate_coverage(&b, 0));
    }

    #[test]
    fn coverage_format2() {
        let mut t = Vec::new();
        t.extend_from_slice(&2u16.to_be_bytes());
        t.extend_from_slice(&2u16.to_be_bytes());
        // ranges: 10..=12 -> 0.., 20..=20 -> 3
        for rec in [[10u16, 12, 0], [20, 20, 3]] {
            for v in rec {
                t.extend_from_slice(&v.to_be_bytes());
            }
        }
        let b = Bytes::new(&t);
        assert_eq!(coverage(&b, 0, 11), Some(1));
        assert_eq!(coverage(&b, 0, 20), Some(3));
        assert_eq!(coverage(&b, 0, 13), None);
        let mut seen = Vec::new();
        enumerate_coverage(&b, 0, |g| seen.push(g)).unwrap();
        assert_eq!(seen, vec![10, 11, 12, 20]);
    }

    #[test]
    fn classdef_formats() {
        let mut t = Vec::new();
        t.extend_from_slice(&1u16.to_be_bytes());
        t.extend_from_slice(&5u16.to_be_bytes()); // start glyph
        t.extend_from_slice(&2u16.to_be_bytes()); // count
        t.extend_from_slice(&7u16.to_be_bytes());
        t.extend_from_slice(&3u16.to_be_bytes());
        let b = Bytes::new(&t);
        assert_eq!(classdef(&b, 0, 5), 7);
        assert_eq!(classdef(&b, 0, 6), 3);
        assert_eq!(classdef(&b, 0, 7), 0);
        assert_eq!(classdef(&b, 0, 4), 0);

        let mut t = Vec::new();
        t.extend_from_slice(&2u16.to_be_bytes());
        t.extend_from_slice(&1u16.to_be_bytes());
        for v in [30u16, 33, 2] {
            t.extend_from_slice(&v.to_be_bytes());
        }
        let b = Bytes::new(&t);
        assert_eq!(classdef(&b, 0, 31), 2);
        assert_eq!(classdef(&b, 0, 29), 0);
    }
}
