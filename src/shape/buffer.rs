//! Glyph buffer used during shaping.

use crate::text::{is_combining_mark, is_default_ignorable, joining_type, JoiningType};

// Glyph flags.
pub const SUBSTITUTED: u16 = 1;
pub const LIGATED: u16 = 2;
pub const COMPONENT: u16 = 4;
pub const MARK_ATTACH: u16 = 8;
pub const CURSIVE_ATTACH: u16 = 16;
pub const IGNORABLE: u16 = 64;

/// Glyph class values from GDEF. Consumed ligature components are parked
/// in class 5 so that every lookup skips them.
pub const CLASS_BASE: u8 = 1;
pub const CLASS_LIGATURE: u8 = 2;
pub const CLASS_MARK: u8 = 3;
pub const CLASS_CONSUMED: u8 = 5;

/// Per glyph shaping data.
#[derive(Copy, Clone, Default, Debug)]
pub struct GlyphData {
    pub id: u16,
    pub codepoint: u32,
    pub cluster: u32,
    pub mask: u32,
    pub flags: u16,
    pub class: u8,
    pub mark_type: u8,
    pub joining_type: u8,
    pub lig_id: u8,
    pub component: u8,
    pub skip: bool,
}

/// Per glyph position data in font units.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct PositionData {
    pub x_advance: i32,
    pub y_advance: i32,
    pub x_offset: i32,
    pub y_offset: i32,
    pub attach_chain: i16,
    pub attach_type: u8,
}

/// Attachment types recorded in position data.
pub const ATTACH_MARK: u8 = 1;
pub const ATTACH_CURSIVE: u8 = 2;

/// Conservative three band summary of the glyph identifiers in a buffer or
/// coverage set. Bands use decorrelated multiplicative hashes; an empty
/// intersection in any band proves the sets are disjoint.
#[derive(Copy, Clone, Default, Debug)]
pub struct Digest([u64; 3]);

impl Digest {
    const FACTORS: [u64; 3] = [0x9E3779B97F4A7C15, 0xC2B2AE3D27D4EB4F, 0x165667B19E3779F9];
    const SHIFTS: [u32; 3] = [58, 53, 47];

    /// Adds a glyph identifier to the digest.
    #[inline]
    pub fn insert(&mut self, glyph_id: u16) {
        for ((word, factor), shift) in self
            .0
            .iter_mut()
            .zip(&Self::FACTORS)
            .zip(&Self::SHIFTS)
        {
            let hash = (glyph_id as u64).wrapping_mul(*factor) >> shift;
            *word |= 1 << (hash & 63);
        }
    }

    /// Returns true if the digest possibly contains the specified glyph.
    #[inline]
    pub fn may_contain(&self, glyph_id: u16) -> bool {
        let mut probe = Self::default();
        probe.insert(glyph_id);
        self.may_intersect(&probe)
    }

    /// Returns true if the two digests possibly share a glyph. False
    /// proves they are disjoint; true may be a collision.
    #[inline]
    pub fn may_intersect(&self, other: &Self) -> bool {
        self.0
            .iter()
            .zip(&other.0)
            .all(|(a, b)| a & b != 0)
    }

    /// Merges another digest into this one.
    #[inline]
    pub fn merge(&mut self, other: &Self) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a |= b;
        }
    }

    pub fn clear(&mut self) {
        self.0 = [0; 3];
    }
}

/// Skip state derived from the flags of the active lookup.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub struct SkipState {
    pub flags: u8,
    pub mark_check: u8,
    pub mark_class: u8,
    pub mark_set: u32,
}

#[derive(Clone, Default)]
pub struct Buffer {
    pub glyphs: Vec<GlyphData>,
    pub positions: Vec<PositionData>,
    pub pre_context: Vec<u16>,
    pub post_context: Vec<u16>,
    pub is_rtl: bool,
    pub vertical: bool,
    pub has_cursive: bool,
    pub has_marks: bool,
    pub reversed: bool,
    pub next_lig_id: u8,
    pub skip_state: SkipState,
    digest: Digest,
    digest_dirty: bool,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn clear(&mut self) {
        self.glyphs.clear();
        self.positions.clear();
        self.pre_context.clear();
        self.post_context.clear();
        self.is_rtl = false;
        self.vertical = false;
        self.has_cursive = false;
        self.has_marks = false;
        self.reversed = false;
        self.next_lig_id = 0;
        self.skip_state = SkipState::default();
        self.digest.clear();
        self.digest_dirty = false;
    }

    /// Appends a mapped codepoint.
    pub fn push(&mut self, codepoint: u32, cluster: u32, glyph_id: u16, mask: u32) {
        let ignorable = is_default_ignorable(codepoint);
        self.glyphs.push(GlyphData {
            id: glyph_id,
            codepoint,
            cluster,
            mask,
            flags: (ignorable as u16) << 6,
            class: 0,
            mark_type: 0,
            joining_type: joining_type(codepoint) as u8,
            lig_id: 0,
            component: !0,
            skip: false,
        });
        self.digest_dirty = true;
    }

    /// Returns the digest of the current glyph identifiers, rebuilding it
    /// if substitutions have occurred since the last call.
    pub fn digest(&mut self) -> Digest {
        if self.digest_dirty {
            self.digest.clear();
            for g in &self.glyphs {
                self.digest.insert(g.id);
            }
            self.digest_dirty = false;
        }
        self.digest
    }

    /// Replaces the glyph at the specified index.
    pub fn substitute(&mut self, index: usize, id: u16) {
        let g = &mut self.glyphs[index];
        g.id = id;
        g.flags |= SUBSTITUTED;
        self.digest_dirty = true;
    }

    /// Replaces the glyph at the specified index with a ligature glyph,
    /// consuming the specified component positions. Clusters of every
    /// involved glyph merge to the minimum of the set; marks between
    /// components receive the index of the nearest preceding component for
    /// later mark-to-ligature attachment.
    pub fn substitute_ligature(&mut self, index: usize, id: u16, components: &[usize]) {
        if components.is_empty() {
            return;
        }
        self.next_lig_id = self.next_lig_id.wrapping_add(1).max(1);
        let lig_id = self.next_lig_id;
        let mut cluster = self.glyphs[index].cluster;
        for &i in components {
            cluster = cluster.min(self.glyphs[i].cluster);
        }
        let g = &mut self.glyphs[index];
        g.id = id;
        g.flags |= SUBSTITUTED | LIGATED;
        g.cluster = cluster;
        g.lig_id = lig_id;
        let mut last_index = index;
        let mut component_index = 0u8;
        for &i in components {
            if i > last_index + 1 {
                // Skipped glyphs (marks) stay in place and attach to the
                // nearest preceding component.
                for g in &mut self.glyphs[last_index + 1..i] {
                    if g.class == CLASS_MARK {
                        g.component = component_index;
                        g.lig_id = lig_id;
                        g.cluster = cluster;
                    }
                }
            }
            component_index += 1;
            let g = &mut self.glyphs[i];
            g.id = 0xFFFF;
            g.flags |= COMPONENT;
            g.class = CLASS_CONSUMED;
            g.cluster = cluster;
            g.skip = true;
            last_index = i;
        }
        if last_index + 1 < self.glyphs.len() {
            for g in &mut self.glyphs[last_index + 1..] {
                if g.class == CLASS_MARK {
                    g.component = component_index;
                    g.lig_id = lig_id;
                    g.cluster = cluster;
                } else {
                    break;
                }
            }
        }
        self.digest_dirty = true;
    }

    /// Replaces the glyph at the specified index with an ordered sequence.
    /// The sequence must be non-empty; empty multiple substitutions are
    /// skipped by the caller.
    pub fn substitute_multiple(&mut self, index: usize, ids: &[u16]) {
        match ids.len() {
            0 => {}
            1 => self.substitute(index, ids[0]),
            _ => {
                let g = self.glyphs[index];
                self.glyphs.splice(
                    index..index + 1,
                    ids.iter().map(|id| GlyphData {
                        id: *id,
                        flags: g.flags | SUBSTITUTED,
                        ..g
                    }),
                );
                self.digest_dirty = true;
            }
        }
    }

    /// Duplicates the glyph at the specified index `count` times,
    /// making room for an insertion.
    pub fn multiply(&mut self, index: usize, count: usize) {
        let g = self.glyphs.get(index).copied().unwrap_or_default();
        self.glyphs.splice(index..index, (0..count).map(|_| g));
        self.digest_dirty = true;
    }

    /// Adds a positioning adjustment to the glyph at the specified index.
    pub fn position(&mut self, index: usize, adjustment: [i32; 4]) {
        let p = &mut self.positions[index];
        p.x_offset += adjustment[0];
        p.y_offset += adjustment[1];
        p.x_advance += adjustment[2];
        p.y_advance += adjustment[3];
    }

    /// Records a mark attachment: the mark at `index` attaches to the base
    /// at `base` with the specified anchor difference.
    pub fn position_mark(&mut self, index: usize, base: usize, dx: i32, dy: i32) {
        let chain = base as i64 - index as i64;
        if !(-255..=255).contains(&chain) {
            return;
        }
        self.has_marks = true;
        let p = &mut self.positions[index];
        p.attach_type = ATTACH_MARK;
        p.attach_chain = chain as i16;
        p.x_offset = dx;
        p.y_offset = dy;
    }

    /// Records a cursive attachment: the glyph at `child` chains to the
    /// glyph at `parent` with the specified vertical anchor difference.
    pub fn position_cursive(&mut self, child: usize, parent: usize, dy: i32) {
        let chain = parent as i64 - child as i64;
        if !(-255..=255).contains(&chain) {
            return;
        }
        self.has_cursive = true;
        let p = &mut self.positions[child];
        p.attach_type = ATTACH_CURSIVE;
        p.attach_chain = chain as i16;
        p.y_offset = dy;
    }

    /// Drops consumed ligature components and initializes positions.
    pub fn setup_positions(&mut self, was_morx: bool) {
        if was_morx {
            self.glyphs
                .retain(|g| g.flags & COMPONENT == 0 && g.id != 0xFFFF);
        } else {
            self.glyphs.retain(|g| g.flags & COMPONENT == 0);
        }
        self.positions.clear();
        self.positions
            .resize(self.glyphs.len(), PositionData::default());
        self.digest_dirty = true;
    }

    /// Reverses the buffer if the current order does not match the
    /// requested one.
    pub fn ensure_order(&mut self, reversed: bool) {
        if reversed != self.reversed {
            self.glyphs.reverse();
            if !self.positions.is_empty() {
                self.positions.reverse();
            }
            self.reversed = reversed;
        }
    }

    /// Synthesizes glyph classes from codepoints when the font carries no
    /// GDEF table.
    pub fn synthesize_classes(&mut self) {
        for g in &mut self.glyphs {
            if g.class != CLASS_CONSUMED {
                g.class = if is_combining_mark(g.codepoint) {
                    CLASS_MARK
                } else {
                    CLASS_BASE
                };
            }
        }
    }

    /// Computes joining actions for the Arabic family of scripts and
    /// stamps the corresponding feature masks. The action masks index by
    /// [`JoinAction`]; transparent glyphs are invisible to the analysis.
    pub fn set_join_masks(&mut self, masks: &[u32; 8]) {
        let mut prev: Option<usize> = None;
        let mut state = 0usize;
        let len = self.glyphs.len();
        for i in 0..len {
            let ty = self.glyphs[i].joining_type;
            if ty == JoiningType::T as u8 {
                self.glyphs[i].mask = masks[JoinAction::None as usize];
                continue;
            }
            let entry = JOIN_STATES[state][ty as usize];
            if let Some(j) = prev {
                if entry.0 != JoinAction::None as u8 {
                    self.glyphs[j].mask = masks[entry.0 as usize];
                }
            }
            self.glyphs[i].mask = masks[entry.1 as usize];
            prev = Some(i);
            state = entry.2 as usize;
        }
    }
}

/// Joining action selected for a glyph by the joining state machine.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum JoinAction {
    None = 0,
    Isol = 1,
    Fina = 2,
    Fin2 = 3,
    Fin3 = 4,
    Medi = 5,
    Med2 = 6,
    Init = 7,
}

const NONE: u8 = JoinAction::None as u8;
const ISOL: u8 = JoinAction::Isol as u8;
const FINA: u8 = JoinAction::Fina as u8;
const FIN2: u8 = JoinAction::Fin2 as u8;
const FIN3: u8 = JoinAction::Fin3 as u8;
const MEDI: u8 = JoinAction::Medi as u8;
const MED2: u8 = JoinAction::Med2 as u8;
const INIT: u8 = JoinAction::Init as u8;

// Arabic joining state machine: rows are states, columns are joining
// types (U, L, R, D, ALAPH, DALATH_RISH); entries are the action for the
// previous glyph, the action for the current glyph, and the next state.
#[rustfmt::skip]
const JOIN_STATES: [[(u8, u8, u8); 6]; 7] = [
    // State 0: prev was U, not willing to join.
    [ (NONE,NONE,0), (NONE,ISOL,2), (NONE,ISOL,1), (NONE,ISOL,2), (NONE,ISOL,1), (NONE,ISOL,6), ],
    // State 1: prev was R or ISOL/ALAPH, not willing to join.
    [ (NONE,NONE,0), (NONE,ISOL,2), (NONE,ISOL,1), (NONE,ISOL,2), (NONE,FIN2,5), (NONE,ISOL,6), ],
    // State 2: prev was D/L in ISOL form, willing to join.
    [ (NONE,NONE,0), (NONE,ISOL,2), (INIT,FINA,1), (INIT,FINA,3), (INIT,FINA,4), (INIT,FINA,6), ],
    // State 3: prev was D in FINA form, willing to join.
    [ (NONE,NONE,0), (NONE,ISOL,2), (MEDI,FINA,1), (MEDI,FINA,3), (MEDI,FINA,4), (MEDI,FINA,6), ],
    // State 4: prev was FINA ALAPH, not willing to join.
    [ (NONE,NONE,0), (NONE,ISOL,2), (MED2,ISOL,1), (MED2,ISOL,2), (MED2,FIN2,5), (MED2,ISOL,6), ],
    // State 5: prev was FIN2/FIN3 ALAPH, not willing to join.
    [ (NONE,NONE,0), (NONE,ISOL,2), (ISOL,ISOL,1), (ISOL,ISOL,2), (ISOL,FIN2,5), (ISOL,ISOL,6), ],
    // State 6: prev was DALATH/RISH, not willing to join.
    [ (NONE,NONE,0), (NONE,ISOL,2), (NONE,ISOL,1), (NONE,ISOL,2), (NONE,FIN3,5), (NONE,ISOL,6), ],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_never_false_negative() {
        let mut digest = Digest::default();
        let glyphs = [1u16, 7, 300, 5000, 65535];
        for g in glyphs {
            digest.insert(g);
        }
        for g in glyphs {
            assert!(digest.may_contain(g));
        }
        let mut other = Digest::default();
        other.insert(42);
        assert!(digest.may_intersect(&digest));
        // Disjointness claims must be exact in the other direction: if a
        // band misses, the glyph was definitely never inserted.
        if !digest.may_intersect(&other) {
            assert!(!glyphs.contains(&42));
        }
    }

    #[test]
    fn ligature_merges_to_min_cluster() {
        let mut buf = Buffer::new();
        buf.push('f' as u32, 3, 10, !0);
        buf.push('f' as u32, 4, 10, !0);
        buf.push('i' as u32, 5, 11, !0);
        buf.substitute_ligature(0, 20, &[1, 2]);
        assert_eq!(buf.glyphs[0].id, 20);
        assert_eq!(buf.glyphs[0].cluster, 3);
        assert_eq!(buf.glyphs[1].cluster, 3);
        assert_eq!(buf.glyphs[2].cluster, 3);
        assert!(buf.glyphs[1].skip);
        buf.setup_positions(false);
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.positions.len(), 1);
    }

    #[test]
    fn ligature_assigns_mark_components() {
        let mut buf = Buffer::new();
        buf.push('l' as u32, 0, 1, !0);
        buf.push(0x301, 1, 2, !0);
        buf.push('a' as u32, 2, 3, !0);
        buf.glyphs[1].class = CLASS_MARK;
        buf.substitute_ligature(0, 9, &[2]);
        // The mark between the components attaches to component 0.
        assert_eq!(buf.glyphs[1].component, 0);
        assert_eq!(buf.glyphs[1].lig_id, buf.glyphs[0].lig_id);
    }

    #[test]
    fn multiple_substitution_splices() {
        let mut buf = Buffer::new();
        buf.push('x' as u32, 0, 5, !0);
        buf.push('y' as u32, 1, 6, !0);
        buf.substitute_multiple(0, &[7, 8, 9]);
        assert_eq!(
            buf.glyphs.iter().map(|g| g.id).collect::<Vec<_>>(),
            vec![7, 8, 9, 6]
        );
        assert_eq!(buf.glyphs[1].cluster, 0);
    }

    #[test]
    fn join_masks_for_lam_alef() {
        // lam (dual) + alef (right): lam takes INIT, alef takes FINA.
        let mut masks = [0u32; 8];
        for (i, m) in masks.iter_mut().enumerate() {
            *m = 1 << i;
        }
        let mut buf = Buffer::new();
        buf.push(0x644, 0, 1, 0);
        buf.push(0x627, 1, 2, 0);
        buf.set_join_masks(&masks);
        assert_eq!(buf.glyphs[0].mask, 1 << JoinAction::Init as u32);
        assert_eq!(buf.glyphs[1].mask, 1 << JoinAction::Fina as u32);
    }

    #[test]
    fn isolated_arabic_letter() {
        let mut masks = [0u32; 8];
        for (i, m) in masks.iter_mut().enumerate() {
            *m = 100 + i as u32;
        }
        let mut buf = Buffer::new();
        buf.push(0x621, 0, 1, 0); // hamza: non joining
        buf.push(0x644, 1, 2, 0); // lam alone afterwards
        buf.set_join_masks(&masks);
        assert_eq!(buf.glyphs[1].mask, 100 + JoinAction::Isol as u32);
    }
}
