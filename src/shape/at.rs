//! Application of GSUB and GPOS lookups to a glyph buffer.

use super::buffer::*;
use super::plan::{PlanLookup, ShapePlan};
use crate::internal::{at::*, Bytes, Stream};

const MAX_NESTED_LOOKUPS: usize = 8;
const MAX_SEQUENCE: usize = 32;

/// Applies the plan's lookups for one stage (0 = GSUB, 1 = GPOS) to the
/// buffer. Returns true if any lookup applied.
#[allow(clippy::too_many_arguments)]
pub fn apply(
    stage: u8,
    data: &Bytes,
    gsubgpos: u32,
    coords: &[i16],
    gdef: &Gdef,
    storage: &mut Storage,
    plan: &ShapePlan,
    buffer: &mut Buffer,
) -> bool {
    if gsubgpos == 0 {
        return false;
    }
    let lookups = if stage == 0 {
        &plan.sub_lookups
    } else {
        &plan.pos_lookups
    };
    let mut applied = false;
    for lookup in lookups {
        // A disjoint digest proves no glyph in the buffer is covered.
        if !buffer.digest().may_intersect(&lookup.digest) {
            continue;
        }
        let subtables = plan.lookup_subtables(lookup);
        let mut acx = ApplyContext::new(stage, data, gsubgpos, gdef, coords, storage, buffer);
        if acx.apply(lookup, subtables) == Some(true) {
            applied = true;
        }
    }
    applied
}

#[derive(Copy, Clone, Default)]
struct LookupState {
    skip_state: SkipState,
    cur: usize,
    end: usize,
}

#[derive(Copy, Clone, Default)]
struct NestedFrame {
    state: LookupState,
    lookup_index: u16,
    position: usize,
}

/// Scratch storage shared by every lookup application in a shape call.
#[derive(Default)]
pub struct Storage {
    stack: [NestedFrame; MAX_NESTED_LOOKUPS],
    ids: [u16; MAX_SEQUENCE],
    indices: [usize; MAX_SEQUENCE],
}

struct ApplyContext<'a, 'b, 'c> {
    stage: u8,
    data: &'a Bytes<'a>,
    gsubgpos: u32,
    defs: &'a Gdef<'a>,
    coords: &'a [i16],
    enable_var: bool,
    storage: &'b mut Storage,
    top: u8,
    arg: u16,
    mask: u32,
    end: usize,
    s: LookupState,
    buf: &'c mut Buffer,
}

impl<'a, 'b, 'c> ApplyContext<'a, 'b, 'c> {
    fn new(
        stage: u8,
        data: &'a Bytes<'a>,
        gsubgpos: u32,
        defs: &'a Gdef<'a>,
        coords: &'a [i16],
        storage: &'b mut Storage,
        buffer: &'c mut Buffer,
    ) -> Self {
        let end = buffer.len();
        Self {
            stage,
            data,
            gsubgpos,
            defs,
            coords,
            enable_var: defs.has_var_store() && !coords.is_empty(),
            storage,
            top: 0,
            arg: 0,
            mask: !0,
            end,
            s: LookupState::default(),
            buf: buffer,
        }
    }

    fn apply(&mut self, lookup: &PlanLookup, subtables: &[SubtableData]) -> Option<bool> {
        let b = self.data;
        self.arg = lookup.arg;
        self.mask = lookup.mask;
        self.s.skip_state = SkipState {
            flags: lookup.data.ignored,
            mark_check: lookup.data.mark_check,
            mark_class: lookup.data.mark_class,
            mark_set: lookup.data.mark_set,
        };
        self.s.cur = 0;
        self.s.end = self.end;
        self.apply_skip_state();
        let mut applied = false;
        if lookup.data.kind == LookupKind::RevChainContext {
            // Reverse chaining single substitution walks the buffer in
            // reverse order.
            if !self.move_last() {
                return Some(false);
            }
            loop {
                let i = self.s.cur;
                let g = self.buf.glyphs.get(i)?;
                if !g.skip && g.mask & self.mask != 0 {
                    let id = g.id;
                    if lookup.digest.may_contain(id) {
                        for s in subtables {
                            if let Some(index) = s.coverage(b, id) {
                                if self.apply_subtable(b, s, index as usize, i, id, lookup.data.rtl)
                                    == Some(true)
                                {
                                    applied = true;
                                    break;
                                }
                            }
                        }
                    }
                }
                if self.s.cur == 0 {
                    break;
                }
                self.s.cur -= 1;
            }
        } else {
            if !self.move_first() {
                return Some(false);
            }
            while self.s.cur < self.s.end {
                let i = self.s.cur;
                let g = self.buf.glyphs.get(i)?;
                if !g.skip && g.mask & self.mask != 0 {
                    let id = g.id;
                    if lookup.digest.may_contain(id) {
                        for s in subtables {
                            if let Some(index) = s.coverage(b, id) {
                                if self.apply_subtable(b, s, index as usize, i, id, lookup.data.rtl)
                                    == Some(true)
                                {
                                    applied = true;
                                    break;
                                }
                            }
                        }
                    }
                }
                self.s.cur += 1;
            }
        }
        Some(applied)
    }

    fn apply_skip_state(&mut self) {
        if self.s.skip_state == self.buf.skip_state {
            return;
        }
        self.buf.skip_state = self.s.skip_state;
        self.update_glyphs_skip(None);
    }

    fn update_glyphs_skip(&mut self, range: Option<core::ops::Range<usize>>) {
        let range = range.unwrap_or(0..self.buf.glyphs.len());
        let ss = self.s.skip_state;
        if ss.mark_check != 0 {
            if ss.mark_set != 0 {
                for g in self.buf.glyphs[range].iter_mut() {
                    g.skip = ss.flags & (1 << g.class) != 0;
                    if !g.skip && g.class == CLASS_MARK {
                        g.skip = self.defs.mark_set_coverage(ss.mark_set, g.id).is_none();
                    }
                }
            } else {
                for g in self.buf.glyphs[range].iter_mut() {
                    g.skip = ss.flags & (1 << g.class) != 0;
                    if !g.skip && g.class == CLASS_MARK {
                        g.skip = g.mark_type != ss.mark_class;
                    }
                }
            }
        } else {
            for g in self.buf.glyphs[range].iter_mut() {
                g.skip = ss.flags & (1 << g.class) != 0;
            }
        }
    }

    fn update_glyphs(&mut self, start: usize, end: usize) {
        if self.defs.has_mark_classes() {
            for g in &mut self.buf.glyphs[start..end] {
                let class = self.defs.class(g.id) as u8;
                g.class = class;
                g.mark_type = if class == CLASS_MARK {
                    self.defs.mark_class(g.id) as u8
                } else {
                    0
                };
            }
        } else if self.defs.ok() {
            for g in &mut self.buf.glyphs[start..end] {
                g.class = self.defs.class(g.id) as u8;
            }
        }
        self.update_glyphs_skip(Some(start..end));
    }

    fn update_glyph(&mut self, index: usize) {
        self.update_glyphs(index, index + 1);
    }

    #[inline(always)]
    fn ignored(&self, index: usize) -> bool {
        self.buf.glyphs[index].skip
    }

    fn next(&self, index: usize) -> Option<usize> {
        ((index + 1)..self.s.end).find(|&i| !self.ignored(i))
    }

    fn previous(&self, index: usize) -> Option<usize> {
        (0..index).rev().find(|&i| !self.ignored(i))
    }

    fn previous_base(&self, index: usize) -> Option<usize> {
        (0..index)
            .rev()
            .find(|&i| !self.ignored(i) && self.buf.glyphs[i].class != CLASS_MARK)
    }

    fn move_first(&mut self) -> bool {
        while self.s.cur < self.s.end {
            if !self.buf.glyphs[self.s.cur].skip {
                break;
            }
            self.s.cur += 1;
        }
        self.s.cur < self.s.end
    }

    fn move_last(&mut self) -> bool {
        if self.s.end == 0 {
            return false;
        }
        self.s.cur = self.s.end - 1;
        loop {
            if !self.ignored(self.s.cur) {
                return true;
            }
            if self.s.cur == 0 {
                return false;
            }
            self.s.cur -= 1;
        }
    }

    fn move_next(&mut self) -> bool {
        self.s.cur += 1;
        self.move_first()
    }

    fn move_to(&mut self, index: usize) -> bool {
        if !self.move_first() {
            return false;
        }
        for _ in 0..index {
            if !self.move_next() {
                return false;
            }
        }
        true
    }

    /// Collects up to `len` non-skipped glyphs after the current position
    /// into scratch storage.
    fn collect_sequence(&mut self, len: usize) -> bool {
        let mut collected = 0;
        let mut i = self.s.cur + 1;
        for g in &self.buf.glyphs[self.s.cur + 1..self.s.end] {
            if !g.skip {
                self.storage.indices[collected] = i;
                self.storage.ids[collected] = g.id;
                collected += 1;
                if collected == len {
                    return true;
                }
            }
            i += 1;
        }
        false
    }

    fn extend(&mut self, count: usize) {
        self.end += count;
        self.s.end += count;
        for frame in self.storage.stack[..self.top as usize].iter_mut() {
            frame.state.end += count;
        }
    }

    /// Matches a backtrack sequence; positions past the buffer start read
    /// glyph ids from the pre-context array.
    fn match_backtrack<F>(&self, start: usize, len: usize, pred: F) -> Option<bool>
    where
        F: Fn(usize, u16) -> bool,
    {
        let mut idx = start;
        let mut context = self.buf.pre_context.len();
        for i in 0..len {
            match self.previous(idx) {
                Some(prev) => {
                    if !pred(i, self.buf.glyphs[prev].id) {
                        return None;
                    }
                    idx = prev;
                }
                None => {
                    context = context.checked_sub(1)?;
                    if !pred(i, self.buf.pre_context[context]) {
                        return None;
                    }
                    idx = 0;
                }
            }
        }
        Some(true)
    }

    /// Matches an input sequence entirely inside the buffer, returning the
    /// index of the last matched glyph.
    fn match_sequence<F>(&self, start: usize, len: usize, pred: F) -> Option<usize>
    where
        F: Fn(usize, u16) -> bool,
    {
        let mut idx = start;
        for i in 0..len {
            idx = self.next(idx)?;
            if !pred(i, self.buf.glyphs[idx].id) {
                return None;
            }
        }
        Some(idx)
    }

    /// Matches a lookahead sequence; positions past the buffer end read
    /// glyph ids from the post-context array.
    fn match_lookahead<F>(&self, start: usize, len: usize, pred: F) -> Option<bool>
    where
        F: Fn(usize, u16) -> bool,
    {
        let mut idx = start;
        let mut context = 0;
        for i in 0..len {
            match self.next(idx) {
                Some(next) => {
                    if !pred(i, self.buf.glyphs[next].id) {
                        return None;
                    }
                    idx = next;
                }
                None => {
                    let id = *self.buf.post_context.get(context)?;
                    context += 1;
                    if !pred(i, id) {
                        return None;
                    }
                    idx = self.s.end;
                }
            }
        }
        Some(true)
    }

    #[inline(never)]
    fn apply_subtable(
        &mut self,
        b: &'a Bytes<'a>,
        subtable: &SubtableData,
        index: usize,
        cur: usize,
        g: u16,
        rtl_flag: bool,
    ) -> Option<bool> {
        use SubtableKind::*;
        let kind = subtable.kind;
        let base = subtable.offset as usize;
        match kind {
            SingleSub1 => {
                let delta = b.read::<i16>(base + 4)? as i32;
                let subst = (g as i32 + delta) as u16;
                self.buf.substitute(cur, subst);
                self.update_glyph(cur);
                return Some(true);
            }
            SingleSub2 => {
                let subst = b.read::<u16>(base + 6 + index * 2)?;
                self.buf.substitute(cur, subst);
                self.update_glyph(cur);
                return Some(true);
            }
            MultiSub1 => {
                let seqbase = base + b.read::<u16>(base + 6 + index * 2)? as usize;
                let seqlen = b.read::<u16>(seqbase)? as usize;
                // Empty sequences would delete the glyph; skip them.
                if seqlen == 0 || seqlen > MAX_SEQUENCE {
                    return Some(false);
                }
                for i in 0..seqlen {
                    self.storage.ids[i] = b.read::<u16>(seqbase + 2 + i * 2)?;
                }
                self.buf
                    .substitute_multiple(cur, &self.storage.ids[..seqlen]);
                self.update_glyphs(cur, cur + seqlen);
                self.extend(seqlen - 1);
                self.s.cur += seqlen - 1;
                return Some(true);
            }
            AltSub1 => {
                let offset = b.read::<u16>(base + 6 + index * 2)? as usize;
                if offset == 0 {
                    return Some(false);
                }
                // Feature values select alternates with a one based index;
                // an enabled feature with no explicit value takes the
                // first.
                let alt = (self.arg as usize).max(1) - 1;
                let setbase = base + offset;
                let count = b.read::<u16>(setbase)? as usize;
                if alt >= count {
                    return Some(false);
                }
                let subst = b.read::<u16>(setbase + 2 + alt * 2)?;
                self.buf.substitute(cur, subst);
                self.update_glyph(cur);
                return Some(true);
            }
            LigSub1 => {
                let setbase = base + b.read::<u16>(base + 6 + index * 2)? as usize;
                let ligcount = b.read::<u16>(setbase)? as usize;
                let mut seqlen = 0usize;
                for i in 0..ligcount {
                    let ligbase = setbase + b.read::<u16>(setbase + 2 + i * 2)? as usize;
                    let mut compcount = b.read::<u16>(ligbase + 2)? as usize;
                    if compcount == 0 {
                        continue;
                    }
                    compcount -= 1;
                    if compcount >= MAX_SEQUENCE {
                        continue;
                    }
                    if seqlen < compcount {
                        if !self.collect_sequence(compcount) {
                            continue;
                        }
                        seqlen = compcount;
                    }
                    let components = b.read_array::<u16>(ligbase + 4, compcount)?;
                    if components
                        .iter()
                        .zip(&self.storage.ids)
                        .any(|(a, b)| a != *b)
                    {
                        continue;
                    }
                    let glyph = b.read::<u16>(ligbase)?;
                    self.buf
                        .substitute_ligature(cur, glyph, &self.storage.indices[..compcount]);
                    self.update_glyph(cur);
                    return Some(true);
                }
            }
            SingleAdj1 => {
                let mut pos = [0i32; 4];
                self.value_record(base, base + 6, b.read::<u16>(base + 4)?, &mut pos)?;
                self.buf.position(cur, pos);
                return Some(true);
            }
            SingleAdj2 => {
                let vf = b.read::<u16>(base + 4)?;
                let len = vf.count_ones() as usize * 2;
                let mut pos = [0i32; 4];
                self.value_record(base, base + 8 + index * len, vf, &mut pos)?;
                self.buf.position(cur, pos);
                return Some(true);
            }
            PairAdj1 => {
                let next = self.next(cur)?;
                let g2 = self.buf.glyphs[next].id;
                let vf1 = b.read::<u16>(base + 4)?;
                let vf2 = b.read::<u16>(base + 6)?;
                let len1 = vf1.count_ones() as usize * 2;
                let step = len1 + vf2.count_ones() as usize * 2 + 2;
                let setbase = base + b.read::<u16>(base + 10 + index * 2)? as usize;
                let count = b.read::<u16>(setbase)? as usize;
                let vbase = setbase + 2;
                let mut lo = 0;
                let mut hi = count;
                while lo < hi {
                    use core::cmp::Ordering::*;
                    let i = (lo + hi) / 2;
                    let rec = vbase + i * step;
                    let gv = b.read::<u16>(rec)?;
                    match g2.cmp(&gv) {
                        Greater => lo = i + 1,
                        Less => hi = i,
                        Equal => {
                            if vf1 != 0 {
                                let mut pos = [0i32; 4];
                                self.value_record(setbase, rec + 2, vf1, &mut pos)?;
                                self.buf.position(cur, pos);
                            }
                            if vf2 != 0 {
                                let mut pos = [0i32; 4];
                                self.value_record(setbase, rec + 2 + len1, vf2, &mut pos)?;
                                self.buf.position(next, pos);
                            }
                            return Some(true);
                        }
                    }
                }
            }
            PairAdj2 => {
                let next = self.next(cur)?;
                let g2 = self.buf.glyphs[next].id;
                let vf1 = b.read::<u16>(base + 4)?;
                let vf2 = b.read::<u16>(base + 6)?;
                let len1 = vf1.count_ones() as usize * 2;
                let step = len1 + vf2.count_ones() as usize * 2;
                let class1 = self.class(base + b.read::<u16>(base + 8)? as usize, g) as usize;
                let class2 = self.class(base + b.read::<u16>(base + 10)? as usize, g2) as usize;
                let class1_count = b.read::<u16>(base + 12)? as usize;
                let class2_count = b.read::<u16>(base + 14)? as usize;
                if class1 >= class1_count || class2 >= class2_count {
                    return Some(false);
                }
                let rec = base + 16 + (class1 * class2_count + class2) * step;
                if vf1 != 0 {
                    let mut pos = [0i32; 4];
                    self.value_record(base, rec, vf1, &mut pos)?;
                    self.buf.position(cur, pos);
                }
                if vf2 != 0 {
                    let mut pos = [0i32; 4];
                    self.value_record(base, rec + len1, vf2, &mut pos)?;
                    self.buf.position(next, pos);
                }
                return Some(true);
            }
            Cursive1 => {
                let next = self.next(cur)?;
                let g2 = self.buf.glyphs[next].id;
                let index2 = subtable.coverage(b, g2)? as usize;
                let recbase = base + 6;
                let exit_offset = b.read::<u16>(recbase + index * 4 + 2)? as usize;
                let entry_offset = b.read::<u16>(recbase + index2 * 4)? as usize;
                if exit_offset == 0 || entry_offset == 0 {
                    return Some(false);
                }
                let exit = self.anchor(base + exit_offset)?;
                let entry = self.anchor(base + entry_offset)?;
                // The RightToLeft lookup flag places the joining advance
                // on the first glyph instead of the second, and chooses
                // which glyph chains to the other.
                if rtl_flag {
                    let d = exit.0 + self.buf.positions[cur].x_offset;
                    self.buf.positions[cur].x_advance -= d;
                    self.buf.positions[cur].x_offset -= d;
                    self.buf.positions[next].x_advance =
                        entry.0 + self.buf.positions[next].x_offset;
                    self.buf.position_cursive(cur, next, entry.1 - exit.1);
                } else {
                    self.buf.positions[cur].x_advance =
                        exit.0 + self.buf.positions[cur].x_offset;
                    let d = entry.0 + self.buf.positions[next].x_offset;
                    self.buf.positions[next].x_advance -= d;
                    self.buf.positions[next].x_offset -= d;
                    self.buf.position_cursive(next, cur, exit.1 - entry.1);
                }
                return Some(true);
            }
            MarkToBase1 | MarkToMark1 => {
                // Marks attach to the closest preceding base, skipping
                // other marks regardless of the lookup flags; mark to mark
                // attaches to the immediately preceding mark.
                let prev = if kind == MarkToBase1 {
                    self.previous_base(cur)?
                } else {
                    self.previous(cur)?
                };
                let g2 = self.buf.glyphs[prev].id;
                let index2 = self.coverage(base + b.read::<u16>(base + 4)? as usize, g2)? as usize;
                let class_count = b.read::<u16>(base + 6)? as usize;
                let (mark_class, mark_anchor) =
                    self.mark_anchor(base + b.read::<u16>(base + 8)? as usize, index as u16)?;
                let base_anchor = {
                    let basebase = base + b.read::<u16>(base + 10)? as usize;
                    let count = b.read::<u16>(basebase)? as usize;
                    if index2 >= count || mark_class as usize >= class_count {
                        return Some(false);
                    }
                    let rec = basebase + 2 + (index2 * class_count + mark_class as usize) * 2;
                    let offset = b.read::<u16>(rec)? as usize;
                    if offset == 0 {
                        return Some(false);
                    }
                    self.anchor(basebase + offset)?
                };
                let dx = base_anchor.0 - mark_anchor.0;
                let dy = base_anchor.1 - mark_anchor.1;
                self.buf.position_mark(cur, prev, dx, dy);
                return Some(true);
            }
            MarkToLig1 => {
                let comp_index = self.buf.glyphs[cur].component as usize;
                let prev = self.previous_base(cur)?;
                let g2 = self.buf.glyphs[prev].id;
                let lig_index = self.coverage(base + b.read::<u16>(base + 4)? as usize, g2)?;
                let class_count = b.read::<u16>(base + 6)? as usize;
                let (mark_class, mark_anchor) =
                    self.mark_anchor(base + b.read::<u16>(base + 8)? as usize, index as u16)?;
                if mark_class as usize >= class_count {
                    return None;
                }
                let lig_array = b.read::<u16>(base + 10)? as usize;
                if lig_array == 0 {
                    return None;
                }
                let lig_array = base + lig_array;
                if lig_index >= b.read::<u16>(lig_array)? {
                    return None;
                }
                let attach = b.read::<u16>(lig_array + 2 + lig_index as usize * 2)? as usize;
                if attach == 0 {
                    return None;
                }
                let attach = lig_array + attach;
                let comp_count = b.read::<u16>(attach)? as usize;
                if comp_count == 0 {
                    return None;
                }
                // Marks with an out of range component clamp to the last.
                let comp = comp_index.min(comp_count - 1);
                let rec = attach + 2 + (comp * class_count + mark_class as usize) * 2;
                let offset = b.read::<u16>(rec)? as usize;
                if offset == 0 {
                    return None;
                }
                let lig_anchor = self.anchor(attach + offset)?;
                let dx = lig_anchor.0 - mark_anchor.0;
                let dy = lig_anchor.1 - mark_anchor.1;
                self.buf.position_mark(cur, prev, dx, dy);
                return Some(true);
            }
            Context1 | Context2 => {
                let mut c = b.stream_at(base + 4)?;
                let set_index = if kind == Context2 {
                    let classdef = c.read::<u16>()? as usize;
                    if classdef == 0 {
                        return Some(false);
                    }
                    self.class(base + classdef, g) as usize
                } else {
                    index
                };
                let set_count = c.read::<u16>()? as usize;
                let set_offsets = c.read_array::<u16>(set_count)?;
                let mut offset = set_offsets.get(set_index)? as usize;
                if offset == 0 {
                    return Some(false);
                }
                offset += base;
                let classdef_base = if kind == Context2 {
                    Some(base + b.read::<u16>(base + 4)? as usize)
                } else {
                    None
                };
                let mut c = b.stream_at(offset)?;
                let rule_count = c.read::<u16>()? as usize;
                let rule_offsets = c.read_array::<u16>(rule_count)?;
                for i in 0..rule_count {
                    let rule_offset = offset + rule_offsets.get(i)? as usize;
                    let mut c = b.stream_at(rule_offset)?;
                    let mut input_count = c.read::<u16>()? as usize;
                    let subst_count = c.read::<u16>()? as usize;
                    let mut input_end = cur;
                    if input_count > 1 {
                        input_count -= 1;
                        let seq = c.read_array::<u16>(input_count)?;
                        let matched = match classdef_base {
                            Some(classdef) => self.match_sequence(cur, input_count, |i, id| {
                                self.class(classdef, id) == seq.get_or(i, 0)
                            }),
                            None => self.match_sequence(cur, input_count, |i, id| {
                                id == seq.get_or(i, 0)
                            }),
                        };
                        match matched {
                            Some(end) => input_end = end,
                            None => continue,
                        }
                    }
                    self.apply_contextual(c, subst_count, input_end);
                    return Some(true);
                }
            }
            Context3 => {
                let mut c = b.stream_at(base + 2)?;
                let input_count = c.read::<u16>()? as usize;
                if input_count == 0 {
                    return None;
                }
                let subst_count = c.read::<u16>()? as usize;
                c.skip(2)?;
                let input = c.read_array::<u16>(input_count - 1)?;
                let input_end = self.match_sequence(cur, input_count - 1, |i, id| {
                    self.coverage(base + input.get_or(i, 0) as usize, id).is_some()
                })?;
                self.apply_contextual(c, subst_count, input_end);
                return Some(true);
            }
            ChainContext1 | ChainContext2 => {
                let mut c = b.stream_at(base + 4)?;
                let mut classdefs = None;
                let set_index = if kind == ChainContext2 {
                    let backtrack_classdef = base + c.read::<u16>()? as usize;
                    let input_classdef = c.read::<u16>()? as usize;
                    if input_classdef == 0 {
                        return Some(false);
                    }
                    let input_classdef = base + input_classdef;
                    let lookahead_classdef = base + c.read::<u16>()? as usize;
                    classdefs = Some((backtrack_classdef, input_classdef, lookahead_classdef));
                    self.class(input_classdef, g) as usize
                } else {
                    index
                };
                let set_count = c.read::<u16>()? as usize;
                let set_offsets = c.read_array::<u16>(set_count)?;
                let mut offset = set_offsets.get(set_index)? as usize;
                if offset == 0 {
                    return Some(false);
                }
                offset += base;
                let mut c = b.stream_at(offset)?;
                let rule_count = c.read::<u16>()? as usize;
                let rule_offsets = c.read_array::<u16>(rule_count)?;
                'rules: for i in 0..rule_count {
                    let rule_offset = offset + rule_offsets.get(i)? as usize;
                    let mut c = b.stream_at(rule_offset)?;
                    let backtrack_count = c.read::<u16>()? as usize;
                    if backtrack_count != 0 {
                        let seq = c.read_array::<u16>(backtrack_count)?;
                        let matched = match classdefs {
                            Some((backtrack, _, _)) => {
                                self.match_backtrack(cur, backtrack_count, |i, id| {
                                    self.class(backtrack, id) == seq.get_or(i, 0)
                                })
                            }
                            None => self.match_backtrack(cur, backtrack_count, |i, id| {
                                id == seq.get_or(i, 0)
                            }),
                        };
                        if matched.is_none() {
                            continue 'rules;
                        }
                    }
                    let mut input_count = c.read::<u16>()? as usize;
                    let mut input_end = cur;
                    if input_count > 1 {
                        input_count -= 1;
                        let seq = c.read_array::<u16>(input_count)?;
                        let matched = match classdefs {
                            Some((_, input, _)) => self.match_sequence(cur, input_count, |i, id| {
                                self.class(input, id) == seq.get_or(i, 0)
                            }),
                            None => self.match_sequence(cur, input_count, |i, id| {
                                id == seq.get_or(i, 0)
                            }),
                        };
                        match matched {
                            Some(end) => input_end = end,
                            None => continue 'rules,
                        }
                    }
                    let lookahead_count = c.read::<u16>()? as usize;
                    if lookahead_count != 0 {
                        let seq = c.read_array::<u16>(lookahead_count)?;
                        let matched = match classdefs {
                            Some((_, _, lookahead)) => {
                                self.match_lookahead(input_end, lookahead_count, |i, id| {
                                    self.class(lookahead, id) == seq.get_or(i, 0)
                                })
                            }
                            None => self.match_lookahead(input_end, lookahead_count, |i, id| {
                                id == seq.get_or(i, 0)
                            }),
                        };
                        if matched.is_none() {
                            continue 'rules;
                        }
                    }
                    let count = c.read::<u16>()? as usize;
                    self.apply_contextual(c, count, input_end);
                    return Some(true);
                }
            }
            ChainContext3 => {
                let mut c = b.stream_at(base + 2)?;
                let backtrack_count = c.read::<u16>()? as usize;
                if backtrack_count != 0 {
                    let backtrack = c.read_array::<u16>(backtrack_count)?;
                    self.match_backtrack(cur, backtrack_count, |i, id| {
                        self.coverage(base + backtrack.get_or(i, 0) as usize, id)
                            .is_some()
                    })?;
                }
                let input_count = c.read::<u16>()? as usize;
                if input_count == 0 {
                    return None;
                }
                c.skip(2)?;
                let mut input_end = cur;
                if input_count > 1 {
                    let input = c.read_array::<u16>(input_count - 1)?;
                    input_end = self.match_sequence(cur, input_count - 1, |i, id| {
                        self.coverage(base + input.get_or(i, 0) as usize, id).is_some()
                    })?;
                }
                let lookahead_count = c.read::<u16>()? as usize;
                if lookahead_count != 0 {
                    let lookahead = c.read_array::<u16>(lookahead_count)?;
                    self.match_lookahead(input_end, lookahead_count, |i, id| {
                        self.coverage(base + lookahead.get_or(i, 0) as usize, id)
                            .is_some()
                    })?;
                }
                let count = c.read::<u16>()? as usize;
                self.apply_contextual(c, count, input_end);
                return Some(true);
            }
            RevChainContext1 => {
                let mut c = b.stream_at(base + 4)?;
                let backtrack_count = c.read::<u16>()? as usize;
                if backtrack_count != 0 {
                    let backtrack = c.read_array::<u16>(backtrack_count)?;
                    self.match_backtrack(cur, backtrack_count, |i, id| {
                        self.coverage(base + backtrack.get_or(i, 0) as usize, id)
                            .is_some()
                    })?;
                }
                let lookahead_count = c.read::<u16>()? as usize;
                if lookahead_count != 0 {
                    let lookahead = c.read_array::<u16>(lookahead_count)?;
                    self.match_lookahead(cur, lookahead_count, |i, id| {
                        self.coverage(base + lookahead.get_or(i, 0) as usize, id)
                            .is_some()
                    })?;
                }
                let count = c.read::<u16>()? as usize;
                let substs = c.read_array::<u16>(count)?;
                let subst = substs.get(index)?;
                self.buf.substitute(cur, subst);
                return Some(true);
            }
        }
        None
    }

    /// Applies the nested lookup records of a matched contextual rule.
    fn apply_contextual(&mut self, mut c: Stream<'a>, count: usize, end: usize) -> Option<bool> {
        let mut applied = false;
        let start = self.s.cur;
        for _ in 0..count {
            let first = c.read::<u16>()? as usize;
            let lookup = c.read::<u16>()?;
            if let Some(true) = self.apply_nested(lookup, start, end, first) {
                applied = true;
            }
        }
        if applied {
            self.s.cur = end;
        }
        Some(applied)
    }

    fn apply_nested(&mut self, index: u16, cur: usize, end: usize, first: usize) -> Option<bool> {
        if self.top as usize == MAX_NESTED_LOOKUPS {
            return None;
        }
        // Suppress a lookup recursing into itself at the same position.
        for frame in &self.storage.stack[..self.top as usize] {
            if frame.lookup_index == index && frame.position == cur {
                return None;
            }
        }
        let b = self.data;
        let list_base = lookup_list_offset(b, self.gsubgpos)?;
        let gdef = self.defs.ok().then_some(self.defs);
        let lookup = lookup_data(b, self.stage, list_base, index, gdef)?;
        self.storage.stack[self.top as usize] = NestedFrame {
            state: self.s,
            lookup_index: index,
            position: cur,
        };
        self.top += 1;
        let result = self.apply_at(&lookup, cur, end + 1, first);
        self.top -= 1;
        self.s = self.storage.stack[self.top as usize].state;
        result
    }

    /// Applies a lookup at a single position, used for nested dispatch.
    fn apply_at(&mut self, lookup: &LookupData, cur: usize, end: usize, first: usize) -> Option<bool> {
        let b = self.data;
        let base = lookup.offset as usize;
        self.s.cur = cur;
        self.s.end = end.min(self.buf.len());
        self.s.skip_state = SkipState {
            flags: lookup.ignored,
            mark_check: lookup.mark_check,
            mark_class: lookup.mark_class,
            mark_set: lookup.mark_set,
        };
        self.apply_skip_state();
        if !self.move_to(first) {
            return Some(false);
        }
        let cur = self.s.cur;
        let g = self.buf.glyphs.get(cur)?.id;
        let subtables = base + 6;
        for i in 0..lookup.count as usize {
            let mut subtable = base + b.read::<u16>(subtables + i * 2)? as usize;
            if lookup.is_ext {
                subtable += b.read::<u32>(subtable + 4)? as usize;
            }
            let fmt = b.read::<u16>(subtable)?;
            if let Some(ref s) = subtable_data(b, subtable as u32, lookup.kind, fmt) {
                if let Some(index) = s.coverage(b, g) {
                    if self.apply_subtable(b, s, index as usize, cur, g, lookup.rtl) == Some(true) {
                        return Some(true);
                    }
                }
            }
        }
        Some(false)
    }

    #[inline(always)]
    fn coverage(&self, coverage_offset: usize, glyph_id: u16) -> Option<u16> {
        coverage(self.data, coverage_offset as u32, glyph_id)
    }

    #[inline(always)]
    fn class(&self, classdef_offset: usize, glyph_id: u16) -> u16 {
        classdef(self.data, classdef_offset as u32, glyph_id)
    }

    /// Reads a value record with exactly the fields selected by the format
    /// bits, resolving variation index deltas through the GDEF store.
    /// Device table adjustments are parsed but not applied.
    fn value_record(
        &self,
        parent_offset: usize,
        mut offset: usize,
        format: u16,
        pos: &mut [i32; 4],
    ) -> Option<()> {
        let b = self.data;
        // Field order: x placement, y placement, x advance, y advance.
        for (bit, slot) in [(1u16, 0usize), (2, 1), (4, 2), (8, 3)] {
            if format & bit != 0 {
                pos[slot] = b.read::<i16>(offset)? as i32;
                offset += 2;
            }
        }
        if format & 0xF0 == 0 {
            return Some(());
        }
        for (bit, slot) in [(0x10u16, 0usize), (0x20, 1), (0x40, 2), (0x80, 3)] {
            if format & bit != 0 {
                if self.enable_var {
                    pos[slot] += self.value_delta(parent_offset, b.read::<u16>(offset)?)?;
                }
                offset += 2;
            }
        }
        Some(())
    }

    fn value_delta(&self, parent_offset: usize, offset: u16) -> Option<i32> {
        if offset == 0 {
            return Some(0);
        }
        let b = self.data;
        let offset = parent_offset + offset as usize;
        // Only VariationIndex tables (delta format 0x8000) contribute;
        // hinting device tables are ignored.
        if b.read::<u16>(offset + 4)? != 0x8000 {
            return Some(0);
        }
        let outer = b.read::<u16>(offset)?;
        let inner = b.read::<u16>(offset + 2)?;
        Some(self.defs.delta(outer, inner, self.coords).round() as i32)
    }

    fn anchor(&self, offset: usize) -> Option<(i32, i32)> {
        let b = self.data;
        let format = b.read::<u16>(offset)?;
        let mut x = b.read::<i16>(offset + 2)? as i32;
        let mut y = b.read::<i16>(offset + 4)? as i32;
        if format == 3 && self.enable_var {
            x += self.value_delta(offset, b.read::<u16>(offset + 6)?)?;
            y += self.value_delta(offset, b.read::<u16>(offset + 8)?)?;
        }
        Some((x, y))
    }

    fn mark_anchor(&self, marks: usize, index: u16) -> Option<(u16, (i32, i32))> {
        let b = self.data;
        if index >= b.read::<u16>(marks)? {
            return None;
        }
        let rec = marks + 2 + index as usize * 4;
        let class = b.read::<u16>(rec)?;
        let offset = b.read::<u16>(rec + 2)? as usize;
        if offset == 0 {
            return None;
        }
        Some((class, self.anchor(marks + offset)?))
    }
}
