//! Drivers for the Apple metamorphosis and kerning tables.

use super::buffer::*;
use crate::internal::aat::*;
use crate::text::JoiningType;

/// Applies the extended metamorphosis table to the buffer. Used when the
/// font has no GSUB table.
pub fn apply_morx(data: &[u8], morx: u32, buffer: &mut Buffer, selectors: &[(u16, u16)]) -> Option<()> {
    use morx::*;
    let max_ops = buffer.glyphs.len() * 16;
    for chain in chains(data, morx) {
        let mut ops = 0;
        let mut flags = chain.default_flags();
        if !selectors.is_empty() {
            for feature in chain.features() {
                let key = (feature.selector, feature.setting_selector);
                if selectors.binary_search(&key).is_ok() {
                    flags = flags & feature.disable_flags | feature.enable_flags;
                }
            }
        }
        for subtable in chain.subtables() {
            if subtable.flags() & flags == 0 {
                continue;
            }
            let reverse = subtable.should_reverse(buffer.is_rtl);
            buffer.ensure_order(reverse);
            let kind = match subtable.kind() {
                Some(kind) => kind,
                _ => continue,
            };
            match kind {
                SubtableKind::Rearrangement(t) => {
                    let mut i = 0;
                    let mut state = RearrangementState::new();
                    while i < buffer.glyphs.len() && ops < max_ops {
                        let g = buffer.glyphs[i].id;
                        match t.next(&mut state, i, g, false, |r| {
                            r.apply(&mut buffer.glyphs);
                            Some(())
                        }) {
                            Some(advance) => i += advance,
                            None => break,
                        }
                        ops += 1;
                    }
                    t.next(&mut state, i, 0, true, |r| {
                        r.apply(&mut buffer.glyphs);
                        Some(())
                    });
                }
                SubtableKind::Contextual(t) => {
                    let mut state = ContextualState::new();
                    for i in 0..buffer.glyphs.len() {
                        let g = buffer.glyphs[i].id;
                        t.next(&mut state, i, g, false, |i, g| {
                            buffer.substitute(i, g);
                            Some(())
                        });
                    }
                    if let Some(last_id) = buffer.glyphs.last().map(|g| g.id) {
                        let last = buffer.glyphs.len() - 1;
                        t.next(&mut state, last, last_id, true, |i, g| {
                            buffer.substitute(i, g);
                            Some(())
                        });
                    }
                }
                SubtableKind::NonContextual(t) => {
                    for i in 0..buffer.glyphs.len() {
                        let id = buffer.glyphs[i].id;
                        if let Some(s) = t.substitute(id) {
                            buffer.substitute(i, s);
                        }
                    }
                }
                SubtableKind::Ligature(t) => {
                    let mut i = 0;
                    let mut state = LigatureState::new();
                    while i < buffer.glyphs.len() && ops < max_ops {
                        let g = buffer.glyphs[i].id;
                        if t.next(&mut state, i, g, false, |i, g, comps| {
                            buffer.substitute_ligature(i, g, comps);
                            Some(())
                        })
                        .is_none()
                        {
                            break;
                        }
                        i += 1;
                        ops += 1;
                    }
                    t.next(
                        &mut state,
                        buffer.glyphs.len().saturating_sub(1),
                        0,
                        true,
                        |i, g, comps| {
                            buffer.substitute_ligature(i, g, comps);
                            Some(())
                        },
                    );
                }
                SubtableKind::Insertion(t) => {
                    let mut i = 0;
                    let mut state = InsertionState::new();
                    while i < buffer.glyphs.len() && ops < max_ops {
                        let g = buffer.glyphs[i].id;
                        match t.next(&mut state, i, g, false, |i, array| {
                            insert_glyphs(buffer, i, &array);
                            Some(())
                        }) {
                            Some(advance) => i += advance,
                            None => break,
                        }
                        ops += 1;
                    }
                    t.next(
                        &mut state,
                        buffer.glyphs.len().saturating_sub(1),
                        0,
                        true,
                        |i, array| {
                            insert_glyphs(buffer, i, &array);
                            Some(())
                        },
                    );
                }
            }
        }
    }
    buffer.ensure_order(false);
    Some(())
}

fn insert_glyphs(buffer: &mut Buffer, index: usize, array: &crate::internal::Array<u16>) {
    let index = index.min(buffer.glyphs.len());
    buffer.multiply(index, array.len());
    let end = index + array.len();
    for (g, s) in buffer.glyphs[index..end].iter_mut().zip(array.iter()) {
        g.id = s;
        g.flags = 0;
    }
}

/// Applies the legacy kerning table. Used when the font has no GPOS table.
pub fn apply_kern(data: &[u8], kern_offset: u32, buffer: &mut Buffer) -> Option<()> {
    use kern::*;
    for subtable in subtables(data, kern_offset) {
        if !subtable.is_horizontal() || subtable.cross_stream() {
            continue;
        }
        let kind = match subtable.kind() {
            Some(kind) => kind,
            _ => continue,
        };
        match kind {
            SubtableKind::Format0(t) => kern_pairs(buffer, |left, right| t.get(left, right)),
            SubtableKind::Format2(t) => kern_pairs(buffer, |left, right| t.get(left, right)),
        }
    }
    Some(())
}

/// Walks adjacent visible glyph pairs, adding kerning to the advance of
/// the left glyph. Transparent (mark) glyphs are invisible to pairing.
fn kern_pairs(buffer: &mut Buffer, get: impl Fn(u16, u16) -> Option<i16>) {
    let len = buffer.len();
    let mut left_index = match buffer
        .glyphs
        .iter()
        .position(|g| g.joining_type != JoiningType::T as u8)
    {
        Some(index) => index,
        None => return,
    };
    let mut left = buffer.glyphs[left_index].id;
    for i in left_index + 1..len {
        if buffer.glyphs[i].joining_type == JoiningType::T as u8 {
            continue;
        }
        let right = buffer.glyphs[i].id;
        if let Some(kerning) = get(left, right) {
            if kerning != 0 {
                buffer.positions[left_index].x_advance += kerning as i32;
            }
        }
        left_index = i;
        left = right;
    }
}

/// Synthesizes mark positioning when the font has no GPOS table: combining
/// marks keep their intrinsic (usually zero) advance and center over the
/// preceding base using advance widths.
pub fn synthesize_marks(buffer: &mut Buffer) {
    let len = buffer.len();
    for i in 1..len {
        if buffer.glyphs[i].class != CLASS_MARK {
            continue;
        }
        let mut base = None;
        for j in (0..i).rev() {
            if buffer.glyphs[j].class != CLASS_MARK {
                base = Some(j);
                break;
            }
        }
        let base = match base {
            Some(base) => base,
            None => continue,
        };
        let base_advance = buffer.positions[base].x_advance;
        let mark_advance = buffer.positions[i].x_advance;
        let dx = (base_advance - mark_advance) / 2;
        buffer.position_mark(i, base, dx, 0);
    }
}
