//! Syllable reordering for the Indic family of scripts.
//!
//! Runs before substitution: pre-base vowel signs move to the front of
//! their syllable and an initial ra+halant pair (the reph) moves behind
//! the base. Reordered syllables merge their clusters so cluster order
//! stays monotonic through the rest of the pipeline.

use super::buffer::{Buffer, GlyphData};
use crate::text::Script;

struct SyllableChars {
    halant: u32,
    consonants: &'static [(u32, u32)],
    ra: u32,
    has_reph: bool,
    pre_base: &'static [u32],
}

fn syllable_chars(script: Script) -> Option<&'static SyllableChars> {
    use Script::*;
    Some(match script {
        Devanagari => &SyllableChars {
            halant: 0x94D,
            consonants: &[(0x915, 0x939), (0x958, 0x95F)],
            ra: 0x930,
            has_reph: true,
            pre_base: &[0x93F],
        },
        Bengali => &SyllableChars {
            halant: 0x9CD,
            consonants: &[(0x995, 0x9B9), (0x9DC, 0x9DF), (0x9F0, 0x9F1)],
            ra: 0x9B0,
            has_reph: true,
            pre_base: &[0x9BF, 0x9C7, 0x9C8],
        },
        Gurmukhi => &SyllableChars {
            halant: 0xA4D,
            consonants: &[(0xA15, 0xA39), (0xA59, 0xA5E)],
            ra: 0xA30,
            has_reph: false,
            pre_base: &[0xA3F],
        },
        Gujarati => &SyllableChars {
            halant: 0xACD,
            consonants: &[(0xA95, 0xAB9)],
            ra: 0xAB0,
            has_reph: true,
            pre_base: &[0xABF],
        },
        Oriya => &SyllableChars {
            halant: 0xB4D,
            consonants: &[(0xB15, 0xB39), (0xB5C, 0xB5F)],
            ra: 0xB30,
            has_reph: true,
            pre_base: &[0xB47],
        },
        Tamil => &SyllableChars {
            halant: 0xBCD,
            consonants: &[(0xB95, 0xBB9)],
            ra: 0xBB0,
            has_reph: false,
            pre_base: &[0xBC6, 0xBC7, 0xBC8],
        },
        Telugu => &SyllableChars {
            halant: 0xC4D,
            consonants: &[(0xC15, 0xC39)],
            ra: 0xC30,
            has_reph: true,
            pre_base: &[],
        },
        Kannada => &SyllableChars {
            halant: 0xCCD,
            consonants: &[(0xC95, 0xCB9)],
            ra: 0xCB0,
            has_reph: true,
            pre_base: &[],
        },
        Malayalam => &SyllableChars {
            halant: 0xD4D,
            consonants: &[(0xD15, 0xD39)],
            ra: 0xD30,
            has_reph: false,
            pre_base: &[0xD46, 0xD47, 0xD48],
        },
        Sinhala => &SyllableChars {
            halant: 0xDCA,
            consonants: &[(0xD9A, 0xDC6)],
            ra: 0xDBB,
            has_reph: false,
            pre_base: &[0xDD9],
        },
        Khmer => &SyllableChars {
            halant: 0x17D2,
            consonants: &[(0x1780, 0x17A2)],
            ra: 0x179A,
            has_reph: false,
            pre_base: &[0x17C1, 0x17C2, 0x17C3],
        },
        Myanmar => &SyllableChars {
            halant: 0x1039,
            consonants: &[(0x1000, 0x1020)],
            ra: 0x101B,
            has_reph: false,
            pre_base: &[0x1031],
        },
        _ => return None,
    })
}

impl SyllableChars {
    fn is_consonant(&self, ch: u32) -> bool {
        self.consonants
            .iter()
            .any(|&(start, end)| (start..=end).contains(&ch))
    }
}

/// Reorders syllables in place. Returns true if any glyph moved.
pub fn reorder_syllables(buffer: &mut Buffer, script: Script) -> bool {
    let chars = match syllable_chars(script) {
        Some(chars) => chars,
        None => return false,
    };
    let mut reordered = false;
    let mut start = 0;
    let len = buffer.len();
    while start < len {
        let end = syllable_end(&buffer.glyphs, chars, start, len);
        if end - start > 1 {
            reordered |= reorder_one(&mut buffer.glyphs[start..end], chars);
        }
        start = end;
    }
    reordered
}

/// Returns the exclusive end of the syllable starting at `start`: an
/// initial consonant (or any other character), followed by halant +
/// consonant extensions and trailing dependent signs.
fn syllable_end(glyphs: &[GlyphData], chars: &SyllableChars, start: usize, len: usize) -> usize {
    let mut i = start + 1;
    let mut after_halant = false;
    while i < len {
        let ch = glyphs[i].codepoint;
        if ch == chars.halant {
            after_halant = true;
            i += 1;
        } else if chars.is_consonant(ch) {
            if !after_halant {
                break;
            }
            after_halant = false;
            i += 1;
        } else if is_dependent_sign(ch) || chars.pre_base.contains(&ch) {
            after_halant = false;
            i += 1;
        } else {
            break;
        }
    }
    i
}

/// Dependent vowel signs and syllable modifiers for the covered blocks.
fn is_dependent_sign(ch: u32) -> bool {
    matches!(
        ch,
        0x900..=0x903 | 0x93A..=0x94C | 0x951..=0x957
            | 0x981..=0x983 | 0x9BE..=0x9CC | 0x9D7
            | 0xA01..=0xA03 | 0xA3E..=0xA4C
            | 0xA81..=0xA83 | 0xABE..=0xACC
            | 0xB01..=0xB03 | 0xB3E..=0xB4C | 0xB56..=0xB57
            | 0xB82 | 0xBBE..=0xBCC | 0xBD7
            | 0xC01..=0xC04 | 0xC3E..=0xC4C | 0xC55..=0xC56
            | 0xC81..=0xC83 | 0xCBE..=0xCCC | 0xCD5..=0xCD6
            | 0xD01..=0xD03 | 0xD3E..=0xD4C | 0xD57
            | 0xD81..=0xD83 | 0xDCF..=0xDDF | 0xDF2..=0xDF3
            | 0x17B6..=0x17D1 | 0x17DD
            | 0x102B..=0x103E | 0x1056..=0x1059
    )
}

fn reorder_one(syllable: &mut [GlyphData], chars: &SyllableChars) -> bool {
    let mut moved = false;
    // Move pre-base vowel signs to the front of the syllable.
    let mut i = 0;
    while i < syllable.len() {
        if chars.pre_base.contains(&syllable[i].codepoint) && i > 0 {
            syllable[..=i].rotate_right(1);
            moved = true;
        }
        i += 1;
    }
    // An initial ra + halant forms a reph and moves behind the last
    // consonant.
    if chars.has_reph
        && syllable.len() > 2
        && syllable[0].codepoint == chars.ra
        && syllable[1].codepoint == chars.halant
        && chars.is_consonant(syllable[2].codepoint)
    {
        let mut target = syllable.len();
        for (i, g) in syllable.iter().enumerate().skip(2) {
            if !chars.is_consonant(g.codepoint) && g.codepoint != chars.halant {
                target = i;
                break;
            }
        }
        syllable[..target].rotate_left(2);
        moved = true;
    }
    if moved {
        let cluster = syllable.iter().map(|g| g.cluster).min().unwrap_or(0);
        for g in syllable.iter_mut() {
            g.cluster = cluster;
        }
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_buffer(codepoints: &[u32]) -> Buffer {
        let mut buffer = Buffer::new();
        for (i, &ch) in codepoints.iter().enumerate() {
            buffer.push(ch, i as u32, (i + 1) as u16, !0);
        }
        buffer
    }

    #[test]
    fn devanagari_pre_base_vowel_moves() {
        // ka + vowel sign i: the vowel renders before the consonant.
        let mut buffer = make_buffer(&[0x915, 0x93F]);
        assert!(reorder_syllables(&mut buffer, Script::Devanagari));
        assert_eq!(buffer.glyphs[0].codepoint, 0x93F);
        assert_eq!(buffer.glyphs[1].codepoint, 0x915);
        // Clusters merged to keep monotonic order.
        assert_eq!(buffer.glyphs[0].cluster, 0);
        assert_eq!(buffer.glyphs[1].cluster, 0);
    }

    #[test]
    fn devanagari_reph_moves_after_base() {
        // ra + halant + ka: the reph moves behind the base consonant.
        let mut buffer = make_buffer(&[0x930, 0x94D, 0x915]);
        assert!(reorder_syllables(&mut buffer, Script::Devanagari));
        assert_eq!(buffer.glyphs[0].codepoint, 0x915);
        assert_eq!(buffer.glyphs[1].codepoint, 0x930);
        assert_eq!(buffer.glyphs[2].codepoint, 0x94D);
    }

    #[test]
    fn unrelated_scripts_untouched() {
        let mut buffer = make_buffer(&['a' as u32, 'b' as u32]);
        assert!(!reorder_syllables(&mut buffer, Script::Latin));
        assert_eq!(buffer.glyphs[0].codepoint, 'a' as u32);
    }
}
