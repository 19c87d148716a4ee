//! Script identification.

use crate::internal::{raw_tag, RawTag};

/// Script of a run of text.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Script {
    Arabic,
    Armenian,
    Bengali,
    Cherokee,
    Common,
    Cyrillic,
    Devanagari,
    Ethiopic,
    Georgian,
    Greek,
    Gujarati,
    Gurmukhi,
    Han,
    Hangul,
    Hebrew,
    Hiragana,
    Inherited,
    Kannada,
    Katakana,
    Khmer,
    Lao,
    Latin,
    Malayalam,
    Mandaic,
    Myanmar,
    Nko,
    Oriya,
    Sinhala,
    Syriac,
    Tamil,
    Telugu,
    Thaana,
    Thai,
    Tibetan,
    Unknown,
}

impl Script {
    /// Returns the script for the specified character.
    pub fn from_char(ch: u32) -> Self {
        use Script::*;
        match ch {
            0x41..=0x5A | 0x61..=0x7A | 0xC0..=0x24F | 0x1E00..=0x1EFF | 0x2C60..=0x2C7F => Latin,
            0x300..=0x36F | 0x1DC0..=0x1DFF | 0x20D0..=0x20F0 | 0xFE00..=0xFE0F => Inherited,
            0x370..=0x373 | 0x375..=0x377 | 0x37A..=0x37D | 0x384..=0x3FF | 0x1F00..=0x1FFF => {
                Greek
            }
            0x400..=0x484 | 0x487..=0x52F | 0x2DE0..=0x2DFF | 0xA640..=0xA69F => Cyrillic,
            0x531..=0x58A => Armenian,
            0x591..=0x5F4 | 0xFB1D..=0xFB4F => Hebrew,
            0x600..=0x6FF | 0x750..=0x77F | 0x8A0..=0x8FF | 0xFB50..=0xFDFF | 0xFE70..=0xFEFF => {
                Arabic
            }
            0x700..=0x74F => Syriac,
            0x780..=0x7BF => Thaana,
            0x7C0..=0x7FF => Nko,
            0x840..=0x85F => Mandaic,
            0x900..=0x97F => Devanagari,
            0x980..=0x9FF => Bengali,
            0xA00..=0xA7F => Gurmukhi,
            0xA80..=0xAFF => Gujarati,
            0xB00..=0xB7F => Oriya,
            0xB80..=0xBFF => Tamil,
            0xC00..=0xC7F => Telugu,
            0xC80..=0xCFF => Kannada,
            0xD00..=0xD7F => Malayalam,
            0xD80..=0xDFF => Sinhala,
            0xE00..=0xE7F => Thai,
            0xE80..=0xEFF => Lao,
            0xF00..=0xFFF => Tibetan,
            0x1000..=0x109F | 0xA9E0..=0xA9FF | 0xAA60..=0xAA7F => Myanmar,
            0x10A0..=0x10FF | 0x2D00..=0x2D2F => Georgian,
            0x1100..=0x11FF | 0x3130..=0x318F | 0xA960..=0xA97F | 0xAC00..=0xD7FF => Hangul,
            0x1200..=0x139F | 0x2D80..=0x2DDF | 0xAB00..=0xAB2F => Ethiopic,
            0x13A0..=0x13FF | 0xAB70..=0xABBF => Cherokee,
            0x1780..=0x17FF | 0x19E0..=0x19FF => Khmer,
            0x2E80..=0x2FDF | 0x3005 | 0x3007 | 0x3400..=0x4DBF | 0x4E00..=0x9FFF
            | 0xF900..=0xFAFF | 0x20000..=0x2FA1F => Han,
            0x3041..=0x309F => Hiragana,
            0x30A0..=0x30FF | 0x31F0..=0x31FF => Katakana,
            0x0..=0x40 | 0x5B..=0x60 | 0x7B..=0xA9 | 0x2000..=0x206F | 0x3000..=0x3004 => Common,
            _ => Unknown,
        }
    }

    /// Returns the first strong script in the specified characters, if any.
    /// Common, inherited and unknown characters are not strong.
    pub fn resolve(chars: impl Iterator<Item = u32>) -> Option<Self> {
        use Script::*;
        for ch in chars {
            match Self::from_char(ch) {
                Common | Inherited | Unknown => continue,
                script => return Some(script),
            }
        }
        None
    }

    /// Returns the OpenType script tag.
    pub fn to_opentype(self) -> RawTag {
        use Script::*;
        raw_tag(match self {
            Arabic => b"arab",
            Armenian => b"armn",
            Bengali => b"bng2",
            Cherokee => b"cher",
            Cyrillic => b"cyrl",
            Devanagari => b"dev2",
            Ethiopic => b"ethi",
            Georgian => b"geor",
            Greek => b"grek",
            Gujarati => b"gjr2",
            Gurmukhi => b"gur2",
            Han => b"hani",
            Hangul => b"hang",
            Hebrew => b"hebr",
            Hiragana | Katakana => b"kana",
            Kannada => b"knd2",
            Khmer => b"khmr",
            Lao => b"lao ",
            Latin => b"latn",
            Malayalam => b"mlm2",
            Mandaic => b"mand",
            Myanmar => b"mym2",
            Nko => b"nko ",
            Oriya => b"ory2",
            Sinhala => b"sinh",
            Syriac => b"syrc",
            Tamil => b"tml2",
            Telugu => b"tel2",
            Thaana => b"thaa",
            Thai => b"thai",
            Tibetan => b"tibt",
            Common | Inherited | Unknown => b"DFLT",
        })
    }

    /// Returns true if the script is written right to left by default.
    pub fn is_rtl(self) -> bool {
        use Script::*;
        matches!(self, Arabic | Hebrew | Syriac | Thaana | Nko | Mandaic)
    }

    /// Returns true if the script uses joining (cursive connection)
    /// analysis.
    pub fn is_joined(self) -> bool {
        use Script::*;
        matches!(self, Arabic | Syriac | Mandaic | Nko)
    }

    /// Returns true if the script requires complex syllable processing.
    pub fn is_complex(self) -> bool {
        use Script::*;
        matches!(
            self,
            Bengali
                | Devanagari
                | Gujarati
                | Gurmukhi
                | Kannada
                | Khmer
                | Malayalam
                | Myanmar
                | Oriya
                | Sinhala
                | Tamil
                | Telugu
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Script;

    #[test]
    fn detection() {
        assert_eq!(Script::from_char('a' as u32), Script::Latin);
        assert_eq!(Script::from_char(0x644), Script::Arabic);
        assert_eq!(Script::from_char(0x5D0), Script::Hebrew);
        assert_eq!(Script::from_char(0x915), Script::Devanagari);
        assert_eq!(Script::from_char(' ' as u32), Script::Common);
    }

    #[test]
    fn resolve_first_strong() {
        let text = " \u{644}abc";
        assert_eq!(
            Script::resolve(text.chars().map(|c| c as u32)),
            Some(Script::Arabic)
        );
        assert_eq!(Script::resolve("  .".chars().map(|c| c as u32)), None);
    }

    #[test]
    fn direction_defaults() {
        assert!(Script::Arabic.is_rtl());
        assert!(Script::Hebrew.is_rtl());
        assert!(!Script::Latin.is_rtl());
        assert!(Script::Arabic.is_joined());
        assert!(!Script::Hebrew.is_joined());
        assert!(Script::Devanagari.is_complex());
    }
}
