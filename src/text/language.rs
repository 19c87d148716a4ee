//! Language tags.

use crate::internal::{raw_tag, RawTag};
use core::fmt;

/// Representation of a language with its associated OpenType tag.
///
/// Parsed from the language subtag of a BCP-47 identifier; script and
/// region subtags are accepted and ignored for tag selection.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Language {
    language: [u8; 3],
    len: u8,
    tag: Option<RawTag>,
}

impl Language {
    /// Parses a language tag.
    pub fn parse(tag: &str) -> Option<Self> {
        let first = tag.split('-').next()?;
        let bytes = first.as_bytes();
        if !(2..=3).contains(&bytes.len()) || !bytes.iter().all(|b| b.is_ascii_alphabetic()) {
            return None;
        }
        let mut language = [0u8; 3];
        for (dst, src) in language.iter_mut().zip(bytes) {
            *dst = src.to_ascii_lowercase();
        }
        let len = bytes.len() as u8;
        let key = &language[..len as usize];
        let tag = LANGUAGES
            .iter()
            .find(|entry| entry.0.as_bytes() == key)
            .map(|entry| raw_tag(entry.1));
        Some(Self { language, len, tag })
    }

    /// Returns the language component.
    pub fn language(&self) -> &str {
        core::str::from_utf8(&self.language[..self.len as usize]).unwrap_or("")
    }

    /// Returns the associated OpenType language tag.
    pub fn to_opentype(self) -> Option<RawTag> {
        self.tag
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.language())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.language())
    }
}

// ISO 639 language subtag to OpenType language system tag for the
// languages that commonly select distinct layout behavior.
const LANGUAGES: &[(&str, &[u8; 4])] = &[
    ("aa", b"AFR "),
    ("ar", b"ARA "),
    ("az", b"AZE "),
    ("be", b"BEL "),
    ("bg", b"BGR "),
    ("bn", b"BEN "),
    ("ca", b"CAT "),
    ("cs", b"CSY "),
    ("da", b"DAN "),
    ("de", b"DEU "),
    ("el", b"ELL "),
    ("en", b"ENG "),
    ("es", b"ESP "),
    ("et", b"ETI "),
    ("fa", b"FAR "),
    ("fi", b"FIN "),
    ("fr", b"FRA "),
    ("ga", b"IRI "),
    ("he", b"IWR "),
    ("hi", b"HIN "),
    ("hr", b"HRV "),
    ("hu", b"HUN "),
    ("hy", b"HYE "),
    ("id", b"IND "),
    ("it", b"ITA "),
    ("ja", b"JAN "),
    ("ka", b"KAT "),
    ("kk", b"KAZ "),
    ("km", b"KHM "),
    ("kn", b"KAN "),
    ("ko", b"KOR "),
    ("lo", b"LAO "),
    ("lt", b"LTH "),
    ("lv", b"LVI "),
    ("mk", b"MKD "),
    ("ml", b"MAL "),
    ("mn", b"MNG "),
    ("mr", b"MAR "),
    ("my", b"BRM "),
    ("nb", b"NOR "),
    ("ne", b"NEP "),
    ("nl", b"NLD "),
    ("pa", b"PAN "),
    ("pl", b"PLK "),
    ("pt", b"PTG "),
    ("ro", b"ROM "),
    ("ru", b"RUS "),
    ("si", b"SNH "),
    ("sk", b"SKY "),
    ("sl", b"SLV "),
    ("sq", b"SQI "),
    ("sr", b"SRB "),
    ("sv", b"SVE "),
    ("ta", b"TAM "),
    ("te", b"TEL "),
    ("th", b"THA "),
    ("tr", b"TRK "),
    ("uk", b"UKR "),
    ("ur", b"URD "),
    ("vi", b"VIT "),
    ("zh", b"ZHS "),
];

#[cfg(test)]
mod tests {
    use super::Language;
    use crate::internal::raw_tag;

    #[test]
    fn parse_and_map() {
        let lang = Language::parse("tr-TR").unwrap();
        assert_eq!(lang.language(), "tr");
        assert_eq!(lang.to_opentype(), Some(raw_tag(b"TRK ")));
        let lang = Language::parse("en").unwrap();
        assert_eq!(lang.to_opentype(), Some(raw_tag(b"ENG ")));
        // Unknown languages parse but carry no OpenType tag.
        let lang = Language::parse("xx").unwrap();
        assert_eq!(lang.to_opentype(), None);
        assert!(Language::parse("").is_none());
        assert!(Language::parse("q1").is_none());
    }
}
