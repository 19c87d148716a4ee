//! Feature tag constants and per script default feature sets.

use crate::internal::{raw_tag, RawTag};
use crate::text::Script;

// Substitution features.
pub const CCMP: RawTag = raw_tag(b"ccmp");
pub const LOCL: RawTag = raw_tag(b"locl");
pub const RVRN: RawTag = raw_tag(b"rvrn");
pub const LIGA: RawTag = raw_tag(b"liga");
pub const CLIG: RawTag = raw_tag(b"clig");
pub const RLIG: RawTag = raw_tag(b"rlig");
pub const CALT: RawTag = raw_tag(b"calt");
pub const LJMO: RawTag = raw_tag(b"ljmo");
pub const VJMO: RawTag = raw_tag(b"vjmo");
pub const TJMO: RawTag = raw_tag(b"tjmo");
pub const NUKT: RawTag = raw_tag(b"nukt");
pub const AKHN: RawTag = raw_tag(b"akhn");
pub const RKRF: RawTag = raw_tag(b"rkrf");
pub const HALF: RawTag = raw_tag(b"half");
pub const HALN: RawTag = raw_tag(b"haln");
pub const VATU: RawTag = raw_tag(b"vatu");
pub const CJCT: RawTag = raw_tag(b"cjct");
pub const ISOL: RawTag = raw_tag(b"isol");
pub const INIT: RawTag = raw_tag(b"init");
pub const MEDI: RawTag = raw_tag(b"medi");
pub const MED2: RawTag = raw_tag(b"med2");
pub const FINA: RawTag = raw_tag(b"fina");
pub const FIN2: RawTag = raw_tag(b"fin2");
pub const FIN3: RawTag = raw_tag(b"fin3");
pub const MSET: RawTag = raw_tag(b"mset");
pub const RCLT: RawTag = raw_tag(b"rclt");
pub const RPHF: RawTag = raw_tag(b"rphf");
pub const PREF: RawTag = raw_tag(b"pref");
pub const ABVF: RawTag = raw_tag(b"abvf");
pub const BLWF: RawTag = raw_tag(b"blwf");
pub const PSTF: RawTag = raw_tag(b"pstf");
pub const PRES: RawTag = raw_tag(b"pres");
pub const ABVS: RawTag = raw_tag(b"abvs");
pub const BLWS: RawTag = raw_tag(b"blws");
pub const PSTS: RawTag = raw_tag(b"psts");

// Positioning features.
pub const KERN: RawTag = raw_tag(b"kern");
pub const DIST: RawTag = raw_tag(b"dist");
pub const ABVM: RawTag = raw_tag(b"abvm");
pub const BLWM: RawTag = raw_tag(b"blwm");
pub const CURS: RawTag = raw_tag(b"curs");
pub const MARK: RawTag = raw_tag(b"mark");
pub const MKMK: RawTag = raw_tag(b"mkmk");

const COMMON: &[RawTag] = &[
    CCMP, LOCL, RVRN, LIGA, CLIG, CALT, RLIG, KERN, DIST, MARK, MKMK,
];

const JOINED: &[RawTag] = &[
    CCMP, LOCL, RVRN, LIGA, CLIG, CALT, RLIG, MSET, RCLT, ISOL, INIT, MEDI, MED2, FINA, FIN2,
    FIN3, KERN, DIST, CURS, MARK, MKMK,
];

const HANGUL: &[RawTag] = &[CCMP, LOCL, RVRN, LJMO, VJMO, TJMO, KERN, DIST, MARK, MKMK];

const COMPLEX: &[RawTag] = &[
    CCMP, LOCL, RVRN, NUKT, AKHN, RPHF, RKRF, PREF, BLWF, ABVF, HALF, PSTF, VATU, CJCT, PRES,
    ABVS, BLWS, PSTS, HALN, CALT, CLIG, LIGA, RLIG, KERN, DIST, ABVM, BLWM, MARK, MKMK,
];

/// Returns the default feature set for the specified script.
pub fn default_features(script: Script) -> &'static [RawTag] {
    if script == Script::Hangul {
        HANGUL
    } else if script.is_joined() {
        JOINED
    } else if script.is_complex() {
        COMPLEX
    } else {
        COMMON
    }
}

/// Returns true if the feature applies per glyph based on the joining
/// analysis rather than globally.
pub fn is_joining_feature(tag: RawTag) -> bool {
    matches!(tag, ISOL | INIT | MEDI | MED2 | FINA | FIN2 | FIN3)
}
