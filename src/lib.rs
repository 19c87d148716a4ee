/*!
Gávea is an OpenType/TrueType text shaping engine: it converts a sequence
of Unicode codepoints plus a font into a sequence of positioned glyphs.

The pipeline reads the advanced typography tables (GDEF/GSUB/GPOS, the
Apple morx/kern/trak extensions and the variation tables), compiles a
cached [shape plan](shape::ShapePlan) for each script, language and
feature selection, and applies the plan's lookups to a glyph buffer while
preserving clusters and skip marker semantics.

# Quick start

```no_run
use gavea::{shape, Face, FontRef, ShapeOptions, UnicodeBuffer};

let data = std::fs::read("font.ttf").unwrap();
let font = FontRef::load(&data).unwrap();
let mut face = Face::new(font);
let mut buffer = UnicodeBuffer::new();
buffer.add_str("A quick brown fox?", 0);
let glyphs = shape(&mut face, buffer, &ShapeOptions::default());
println!("{}", glyphs.serialize());
```

Font data is borrowed, never copied: every parsed table is a view over
the caller's bytes, and the bytes must outlive any [`FontRef`], [`Face`]
or plan derived from them.
*/

mod cache;
mod charmap;
mod error;
mod face;
mod font;
mod internal;
mod metrics;
mod setting;
mod tag;
mod variation;

pub mod shape;
pub mod text;

pub use cache::CacheKey;
pub use charmap::{Charmap, MapVariant};
pub use error::{ParseError, VariationError};
pub use face::Face;
pub use font::{FontDataRef, FontRef};
pub use metrics::{GlyphMetrics, Metrics};
pub use setting::Setting;
pub use shape::{
    shape, ClusterLevel, Direction, GlyphInfo, GlyphPosition, OutputBuffer, ShapeOptions,
    UnicodeBuffer,
};
pub use internal::var::{StatAxis, StatValue};
pub use tag::{tag_from_bytes, tag_from_str_lossy, Tag};
pub use variation::{Instance, Instances, StyleAttributes, Variation, Variations};

/// Glyph identifier.
pub type GlyphId = u16;

/// Normalized variation coordinate in 2.14 fixed point format.
pub type NormalizedCoord = i16;
