//! A font configured for shaping: normalized variation coordinates plus
//! the per face caches.

use crate::charmap::{Charmap, CharmapProxy};
use crate::metrics::{GlyphMetrics, Metrics, MetricsProxy};
use crate::setting::Setting;
use crate::shape::{Buffer, EngineMetadata, PlanBuilder, PlanCache, UnicodeBuffer};
use crate::{FontRef, NormalizedCoord};
use smallvec::SmallVec;
use tracing::trace;

const MAX_POOLED_BUFFERS: usize = 8;

/// A font plus mutable normalized axis coordinates and the shape plan
/// cache.
///
/// A face is cheap to create but carries caches that reward reuse; share
/// the underlying [`FontRef`] freely across threads and keep one face per
/// worker.
pub struct Face<'a> {
    pub(crate) font: FontRef<'a>,
    pub(crate) coords: SmallVec<[NormalizedCoord; 8]>,
    pub(crate) charmap: CharmapProxy,
    pub(crate) metrics: MetricsProxy,
    pub(crate) metadata: EngineMetadata,
    pub(crate) plans: PlanCache,
    pub(crate) builder: PlanBuilder,
    pub(crate) scratch: Buffer,
    pub(crate) selectors: Vec<(u16, u16)>,
    pool: Vec<UnicodeBuffer>,
}

impl<'a> Face<'a> {
    /// Creates a new face for the specified font at the default location
    /// in the design space.
    pub fn new(font: FontRef<'a>) -> Self {
        let mut coords = SmallVec::new();
        let axis_count = font.variations().count();
        coords.resize(axis_count, 0);
        Self {
            font,
            coords,
            charmap: CharmapProxy::from_font(&font),
            metrics: MetricsProxy::from_font(&font),
            metadata: EngineMetadata::from_font(&font),
            plans: PlanCache::new(),
            builder: PlanBuilder::default(),
            scratch: Buffer::new(),
            selectors: Vec::new(),
            pool: Vec::new(),
        }
    }

    /// Creates a new face with the specified variation settings applied.
    pub fn with_variations<I>(font: FontRef<'a>, settings: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Setting<f32>>,
    {
        let mut face = Self::new(font);
        face.set_variations(settings);
        face
    }

    /// Returns the underlying font.
    pub fn font(&self) -> &FontRef<'a> {
        &self.font
    }

    /// Sets variation coordinates from design space values. Settings for
    /// axes the font does not have are ignored.
    pub fn set_variations<I>(&mut self, settings: I)
    where
        I: IntoIterator,
        I::Item: Into<Setting<f32>>,
    {
        let variations = self.font.variations();
        for setting in settings {
            let setting = setting.into();
            match variations.find_by_tag(setting.tag) {
                Some(axis) => {
                    if let Some(slot) = self.coords.get_mut(axis.index()) {
                        *slot = axis.normalize(setting.value);
                    }
                }
                None => {
                    trace!(tag = setting.tag, "variation setting for unknown axis ignored");
                }
            }
        }
    }

    /// Sets the normalized variation coordinates directly. Extra
    /// coordinates are truncated; missing ones default to zero.
    pub fn set_normalized_coords(&mut self, coords: &[NormalizedCoord]) {
        let len = self.coords.len();
        for (slot, value) in self.coords.iter_mut().zip(coords) {
            *slot = *value;
        }
        if coords.len() < len {
            for slot in self.coords.iter_mut().skip(coords.len()) {
                *slot = 0;
            }
        }
    }

    /// Returns the current normalized variation coordinates.
    pub fn normalized_coords(&self) -> &[NormalizedCoord] {
        &self.coords
    }

    /// Returns the character map of the font.
    pub fn charmap(&self) -> Charmap<'a> {
        self.charmap.materialize(&self.font)
    }

    /// Returns the font wide metrics at the current coordinates.
    pub fn metrics(&self) -> Metrics {
        self.metrics.materialize_metrics(&self.font, &self.coords)
    }

    /// Returns the per glyph metrics at the current coordinates.
    pub fn glyph_metrics(&self) -> GlyphMetrics<'_> {
        self.metrics.materialize_glyph_metrics(&self.font, &self.coords)
    }

    /// Returns a unicode buffer, reusing a recycled one when available.
    pub fn unicode_buffer(&mut self) -> UnicodeBuffer {
        self.pool.pop().unwrap_or_default()
    }

    /// Returns a buffer to the bounded pool.
    pub(crate) fn recycle(&mut self, mut buffer: UnicodeBuffer) {
        if self.pool.len() < MAX_POOLED_BUFFERS {
            buffer.reset();
            self.pool.push(buffer);
        }
    }
}
