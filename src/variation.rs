//! Variable font axes, named instances and style attributes.

use super::internal::{var::*, RawFont};
use super::{setting::Setting, FontRef, NormalizedCoord, Tag};

/// Iterator over the variation axes of a font.
#[derive(Copy, Clone)]
pub struct Variations<'a> {
    font: FontRef<'a>,
    fvar: Fvar<'a>,
    avar: u32,
    len: usize,
    pos: usize,
}

impl<'a> Variations<'a> {
    pub(crate) fn from_font(font: &FontRef<'a>) -> Self {
        let fvar = Fvar::from_font(font).unwrap_or_else(|| Fvar::new(&[]));
        Self {
            font: *font,
            fvar,
            avar: font.table_offset(AVAR),
            len: fvar.axis_count() as usize,
            pos: 0,
        }
    }

    fn get(&self, index: usize) -> Option<Variation<'a>> {
        Some(Variation {
            font: self.font,
            axis: self.fvar.get_axis(index as u16)?,
            avar: self.avar,
        })
    }

    /// Searches for a variation axis with the specified tag.
    pub fn find_by_tag(&self, tag: Tag) -> Option<Variation<'a>> {
        (0..self.len).filter_map(|i| self.get(i)).find(|v| v.tag() == tag)
    }

    /// Computes the full set of normalized coordinates for the specified
    /// variation settings. Settings for axes the font does not have are
    /// ignored.
    pub fn normalize<I>(&self, settings: I, coords: &mut Vec<NormalizedCoord>)
    where
        I: IntoIterator,
        I::Item: Into<Setting<f32>>,
    {
        coords.clear();
        coords.resize(self.len, 0);
        for setting in settings {
            let setting = setting.into();
            if let Some(var) = self.find_by_tag(setting.tag) {
                if let Some(slot) = coords.get_mut(var.index()) {
                    *slot = var.normalize(setting.value);
                }
            }
        }
    }
}

impl<'a> Iterator for Variations<'a> {
    type Item = Variation<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.len {
            return None;
        }
        let pos = self.pos;
        self.pos += 1;
        self.get(pos)
    }
}

/// Axis of variation in a variable font.
#[derive(Copy, Clone)]
pub struct Variation<'a> {
    font: FontRef<'a>,
    axis: VarAxis,
    avar: u32,
}

impl<'a> Variation<'a> {
    /// Returns the index of the axis.
    pub fn index(&self) -> usize {
        self.axis.index as usize
    }

    /// Returns the tag that identifies the axis.
    pub fn tag(&self) -> Tag {
        self.axis.tag
    }

    /// Returns the name identifier for the axis.
    pub fn name_id(&self) -> u16 {
        self.axis.name_id
    }

    /// Returns true if the axis should be hidden from users.
    pub fn is_hidden(&self) -> bool {
        self.axis.is_hidden()
    }

    /// Returns the minimum value of the axis.
    pub fn min_value(&self) -> f32 {
        self.axis.min.to_f32()
    }

    /// Returns the maximum value of the axis.
    pub fn max_value(&self) -> f32 {
        self.axis.max.to_f32()
    }

    /// Returns the default value of the axis.
    pub fn default_value(&self) -> f32 {
        self.axis.default.to_f32()
    }

    /// Computes a normalized coordinate for the specified value.
    pub fn normalize(&self, value: f32) -> NormalizedCoord {
        let avar = (self.avar != 0).then_some((self.font.data, self.avar));
        self.axis
            .normalized_coord(super::internal::fixed::Fixed::from_f32(value), avar)
    }
}

/// Iterator over the named variation instances of a font.
#[derive(Copy, Clone)]
pub struct Instances<'a> {
    font: FontRef<'a>,
    fvar: Fvar<'a>,
    avar: u32,
    len: usize,
    pos: usize,
}

impl<'a> Instances<'a> {
    pub(crate) fn from_font(font: &FontRef<'a>) -> Self {
        let fvar = Fvar::from_font(font).unwrap_or_else(|| Fvar::new(&[]));
        Self {
            font: *font,
            fvar,
            avar: font.table_offset(AVAR),
            len: fvar.instance_count() as usize,
            pos: 0,
        }
    }

    fn get(&self, index: usize) -> Option<Instance<'a>> {
        Some(Instance {
            parent: *self,
            inner: self.fvar.get_instance(index as u16)?,
        })
    }
}

impl<'a> Iterator for Instances<'a> {
    type Item = Instance<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.len {
            return None;
        }
        let pos = self.pos;
        self.pos += 1;
        self.get(pos)
    }
}

/// Named instance in a variable font.
#[derive(Copy, Clone)]
pub struct Instance<'a> {
    parent: Instances<'a>,
    inner: VarInstance<'a>,
}

impl<'a> Instance<'a> {
    /// Returns the index of the instance.
    pub fn index(&self) -> usize {
        self.inner.index as usize
    }

    /// Returns the name identifier for the instance.
    pub fn name_id(&self) -> u16 {
        self.inner.name_id
    }

    /// Returns the PostScript name identifier for the instance, if
    /// present.
    pub fn postscript_name_id(&self) -> Option<u16> {
        self.inner.postscript_name_id
    }

    /// Returns an iterator over the design space values of the instance.
    pub fn values(&self) -> impl Iterator<Item = f32> + 'a {
        self.inner.values.iter().map(|v| v.to_f32())
    }

    /// Returns an iterator over the normalized coordinates of the
    /// instance.
    pub fn normalized_coords(&self) -> impl Iterator<Item = NormalizedCoord> + 'a {
        let avar = if self.parent.avar != 0 {
            Some((self.parent.font.data, self.parent.avar))
        } else {
            None
        };
        let fvar = self.parent.fvar;
        (0..fvar.axis_count())
            .map(move |i| fvar.get_axis(i).unwrap_or_default())
            .zip(self.inner.values)
            .map(move |(axis, value)| axis.normalized_coord(value, avar))
    }
}

/// Iterator over the style attribute axis values of a font.
#[derive(Copy, Clone)]
pub struct StyleAttributes<'a> {
    stat: Option<Stat<'a>>,
    pos: u16,
}

impl<'a> StyleAttributes<'a> {
    pub(crate) fn from_font(font: &FontRef<'a>) -> Self {
        Self {
            stat: Stat::from_font(font),
            pos: 0,
        }
    }

    /// Returns the design axis record at the specified index.
    pub fn axis(&self, index: u16) -> Option<StatAxis> {
        self.stat?.axis(index)
    }
}

impl<'a> Iterator for StyleAttributes<'a> {
    type Item = StatValue;

    fn next(&mut self) -> Option<Self::Item> {
        let stat = self.stat?;
        while self.pos < stat.value_count() {
            let pos = self.pos;
            self.pos += 1;
            if let Some(value) = stat.value(pos) {
                return Some(value);
            }
        }
        None
    }
}

impl<'a> FontRef<'a> {
    /// Returns an iterator over the variation axes of the font.
    pub fn variations(&self) -> Variations<'a> {
        Variations::from_font(self)
    }

    /// Returns an iterator over the named variation instances of the font.
    pub fn instances(&self) -> Instances<'a> {
        Instances::from_font(self)
    }

    /// Returns an iterator over the style attribute values of the font.
    pub fn style_attributes(&self) -> StyleAttributes<'a> {
        StyleAttributes::from_font(self)
    }
}
