//! Font and metric variation tables.

use super::{fixed::Fixed, raw_tag, Array, Bytes, RawFont, RawTag, U24};

pub const FVAR: RawTag = raw_tag(b"fvar");
pub const AVAR: RawTag = raw_tag(b"avar");
pub const HVAR: RawTag = raw_tag(b"HVAR");
pub const VVAR: RawTag = raw_tag(b"VVAR");
pub const MVAR: RawTag = raw_tag(b"MVAR");
pub const STAT: RawTag = raw_tag(b"STAT");

/// Font variations table.
#[derive(Copy, Clone)]
pub struct Fvar<'a> {
    data: Bytes<'a>,
    axis_offset: u16,
    axis_count: u16,
    axis_size: u16,
    inst_count: u16,
    inst_size: u16,
}

impl<'a> Fvar<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        let b = Bytes::new(data);
        Self {
            data: b,
            axis_offset: b.read_or_default(4),
            axis_count: b.read_or_default(8),
            axis_size: b.read_or_default(10),
            inst_count: b.read_or_default(12),
            inst_size: b.read_or_default(14),
        }
    }

    pub fn from_font(font: impl RawFont<'a>) -> Option<Self> {
        Some(Self::new(font.table_data(FVAR)?))
    }

    pub fn axis_count(&self) -> u16 {
        self.axis_count
    }

    pub fn get_axis(&self, index: u16) -> Option<VarAxis> {
        if index >= self.axis_count {
            return None;
        }
        let b = &self.data;
        let offset = self.axis_offset as usize + index as usize * self.axis_size as usize;
        Some(VarAxis {
            index,
            tag: b.read::<u32>(offset)?,
            min: Fixed(b.read::<i32>(offset + 4)?),
            default: Fixed(b.read::<i32>(offset + 8)?),
            max: Fixed(b.read::<i32>(offset + 12)?),
            flags: b.read::<u16>(offset + 16)?,
            name_id: b.read::<u16>(offset + 18)?,
        })
    }

    pub fn get_axis_by_tag(&self, tag: RawTag) -> Option<VarAxis> {
        (0..self.axis_count)
            .filter_map(|i| self.get_axis(i))
            .find(|axis| axis.tag == tag)
    }

    pub fn instance_count(&self) -> u16 {
        self.inst_count
    }

    pub fn get_instance(&self, index: u16) -> Option<VarInstance<'a>> {
        if index >= self.inst_count {
            return None;
        }
        let b = &self.data;
        let base =
            self.axis_offset as usize + self.axis_count as usize * self.axis_size as usize;
        let offset = base + index as usize * self.inst_size as usize;
        let name_id = b.read::<u16>(offset)?;
        let values = b.read_array::<Fixed>(offset + 4, self.axis_count as usize)?;
        let ps_name_offset = 4 + self.axis_count as usize * 4;
        let postscript_name_id = if ps_name_offset + 2 == self.inst_size as usize {
            b.read::<u16>(offset + ps_name_offset)
        } else {
            None
        };
        Some(VarInstance {
            index,
            name_id,
            postscript_name_id,
            values,
        })
    }
}

/// Axis of variation in a variable font.
#[derive(Copy, Clone, Default)]
pub struct VarAxis {
    pub index: u16,
    pub tag: RawTag,
    pub name_id: u16,
    pub flags: u16,
    pub min: Fixed,
    pub default: Fixed,
    pub max: Fixed,
}

impl VarAxis {
    /// Returns true if the axis should be hidden in a user interface.
    pub fn is_hidden(&self) -> bool {
        self.flags & 1 != 0
    }

    /// Returns a normalized axis coordinate for the specified value in 2.14
    /// fixed point format, applying the `avar` mapping when present.
    pub fn normalized_coord(&self, mut value: Fixed, avar: Option<(&[u8], u32)>) -> i16 {
        use core::cmp::Ordering::*;
        value = value.max(self.min).min(self.max);
        value = match value.cmp(&self.default) {
            Less => {
                if self.default == self.min {
                    Fixed::ZERO
                } else {
                    -((self.default - value) / (self.default - self.min))
                }
            }
            Greater => {
                if self.max == self.default {
                    Fixed::ZERO
                } else {
                    (value - self.default) / (self.max - self.default)
                }
            }
            Equal => Fixed::ZERO,
        };
        value = value.min(Fixed::ONE).max(-Fixed::ONE);
        value = avar
            .and_then(|(data, avar)| adjust_axis(data, avar, self.index, value))
            .unwrap_or(value);
        value.to_f2dot14()
    }
}

/// Named instance in a variable font.
#[derive(Copy, Clone)]
pub struct VarInstance<'a> {
    pub index: u16,
    pub name_id: u16,
    pub postscript_name_id: Option<u16>,
    pub values: Array<'a, Fixed>,
}

/// Applies the segment map of the axis variation table to a normalized
/// coordinate. Mappings are piecewise linear between (from, to) pairs.
pub fn adjust_axis(data: &[u8], avar: u32, axis: u16, coord: Fixed) -> Option<Fixed> {
    if avar == 0 {
        return None;
    }
    let b = Bytes::new(data);
    let axis_count = b.read::<u16>(avar as usize + 6)?;
    if axis >= axis_count {
        return None;
    }
    // Walk the variable size segment maps to the requested axis.
    let mut offset = avar as usize + 8;
    for _ in 0..axis {
        let pairs = b.read::<u16>(offset)? as usize;
        offset += 2 + pairs * 4;
    }
    let pairs = b.read::<u16>(offset)? as usize;
    offset += 2;
    if pairs == 0 {
        return Some(coord);
    }
    let coord14 = coord.to_f2dot14() as i32;
    let mut prev = None;
    for i in 0..pairs {
        let rec = offset + i * 4;
        let from = b.read::<i16>(rec)? as i32;
        let to = b.read::<i16>(rec + 2)? as i32;
        if coord14 == from {
            return Some(Fixed::from_f2dot14(to as i16));
        }
        if coord14 < from {
            return match prev {
                Some((pf, pt)) if from != pf => {
                    let mapped = pt + (to - pt) * (coord14 - pf) / (from - pf);
                    Some(Fixed::from_f2dot14(mapped as i16))
                }
                _ => Some(coord),
            };
        }
        prev = Some((from, to));
    }
    // Past the last mapped point.
    match prev {
        Some((_, to)) => Some(Fixed::from_f2dot14(to as i16)),
        None => Some(coord),
    }
}

/// Computes the scalar for a single region axis: 1 at the peak (or when the
/// axis has no influence), 0 outside [start, end], with linear ramps from
/// start to peak and peak to end.
fn axis_scalar(start: Fixed, peak: Fixed, end: Fixed, coord: Fixed) -> Fixed {
    const ZERO: Fixed = Fixed::ZERO;
    if start > peak || peak > end {
        return Fixed::ONE;
    }
    if start < ZERO && end > ZERO && peak != ZERO {
        return Fixed::ONE;
    }
    if peak == ZERO || coord == peak {
        return Fixed::ONE;
    }
    if coord < start || coord > end {
        return ZERO;
    }
    if coord < peak {
        (coord - start) / (peak - start)
    } else {
        (end - coord) / (end - peak)
    }
}

/// Returns a delta from an item variation store at the specified offset,
/// selecting variation data `outer` and delta set entry `inner`.
pub fn item_delta(data: &[u8], offset: u32, outer: u16, inner: u16, coords: &[i16]) -> Option<Fixed> {
    if offset == 0 {
        return None;
    }
    let b = Bytes::new(data);
    let store = offset as usize;
    if outer >= b.read::<u16>(store + 6)? {
        return None;
    }
    let region_base = store + b.read::<u32>(store + 2)? as usize;
    let axis_count = b.read::<u16>(region_base)? as usize;
    let region_count = b.read::<u16>(region_base + 2)? as usize;
    let region_size = axis_count * 6;
    let data_base = store + b.read::<u32>(store + 8 + outer as usize * 4)? as usize;
    let short_count = b.read::<u16>(data_base + 2)? as usize;
    let region_index_count = b.read::<u16>(data_base + 4)? as usize;
    let region_indices = data_base + 6;
    let row_len = region_index_count + short_count;
    let row = region_indices + region_index_count * 2 + inner as usize * row_len;
    let mut delta = Fixed::ZERO;
    let mut value_offset = row;
    for i in 0..region_index_count {
        let value = if i < short_count {
            let v = b.read::<i16>(value_offset)?;
            value_offset += 2;
            v
        } else {
            let v = b.read::<i8>(value_offset)? as i16;
            value_offset += 1;
            v
        };
        let region_index = b.read::<u16>(region_indices + i * 2)? as usize;
        if region_index >= region_count {
            return None;
        }
        let region = region_base + 4 + region_index * region_size;
        let mut scalar = Fixed::ONE;
        for axis in 0..axis_count {
            let rec = region + axis * 6;
            let start = Fixed::from_f2dot14(b.read::<i16>(rec)?);
            let peak = Fixed::from_f2dot14(b.read::<i16>(rec + 2)?);
            let end = Fixed::from_f2dot14(b.read::<i16>(rec + 4)?);
            let coord = coords
                .get(axis)
                .map(|c| Fixed::from_f2dot14(*c))
                .unwrap_or(Fixed::ZERO);
            scalar = scalar * axis_scalar(start, peak, end, coord);
            if scalar == Fixed::ZERO {
                break;
            }
        }
        delta += scalar * Fixed::from_i32(value as i32);
    }
    Some(delta)
}

/// Translates a glyph id through a delta set index map, returning the
/// (outer, inner) pair. Glyphs past the end of the map reuse the last entry.
fn delta_set_index(b: &Bytes, offset: usize, glyph_id: u16) -> Option<(u16, u16)> {
    let format = b.read::<u16>(offset)? as u32;
    let count = b.read::<u16>(offset + 2)?;
    if count == 0 {
        return None;
    }
    let inner_bits = (format & 0xF) + 1;
    let entry_size = ((format & 0x30) >> 4) + 1;
    let index = glyph_id.min(count - 1) as usize;
    let base = offset + 4;
    let entry = match entry_size {
        1 => b.read::<u8>(base + index)? as u32,
        2 => b.read::<u16>(base + index * 2)? as u32,
        3 => b.read::<U24>(base + index * 3)?.0,
        4 => b.read::<u32>(base + index * 4)?,
        _ => return None,
    };
    Some(((entry >> inner_bits) as u16, (entry & ((1 << inner_bits) - 1)) as u16))
}

/// Returns a per-glyph delta from a metric variation table (`HVAR` or
/// `VVAR`). `which` selects the table-relative offset of the mapping:
/// 8 for advances, 12 for side bearings.
fn metric_delta(data: &[u8], base: u32, which: usize, glyph_id: u16, coords: &[i16]) -> Option<Fixed> {
    if base == 0 {
        return None;
    }
    let b = Bytes::new(data);
    let store = b.read::<u32>(base as usize + 4)?;
    if store == 0 {
        return None;
    }
    let store = store + base;
    let map_offset = b.read::<u32>(base as usize + which)? as usize;
    if map_offset == 0 {
        // No mapping: the glyph id indexes the first variation data
        // directly. Only valid for advances.
        if which == 8 {
            return item_delta(data, store, 0, glyph_id, coords);
        }
        return None;
    }
    let (outer, inner) = delta_set_index(&b, base as usize + map_offset, glyph_id)?;
    item_delta(data, store, outer, inner, coords)
}

/// Returns the advance delta for the specified glyph.
pub fn advance_delta(data: &[u8], xvar: u32, glyph_id: u16, coords: &[i16]) -> f32 {
    metric_delta(data, xvar, 8, glyph_id, coords)
        .map(|d| d.to_f32())
        .unwrap_or(0.)
}

/// Returns the side bearing delta for the specified glyph.
pub fn sb_delta(data: &[u8], xvar: u32, glyph_id: u16, coords: &[i16]) -> f32 {
    metric_delta(data, xvar, 12, glyph_id, coords)
        .map(|d| d.to_f32())
        .unwrap_or(0.)
}

/// Metrics variation table.
pub struct Mvar<'a> {
    data: Bytes<'a>,
    coords: &'a [i16],
    rec_size: usize,
    rec_count: usize,
    store: u32,
}

impl<'a> Mvar<'a> {
    pub fn new(data: &'a [u8], mvar: u32, coords: &'a [i16]) -> Option<Self> {
        let b = Bytes::slice_from(data, mvar as usize)?;
        let rec_size = b.read::<u16>(6)? as usize;
        let rec_count = b.read::<u16>(8)? as usize;
        let store = b.read::<u16>(10)? as u32;
        if rec_count == 0 || store == 0 {
            return None;
        }
        Some(Self {
            data: b,
            coords,
            rec_size,
            rec_count,
            store,
        })
    }

    /// Returns the delta for the metric identified by the specified tag.
    pub fn delta(&self, metric: RawTag) -> f32 {
        self.read_delta(metric).map(|d| d.to_f32()).unwrap_or(0.)
    }

    fn read_delta(&self, metric: RawTag) -> Option<Fixed> {
        let b = &self.data;
        let base = 12;
        let mut lo = 0;
        let mut hi = self.rec_count;
        while lo < hi {
            use core::cmp::Ordering::*;
            let i = (lo + hi) / 2;
            let rec = base + i * self.rec_size;
            let tag = b.read::<u32>(rec)?;
            match metric.cmp(&tag) {
                Less => hi = i,
                Greater => lo = i + 1,
                Equal => {
                    let outer = b.read::<u16>(rec + 4)?;
                    let inner = b.read::<u16>(rec + 6)?;
                    return item_delta(b.data(), self.store, outer, inner, self.coords);
                }
            }
        }
        None
    }
}

/// Tags for metrics from the `MVAR` table.
pub mod mvar_tags {
    use super::{raw_tag, RawTag};

    /// Horizontal ascender.
    pub const HASC: RawTag = raw_tag(b"hasc");
    /// Horizontal descender.
    pub const HDSC: RawTag = raw_tag(b"hdsc");
    /// Horizontal line gap.
    pub const HLGP: RawTag = raw_tag(b"hlgp");
    /// Vertical ascender.
    pub const VASC: RawTag = raw_tag(b"vasc");
    /// Vertical descender.
    pub const VDSC: RawTag = raw_tag(b"vdsc");
    /// Vertical line gap.
    pub const VLGP: RawTag = raw_tag(b"vlgp");
    /// X-height.
    pub const XHGT: RawTag = raw_tag(b"xhgt");
    /// Cap height.
    pub const CPHT: RawTag = raw_tag(b"cpht");
    /// Underline offset.
    pub const UNDO: RawTag = raw_tag(b"undo");
    /// Underline size.
    pub const UNDS: RawTag = raw_tag(b"unds");
    /// Strikeout offset.
    pub const STRO: RawTag = raw_tag(b"stro");
    /// Strikeout size.
    pub const STRS: RawTag = raw_tag(b"strs");
}

/// Style attributes table.
#[derive(Copy, Clone)]
pub struct Stat<'a> {
    data: Bytes<'a>,
    axis_size: u16,
    axis_count: u16,
    axis_offset: u32,
    value_count: u16,
    value_offset: u32,
}

impl<'a> Stat<'a> {
    pub fn new(data: &'a [u8]) -> Option<Self> {
        let b = Bytes::new(data);
        Some(Self {
            data: b,
            axis_size: b.read::<u16>(4)?,
            axis_count: b.read::<u16>(6)?,
            axis_offset: b.read::<u32>(8)?,
            value_count: b.read::<u16>(12)?,
            value_offset: b.read::<u32>(14)?,
        })
    }

    pub fn from_font(font: impl RawFont<'a>) -> Option<Self> {
        Self::new(font.table_data(STAT)?)
    }

    pub fn axis_count(&self) -> u16 {
        self.axis_count
    }

    /// Returns the design axis record at the specified index.
    pub fn axis(&self, index: u16) -> Option<StatAxis> {
        if index >= self.axis_count {
            return None;
        }
        let offset = self.axis_offset as usize + index as usize * self.axis_size as usize;
        Some(StatAxis {
            tag: self.data.read::<u32>(offset)?,
            name_id: self.data.read::<u16>(offset + 4)?,
            ordering: self.data.read::<u16>(offset + 6)?,
        })
    }

    pub fn value_count(&self) -> u16 {
        self.value_count
    }

    /// Returns the axis value record at the specified index. Format 4
    /// records carry multiple axis/value pairs; only the first is reported.
    pub fn value(&self, index: u16) -> Option<StatValue> {
        if index >= self.value_count {
            return None;
        }
        let b = &self.data;
        let base = self.value_offset as usize;
        let offset = base + b.read::<u16>(base + index as usize * 2)? as usize;
        let format = b.read::<u16>(offset)?;
        Some(match format {
            1 | 3 => StatValue {
                axis_index: b.read::<u16>(offset + 2)?,
                flags: b.read::<u16>(offset + 4)?,
                name_id: b.read::<u16>(offset + 6)?,
                value: Fixed(b.read::<i32>(offset + 8)?).to_f32(),
                linked_value: if format == 3 {
                    Some(Fixed(b.read::<i32>(offset + 12)?).to_f32())
                } else {
                    None
                },
            },
            2 => StatValue {
                axis_index: b.read::<u16>(offset + 2)?,
                flags: b.read::<u16>(offset + 4)?,
                name_id: b.read::<u16>(offset + 6)?,
                value: Fixed(b.read::<i32>(offset + 8)?).to_f32(),
                linked_value: None,
            },
            4 => {
                let count = b.read::<u16>(offset + 2)?;
                if count == 0 {
                    return None;
                }
                StatValue {
                    axis_index: b.read::<u16>(offset + 8)?,
                    flags: b.read::<u16>(offset + 4)?,
                    name_id: b.read::<u16>(offset + 6)?,
                    value: Fixed(b.read::<i32>(offset + 10)?).to_f32(),
                    linked_value: None,
                }
            }
            _ => return None,
        })
    }
}

/// Design axis record from the `STAT` table.
#[derive(Copy, Clone, Debug)]
pub struct StatAxis {
    pub tag: RawTag,
    pub name_id: u16,
    pub ordering: u16,
}

/// Axis value record from the `STAT` table, mapping a design coordinate to
/// a name identifier.
#[derive(Copy, Clone, Debug)]
pub struct StatValue {
    pub axis_index: u16,
    pub flags: u16,
    pub name_id: u16,
    pub value: f32,
    pub linked_value: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f2(v: f32) -> i16 {
        Fixed::from_f32(v).to_f2dot14()
    }

    fn scalar(start: f32, peak: f32, end: f32, coord: f32) -> f32 {
        axis_scalar(
            Fixed::from_f32(start),
            Fixed::from_f32(peak),
            Fixed::from_f32(end),
            Fixed::from_f32(coord),
        )
        .to_f32()
    }

    #[test]
    fn region_scalar_tent() {
        // Scalar is 1 at the peak and 0 outside the box.
        assert_eq!(scalar(0., 0.5, 1., 0.5), 1.0);
        assert_eq!(scalar(0., 0.5, 1., -0.25), 0.0);
        // Linear ramps on both sides, 0 at the far boundary.
        assert_eq!(scalar(0., 0.5, 1., 0.25), 0.5);
        assert_eq!(scalar(0., 0.5, 1., 0.75), 0.5);
        assert_eq!(scalar(0., 0.5, 1., 1.0), 0.0);
        // Degenerate and zero-peak regions have no influence.
        assert_eq!(scalar(0.5, 0.25, 1., 0.8), 1.0);
        assert_eq!(scalar(-1., 0., 1., 0.5), 1.0);
    }

    fn item_store_fixture() -> Vec<u8> {
        // One axis, one region (0, 1, 1), one variation data with a single
        // two byte delta of 100.
        let mut t = Vec::new();
        t.extend_from_slice(&1u16.to_be_bytes()); // format
        t.extend_from_slice(&16u32.to_be_bytes()); // region list offset
        t.extend_from_slice(&1u16.to_be_bytes()); // data count
        t.extend_from_slice(&28u32.to_be_bytes()); // data offset 0
        t.extend_from_slice(&[0; 4]); // pad to offset 16
        assert_eq!(t.len(), 16);
        // Region list
        t.extend_from_slice(&1u16.to_be_bytes()); // axis count
        t.extend_from_slice(&1u16.to_be_bytes()); // region count
        t.extend_from_slice(&f2(0.).to_be_bytes());
        t.extend_from_slice(&f2(1.).to_be_bytes());
        t.extend_from_slice(&f2(1.).to_be_bytes());
        t.extend_from_slice(&[0; 2]); // pad to offset 28
        assert_eq!(t.len(), 28);
        // Item variation data
        t.extend_from_slice(&1u16.to_be_bytes()); // item count
        t.extend_from_slice(&1u16.to_be_bytes()); // short delta count
        t.extend_from_slice(&1u16.to_be_bytes()); // region index count
        t.extend_from_slice(&0u16.to_be_bytes()); // region index 0
        t.extend_from_slice(&100i16.to_be_bytes()); // delta
        t
    }

    #[test]
    fn item_delta_scales_with_coords() {
        let store = item_store_fixture();
        let default = item_delta(&store, 0, 0, 0, &[0]).unwrap();
        assert_eq!(default.to_f32(), 0.0);
        let full = item_delta(&store, 0, 0, 0, &[f2(1.)]).unwrap();
        assert_eq!(full.to_f32(), 100.0);
        let half = item_delta(&store, 0, 0, 0, &[f2(0.5)]).unwrap();
        assert_eq!(half.to_f32(), 50.0);
    }

    #[test]
    fn avar_identity_and_segments() {
        // avar with one axis and a 3 pair map bending 0.5 -> 0.25.
        let mut t = Vec::new();
        t.extend_from_slice(&1u16.to_be_bytes()); // major
        t.extend_from_slice(&0u16.to_be_bytes()); // minor
        t.extend_from_slice(&0u16.to_be_bytes()); // reserved
        t.extend_from_slice(&1u16.to_be_bytes()); // axis count
        t.extend_from_slice(&3u16.to_be_bytes()); // pair count
        for (from, to) in [(-1.0f32, -1.0f32), (0.0, 0.0), (1.0, 0.5)] {
            t.extend_from_slice(&f2(from).to_be_bytes());
            t.extend_from_slice(&f2(to).to_be_bytes());
        }
        let mapped = adjust_axis(&t, 0, 0, Fixed::from_f32(1.0)).unwrap();
        assert_eq!(mapped.to_f32(), 0.5);
        let mapped = adjust_axis(&t, 0, 0, Fixed::from_f32(0.5)).unwrap();
        assert_eq!(mapped.to_f32(), 0.25);
        assert!(adjust_axis(&t, 0, 1, Fixed::from_f32(0.5)).is_none());
    }
}
