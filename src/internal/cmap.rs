//! Character to glyph mapping table.

use super::{raw_tag, Bytes, RawTag, Stream};

pub const CMAP: RawTag = raw_tag(b"cmap");

/// Selected character map subtable: offset, format and whether the
/// subtable uses a symbol encoding.
#[derive(Copy, Clone, Default, Debug)]
pub struct SubtableInfo {
    pub offset: u32,
    pub format: u8,
    pub is_symbol: bool,
    pub variations: u32,
}

/// Finds a suitable character map subtable for the font with the cmap table
/// at the specified offset.
///
/// Preference order: (3,10) > (0,6) > (3,1) > (0,*) > (1,0), with symbol
/// encodings (3,0) taking priority when present and a format 14 subtable
/// recorded separately for variation selectors.
pub fn subtable(data: &[u8], cmap: u32) -> Option<SubtableInfo> {
    if cmap == 0 {
        return None;
    }
    let mut s = Stream::with_offset(data, cmap as usize)?;
    s.skip(2)?;
    let len = s.read_u16()? as usize;
    let b = Bytes::new(s.data());
    let mut best: Option<(u32, u32, u8)> = None;
    let mut symbol = None;
    let mut variations = 0u32;
    for _ in 0..len {
        let platform = s.read_u16()?;
        let encoding = s.read_u16()?;
        let offset = s.read_u32()?;
        let format = b.read_u16(offset as usize)? as u8;
        let offset = cmap.checked_add(offset)?;
        if format == 14 && platform == 0 && encoding == 5 {
            variations = offset;
            continue;
        }
        if format != 4 && format != 6 && format != 12 {
            continue;
        }
        if platform == 3 && encoding == 0 {
            symbol = Some((offset, format));
            continue;
        }
        let rank = match (platform, encoding) {
            (3, 10) => 5,
            (0, 6) => 4,
            (3, 1) => 3,
            (0, _) => 2,
            (1, 0) => 1,
            _ => 0,
        };
        if rank != 0 && best.map(|(r, ..)| rank > r).unwrap_or(true) {
            best = Some((rank, offset, format));
        }
    }
    if let Some((offset, format)) = symbol {
        return Some(SubtableInfo {
            offset,
            format,
            is_symbol: true,
            variations,
        });
    }
    let (_, offset, format) = best?;
    Some(SubtableInfo {
        offset,
        format,
        is_symbol: false,
        variations,
    })
}

/// Maps a codepoint to a glyph identifier.
pub fn map(data: &[u8], subtable: u32, format: u8, codepoint: u32) -> Option<u16> {
    if subtable == 0 {
        return None;
    }
    let b = Bytes::slice_from(data, subtable as usize)?;
    match format {
        4 => map_format4(&b, codepoint),
        6 => map_format6(&b, codepoint),
        12 => map_format12(&b, codepoint),
        _ => None,
    }
}

fn map_format4(b: &Bytes, codepoint: u32) -> Option<u16> {
    if codepoint > 0xFFFF {
        return None;
    }
    let c = codepoint as u16;
    let segcount_x2 = b.read_u16(6)? as usize;
    let segcount = segcount_x2 / 2;
    b.ensure_range(0, 16 + segcount_x2 * 4)?;
    let end_codes = 14;
    let start_codes = end_codes + segcount_x2 + 2;
    let deltas = start_codes + segcount_x2;
    let ranges = deltas + segcount_x2;
    let mut lo = 0;
    let mut hi = segcount;
    while lo < hi {
        let i = (lo + hi) / 2;
        let i2 = i * 2;
        if c < b.read_u16(start_codes + i2)? {
            hi = i;
        } else if c > b.read_u16(end_codes + i2)? {
            lo = i + 1;
        } else {
            let start = b.read_u16(start_codes + i2)?;
            let delta = b.read_i16(deltas + i2)? as i32;
            let range = b.read_u16(ranges + i2)? as usize;
            if range == 0 {
                return Some((codepoint as i32 + delta) as u16);
            }
            let id_offset = ranges + i2 + range + (c - start) as usize * 2;
            let id = b.read_u16(id_offset).unwrap_or(0);
            return Some(if id != 0 { (id as i32 + delta) as u16 } else { 0 });
        }
    }
    None
}

fn map_format6(b: &Bytes, codepoint: u32) -> Option<u16> {
    let first = b.read_u16(6)? as u32;
    let count = b.read_u16(8)? as u32;
    let index = codepoint.checked_sub(first)?;
    if index >= count {
        return None;
    }
    b.read_u16(10 + index as usize * 2)
}

fn map_format12(b: &Bytes, codepoint: u32) -> Option<u16> {
    let base = 16;
    let len = b.read_u32(12)? as usize;
    b.ensure_range(base, len.checked_mul(12)?)?;
    let mut lo = 0;
    let mut hi = len;
    while lo < hi {
        let i = (lo + hi) / 2;
        let rec = base + i * 12;
        if codepoint < b.read_u32(rec)? {
            hi = i;
        } else if codepoint > b.read_u32(rec + 4)? {
            lo = i + 1;
        } else {
            let start = b.read_u32(rec)?;
            let delta = b.read_u32(rec + 8)?;
            return Some((codepoint - start + delta) as u16);
        }
    }
    None
}

/// Result of mapping a codepoint with a variation selector.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MapVariant {
    /// Use the default glyph mapping.
    UseDefault,
    /// Use the specified variant.
    Variant(u16),
}

/// Maps a codepoint with a variation selector to a glyph identifier using
/// the format 14 subtable at the specified offset in data.
pub fn map_variant(
    data: &[u8],
    offset: u32,
    codepoint: u32,
    variation_selector: u32,
) -> Option<MapVariant> {
    use core::cmp::Ordering;
    if offset == 0 {
        return None;
    }
    let b = Bytes::slice_from(data, offset as usize)?;
    let len = b.read_u32(6)? as usize;
    let base = 10;
    let mut lo = 0;
    let mut hi = len;
    let mut default_uvs = 0;
    let mut non_default_uvs = 0;
    while lo < hi {
        let i = (lo + hi) / 2;
        let rec = base + i * 11;
        let vs = b.read_u24(rec)?;
        match variation_selector.cmp(&vs) {
            Ordering::Less => hi = i,
            Ordering::Greater => lo = i + 1,
            Ordering::Equal => {
                default_uvs = b.read_u32(rec + 3)? as usize;
                non_default_uvs = b.read_u32(rec + 7)? as usize;
                break;
            }
        }
    }
    if default_uvs != 0 {
        let len = b.read_u32(default_uvs)? as usize;
        let mut lo = 0;
        let mut hi = len;
        while lo < hi {
            let i = (lo + hi) / 2;
            let rec = default_uvs + 4 + i * 4;
            let start = b.read_u24(rec)?;
            if codepoint < start {
                hi = i;
            } else if codepoint > start + b.read_u8(rec + 3)? as u32 {
                lo = i + 1;
            } else {
                return Some(MapVariant::UseDefault);
            }
        }
    }
    if non_default_uvs != 0 {
        let len = b.read_u32(non_default_uvs)? as usize;
        let mut lo = 0;
        let mut hi = len;
        while lo < hi {
            let i = (lo + hi) / 2;
            let rec = non_default_uvs + 4 + i * 5;
            let value = b.read_u24(rec)?;
            match codepoint.cmp(&value) {
                Ordering::Less => hi = i,
                Ordering::Greater => lo = i + 1,
                Ordering::Equal => return Some(MapVariant::Variant(b.read_u16(rec + 3)?)),
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format4_fixture() -> Vec<u8> {
        // One mapped segment 0x41..=0x43 with delta so that 'A' -> glyph 1,
        // plus the required 0xFFFF terminator segment.
        let mut t = Vec::new();
        t.extend_from_slice(&4u16.to_be_bytes()); // format
        t.extend_from_slice(&32u16.to_be_bytes()); // length
        t.extend_from_slice(&0u16.to_be_bytes()); // language
        t.extend_from_slice(&4u16.to_be_bytes()); // segcount * 2
        t.extend_from_slice(&[0; 6]); // search params
        t.extend_from_slice(&0x43u16.to_be_bytes()); // end codes
        t.extend_from_slice(&0xFFFFu16.to_be_bytes());
        t.extend_from_slice(&0u16.to_be_bytes()); // reserved pad
        t.extend_from_slice(&0x41u16.to_be_bytes()); // start codes
        t.extend_from_slice(&0xFFFFu16.to_be_bytes());
        t.extend_from_slice(&(-0x40i16).to_be_bytes()); // deltas
        t.extend_from_slice(&1i16.to_be_bytes());
        t.extend_from_slice(&0u16.to_be_bytes()); // range offsets
        t.extend_from_slice(&0u16.to_be_bytes());
        t
    }

    #[test]
    fn format4_maps_segment() {
        let table = format4_fixture();
        assert_eq!(map(&table, 0, 4, 'A' as u32), Some(1));
        assert_eq!(map(&table, 0, 4, 'C' as u32), Some(3));
        assert_eq!(map(&table, 0, 4, 'D' as u32), None);
    }

    #[test]
    fn format6_trimmed() {
        let mut t = Vec::new();
        t.extend_from_slice(&6u16.to_be_bytes());
        t.extend_from_slice(&14u16.to_be_bytes()); // length
        t.extend_from_slice(&0u16.to_be_bytes()); // language
        t.extend_from_slice(&0x61u16.to_be_bytes()); // first code
        t.extend_from_slice(&2u16.to_be_bytes()); // count
        t.extend_from_slice(&7u16.to_be_bytes());
        t.extend_from_slice(&8u16.to_be_bytes());
        assert_eq!(map(&t, 0, 6, 0x61), Some(7));
        assert_eq!(map(&t, 0, 6, 0x62), Some(8));
        assert_eq!(map(&t, 0, 6, 0x63), None);
        assert_eq!(map(&t, 0, 6, 0x60), None);
    }

    #[test]
    fn format12_groups() {
        let mut t = Vec::new();
        t.extend_from_slice(&12u16.to_be_bytes());
        t.extend_from_slice(&[0; 10]); // reserved, length, language
        t.extend_from_slice(&1u32.to_be_bytes()); // group count
        t.extend_from_slice(&0x1F600u32.to_be_bytes());
        t.extend_from_slice(&0x1F602u32.to_be_bytes());
        t.extend_from_slice(&100u32.to_be_bytes());
        assert_eq!(map(&t, 0, 12, 0x1F601), Some(101));
        assert_eq!(map(&t, 0, 12, 0x1F603), None);
    }
}
