//! Glyph metrics tables.

use super::{raw_tag, Bytes, RawTag};

pub const HMTX: RawTag = raw_tag(b"hmtx");
pub const VMTX: RawTag = raw_tag(b"vmtx");

/// Returns the advance for the specified glyph.
pub fn advance(data: &[u8], xmtx: u32, long_metric_count: u16, glyph_id: u16) -> u16 {
    if xmtx == 0 || long_metric_count == 0 {
        return 0;
    }
    let b = Bytes::new(data);
    let index = glyph_id.min(long_metric_count - 1) as usize;
    b.read_u16(xmtx as usize + index * 4).unwrap_or(0)
}

/// Returns the side bearing for the specified glyph.
pub fn sb(data: &[u8], xmtx: u32, long_metric_count: u16, glyph_id: u16) -> i16 {
    if xmtx == 0 || long_metric_count == 0 {
        return 0;
    }
    let b = Bytes::new(data);
    let offset = if glyph_id < long_metric_count {
        glyph_id as usize * 4 + 2
    } else {
        long_metric_count as usize * 4 + (glyph_id - long_metric_count) as usize * 2
    };
    b.read_i16(xmtx as usize + offset).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_and_short_metrics() {
        // Two long metrics followed by two trailing side bearings.
        let data = [
            0x02, 0x58, 0x00, 0x0A, // advance 600, lsb 10
            0x01, 0xF4, 0xFF, 0xF6, // advance 500, lsb -10
            0x00, 0x14, 0x00, 0x1E, // lsb 20, lsb 30
        ];
        assert_eq!(advance(&data, 0, 2, 0), 600);
        assert_eq!(advance(&data, 0, 2, 1), 500);
        // Glyphs past the long metric count reuse the last advance.
        assert_eq!(advance(&data, 0, 2, 3), 500);
        assert_eq!(sb(&data, 0, 2, 1), -10);
        assert_eq!(sb(&data, 0, 2, 2), 20);
        assert_eq!(sb(&data, 0, 2, 3), 30);
    }
}
