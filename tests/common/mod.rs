//! Test font assembly: builds minimal sfnt containers with hand rolled
//! tables so shaping behavior can be exercised without font binaries.

#![allow(dead_code)]

/// Big endian table writer.
#[derive(Default)]
pub struct Writer {
    pub buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn i16(&mut self, v: i16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn bytes(&mut self, v: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(v);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

pub fn tag(s: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*s)
}

/// Builder for a complete single font file.
pub struct TestFont {
    pub glyph_count: u16,
    pub units_per_em: u16,
    pub advances: Vec<u16>,
    pub cmap: Vec<(u32, u16)>,
    pub tables: Vec<(u32, Vec<u8>)>,
}

impl TestFont {
    pub fn new(glyph_count: u16) -> Self {
        Self {
            glyph_count,
            units_per_em: 1000,
            advances: vec![500; glyph_count as usize],
            cmap: Vec::new(),
            tables: Vec::new(),
        }
    }

    /// Maps a codepoint to a glyph.
    pub fn map(&mut self, ch: char, glyph: u16) -> &mut Self {
        self.cmap.push((ch as u32, glyph));
        self
    }

    /// Sets the advance width of a glyph.
    pub fn advance(&mut self, glyph: u16, advance: u16) -> &mut Self {
        self.advances[glyph as usize] = advance;
        self
    }

    /// Adds an arbitrary table.
    pub fn table(&mut self, tag_bytes: &[u8; 4], data: Vec<u8>) -> &mut Self {
        self.tables.push((tag(tag_bytes), data));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut tables: Vec<(u32, Vec<u8>)> = vec![
            (tag(b"head"), self.head()),
            (tag(b"maxp"), self.maxp()),
            (tag(b"hhea"), self.hhea()),
            (tag(b"hmtx"), self.hmtx()),
            (tag(b"cmap"), self.cmap_table()),
        ];
        for (t, data) in &self.tables {
            tables.push((*t, data.clone()));
        }
        tables.sort_by_key(|entry| entry.0);
        let count = tables.len() as u16;
        let mut w = Writer::new();
        w.u32(0x10000);
        w.u16(count);
        // Binary search parameters are unused by the parser.
        w.u16(16).u16(4).u16(0);
        let mut offset = 12 + 16 * tables.len();
        for (t, data) in &tables {
            w.u32(*t);
            w.u32(0); // checksum
            w.u32(offset as u32);
            w.u32(data.len() as u32);
            offset += data.len();
        }
        for (_, data) in &tables {
            w.bytes(data);
        }
        w.finish()
    }

    fn head(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.u32(0x10000); // version
        w.u32(0); // revision
        w.u32(0); // checksum adjustment
        w.u32(0x5F0F3CF5); // magic
        w.u16(0); // flags
        w.u16(self.units_per_em);
        w.bytes(&[0; 16]); // created/modified
        w.i16(0).i16(-200).i16(1000).i16(800); // bounds
        w.u16(0); // mac style
        w.u16(8); // lowest rec ppem
        w.i16(2); // direction hint
        w.i16(0); // index to loc format
        w.i16(0); // glyph data format
        w.finish()
    }

    fn maxp(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.u32(0x5000);
        w.u16(self.glyph_count);
        w.finish()
    }

    fn hhea(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.u32(0x10000);
        w.i16(800).i16(-200).i16(90); // ascender, descender, line gap
        w.u16(*self.advances.iter().max().unwrap_or(&0));
        w.i16(0).i16(0).i16(0); // min lsb, min rsb, x max extent
        w.i16(1).i16(0).i16(0); // caret slope, offset
        w.bytes(&[0; 8]); // reserved
        w.i16(0); // metric data format
        w.u16(self.glyph_count); // number of h metrics
        w.finish()
    }

    fn hmtx(&self) -> Vec<u8> {
        let mut w = Writer::new();
        for &advance in &self.advances {
            w.u16(advance);
            w.i16(0);
        }
        w.finish()
    }

    fn cmap_table(&self) -> Vec<u8> {
        let mut mappings = self.cmap.clone();
        mappings.sort_by_key(|m| m.0);
        let mut w = Writer::new();
        w.u16(0); // version
        w.u16(1); // table count
        w.u16(3).u16(10); // windows, ucs-4
        w.u32(12);
        // Format 12 with one group per mapping.
        w.u16(12).u16(0);
        w.u32(16 + mappings.len() as u32 * 12); // length
        w.u32(0); // language
        w.u32(mappings.len() as u32);
        for (ch, glyph) in &mappings {
            w.u32(*ch);
            w.u32(*ch);
            w.u32(*glyph as u32);
        }
        w.finish()
    }
}

/// Assembles a GSUB or GPOS table: a DFLT script whose default language
/// system enables every feature, a feature list in the given order, and a
/// lookup list with one subtable per lookup.
///
/// Lookups are (lookup_type, lookup_flag, subtable bytes).
pub fn layout_table(features: &[(u32, &[u16])], lookups: &[(u16, u16, Vec<u8>)]) -> Vec<u8> {
    // Script list: one DFLT script with only a default language system.
    let mut script_list = Writer::new();
    script_list.u16(1);
    script_list.u32(tag(b"DFLT"));
    script_list.u16(8); // script table follows the single record
    script_list.u16(4); // default langsys offset within script table
    script_list.u16(0); // no langsys records
    script_list.u16(0); // lookup order
    script_list.u16(0xFFFF); // no required feature
    script_list.u16(features.len() as u16);
    for i in 0..features.len() {
        script_list.u16(i as u16);
    }
    let script_list = script_list.finish();

    // Feature list.
    let mut feature_list = Writer::new();
    feature_list.u16(features.len() as u16);
    let records_end = 2 + features.len() * 6;
    let mut feature_offset = records_end;
    for (t, lookup_indices) in features {
        feature_list.u32(*t);
        feature_list.u16(feature_offset as u16);
        feature_offset += 4 + lookup_indices.len() * 2;
    }
    for (_, lookup_indices) in features {
        feature_list.u16(0); // feature params
        feature_list.u16(lookup_indices.len() as u16);
        for &index in *lookup_indices {
            feature_list.u16(index);
        }
    }
    let feature_list = feature_list.finish();

    // Lookup list.
    let mut lookup_tables: Vec<Vec<u8>> = Vec::new();
    for (lookup_type, flag, subtable) in lookups {
        let mut w = Writer::new();
        w.u16(*lookup_type);
        w.u16(*flag);
        w.u16(1); // subtable count
        w.u16(8); // subtable offset
        w.bytes(subtable);
        lookup_tables.push(w.finish());
    }
    let mut lookup_list = Writer::new();
    lookup_list.u16(lookups.len() as u16);
    let mut offset = 2 + lookups.len() * 2;
    for table in &lookup_tables {
        lookup_list.u16(offset as u16);
        offset += table.len();
    }
    for table in &lookup_tables {
        lookup_list.bytes(table);
    }
    let lookup_list = lookup_list.finish();

    let mut w = Writer::new();
    w.u32(0x10000);
    let header_len = 10;
    w.u16(header_len as u16);
    w.u16((header_len + script_list.len()) as u16);
    w.u16((header_len + script_list.len() + feature_list.len()) as u16);
    w.bytes(&script_list);
    w.bytes(&feature_list);
    w.bytes(&lookup_list);
    w.finish()
}

/// Coverage table format 1 over a sorted glyph list.
pub fn coverage(glyphs: &[u16]) -> Vec<u8> {
    let mut sorted = glyphs.to_vec();
    sorted.sort_unstable();
    let mut w = Writer::new();
    w.u16(1);
    w.u16(sorted.len() as u16);
    for g in sorted {
        w.u16(g);
    }
    w.finish()
}

/// Ligature substitution subtable (GSUB type 4 format 1): a single
/// ligature per first glyph.
///
/// Each entry is (first, remaining components, ligature glyph).
pub fn ligature_subtable(ligatures: &[(u16, &[u16], u16)]) -> Vec<u8> {
    let firsts: Vec<u16> = ligatures.iter().map(|l| l.0).collect();
    let cov = coverage(&firsts);
    let count = ligatures.len();
    let mut w = Writer::new();
    w.u16(1); // format
    let header_len = 6 + count * 2;
    w.u16((header_len + total_ligset_len(ligatures)) as u16); // coverage offset
    w.u16(count as u16);
    let mut offset = header_len;
    for lig in ligatures {
        w.u16(offset as u16);
        offset += ligset_len(lig);
    }
    for (_, components, ligature) in ligatures {
        // Ligature set with a single ligature.
        w.u16(1);
        w.u16(4); // ligature offset
        w.u16(*ligature);
        w.u16(components.len() as u16 + 1);
        for &c in *components {
            w.u16(c);
        }
    }
    w.bytes(&cov);
    w.finish()
}

fn ligset_len(lig: &(u16, &[u16], u16)) -> usize {
    4 + 4 + lig.1.len() * 2
}

fn total_ligset_len(ligatures: &[(u16, &[u16], u16)]) -> usize {
    ligatures.iter().map(ligset_len).sum()
}

/// Single substitution subtable (GSUB type 1 format 2).
pub fn single_subtable(pairs: &[(u16, u16)]) -> Vec<u8> {
    let mut sorted = pairs.to_vec();
    sorted.sort_unstable_by_key(|p| p.0);
    let glyphs: Vec<u16> = sorted.iter().map(|p| p.0).collect();
    let cov = coverage(&glyphs);
    let mut w = Writer::new();
    w.u16(2); // format
    w.u16((6 + sorted.len() * 2) as u16); // coverage offset
    w.u16(sorted.len() as u16);
    for (_, replacement) in &sorted {
        w.u16(*replacement);
    }
    w.bytes(&cov);
    w.finish()
}

/// Multiple substitution subtable (GSUB type 2 format 1) expanding one
/// glyph into a sequence.
pub fn multiple_subtable(glyph: u16, sequence: &[u16]) -> Vec<u8> {
    let cov = coverage(&[glyph]);
    let mut w = Writer::new();
    w.u16(1); // format
    let seq_offset = 8;
    let seq_len = 2 + sequence.len() * 2;
    w.u16((seq_offset + seq_len) as u16); // coverage offset
    w.u16(1); // sequence count
    w.u16(seq_offset as u16);
    w.u16(sequence.len() as u16);
    for &g in sequence {
        w.u16(g);
    }
    w.bytes(&cov);
    w.finish()
}

/// Pair positioning subtable (GPOS type 2 format 1) with an x-advance
/// adjustment on the first glyph of each pair.
pub fn pair_subtable(pairs: &[(u16, u16, i16)]) -> Vec<u8> {
    let firsts: Vec<u16> = pairs.iter().map(|p| p.0).collect();
    let cov = coverage(&firsts);
    let count = pairs.len();
    let mut w = Writer::new();
    w.u16(1); // format
    let header_len = 10 + count * 2;
    let set_len = 2 + 4; // one pair record: second glyph + value1
    w.u16((header_len + count * set_len) as u16); // coverage offset
    w.u16(0x0004); // value format 1: x advance
    w.u16(0); // value format 2
    w.u16(count as u16);
    let mut offset = header_len;
    for _ in 0..count {
        w.u16(offset as u16);
        offset += set_len;
    }
    for (_, second, adjust) in pairs {
        w.u16(1); // pair count
        w.u16(*second);
        w.i16(*adjust);
    }
    w.bytes(&cov);
    w.finish()
}

/// Mark to base attachment subtable (GPOS type 4 format 1) with one mark
/// class.
pub fn mark_base_subtable(
    marks: &[u16],
    bases: &[u16],
    mark_anchor: (i16, i16),
    base_anchor: (i16, i16),
) -> Vec<u8> {
    let mark_cov = coverage(marks);
    let base_cov = coverage(bases);
    let mut w = Writer::new();
    // Header: format, mark coverage, base coverage, class count, mark
    // array, base array.
    let header_len = 12;
    let mark_array_len = 2 + marks.len() * 4 + 6;
    let base_array_len = 2 + bases.len() * 2 + 6;
    w.u16(1);
    w.u16((header_len + mark_array_len + base_array_len) as u16);
    w.u16((header_len + mark_array_len + base_array_len + mark_cov.len()) as u16);
    w.u16(1); // class count
    w.u16(header_len as u16);
    w.u16((header_len + mark_array_len) as u16);
    // Mark array: every mark in class 0 sharing one anchor.
    w.u16(marks.len() as u16);
    let anchor_offset = 2 + marks.len() * 4;
    for _ in marks {
        w.u16(0); // class
        w.u16(anchor_offset as u16);
    }
    w.u16(1).i16(mark_anchor.0).i16(mark_anchor.1); // anchor format 1
    // Base array: one anchor per base.
    w.u16(bases.len() as u16);
    let anchor_offset = 2 + bases.len() * 2;
    for _ in bases {
        w.u16(anchor_offset as u16);
    }
    w.u16(1).i16(base_anchor.0).i16(base_anchor.1);
    w.bytes(&mark_cov);
    w.bytes(&base_cov);
    w.finish()
}

/// Cursive attachment subtable (GPOS type 3 format 1).
///
/// Each record is (glyph, entry anchor, exit anchor).
pub fn cursive_subtable(
    records: &[(u16, Option<(i16, i16)>, Option<(i16, i16)>)],
) -> Vec<u8> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| r.0);
    let glyphs: Vec<u16> = sorted.iter().map(|r| r.0).collect();
    let cov = coverage(&glyphs);
    let header_len = 6 + sorted.len() * 4;
    let mut anchors = Writer::new();
    let mut offsets = Vec::new();
    for (_, entry, exit) in &sorted {
        let mut anchor = |point: &Option<(i16, i16)>| match point {
            Some((x, y)) => {
                let offset = header_len + anchors.len();
                anchors.u16(1).i16(*x).i16(*y);
                offset as u16
            }
            None => 0,
        };
        let entry = anchor(entry);
        let exit = anchor(exit);
        offsets.push((entry, exit));
    }
    let mut w = Writer::new();
    w.u16(1); // format
    w.u16((header_len + anchors.len()) as u16); // coverage offset
    w.u16(sorted.len() as u16);
    for (entry, exit) in offsets {
        w.u16(entry);
        w.u16(exit);
    }
    w.bytes(&anchors.buf);
    w.bytes(&cov);
    w.finish()
}

/// Chained context subtable (format 3) matching the glyph sequence and
/// dispatching nested lookups at the given sequence positions.
pub fn chain_context3_subtable(input: &[u16], nested: &[(u16, u16)]) -> Vec<u8> {
    let coverages: Vec<Vec<u8>> = input.iter().map(|&g| coverage(&[g])).collect();
    let header_len = 2 + 2 + 2 + input.len() * 2 + 2 + 2 + nested.len() * 4;
    let mut w = Writer::new();
    w.u16(3); // format
    w.u16(0); // backtrack count
    w.u16(input.len() as u16);
    let mut offset = header_len;
    for cov in &coverages {
        w.u16(offset as u16);
        offset += cov.len();
    }
    w.u16(0); // lookahead count
    w.u16(nested.len() as u16);
    for (sequence_index, lookup_index) in nested {
        w.u16(*sequence_index);
        w.u16(*lookup_index);
    }
    for cov in &coverages {
        w.bytes(cov);
    }
    w.finish()
}

/// Font variations table with a single axis.
pub fn fvar_table(axis_tag: &[u8; 4], min: f32, default: f32, max: f32) -> Vec<u8> {
    let fixed = |v: f32| (v * 65536.0) as i32 as u32;
    let mut w = Writer::new();
    w.u16(1).u16(0); // version
    w.u16(16); // axes array offset
    w.u16(2); // reserved
    w.u16(1); // axis count
    w.u16(20); // axis size
    w.u16(0); // instance count
    w.u16(0); // instance size
    w.u32(tag(axis_tag));
    w.u32(fixed(min));
    w.u32(fixed(default));
    w.u32(fixed(max));
    w.u16(0); // flags
    w.u16(256); // name id
    w.finish()
}

/// HVAR table applying the same advance delta to every glyph through an
/// item variation store with one region spanning (0, 1, 1) on axis 0.
pub fn hvar_table(delta: i16, glyph_count: usize) -> Vec<u8> {
    let mut store = Writer::new();
    store.u16(1); // format
    store.u32(16); // region list offset
    store.u16(1); // data count
    store.u32(28); // data offset
    store.bytes(&[0; 4]);
    assert_eq!(store.len(), 16);
    store.u16(1); // axis count
    store.u16(1); // region count
    store.i16(0).i16(0x4000).i16(0x4000); // start, peak, end
    store.bytes(&[0; 2]);
    assert_eq!(store.len(), 28);
    store.u16(glyph_count as u16); // item count
    store.u16(1); // short delta count
    store.u16(1); // region index count
    store.u16(0); // region index
    for _ in 0..glyph_count {
        store.i16(delta);
    }
    let store = store.finish();
    let mut w = Writer::new();
    w.u32(0x10000); // version
    w.u32(20); // item variation store offset
    w.u32(0); // advance mapping: implicit glyph id indexing
    w.u32(0); // lsb mapping
    w.u32(0); // rsb mapping
    w.bytes(&store);
    w.finish()
}

/// Legacy kern table (version 0, format 0) with the specified pairs.
pub fn kern_table(pairs: &[(u16, u16, i16)]) -> Vec<u8> {
    let mut sorted = pairs.to_vec();
    sorted.sort_by_key(|p| ((p.0 as u32) << 16) | p.1 as u32);
    let mut w = Writer::new();
    w.u16(0); // version
    w.u16(1); // table count
    w.u16(0); // subtable version
    w.u16((14 + sorted.len() * 6) as u16); // length
    w.u16(1); // coverage: horizontal
    w.u16(sorted.len() as u16);
    w.bytes(&[0; 6]); // search params
    for (left, right, value) in sorted {
        w.u16(left);
        w.u16(right);
        w.i16(value);
    }
    w.finish()
}
