//! End to end shaping behavior over hand assembled fonts.

mod common;

use common::*;
use gavea::{shape, Direction, Face, FontRef, ParseError, Setting, ShapeOptions, UnicodeBuffer};

const F: u16 = 1;
const I: u16 = 2;
const FI: u16 = 3;
const A: u16 = 4;
const V: u16 = 5;

fn latin_font() -> TestFont {
    let mut font = TestFont::new(8);
    font.map('f', F)
        .map('i', I)
        .map('A', A)
        .map('V', V)
        .advance(F, 300)
        .advance(I, 250)
        .advance(FI, 480)
        .advance(A, 600)
        .advance(V, 580);
    font
}

fn shape_str(data: &[u8], text: &str, options: &ShapeOptions) -> gavea::OutputBuffer {
    let font = FontRef::load(data).unwrap();
    let mut face = Face::new(font);
    let mut buffer = UnicodeBuffer::new();
    buffer.add_str(text, 0);
    shape(&mut face, buffer, options)
}

#[test]
fn rejects_truncated_and_incomplete_fonts() {
    assert!(FontRef::load(&[0, 1, 2, 3]).is_err());
    let data = latin_font().build();
    // Chopping the data invalidates some table range.
    let truncated = &data[..data.len() - 8];
    assert!(matches!(
        FontRef::load(truncated),
        Err(ParseError::BadOffset) | Err(ParseError::OutOfBounds)
    ));
}

#[test]
fn maps_unknown_codepoints_to_notdef() {
    let data = latin_font().build();
    let output = shape_str(&data, "f?", &ShapeOptions::default());
    let ids: Vec<_> = output.glyph_ids().collect();
    assert_eq!(ids, vec![F, 0]);
    let clusters: Vec<_> = output.clusters().collect();
    assert_eq!(clusters, vec![0, 1]);
}

#[test]
fn empty_input_shapes_to_empty_output() {
    let data = latin_font().build();
    let output = shape_str(&data, "", &ShapeOptions::default());
    assert!(output.is_empty());
    assert_eq!(output.total_advance(), 0);
    assert_eq!(output.serialize(), "[]");
}

#[test]
fn liga_forms_fi_ligature_with_merged_cluster() {
    let mut font = latin_font();
    let gsub = layout_table(
        &[(tag(b"liga"), &[0])],
        &[(4, 0, ligature_subtable(&[(F, &[I], FI)]))],
    );
    font.table(b"GSUB", gsub);
    let data = font.build();
    let output = shape_str(&data, "fi", &ShapeOptions::default());
    assert_eq!(output.len(), 1);
    assert_eq!(output.glyph_infos()[0].glyph_id, FI);
    assert_eq!(output.glyph_infos()[0].cluster, 0);
    assert_eq!(output.glyph_positions()[0].x_advance, 480);
}

#[test]
fn disabling_liga_preserves_both_glyphs() {
    let mut font = latin_font();
    let gsub = layout_table(
        &[(tag(b"liga"), &[0])],
        &[(4, 0, ligature_subtable(&[(F, &[I], FI)]))],
    );
    font.table(b"GSUB", gsub);
    let data = font.build();
    let features = [Setting::from(("liga", 0u16))];
    let options = ShapeOptions {
        features: &features,
        ..Default::default()
    };
    let output = shape_str(&data, "fi", &options);
    let ids: Vec<_> = output.glyph_ids().collect();
    assert_eq!(ids, vec![F, I]);
    let clusters: Vec<_> = output.clusters().collect();
    assert_eq!(clusters, vec![0, 1]);
}

#[test]
fn feature_toggle_is_inert_for_disjoint_text() {
    let mut font = latin_font();
    let gsub = layout_table(
        &[(tag(b"liga"), &[0])],
        &[(4, 0, ligature_subtable(&[(F, &[I], FI)]))],
    );
    font.table(b"GSUB", gsub);
    let data = font.build();
    let on = shape_str(&data, "AV", &ShapeOptions::default());
    let features = [Setting::from(("liga", 0u16))];
    let off = shape_str(
        &data,
        "AV",
        &ShapeOptions {
            features: &features,
            ..Default::default()
        },
    );
    assert_eq!(on.serialize(), off.serialize());
}

#[test]
fn gpos_pair_kerning_reduces_advance() {
    let mut font = latin_font();
    let gpos = layout_table(
        &[(tag(b"kern"), &[0])],
        &[(2, 0, pair_subtable(&[(A, V, -80)]))],
    );
    font.table(b"GPOS", gpos);
    let data = font.build();
    let kerned = shape_str(&data, "AV", &ShapeOptions::default());
    assert_eq!(kerned.glyph_positions()[0].x_advance, 600 - 80);
    assert_eq!(kerned.glyph_positions()[1].x_advance, 580);
    // Without the pair, the base advance applies.
    let plain = shape_str(&data, "VA", &ShapeOptions::default());
    assert_eq!(plain.glyph_positions()[0].x_advance, 580);
}

#[test]
fn legacy_kern_fallback_applies_without_gpos() {
    let mut font = latin_font();
    font.table(b"kern", kern_table(&[(A, V, -75)]));
    let data = font.build();
    let output = shape_str(&data, "AV", &ShapeOptions::default());
    assert_eq!(output.glyph_positions()[0].x_advance, 600 - 75);
    // The kern feature setting disables the fallback as well.
    let features = [Setting::from(("kern", 0u16))];
    let output = shape_str(
        &data,
        "AV",
        &ShapeOptions {
            features: &features,
            ..Default::default()
        },
    );
    assert_eq!(output.glyph_positions()[0].x_advance, 600);
}

#[test]
fn mark_attaches_to_base_with_zero_advance() {
    const E: u16 = 6;
    const ACUTE: u16 = 7;
    let mut font = TestFont::new(8);
    font.map('e', E)
        .map('\u{301}', ACUTE)
        .advance(E, 520)
        .advance(ACUTE, 0);
    let gpos = layout_table(
        &[(tag(b"mark"), &[0])],
        &[(4, 0, mark_base_subtable(&[ACUTE], &[E], (40, 0), (260, 540)))],
    );
    font.table(b"GPOS", gpos);
    let data = font.build();
    let output = shape_str(&data, "e\u{301}", &ShapeOptions::default());
    assert_eq!(output.len(), 2);
    let mark = &output.glyph_positions()[1];
    assert_eq!(mark.x_advance, 0);
    // Anchor difference pulled back under the base: 260-40 minus the base
    // advance of 520.
    assert_eq!(mark.x_offset, 220 - 520);
    assert_eq!(mark.y_offset, 540);
    assert_eq!(mark.attach_type, 1);
    assert_eq!(output.glyph_infos()[1].glyph_class, 3);
}

#[test]
fn multiple_substitution_expands_preserving_cluster() {
    let mut font = latin_font();
    let gsub = layout_table(
        &[(tag(b"ccmp"), &[0])],
        &[(2, 0, multiple_subtable(FI, &[F, I]))],
    );
    font.table(b"GSUB", gsub);
    font.map('\u{FB01}', FI);
    let data = font.build();
    let output = shape_str(&data, "\u{FB01}x", &ShapeOptions::default());
    let ids: Vec<_> = output.glyph_ids().collect();
    assert_eq!(ids, vec![F, I, 0]);
    let clusters: Vec<_> = output.clusters().collect();
    assert_eq!(clusters, vec![0, 0, 1]);
}

#[test]
fn rtl_output_is_reversed_ltr_output() {
    let data = latin_font().build();
    let font = FontRef::load(&data).unwrap();
    let mut face = Face::new(font);
    let mut buffer = UnicodeBuffer::new();
    buffer.add_str("AVf", 0);
    let ltr = shape(&mut face, buffer, &ShapeOptions::default());
    let mut buffer = UnicodeBuffer::new();
    buffer.add_str("AVf", 0);
    buffer.set_direction(Direction::RightToLeft);
    let rtl = shape(&mut face, buffer, &ShapeOptions::default());
    let mut expected: Vec<_> = ltr.glyph_ids().collect();
    expected.reverse();
    let got: Vec<_> = rtl.glyph_ids().collect();
    assert_eq!(got, expected);
}

#[test]
fn shaping_is_deterministic() {
    let mut font = latin_font();
    let gsub = layout_table(
        &[(tag(b"liga"), &[0])],
        &[(4, 0, ligature_subtable(&[(F, &[I], FI)]))],
    );
    font.table(b"GSUB", gsub);
    let data = font.build();
    let first = shape_str(&data, "fifiAV", &ShapeOptions::default());
    let second = shape_str(&data, "fifiAV", &ShapeOptions::default());
    assert_eq!(first.serialize(), second.serialize());
}

#[test]
fn clusters_stay_monotonic_through_ligation() {
    let mut font = latin_font();
    let gsub = layout_table(
        &[(tag(b"liga"), &[0])],
        &[(4, 0, ligature_subtable(&[(F, &[I], FI)]))],
    );
    font.table(b"GSUB", gsub);
    let data = font.build();
    let output = shape_str(&data, "AfiV", &ShapeOptions::default());
    let clusters: Vec<_> = output.clusters().collect();
    let mut sorted = clusters.clone();
    sorted.sort_unstable();
    assert_eq!(clusters, sorted);
}

#[test]
fn output_digest_covers_every_glyph() {
    let data = latin_font().build();
    let output = shape_str(&data, "AVfi", &ShapeOptions::default());
    for id in output.glyph_ids() {
        assert!(output.digest().may_contain(id));
    }
}

#[test]
fn serialize_reports_gid_cluster_and_advance() {
    let data = latin_font().build();
    let output = shape_str(&data, "AV", &ShapeOptions::default());
    assert_eq!(output.serialize(), "[4=0+600, 5=1+580]");
    assert_eq!(output.total_advance(), 1180);
}

#[test]
fn arabic_lam_alef_ligature() {
    const LAM: u16 = 1;
    const ALEF: u16 = 2;
    const LAM_ALEF: u16 = 3;
    let mut font = TestFont::new(4);
    font.map('\u{644}', LAM)
        .map('\u{627}', ALEF)
        .advance(LAM, 400)
        .advance(ALEF, 300)
        .advance(LAM_ALEF, 550);
    let gsub = layout_table(
        &[(tag(b"rlig"), &[0])],
        &[(4, 0, ligature_subtable(&[(LAM, &[ALEF], LAM_ALEF)]))],
    );
    font.table(b"GSUB", gsub);
    let data = font.build();
    let output = shape_str(&data, "\u{644}\u{627}", &ShapeOptions::default());
    assert_eq!(output.len(), 1);
    assert_eq!(output.glyph_infos()[0].glyph_id, LAM_ALEF);
    assert_eq!(output.glyph_infos()[0].cluster, 0);
}

#[test]
fn cursive_attachment_joins_anchors() {
    let mut font = latin_font();
    let gpos = layout_table(
        &[(tag(b"curs"), &[0])],
        &[(
            3,
            0,
            cursive_subtable(&[
                (A, None, Some((500, 20))),
                (V, Some((0, -30)), None),
            ]),
        )],
    );
    font.table(b"GPOS", gpos);
    let data = font.build();
    let features = [Setting::from(("curs", 1u16))];
    let output = shape_str(
        &data,
        "AV",
        &ShapeOptions {
            features: &features,
            ..Default::default()
        },
    );
    // The exit glyph takes the joining advance; the entry glyph chains to
    // it and lifts by the anchor difference.
    assert_eq!(output.glyph_positions()[0].x_advance, 500);
    assert_eq!(output.glyph_positions()[1].x_advance, 580);
    assert_eq!(output.glyph_positions()[1].y_offset, 50);
    assert_eq!(output.glyph_positions()[1].attach_type, 2);
}

#[test]
fn cursive_right_to_left_flag_moves_advance_to_first_glyph() {
    let mut font = latin_font();
    // Same chain with the RightToLeft lookup flag set: the advance
    // placement follows the flag even in a left to right run.
    let gpos = layout_table(
        &[(tag(b"curs"), &[0])],
        &[(
            3,
            0x0001,
            cursive_subtable(&[
                (A, None, Some((500, 20))),
                (V, Some((0, -30)), None),
            ]),
        )],
    );
    font.table(b"GPOS", gpos);
    let data = font.build();
    let features = [Setting::from(("curs", 1u16))];
    let output = shape_str(
        &data,
        "AV",
        &ShapeOptions {
            features: &features,
            ..Default::default()
        },
    );
    assert_eq!(output.glyph_positions()[0].x_advance, 100);
    assert_eq!(output.glyph_positions()[0].x_offset, -500);
    assert_eq!(output.glyph_positions()[0].y_offset, -50);
    assert_eq!(output.glyph_positions()[0].attach_type, 2);
    assert_eq!(output.glyph_positions()[1].x_advance, 0);
}

#[test]
fn single_substitution_swaps_glyph() {
    let mut font = latin_font();
    let gsub = layout_table(
        &[(tag(b"calt"), &[0])],
        &[(1, 0, single_subtable(&[(A, V)]))],
    );
    font.table(b"GSUB", gsub);
    let data = font.build();
    let output = shape_str(&data, "Af", &ShapeOptions::default());
    let ids: Vec<_> = output.glyph_ids().collect();
    assert_eq!(ids, vec![V, F]);
}

#[test]
fn chained_context_dispatches_nested_lookup() {
    let mut font = latin_font();
    // A followed by V rewrites the A through a nested single
    // substitution; a lone A stays put.
    let gsub = layout_table(
        &[(tag(b"calt"), &[0])],
        &[
            (6, 0, chain_context3_subtable(&[A, V], &[(0, 1)])),
            (1, 0, single_subtable(&[(A, FI)])),
        ],
    );
    font.table(b"GSUB", gsub);
    let data = font.build();
    let output = shape_str(&data, "AV", &ShapeOptions::default());
    let ids: Vec<_> = output.glyph_ids().collect();
    assert_eq!(ids, vec![FI, V]);
    let output = shape_str(&data, "Af", &ShapeOptions::default());
    let ids: Vec<_> = output.glyph_ids().collect();
    assert_eq!(ids, vec![A, F]);
}

#[test]
fn hvar_advance_deltas_follow_the_weight_axis() {
    let mut font = latin_font();
    font.table(b"fvar", fvar_table(b"wght", 100.0, 400.0, 900.0));
    font.table(b"HVAR", hvar_table(100, 8));
    let data = font.build();
    let font = FontRef::load(&data).unwrap();

    // At the default location every delta is exactly zero.
    let mut face = Face::new(font);
    let mut buffer = UnicodeBuffer::new();
    buffer.add_str("A", 0);
    let output = shape(&mut face, buffer, &ShapeOptions::default());
    assert_eq!(output.glyph_positions()[0].x_advance, 600);

    // Half way up the axis the delta scales linearly.
    face.set_variations(&[("wght", 650.0)]);
    let mut buffer = UnicodeBuffer::new();
    buffer.add_str("A", 0);
    let output = shape(&mut face, buffer, &ShapeOptions::default());
    assert_eq!(output.glyph_positions()[0].x_advance, 650);

    // At the end of the axis the full delta applies.
    face.set_variations(&[("wght", 900.0)]);
    let mut buffer = UnicodeBuffer::new();
    buffer.add_str("A", 0);
    let output = shape(&mut face, buffer, &ShapeOptions::default());
    assert_eq!(output.glyph_positions()[0].x_advance, 700);

    // Settings for axes the font does not have are ignored.
    face.set_variations(&[("wdth", 50.0)]);
}

#[test]
fn collection_header_enumerates_fonts() {
    let single = latin_font().build();
    let mut ttc = Vec::new();
    ttc.extend_from_slice(b"ttcf");
    ttc.extend_from_slice(&0x10000u32.to_be_bytes());
    ttc.extend_from_slice(&2u32.to_be_bytes());
    let base = 12 + 8;
    ttc.extend_from_slice(&(base as u32).to_be_bytes());
    ttc.extend_from_slice(&(base as u32).to_be_bytes());
    ttc.extend_from_slice(&single);
    let fonts = gavea::FontDataRef::new(&ttc).unwrap();
    assert!(fonts.is_collection());
    assert_eq!(fonts.len(), 2);
    assert!(fonts.get(0).is_some());
    assert!(fonts.get(1).is_some());
}

#[test]
fn plan_reuse_keeps_results_stable() {
    let mut font = latin_font();
    let gsub = layout_table(
        &[(tag(b"liga"), &[0])],
        &[(4, 0, ligature_subtable(&[(F, &[I], FI)]))],
    );
    font.table(b"GSUB", gsub);
    let data = font.build();
    let font = FontRef::load(&data).unwrap();
    let mut face = Face::new(font);
    let mut results = Vec::new();
    for _ in 0..3 {
        let mut buffer = face.unicode_buffer();
        buffer.add_str("fi", 0);
        results.push(shape(&mut face, buffer, &ShapeOptions::default()).serialize());
    }
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}
