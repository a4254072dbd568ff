//! End-to-end scenarios through the public API: build a wrapper, dispatch
//! an operator by name, check the verdict.

use std::collections::{HashMap, HashSet};

use clinrules_common::{CellValue, Frame};
use clinrules_eval::{
    CodelistInfo, DataframeValue, FrameArgs, GenericValue, RelationshipData, StringValue, Verdict,
};

fn col(values: &[&str]) -> Vec<CellValue> {
    values.iter().map(|&v| CellValue::from(v)).collect()
}

fn ints(values: &[i64]) -> Vec<CellValue> {
    values.iter().map(|&v| CellValue::Int(v)).collect()
}

fn mask(verdict: Verdict) -> Vec<Option<bool>> {
    match verdict {
        Verdict::Mask(m) => m,
        Verdict::Scalar(b) => panic!("expected mask, got scalar {b}"),
    }
}

fn bools(bits: &[bool]) -> Vec<Option<bool>> {
    bits.iter().map(|&b| Some(b)).collect()
}

#[test]
fn clinical_null_equality_scenario() {
    let frame = Frame::from_columns(vec![
        ("A", col(&["x", "", "x"])),
        ("B", col(&["x", "", "y"])),
    ])
    .unwrap();
    let df = DataframeValue::new(frame);
    let args = FrameArgs::new().target("A").comparator("B");
    assert_eq!(
        mask(df.evaluate("equal_to", &args).unwrap()),
        bools(&[true, false, false])
    );
    assert_eq!(
        mask(df.evaluate("not_equal_to", &args).unwrap()),
        bools(&[false, false, true])
    );
}

#[test]
fn prefix_rewrite_scenario() {
    let frame = Frame::from_columns(vec![("AEDECOD", col(&["HEADACHE"]))]).unwrap();
    let df = DataframeValue::new(frame).with_column_prefix_map(
        [("--".to_string(), "AE".to_string())].into_iter().collect(),
    );
    let args = FrameArgs::new().target("--DECOD");
    assert_eq!(mask(df.evaluate("exists", &args).unwrap()), bools(&[true]));
}

#[test]
fn rewriting_a_column_argument_by_hand_changes_nothing() {
    let frame = Frame::from_columns(vec![
        ("AEDECOD", col(&["a", "b"])),
        ("AETERM", col(&["a", "c"])),
    ])
    .unwrap();
    let df = DataframeValue::new(frame).with_column_prefix_map(
        [("--".to_string(), "AE".to_string())].into_iter().collect(),
    );
    let abstract_args = FrameArgs::new().target("--DECOD").comparator("--TERM");
    let concrete_args = FrameArgs::new().target("AEDECOD").comparator("AETERM");
    assert_eq!(
        df.evaluate("equal_to", &abstract_args).unwrap(),
        df.evaluate("equal_to", &concrete_args).unwrap()
    );
}

#[test]
fn reference_integrity_scenario() {
    let frame = Frame::from_columns(vec![("RDOMAIN", col(&["a", "c", "b"]))]).unwrap();
    let data = RelationshipData::Flat(HashMap::from([(
        "S1".to_string(),
        HashSet::from(["a".to_string(), "b".to_string()]),
    )]));
    let df = DataframeValue::new(frame).with_relationship_data(data);
    let args = FrameArgs::new().target("RDOMAIN");
    assert_eq!(
        mask(df.evaluate("is_valid_reference", &args).unwrap()),
        bools(&[true, false, true])
    );
}

#[test]
fn lag_scenario() {
    let frame = Frame::from_columns(vec![
        ("SEQ", ints(&[1, 2, 3])),
        ("USUBJID", col(&["U", "U", "U"])),
        ("A", ints(&[10, 20, 30])),
        (
            "B",
            vec![CellValue::Null, CellValue::Int(10), CellValue::Int(20)],
        ),
    ])
    .unwrap();
    let df = DataframeValue::new(frame);
    let args = FrameArgs::new()
        .target("A")
        .comparator("B")
        .within("USUBJID")
        .ordering("SEQ");
    assert_eq!(
        mask(df.evaluate("has_next_corresponding_record", &args).unwrap()),
        vec![Some(true), Some(true), None]
    );
}

#[test]
fn extensible_codelist_scenario() {
    let frame = Frame::from_columns(vec![
        ("CODELIST", col(&["C1"])),
        ("TERMS", vec![CellValue::from(vec!["x", "y"])]),
    ])
    .unwrap();
    let maps = vec![HashMap::from([(
        "C1".to_string(),
        CodelistInfo {
            extensible: true,
            allowed_terms: HashSet::from(["x".to_string()]),
        },
    )])];
    let df = DataframeValue::new(frame).with_codelist_term_maps(maps);
    let args = FrameArgs::new().target("CODELIST").comparator("TERMS");
    assert_eq!(
        mask(df.evaluate("uses_valid_codelist_terms", &args).unwrap()),
        bools(&[true])
    );
}

#[test]
fn sort_order_scenario() {
    let sorted = DataframeValue::new(
        Frame::from_columns(vec![("N", ints(&[1, 2, 3]))]).unwrap(),
    );
    let args = FrameArgs::new().target("N").order("asc");
    assert_eq!(
        mask(sorted.evaluate("is_ordered_by", &args).unwrap()),
        bools(&[true, true, true])
    );
    let shuffled = DataframeValue::new(
        Frame::from_columns(vec![("N", ints(&[2, 1, 3]))]).unwrap(),
    );
    assert_eq!(
        mask(shuffled.evaluate("is_ordered_by", &args).unwrap()),
        bools(&[false, false, true])
    );
}

#[test]
fn mask_length_matches_row_count() {
    let frame = Frame::from_columns(vec![
        ("A", col(&["x", "y", "z", ""])),
        ("B", col(&["x", "y", "w", ""])),
    ])
    .unwrap();
    let df = DataframeValue::new(frame);
    let args = FrameArgs::new().target("A").comparator("B");
    for operator in [
        "exists",
        "equal_to",
        "not_equal_to",
        "empty",
        "non_empty",
        "is_contained_by",
        "is_unique_set",
        "has_different_values",
    ] {
        let verdict = df.evaluate(operator, &args).unwrap();
        assert_eq!(
            mask(verdict).len(),
            4,
            "operator {operator} broke the mask-length invariant"
        );
    }
}

#[test]
fn catalog_serializes_for_authoring_tools() {
    let json = serde_json::to_value(DataframeValue::get_all_operators()).unwrap();
    let entries = json.as_array().unwrap();
    assert!(entries.iter().any(|entry| {
        entry["name"] == "equal_to"
            && entry["label"] == "Equal To"
            && entry["input_shape"] == "dataframe"
    }));
    let scalar = serde_json::to_value(StringValue::get_all_operators()).unwrap();
    assert!(
        scalar
            .as_array()
            .unwrap()
            .iter()
            .any(|entry| entry["label"] == "Equal To (case insensitive)")
    );
}

#[test]
fn generic_wrapper_round_trip() {
    let g = GenericValue::new(&CellValue::Num(0.1)).unwrap();
    assert!(g.evaluate("equal_to", &CellValue::Num(0.1000001)).unwrap());
    assert!(!g.evaluate("equal_to", &CellValue::Num(0.11)).unwrap());
    let g = GenericValue::new(&CellValue::from("x")).unwrap();
    assert!(
        g.evaluate("is_contained_by", &CellValue::from(vec!["x", "y"]))
            .unwrap()
    );
}
