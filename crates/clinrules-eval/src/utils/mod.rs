//! The vectorized utility layer the dataframe operators consume.
//!
//! Everything here is a pure function over columns (`&[CellValue]`) or
//! single cells; the operators own the masks and group logic.

pub mod dates;

use regex::Regex;
use rustc_hash::FxHashSet;

use clinrules_common::{CellValue, Frame, RuleError};

pub use dates::{DateComponent, PartialDate};

/// The comparison an operator applies once both sides are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparisonOp {
    pub fn apply<T: PartialOrd>(self, left: T, right: T) -> bool {
        match self {
            Self::Eq => left == right,
            Self::Ne => left != right,
            Self::Lt => left < right,
            Self::Le => left <= right,
            Self::Gt => left > right,
            Self::Ge => left >= right,
        }
    }
}

/// ISO parse success per cell.
pub fn vectorized_is_valid(col: &[CellValue]) -> Vec<bool> {
    col.iter()
        .map(|cell| PartialDate::parse(&cell.canonical()).is_some())
        .collect()
}

/// Full year-month-day precision per cell.
pub fn vectorized_is_complete_date(col: &[CellValue]) -> Vec<bool> {
    col.iter()
        .map(|cell| {
            PartialDate::parse(&cell.canonical()).is_some_and(|date| date.is_complete())
        })
        .collect()
}

/// Compare one date component of two cells. False when either side fails to
/// parse or lacks the component.
pub fn compare_date_component(
    component: DateComponent,
    left: &CellValue,
    right: &CellValue,
    op: ComparisonOp,
) -> bool {
    let left = PartialDate::parse(&left.canonical()).and_then(|d| d.component(component));
    let right = PartialDate::parse(&right.canonical()).and_then(|d| d.component(component));
    match (left, right) {
        (Some(l), Some(r)) => op.apply(l, r),
        _ => false,
    }
}

pub fn vectorized_compare_dates(
    component: DateComponent,
    left: &[CellValue],
    right: &[CellValue],
    op: ComparisonOp,
) -> Vec<bool> {
    left.iter()
        .zip(right)
        .map(|(l, r)| compare_date_component(component, l, r, op))
        .collect()
}

/// First capture group if the pattern has one, else the whole match.
pub fn apply_regex(re: &Regex, text: &str) -> Option<String> {
    let caps = re.captures(text)?;
    let m = caps.get(1).or_else(|| caps.get(0))?;
    Some(m.as_str().to_string())
}

pub fn vectorized_apply_regex(re: &Regex, col: &[CellValue]) -> Vec<Option<String>> {
    col.iter()
        .map(|cell| apply_regex(re, &cell.canonical()))
        .collect()
}

/// Membership of each needle's canonical form in the haystack set.
pub fn vectorized_is_in(needles: &[CellValue], haystack: &FxHashSet<String>) -> Vec<bool> {
    needles
        .iter()
        .map(|cell| haystack.contains(&cell.canonical()))
        .collect()
}

/// Case-insensitive variant; the haystack must already be lowercased.
pub fn vectorized_is_in_case_insensitive(
    needles: &[CellValue],
    haystack: &FxHashSet<String>,
) -> Vec<bool> {
    needles
        .iter()
        .map(|cell| haystack.contains(&cell.canonical().to_lowercase()))
        .collect()
}

/// Look a key up in a map-valued cell. Non-map cells and missing keys yield
/// `None`.
pub fn get_dict_key<'a>(cell: &'a CellValue, key: &str) -> Option<&'a CellValue> {
    match cell {
        CellValue::Map(entries) => entries.get(key),
        _ => None,
    }
}

pub fn vectorized_get_dict_key<'a>(
    col: &'a [CellValue],
    keys: &[CellValue],
) -> Vec<Option<&'a CellValue>> {
    col.iter()
        .zip(keys)
        .map(|(cell, key)| get_dict_key(cell, &key.canonical()))
        .collect()
}

/// Character length of each cell's string form.
pub fn vectorized_len(col: &[CellValue]) -> Vec<usize> {
    col.iter()
        .map(|cell| cell.canonical().chars().count())
        .collect()
}

/// Concatenate the values of the named columns, in column order.
pub fn flatten_list(frame: &Frame, names: &[String]) -> Result<Vec<CellValue>, RuleError> {
    let mut out = Vec::new();
    for name in names {
        let col = frame
            .column(name)
            .ok_or_else(|| RuleError::MissingColumn(name.clone()))?;
        out.extend_from_slice(col);
    }
    Ok(out)
}
