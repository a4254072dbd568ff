//! The in-memory table the dataframe operators evaluate against.
//!
//! Columns keep their insertion order and are uniform in length. Operators
//! never mutate a frame; every group-by or sort pass works on index
//! vectors.

use rustc_hash::FxHashMap;

use crate::error::RuleError;
use crate::value::CellValue;

#[derive(Debug, Clone, Default)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Vec<CellValue>>,
    index: FxHashMap<String, usize>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from `(name, cells)` pairs. Fails when a name repeats
    /// or the columns disagree on length.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = (S, Vec<CellValue>)>,
        S: Into<String>,
    {
        let mut frame = Self::new();
        for (name, cells) in columns {
            frame.push_column(name.into(), cells)?;
        }
        Ok(frame)
    }

    pub fn push_column(&mut self, name: String, cells: Vec<CellValue>) -> Result<(), RuleError> {
        if self.index.contains_key(&name) {
            return Err(RuleError::payload("frame", format!("duplicate column `{name}`")));
        }
        if !self.columns.is_empty() && cells.len() != self.nrows() {
            return Err(RuleError::payload(
                "frame",
                format!(
                    "column `{name}` has {} rows, expected {}",
                    cells.len(),
                    self.nrows()
                ),
            ));
        }
        self.index.insert(name.clone(), self.columns.len());
        self.names.push(name);
        self.columns.push(cells);
        Ok(())
    }

    pub fn nrows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[CellValue]> {
        self.index.get(name).map(|&i| self.columns[i].as_slice())
    }

    /// Column names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn row(&self, idx: usize) -> RowView<'_> {
        RowView { frame: self, idx }
    }
}

/// A borrowed view of one row, handed to value-level-metadata predicates.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    frame: &'a Frame,
    idx: usize,
}

impl<'a> RowView<'a> {
    pub fn index(&self) -> usize {
        self.idx
    }

    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        self.frame.column(column).map(|col| &col[self.idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|&v| CellValue::from(v)).collect()
    }

    #[test]
    fn build_and_read() {
        let frame = Frame::from_columns([
            ("AEDECOD", cells(&["HEADACHE", "NAUSEA"])),
            ("AESEV", cells(&["MILD", "SEVERE"])),
        ])
        .unwrap();
        assert_eq!(frame.nrows(), 2);
        assert_eq!(frame.ncols(), 2);
        assert!(frame.has_column("AESEV"));
        assert_eq!(frame.column("AEDECOD").unwrap()[1], CellValue::from("NAUSEA"));
        assert_eq!(
            frame.row(0).get("AESEV"),
            Some(&CellValue::from("MILD"))
        );
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = Frame::from_columns([
            ("A", cells(&["x"])),
            ("B", cells(&["x", "y"])),
        ])
        .unwrap_err();
        assert!(matches!(err, RuleError::InvalidPayload { .. }));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Frame::from_columns([("A", cells(&["x"])), ("A", cells(&["y"]))]).unwrap_err();
        assert!(matches!(err, RuleError::InvalidPayload { .. }));
    }

    #[test]
    fn names_keep_insertion_order() {
        let frame = Frame::from_columns([
            ("TSVAL", vec![]),
            ("TSVAL1", vec![]),
            ("TSVAL2", vec![]),
        ])
        .unwrap();
        let names: Vec<_> = frame.names().collect();
        assert_eq!(names, vec!["TSVAL", "TSVAL1", "TSVAL2"]);
    }
}
