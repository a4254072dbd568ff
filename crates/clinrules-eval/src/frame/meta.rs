//! Value-level metadata conformance and the map-valued metadata lookups.

use clinrules_common::{CellValue, RowView, RuleError};

use super::{Comparand, DataframeValue, FrameArgs, ValueLevelMetadata, Verdict};
use crate::utils::vectorized_get_dict_key;

impl DataframeValue {
    /// OR across VLM records of `hit(record, row)`.
    fn vlm_mask(&self, hit: impl Fn(&ValueLevelMetadata, &RowView<'_>) -> bool) -> Verdict {
        self.mask(|i| {
            let row = self.frame.row(i);
            self.value_level_metadata
                .iter()
                .any(|record| hit(record, &row))
        })
    }

    /// Rows where some VLM record applies and its data-type check fails.
    pub fn non_conformant_value_data_type(&self, _args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.vlm_mask(|record, row| (record.filter)(row) && !(record.type_check)(row)))
    }

    /// Rows where some VLM record applies and its data-type check holds.
    pub fn conformant_value_data_type(&self, _args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.vlm_mask(|record, row| (record.filter)(row) && (record.type_check)(row)))
    }

    pub fn non_conformant_value_length(&self, _args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.vlm_mask(|record, row| (record.filter)(row) && !(record.length_check)(row)))
    }

    pub fn conformant_value_length(&self, _args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.vlm_mask(|record, row| (record.filter)(row) && (record.length_check)(row)))
    }

    /* ─────────────────── map-valued cell lookups ────────────────────── */

    /// Each comparator cell maps values to reference counts; the row is
    /// flagged when its target value is referenced more than once.
    pub fn value_has_multiple_references(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let counts = self.require_comparand(args)?;
        let literal_store;
        let counts_col: &[CellValue] = match &counts {
            Comparand::Column(col) => col,
            Comparand::Literal(value) => {
                literal_store = vec![value.clone(); target.len()];
                &literal_store
            }
        };
        let values = vectorized_get_dict_key(counts_col, target);
        Ok(self.mask(|i| {
            values[i]
                .and_then(|count| count.to_f64())
                .is_some_and(|count| count > 1.0)
        }))
    }

    pub fn value_does_not_have_multiple_references(
        &self,
        args: &FrameArgs,
    ) -> Result<Verdict, RuleError> {
        Ok(self.value_has_multiple_references(args)?.complement())
    }

    /// Look the row's target value up in the metadata column's map cell and
    /// compare against the comparator.
    pub fn variable_metadata_equal_to(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let cmp = self.require_comparand(args)?;
        let metadata_name = args
            .metadata
            .as_deref()
            .ok_or_else(|| RuleError::precondition("operator requires a metadata column"))?;
        let metadata = self.column_arg(metadata_name)?;
        let values = vectorized_get_dict_key(metadata, target);
        Ok(self.mask(|i| {
            values[i].is_some_and(|value| value.loose_eq(cmp.at(i), false))
        }))
    }

    pub fn variable_metadata_not_equal_to(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.variable_metadata_equal_to(args)?.complement())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use clinrules_common::{CellValue, Frame};

    use super::*;

    fn col(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|&v| CellValue::from(v)).collect()
    }

    fn mask(verdict: Verdict) -> Vec<Option<bool>> {
        match verdict {
            Verdict::Mask(m) => m,
            Verdict::Scalar(b) => panic!("expected mask, got scalar {b}"),
        }
    }

    fn map(entries: &[(&str, CellValue)]) -> CellValue {
        CellValue::Map(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn vlm_record() -> ValueLevelMetadata {
        // Applies to VSORRES rows where VSTESTCD is HEIGHT: the result must
        // be numeric text no longer than 3 characters.
        ValueLevelMetadata {
            filter: Arc::new(|row| {
                row.get("VSTESTCD")
                    .is_some_and(|cell| cell.canonical() == "HEIGHT")
            }),
            type_check: Arc::new(|row| {
                row.get("VSORRES")
                    .is_some_and(|cell| cell.to_f64().is_some())
            }),
            length_check: Arc::new(|row| {
                row.get("VSORRES")
                    .is_some_and(|cell| cell.canonical().chars().count() <= 3)
            }),
        }
    }

    #[test]
    fn vlm_conformance_masks() {
        let frame = Frame::from_columns(vec![
            ("VSTESTCD", col(&["HEIGHT", "HEIGHT", "WEIGHT"])),
            ("VSORRES", col(&["180", "tall", "80.55"])),
        ])
        .unwrap();
        let df = DataframeValue::new(frame).with_value_level_metadata(vec![vlm_record()]);
        let args = FrameArgs::new().target("VSORRES");
        // Row 1 fails the type check; row 2 is outside the filter.
        assert_eq!(
            mask(df.non_conformant_value_data_type(&args).unwrap()),
            vec![Some(false), Some(true), Some(false)]
        );
        assert_eq!(
            mask(df.conformant_value_data_type(&args).unwrap()),
            vec![Some(true), Some(false), Some(false)]
        );
        assert_eq!(
            mask(df.non_conformant_value_length(&args).unwrap()),
            vec![Some(false), Some(true), Some(false)]
        );
        assert_eq!(
            mask(df.conformant_value_length(&args).unwrap()),
            vec![Some(true), Some(false), Some(false)]
        );
    }

    #[test]
    fn vlm_records_or_together() {
        let always = ValueLevelMetadata {
            filter: Arc::new(|_| true),
            type_check: Arc::new(|_| false),
            length_check: Arc::new(|_| true),
        };
        let frame = Frame::from_columns(vec![
            ("VSTESTCD", col(&["WEIGHT"])),
            ("VSORRES", col(&["80"])),
        ])
        .unwrap();
        let df = DataframeValue::new(frame)
            .with_value_level_metadata(vec![vlm_record(), always]);
        let args = FrameArgs::new().target("VSORRES");
        assert_eq!(
            mask(df.non_conformant_value_data_type(&args).unwrap()),
            vec![Some(true)]
        );
    }

    #[test]
    fn reference_counts_from_map_cells() {
        let counts = map(&[("AE", CellValue::Int(2)), ("CM", CellValue::Int(1))]);
        let frame = Frame::from_columns(vec![
            ("DOMAIN", col(&["AE", "CM", "LB"])),
            ("REFS", vec![counts.clone(), counts.clone(), counts]),
        ])
        .unwrap();
        let df = DataframeValue::new(frame);
        let args = FrameArgs::new().target("DOMAIN").comparator("REFS");
        assert_eq!(
            mask(df.value_has_multiple_references(&args).unwrap()),
            vec![Some(true), Some(false), Some(false)]
        );
        assert_eq!(
            mask(df.value_does_not_have_multiple_references(&args).unwrap()),
            vec![Some(false), Some(true), Some(true)]
        );
    }

    #[test]
    fn metadata_lookup_compares_against_comparator() {
        let meta = map(&[
            ("AETERM", CellValue::from("Char")),
            ("AESEQ", CellValue::from("Num")),
        ]);
        let frame = Frame::from_columns(vec![
            ("VARIABLE", col(&["AETERM", "AESEQ", "AESLIFE"])),
            ("META", vec![meta.clone(), meta.clone(), meta]),
        ])
        .unwrap();
        let df = DataframeValue::new(frame);
        let args = FrameArgs::new()
            .target("VARIABLE")
            .comparator("Char")
            .value_is_literal(true)
            .metadata("META");
        assert_eq!(
            mask(df.variable_metadata_equal_to(&args).unwrap()),
            vec![Some(true), Some(false), Some(false)]
        );
        assert_eq!(
            mask(df.variable_metadata_not_equal_to(&args).unwrap()),
            vec![Some(false), Some(true), Some(true)]
        );
    }
}
