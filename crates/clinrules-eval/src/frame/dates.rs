//! Date validity, completeness, and component-wise comparison.

use clinrules_common::RuleError;

use super::{Comparand, DataframeValue, FrameArgs, Verdict};
use crate::utils::{
    ComparisonOp, DateComponent, vectorized_compare_dates, vectorized_is_complete_date,
    vectorized_is_valid,
};

impl DataframeValue {
    /// True where the target fails ISO 8601 parsing (partial precision is
    /// still valid; garbage and empty cells are not).
    pub fn invalid_date(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        Ok(Verdict::from_bools(
            vectorized_is_valid(target).into_iter().map(|ok| !ok),
        ))
    }

    pub fn is_complete_date(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        Ok(Verdict::from_bools(vectorized_is_complete_date(target)))
    }

    pub fn is_incomplete_date(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.is_complete_date(args)?.complement())
    }

    fn date_comparison(&self, args: &FrameArgs, op: ComparisonOp) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let cmp = self.require_comparand(args)?;
        let component = args
            .date_component
            .as_deref()
            .ok_or_else(|| RuleError::precondition("operator requires a date component"))?;
        let component = DateComponent::parse(component)?;
        let bits = match &cmp {
            Comparand::Column(col) => vectorized_compare_dates(component, target, col, op),
            Comparand::Literal(value) => {
                let rhs = vec![value.clone(); target.len()];
                vectorized_compare_dates(component, target, &rhs, op)
            }
        };
        Ok(Verdict::from_bools(bits))
    }

    pub fn date_equal_to(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        self.date_comparison(args, ComparisonOp::Eq)
    }

    pub fn date_not_equal_to(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        self.date_comparison(args, ComparisonOp::Ne)
    }

    pub fn date_less_than(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        self.date_comparison(args, ComparisonOp::Lt)
    }

    pub fn date_less_than_or_equal_to(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        self.date_comparison(args, ComparisonOp::Le)
    }

    pub fn date_greater_than(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        self.date_comparison(args, ComparisonOp::Gt)
    }

    pub fn date_greater_than_or_equal_to(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        self.date_comparison(args, ComparisonOp::Ge)
    }
}

#[cfg(test)]
mod tests {
    use clinrules_common::{CellValue, Frame};

    use super::*;

    fn col(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|&v| CellValue::from(v)).collect()
    }

    fn df(columns: Vec<(&str, Vec<CellValue>)>) -> DataframeValue {
        DataframeValue::new(Frame::from_columns(columns).unwrap())
    }

    fn mask(verdict: Verdict) -> Vec<Option<bool>> {
        match verdict {
            Verdict::Mask(m) => m,
            Verdict::Scalar(b) => panic!("expected mask, got scalar {b}"),
        }
    }

    #[test]
    fn validity_and_completeness() {
        let df = df(vec![(
            "AESTDTC",
            col(&["2021-03-15", "2021-03", "garbage", ""]),
        )]);
        let args = FrameArgs::new().target("AESTDTC");
        assert_eq!(
            mask(df.invalid_date(&args).unwrap()),
            vec![Some(false), Some(false), Some(true), Some(true)]
        );
        assert_eq!(
            mask(df.is_complete_date(&args).unwrap()),
            vec![Some(true), Some(false), Some(false), Some(false)]
        );
        assert_eq!(
            mask(df.is_incomplete_date(&args).unwrap()),
            vec![Some(false), Some(true), Some(true), Some(true)]
        );
    }

    #[test]
    fn component_comparison_between_columns() {
        let df = df(vec![
            ("AESTDTC", col(&["2021-03-15", "2021-05-01", "2021"])),
            ("AEENDTC", col(&["2021-04-20", "2021-05-30", "2021-06-01"])),
        ]);
        let args = FrameArgs::new()
            .target("AESTDTC")
            .comparator("AEENDTC")
            .date_component("month");
        assert_eq!(
            mask(df.date_less_than(&args).unwrap()),
            // Third row has no month on the left: not comparable.
            vec![Some(true), Some(false), Some(false)]
        );
        assert_eq!(
            mask(df.date_equal_to(&args).unwrap()),
            vec![Some(false), Some(true), Some(false)]
        );
        let years = FrameArgs::new()
            .target("AESTDTC")
            .comparator("AEENDTC")
            .date_component("year");
        assert_eq!(
            mask(df.date_greater_than_or_equal_to(&years).unwrap()),
            vec![Some(true), Some(true), Some(true)]
        );
    }

    #[test]
    fn comparison_against_a_literal_date() {
        let df = df(vec![("AESTDTC", col(&["2020-01-01", "2022-01-01"]))]);
        let args = FrameArgs::new()
            .target("AESTDTC")
            .comparator("2021-06-30")
            .value_is_literal(true)
            .date_component("year");
        assert_eq!(
            mask(df.date_less_than(&args).unwrap()),
            vec![Some(true), Some(false)]
        );
    }

    #[test]
    fn missing_component_is_a_precondition_error() {
        let df = df(vec![("AESTDTC", col(&["2021"]))]);
        let args = FrameArgs::new()
            .target("AESTDTC")
            .comparator("2021")
            .value_is_literal(true);
        assert!(matches!(
            df.date_equal_to(&args),
            Err(RuleError::Precondition(_))
        ));
    }
}
