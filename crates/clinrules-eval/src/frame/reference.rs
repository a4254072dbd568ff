//! Reference-data integrity: foreign-key style checks against the
//! wrapper's relationship data.

use clinrules_common::{CellValue, RuleError};

use super::{DataframeValue, FrameArgs, RelationshipData, Verdict};

impl RelationshipData {
    /// Is `value` among the referents — under one context when given, else
    /// anywhere?
    fn contains_referent(&self, context: Option<&str>, value: &str) -> bool {
        match (self, context) {
            (RelationshipData::Flat(map), None) => {
                map.values().any(|referents| referents.contains(value))
            }
            (RelationshipData::Flat(map), Some(ctx)) => {
                map.get(ctx).is_some_and(|referents| referents.contains(value))
            }
            (RelationshipData::ByContext(map), Some(ctx)) => map
                .get(ctx)
                .is_some_and(|inner| inner.values().any(|referents| referents.contains(value))),
            (RelationshipData::ByContext(map), None) => map
                .values()
                .any(|inner| inner.values().any(|referents| referents.contains(value))),
        }
    }

    /// Does `referent` appear under `key` (within one context when given)?
    fn relation_holds(&self, context: Option<&str>, key: &str, referent: &str) -> bool {
        match self {
            RelationshipData::Flat(map) => {
                map.get(key).is_some_and(|referents| referents.contains(referent))
            }
            RelationshipData::ByContext(map) => match context {
                Some(ctx) => map
                    .get(ctx)
                    .and_then(|inner| inner.get(key))
                    .is_some_and(|referents| referents.contains(referent)),
                None => map
                    .values()
                    .any(|inner| {
                        inner.get(key).is_some_and(|referents| referents.contains(referent))
                    }),
            },
        }
    }
}

impl DataframeValue {
    fn relationship(&self) -> Result<&RelationshipData, RuleError> {
        self.relationship_data
            .as_ref()
            .ok_or_else(|| RuleError::precondition("no relationship data supplied"))
    }

    fn context_column<'a>(&'a self, args: &FrameArgs) -> Result<Option<&'a [CellValue]>, RuleError> {
        match args.context.as_deref() {
            None => Ok(None),
            Some(raw) => self.column_arg(raw).map(Some),
        }
    }

    /// Each target value must be a known referent — within the row's
    /// context when a context column is supplied.
    pub fn is_valid_reference(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let data = self.relationship()?;
        let context = self.context_column(args)?;
        Ok(self.mask(|i| {
            let ctx = context.map(|col| col[i].canonical());
            data.contains_referent(ctx.as_deref(), &target[i].canonical())
        }))
    }

    pub fn is_not_valid_reference(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.is_valid_reference(args)?.complement())
    }

    /// Look the row's target up as a key (under the row's context when
    /// given); the row's comparator value must appear among its referents.
    /// Canonical string forms absorb integer/string skew on either side.
    pub fn is_valid_relationship(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let cmp = self.require_comparand(args)?;
        let data = self.relationship()?;
        let context = self.context_column(args)?;
        Ok(self.mask(|i| {
            let ctx = context.map(|col| col[i].canonical());
            data.relation_holds(
                ctx.as_deref(),
                &target[i].canonical(),
                &cmp.at(i).canonical(),
            )
        }))
    }

    pub fn is_not_valid_relationship(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.is_valid_relationship(args)?.complement())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use clinrules_common::Frame;

    use super::*;

    fn col(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|&v| CellValue::from(v)).collect()
    }

    fn referents(values: &[&str]) -> HashSet<String> {
        values.iter().map(|&v| v.to_string()).collect()
    }

    fn mask(verdict: Verdict) -> Vec<Option<bool>> {
        match verdict {
            Verdict::Mask(m) => m,
            Verdict::Scalar(b) => panic!("expected mask, got scalar {b}"),
        }
    }

    #[test]
    fn reference_without_context_searches_all_referents() {
        let frame = Frame::from_columns(vec![("RDOMAIN", col(&["a", "c", "b"]))]).unwrap();
        let data = RelationshipData::Flat(HashMap::from([(
            "S1".to_string(),
            referents(&["a", "b"]),
        )]));
        let df = DataframeValue::new(frame).with_relationship_data(data);
        let args = FrameArgs::new().target("RDOMAIN");
        assert_eq!(
            mask(df.is_valid_reference(&args).unwrap()),
            vec![Some(true), Some(false), Some(true)]
        );
        assert_eq!(
            mask(df.is_not_valid_reference(&args).unwrap()),
            vec![Some(false), Some(true), Some(false)]
        );
    }

    #[test]
    fn reference_with_context_narrows_the_keyspace() {
        let frame = Frame::from_columns(vec![
            ("IDVARVAL", col(&["1", "1"])),
            ("RDOMAIN", col(&["AE", "CM"])),
        ])
        .unwrap();
        let data = RelationshipData::Flat(HashMap::from([
            ("AE".to_string(), referents(&["1", "2"])),
            ("CM".to_string(), referents(&["9"])),
        ]));
        let df = DataframeValue::new(frame).with_relationship_data(data);
        let args = FrameArgs::new().target("IDVARVAL").context("RDOMAIN");
        assert_eq!(
            mask(df.is_valid_reference(&args).unwrap()),
            vec![Some(true), Some(false)]
        );
    }

    #[test]
    fn relationship_tolerates_integer_string_skew() {
        let frame = Frame::from_columns(vec![
            ("IDVAR", col(&["AESEQ", "AESEQ", "AESEQ"])),
            (
                "IDVARVAL",
                vec![CellValue::Int(1), CellValue::from("2"), CellValue::Int(3)],
            ),
        ])
        .unwrap();
        let data = RelationshipData::Flat(HashMap::from([(
            "AESEQ".to_string(),
            referents(&["1", "2"]),
        )]));
        let df = DataframeValue::new(frame).with_relationship_data(data);
        let args = FrameArgs::new().target("IDVAR").comparator("IDVARVAL");
        assert_eq!(
            mask(df.is_valid_relationship(&args).unwrap()),
            vec![Some(true), Some(true), Some(false)]
        );
        assert_eq!(
            mask(df.is_not_valid_relationship(&args).unwrap()),
            vec![Some(false), Some(false), Some(true)]
        );
    }

    #[test]
    fn two_level_relationship_uses_the_context_column() {
        let frame = Frame::from_columns(vec![
            ("RDOMAIN", col(&["AE", "AE"])),
            ("IDVAR", col(&["AESEQ", "AESEQ"])),
            ("IDVARVAL", col(&["1", "7"])),
        ])
        .unwrap();
        let data = RelationshipData::ByContext(HashMap::from([(
            "AE".to_string(),
            HashMap::from([("AESEQ".to_string(), referents(&["1", "2"]))]),
        )]));
        let df = DataframeValue::new(frame).with_relationship_data(data);
        let args = FrameArgs::new()
            .target("IDVAR")
            .comparator("IDVARVAL")
            .context("RDOMAIN");
        assert_eq!(
            mask(df.is_valid_relationship(&args).unwrap()),
            vec![Some(true), Some(false)]
        );
    }

    #[test]
    fn missing_relationship_data_is_a_precondition_error() {
        let frame = Frame::from_columns(vec![("A", col(&["x"]))]).unwrap();
        let df = DataframeValue::new(frame);
        assert!(matches!(
            df.is_valid_reference(&FrameArgs::new().target("A")),
            Err(RuleError::Precondition(_))
        ));
    }
}
