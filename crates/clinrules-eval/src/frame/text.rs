//! String-part, regex, and length operators.

use regex::Regex;
use rustc_hash::FxHashSet;

use clinrules_common::{CellValue, RuleError};

use super::compare::clinical_eq;
use super::{Comparand, DataframeValue, FrameArgs, Verdict};
use crate::utils::{ComparisonOp, vectorized_apply_regex, vectorized_len};

/// First `len` characters; an over-long request takes the whole string.
fn prefix_of(s: &str, len: usize) -> String {
    s.chars().take(len).collect()
}

/// Last `len` characters; an over-long request takes the whole string.
fn suffix_of(s: &str, len: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(len)).collect()
}

fn compile(pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|e| RuleError::argument("regex", e))
}

impl DataframeValue {
    /// The string-part operators demand string cells throughout the target.
    fn string_target<'a>(&'a self, args: &FrameArgs) -> Result<Vec<&'a str>, RuleError> {
        let name = self.target_name(args)?;
        let column = self
            .frame
            .column(&name)
            .ok_or_else(|| RuleError::MissingColumn(name.clone()))?;
        column
            .iter()
            .map(|cell| match cell {
                CellValue::Str(s) => Ok(s.as_str()),
                other => Err(RuleError::precondition(format!(
                    "column `{name}` holds non-string cell `{other}`"
                ))),
            })
            .collect()
    }

    fn prefix_len(&self, args: &FrameArgs) -> Result<usize, RuleError> {
        args.prefix
            .ok_or_else(|| RuleError::precondition("operator requires a prefix length"))
    }

    fn suffix_len(&self, args: &FrameArgs) -> Result<usize, RuleError> {
        args.suffix
            .ok_or_else(|| RuleError::precondition("operator requires a suffix length"))
    }

    /// The regex the operator applies, taken verbatim from the comparator.
    fn comparator_pattern(&self, args: &FrameArgs) -> Result<Regex, RuleError> {
        let pattern = args
            .comparator
            .as_ref()
            .ok_or_else(|| RuleError::precondition("operator requires a regex comparator"))?;
        compile(&pattern.canonical())
    }

    /* ─────────────────────── substring equality ─────────────────────── */

    pub fn prefix_equal_to(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.string_target(args)?;
        let len = self.prefix_len(args)?;
        let cmp = self.require_comparand(args)?;
        Ok(self.mask(|i| prefix_of(target[i], len) == cmp.at(i).canonical()))
    }

    pub fn suffix_equal_to(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.string_target(args)?;
        let len = self.suffix_len(args)?;
        let cmp = self.require_comparand(args)?;
        Ok(self.mask(|i| suffix_of(target[i], len) == cmp.at(i).canonical()))
    }

    fn part_is_contained_by(
        &self,
        parts: &[String],
        cmp: &Comparand<'_>,
    ) -> Verdict {
        // A column of scalar cells acts as one value set; list cells make
        // the membership row-local.
        let column_set: Option<FxHashSet<String>> = match cmp {
            Comparand::Column(col) => Some(
                col.iter()
                    .filter(|cell| !matches!(cell, CellValue::List(_)))
                    .map(CellValue::canonical)
                    .collect(),
            ),
            Comparand::Literal(_) => None,
        };
        self.mask(|i| {
            let part = &parts[i];
            match cmp.at(i) {
                CellValue::List(items) => items.iter().any(|item| item.canonical() == *part),
                scalar => match &column_set {
                    Some(set) => set.contains(part),
                    None => scalar.canonical() == *part,
                },
            }
        })
    }

    pub fn prefix_is_contained_by(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.string_target(args)?;
        let len = self.prefix_len(args)?;
        let cmp = self.require_comparand(args)?;
        let parts: Vec<String> = target.iter().map(|s| prefix_of(s, len)).collect();
        Ok(self.part_is_contained_by(&parts, &cmp))
    }

    pub fn prefix_is_not_contained_by(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.prefix_is_contained_by(args)?.complement())
    }

    pub fn suffix_is_contained_by(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.string_target(args)?;
        let len = self.suffix_len(args)?;
        let cmp = self.require_comparand(args)?;
        let parts: Vec<String> = target.iter().map(|s| suffix_of(s, len)).collect();
        Ok(self.part_is_contained_by(&parts, &cmp))
    }

    pub fn suffix_is_not_contained_by(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.suffix_is_contained_by(args)?.complement())
    }

    /* ────────────────────── plain string predicates ─────────────────── */

    pub fn starts_with(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let cmp = self.require_comparand(args)?;
        Ok(self.mask(|i| target[i].canonical().starts_with(&cmp.at(i).canonical())))
    }

    pub fn ends_with(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let cmp = self.require_comparand(args)?;
        Ok(self.mask(|i| target[i].canonical().ends_with(&cmp.at(i).canonical())))
    }

    /* ─────────────────────────── regex ──────────────────────────────── */

    pub fn matches_regex(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let re = self.comparator_pattern(args)?;
        Ok(self.mask(|i| re.is_match(&target[i].canonical())))
    }

    pub fn not_matches_regex(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.matches_regex(args)?.complement())
    }

    pub fn prefix_matches_regex(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let len = self.prefix_len(args)?;
        let re = self.comparator_pattern(args)?;
        Ok(self.mask(|i| re.is_match(&prefix_of(&target[i].canonical(), len))))
    }

    pub fn not_prefix_matches_regex(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.prefix_matches_regex(args)?.complement())
    }

    pub fn suffix_matches_regex(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let len = self.suffix_len(args)?;
        let re = self.comparator_pattern(args)?;
        Ok(self.mask(|i| re.is_match(&suffix_of(&target[i].canonical(), len))))
    }

    pub fn not_suffix_matches_regex(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.suffix_matches_regex(args)?.complement())
    }

    /// Extract the first capture group from each comparator cell and check
    /// equality with the target under the clinical null rule.
    pub fn equals_string_part(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let cmp = self.require_comparand(args)?;
        let pattern = args
            .regex
            .as_deref()
            .ok_or_else(|| RuleError::precondition("operator requires a regex"))?;
        let re = compile(pattern)?;
        let extracted = match &cmp {
            Comparand::Column(col) => vectorized_apply_regex(&re, col),
            Comparand::Literal(value) => {
                let rhs = vec![value.clone(); target.len()];
                vectorized_apply_regex(&re, &rhs)
            }
        };
        Ok(self.mask(|i| {
            let part = extracted[i].clone().unwrap_or_default();
            clinical_eq(&target[i], &CellValue::Str(part), false)
        }))
    }

    /* ─────────────────────────── length ─────────────────────────────── */

    fn length_compare(&self, args: &FrameArgs, op: ComparisonOp) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let lengths = vectorized_len(target);
        let cmp = self.require_comparand(args)?;
        Ok(self.mask(|i| match comparator_length(cmp.at(i)) {
            Some(expected) => op.apply(lengths[i], expected),
            None => false,
        }))
    }

    pub fn has_equal_length(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        self.length_compare(args, ComparisonOp::Eq)
    }

    pub fn has_not_equal_length(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        self.length_compare(args, ComparisonOp::Ne)
    }

    pub fn longer_than(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        self.length_compare(args, ComparisonOp::Gt)
    }

    pub fn longer_than_or_equal_to(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        self.length_compare(args, ComparisonOp::Ge)
    }

    pub fn shorter_than(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        self.length_compare(args, ComparisonOp::Lt)
    }

    pub fn shorter_than_or_equal_to(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        self.length_compare(args, ComparisonOp::Le)
    }
}

/// An integer comparator is a length; a string comparator contributes its
/// own length. Anything else is not comparable.
fn comparator_length(cell: &CellValue) -> Option<usize> {
    match cell {
        CellValue::Int(i) => usize::try_from(*i).ok(),
        CellValue::Num(n) if n.fract() == 0.0 && *n >= 0.0 => Some(*n as usize),
        CellValue::Str(s) => Some(s.chars().count()),
        _ => None,
    }
}
