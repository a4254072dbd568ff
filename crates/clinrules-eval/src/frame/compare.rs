//! Existence, equality, ordering, and containment over columns.
//!
//! Equality follows the clinical null rule: where both operands are empty
//! (null or the empty string), neither `equal_to` nor `not_equal_to` holds.

use rustc_hash::FxHashSet;

use clinrules_common::{CellValue, RuleError};

use super::{Comparand, DataframeValue, FrameArgs, Verdict};
use crate::utils::{vectorized_is_in, vectorized_is_in_case_insensitive};

/// Equality under the clinical null rule, case-folded when asked.
pub(crate) fn clinical_eq(a: &CellValue, b: &CellValue, case_insensitive: bool) -> bool {
    if a.is_empty() && b.is_empty() {
        return false;
    }
    a.loose_eq(b, case_insensitive)
}

/// Inequality under the clinical null rule. Not the complement of
/// [`clinical_eq`]: both verdicts are false where both sides are empty.
pub(crate) fn clinical_ne(a: &CellValue, b: &CellValue, case_insensitive: bool) -> bool {
    if a.is_empty() && b.is_empty() {
        return false;
    }
    !a.loose_eq(b, case_insensitive)
}

fn numeric_pair(a: &CellValue, b: &CellValue) -> Option<(f64, f64)> {
    Some((a.to_f64()?, b.to_f64()?))
}

impl DataframeValue {
    pub fn exists(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let name = self.target_name(args)?;
        let present = self.frame.has_column(&name);
        Ok(self.mask(|_| present))
    }

    pub fn not_exists(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.exists(args)?.complement())
    }

    pub fn equal_to(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let cmp = self.require_comparand(args)?;
        Ok(self.mask(|i| clinical_eq(&target[i], cmp.at(i), false)))
    }

    pub fn not_equal_to(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let cmp = self.require_comparand(args)?;
        Ok(self.mask(|i| clinical_ne(&target[i], cmp.at(i), false)))
    }

    pub fn equal_to_case_insensitive(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let cmp = self.require_comparand(args)?;
        Ok(self.mask(|i| clinical_eq(&target[i], cmp.at(i), true)))
    }

    pub fn not_equal_to_case_insensitive(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let cmp = self.require_comparand(args)?;
        Ok(self.mask(|i| clinical_ne(&target[i], cmp.at(i), true)))
    }

    /* ───────────────────────── ordering ─────────────────────── */
    // Both sides coerce element-wise; a side that will not coerce makes the
    // row false. ε widens only the equality halves.

    pub fn less_than(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let cmp = self.require_comparand(args)?;
        Ok(self.mask(|i| {
            numeric_pair(&target[i], cmp.at(i)).is_some_and(|(a, b)| a < b)
        }))
    }

    pub fn less_than_or_equal_to(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let cmp = self.require_comparand(args)?;
        Ok(self.mask(|i| {
            numeric_pair(&target[i], cmp.at(i))
                .is_some_and(|(a, b)| a < b || (a - b).abs() <= 1e-6)
        }))
    }

    pub fn greater_than(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let cmp = self.require_comparand(args)?;
        Ok(self.mask(|i| {
            numeric_pair(&target[i], cmp.at(i)).is_some_and(|(a, b)| a > b)
        }))
    }

    pub fn greater_than_or_equal_to(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let cmp = self.require_comparand(args)?;
        Ok(self.mask(|i| {
            numeric_pair(&target[i], cmp.at(i))
                .is_some_and(|(a, b)| a > b || (a - b).abs() <= 1e-6)
        }))
    }

    /* ──────────────────────── containment ───────────────────── */

    fn contains_impl(&self, args: &FrameArgs, case_insensitive: bool) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let cmp = self.require_comparand(args)?;
        Ok(self.mask(|i| cell_contains(&target[i], cmp.at(i), case_insensitive)))
    }

    pub fn contains(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        self.contains_impl(args, false)
    }

    pub fn does_not_contain(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.contains(args)?.complement())
    }

    pub fn contains_case_insensitive(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        self.contains_impl(args, true)
    }

    pub fn does_not_contain_case_insensitive(
        &self,
        args: &FrameArgs,
    ) -> Result<Verdict, RuleError> {
        Ok(self.contains_case_insensitive(args)?.complement())
    }

    fn is_contained_by_impl(
        &self,
        args: &FrameArgs,
        case_insensitive: bool,
    ) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let cmp = self.require_comparand(args)?;
        let haystack = comparand_value_set(&cmp, case_insensitive);
        let hits = if case_insensitive {
            vectorized_is_in_case_insensitive(target, &haystack)
        } else {
            vectorized_is_in(target, &haystack)
        };
        Ok(Verdict::from_bools(hits))
    }

    pub fn is_contained_by(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        self.is_contained_by_impl(args, false)
    }

    pub fn is_not_contained_by(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.is_contained_by(args)?.complement())
    }

    pub fn is_contained_by_case_insensitive(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        self.is_contained_by_impl(args, true)
    }

    pub fn is_not_contained_by_case_insensitive(
        &self,
        args: &FrameArgs,
    ) -> Result<Verdict, RuleError> {
        Ok(self.is_contained_by_case_insensitive(args)?.complement())
    }
}

/// Row-local containment: membership for list cells, substring for string
/// cells, equality otherwise.
fn cell_contains(cell: &CellValue, needle: &CellValue, case_insensitive: bool) -> bool {
    match cell {
        CellValue::List(items) => items
            .iter()
            .any(|item| item.loose_eq(needle, case_insensitive)),
        CellValue::Str(s) => {
            let needle = needle.canonical();
            if case_insensitive {
                s.to_lowercase().contains(&needle.to_lowercase())
            } else {
                s.contains(&needle)
            }
        }
        other => other.loose_eq(needle, case_insensitive),
    }
}

/// The set of canonical values a `*_contained_by` comparator denotes: a
/// literal list member-by-member, a column by all of its values, a scalar
/// by itself.
fn comparand_value_set(cmp: &Comparand<'_>, lowercase: bool) -> FxHashSet<String> {
    let fold = |v: &CellValue| {
        let c = v.canonical();
        if lowercase { c.to_lowercase() } else { c }
    };
    match cmp {
        Comparand::Column(col) => col.iter().map(fold).collect(),
        Comparand::Literal(CellValue::List(items)) => items.iter().map(fold).collect(),
        Comparand::Literal(value) => std::iter::once(fold(value)).collect(),
    }
}
