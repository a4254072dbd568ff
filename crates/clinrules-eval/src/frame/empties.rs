//! Emptiness operators, including the grouped except-last-row reductions
//! and the numbered additional-columns rule.

use regex::Regex;

use clinrules_common::{CellValue, RuleError};

use super::groups::group_indices;
use super::{DataframeValue, FrameArgs, Verdict};

impl DataframeValue {
    pub fn empty(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        Ok(self.mask(|i| target[i].is_empty()))
    }

    pub fn non_empty(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.empty(args)?.complement())
    }

    /// Group rows by the comparator column, drop the last row of each group
    /// in current order, and reduce: true iff any remaining target cell is
    /// empty.
    pub fn empty_within_except_last_row(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        if self.frame.nrows() == 0 {
            return Ok(Verdict::Scalar(false));
        }
        let any_empty = self
            .except_last_rows(args)?
            .any(|row| target[row].is_empty());
        Ok(Verdict::Scalar(any_empty))
    }

    /// Same grouping, true iff every non-last cell is non-empty.
    pub fn non_empty_within_except_last_row(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        if self.frame.nrows() == 0 {
            return Ok(Verdict::Scalar(false));
        }
        let all_filled = self
            .except_last_rows(args)?
            .all(|row| !target[row].is_empty());
        Ok(Verdict::Scalar(all_filled))
    }

    /// Row indices of every group member except each group's last row.
    fn except_last_rows(
        &self,
        args: &FrameArgs,
    ) -> Result<impl Iterator<Item = usize>, RuleError> {
        let group_col = args
            .comparator
            .as_ref()
            .ok_or_else(|| RuleError::precondition("operator requires a comparator"))?;
        let group_col = self.column_arg(&group_col.canonical())?;
        let groups = group_indices(&[group_col], 0..self.frame.nrows());
        Ok(groups
            .into_iter()
            .flat_map(|rows| rows.into_iter().rev().skip(1)))
    }

    /* ────────────────── numbered additional columns ─────────────────── */

    /// Consider the columns `<target>1`, `<target>2`, … in suffix order. A
    /// row is flagged when some column is empty while its successor is not.
    pub fn additional_columns_empty(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let base = self.target_name(args)?;
        let columns = self.numbered_columns(&base)?;
        Ok(self.mask(|i| {
            columns
                .windows(2)
                .any(|pair| pair[0][i].is_empty() && !pair[1][i].is_empty())
        }))
    }

    pub fn additional_columns_not_empty(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.additional_columns_empty(args)?.complement())
    }

    fn numbered_columns<'a>(&'a self, base: &str) -> Result<Vec<&'a [CellValue]>, RuleError> {
        let pattern = Regex::new(&format!("^{}(\\d+)$", regex::escape(base)))
            .map_err(|e| RuleError::argument("regex", e))?;
        let mut numbered: Vec<(u64, &str)> = Vec::new();
        for name in self.frame.names() {
            if let Some(caps) = pattern.captures(name) {
                if let Ok(n) = caps[1].parse::<u64>() {
                    numbered.push((n, name));
                }
            }
        }
        numbered.sort_by_key(|&(n, _)| n);
        Ok(numbered
            .into_iter()
            .filter_map(|(_, name)| self.frame.column(name))
            .collect())
    }
}
