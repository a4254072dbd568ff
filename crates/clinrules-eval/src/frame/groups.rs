//! Group-by, sort, uniqueness, and cross-row (lag) operators.
//!
//! Grouping never touches the frame: every pass builds index vectors. Group
//! iteration order is first appearance of the group key, and the exploded
//! operators (lag, cardinality) emit their masks in that order.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use clinrules_common::{CellValue, RuleError};

use super::{DataframeValue, FrameArgs, Verdict};
use crate::utils::flatten_list;

type GroupKey = SmallVec<[String; 2]>;

/// Partition row indices by the canonical key over `columns`, preserving
/// the order groups are first seen in.
pub(super) fn group_indices(
    columns: &[&[CellValue]],
    order: impl IntoIterator<Item = usize>,
) -> Vec<Vec<usize>> {
    let mut slots: FxHashMap<GroupKey, usize> = FxHashMap::default();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for row in order {
        let key: GroupKey = columns.iter().map(|col| col[row].canonical()).collect();
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(row);
    }
    groups
}

/// Stable ascending (or descending) permutation of `0..len` by cell order.
pub(super) fn sorted_indices(col: &[CellValue], ascending: bool) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..col.len()).collect();
    indices.sort_by(|&a, &b| {
        let ord = col[a].compare(&col[b]);
        if ascending { ord } else { ord.reverse() }
    });
    indices
}

fn parse_order(args: &FrameArgs) -> Result<bool, RuleError> {
    match args.order.as_deref().unwrap_or("asc") {
        "asc" => Ok(true),
        "dsc" => Ok(false),
        other => Err(RuleError::precondition(format!(
            "unknown sort order `{other}`"
        ))),
    }
}

/// One sort key for `target_is_sorted_by`: column, direction, null slot.
struct SortSpec {
    name: String,
    ascending: bool,
    nulls_last: bool,
}

impl SortSpec {
    fn parse(cell: &CellValue) -> Result<Self, RuleError> {
        match cell {
            CellValue::Str(name) => Ok(Self {
                name: name.clone(),
                ascending: true,
                nulls_last: true,
            }),
            CellValue::Map(entries) => {
                let name = entries
                    .get("name")
                    .map(CellValue::canonical)
                    .ok_or_else(|| RuleError::precondition("sort spec requires a `name`"))?;
                let ascending = match entries
                    .get("sort_order")
                    .map(CellValue::canonical)
                    .as_deref()
                {
                    None => true,
                    Some(token) => match token.to_ascii_lowercase().as_str() {
                        "asc" => true,
                        "dsc" => false,
                        other => {
                            return Err(RuleError::precondition(format!(
                                "unknown sort order `{other}`"
                            )));
                        }
                    },
                };
                let nulls_last = match entries
                    .get("null_position")
                    .map(CellValue::canonical)
                    .as_deref()
                {
                    None => true,
                    Some(token) => match token.to_ascii_lowercase().as_str() {
                        "last" => true,
                        "first" => false,
                        other => {
                            return Err(RuleError::precondition(format!(
                                "unknown null position `{other}`"
                            )));
                        }
                    },
                };
                Ok(Self {
                    name,
                    ascending,
                    nulls_last,
                })
            }
            other => Err(RuleError::precondition(format!(
                "`{other}` is not a sort spec"
            ))),
        }
    }
}

impl DataframeValue {
    /// The comparator interpreted as one or more column names.
    fn comparator_columns<'a>(&'a self, args: &FrameArgs) -> Result<Vec<&'a [CellValue]>, RuleError> {
        let raw = args
            .comparator
            .as_ref()
            .ok_or_else(|| RuleError::precondition("operator requires a comparator"))?;
        let names: Vec<String> = match raw {
            CellValue::List(items) => items.iter().map(CellValue::canonical).collect(),
            scalar => vec![scalar.canonical()],
        };
        names
            .iter()
            .map(|name| self.column_arg(name))
            .collect()
    }

    fn within_column<'a>(&'a self, args: &FrameArgs) -> Result<&'a [CellValue], RuleError> {
        let raw = args
            .within
            .as_deref()
            .ok_or_else(|| RuleError::precondition("operator requires a `within` column"))?;
        self.column_arg(raw)
    }

    /* ──────────────────────── uniqueness ────────────────────────────── */

    /// Group by target and comparator columns; a row is valid while its
    /// group holds no other row.
    pub fn is_unique_set(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let mut keys: Vec<&[CellValue]> = vec![target];
        keys.extend(self.comparator_columns(args)?);
        let groups = group_indices(&keys, 0..self.frame.nrows());
        let mut bits = vec![false; self.frame.nrows()];
        for rows in &groups {
            let unique = rows.len() <= 1;
            for &row in rows {
                bits[row] = unique;
            }
        }
        Ok(Verdict::from_bools(bits))
    }

    pub fn is_not_unique_set(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.is_unique_set(args)?.complement())
    }

    /// Validate a one-to-one relationship between target and comparator:
    /// after dropping duplicate pairs, a key appearing with two partners on
    /// either side marks every row carrying that key.
    pub fn is_not_unique_relationship(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let cmp = self.require_comparand(args)?;
        let nrows = self.frame.nrows();

        let mut pairs: FxHashSet<(String, String)> = FxHashSet::default();
        for i in 0..nrows {
            pairs.insert((target[i].canonical(), cmp.at(i).canonical()));
        }
        let mut target_partners: FxHashMap<String, usize> = FxHashMap::default();
        let mut cmp_partners: FxHashMap<String, usize> = FxHashMap::default();
        for (t, c) in &pairs {
            *target_partners.entry(t.clone()).or_insert(0) += 1;
            *cmp_partners.entry(c.clone()).or_insert(0) += 1;
        }
        Ok(self.mask(|i| {
            target_partners[&target[i].canonical()] > 1
                || cmp_partners[&cmp.at(i).canonical()] > 1
        }))
    }

    pub fn is_unique_relationship(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.is_not_unique_relationship(args)?.complement())
    }

    /* ─────────────────────── group ordering ─────────────────────────── */

    /// Within each comparator group, the target must already be in
    /// ascending order. One verdict across all groups.
    pub fn is_ordered_set(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let group_name = match args.comparator.as_ref() {
            Some(CellValue::Str(name)) => name.clone(),
            other => {
                return Err(RuleError::precondition(format!(
                    "is_ordered_set requires a single grouping column, got `{:?}`",
                    other
                )));
            }
        };
        let group_col = self.column_arg(&group_name)?;
        if self.frame.nrows() == 0 {
            return Ok(Verdict::Scalar(false));
        }
        let ordered = group_indices(&[group_col], 0..self.frame.nrows())
            .iter()
            .all(|rows| {
                rows.windows(2)
                    .all(|pair| target[pair[0]].compare(&target[pair[1]]).is_le())
            });
        Ok(Verdict::Scalar(ordered))
    }

    pub fn is_not_ordered_set(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.is_ordered_set(args)?.complement())
    }

    /// Within each `within` group, sort by the comparator sort specs and
    /// require the target to equal the 1-based position index (reversed for
    /// a descending `order`). The mask stays aligned to the original rows.
    pub fn target_is_sorted_by(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let within = self.within_column(args)?;
        let ascending_index = parse_order(args)?;
        let raw_specs = args
            .comparator
            .as_ref()
            .ok_or_else(|| RuleError::precondition("operator requires sort specs"))?;
        let specs: Vec<SortSpec> = match raw_specs {
            CellValue::List(items) => items.iter().map(SortSpec::parse).collect::<Result<_, _>>()?,
            scalar => vec![SortSpec::parse(scalar)?],
        };
        let columns: Vec<&[CellValue]> = specs
            .iter()
            .map(|spec| self.column_arg(&spec.name))
            .collect::<Result<_, _>>()?;

        let mut bits = vec![false; self.frame.nrows()];
        for rows in group_indices(&[within], 0..self.frame.nrows()) {
            let mut sorted = rows.clone();
            sorted.sort_by(|&a, &b| {
                for (spec, col) in specs.iter().zip(&columns) {
                    let (x, y) = (&col[a], &col[b]);
                    let ord = match (x.is_empty(), y.is_empty()) {
                        (true, true) => std::cmp::Ordering::Equal,
                        (true, false) => {
                            if spec.nulls_last {
                                std::cmp::Ordering::Greater
                            } else {
                                std::cmp::Ordering::Less
                            }
                        }
                        (false, true) => {
                            if spec.nulls_last {
                                std::cmp::Ordering::Less
                            } else {
                                std::cmp::Ordering::Greater
                            }
                        }
                        (false, false) => {
                            let ord = x.compare(y);
                            if spec.ascending { ord } else { ord.reverse() }
                        }
                    };
                    if !ord.is_eq() {
                        return ord;
                    }
                }
                std::cmp::Ordering::Equal
            });
            let len = sorted.len();
            for (pos, &row) in sorted.iter().enumerate() {
                let expected = if ascending_index { pos + 1 } else { len - pos };
                bits[row] = target[row]
                    .to_f64()
                    .is_some_and(|v| (v - expected as f64).abs() <= 1e-6);
            }
        }
        Ok(Verdict::from_bools(bits))
    }

    pub fn target_is_not_sorted_by(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.target_is_sorted_by(args)?.complement())
    }

    /* ─────────────────────────── lag ────────────────────────────────── */

    /// Sort by `ordering`, group by `within`, and compare each row's target
    /// to the next row's comparator. The last row of each group has no next
    /// record: its verdict is undefined. The mask concatenates the groups
    /// in iteration order.
    pub fn has_next_corresponding_record(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let cmp = self.require_comparand(args)?;
        let within = self.within_column(args)?;
        let ordering_name = args
            .ordering
            .as_deref()
            .ok_or_else(|| RuleError::precondition("operator requires an `ordering` column"))?;
        let ordering = self.column_arg(ordering_name)?;

        let order = sorted_indices(ordering, true);
        let mut mask = Vec::with_capacity(self.frame.nrows());
        for rows in group_indices(&[within], order) {
            for pair in rows.windows(2) {
                mask.push(Some(target[pair[0]].loose_eq(cmp.at(pair[1]), false)));
            }
            if !rows.is_empty() {
                mask.push(None);
            }
        }
        Ok(Verdict::Mask(mask))
    }

    pub fn does_not_have_next_corresponding_record(
        &self,
        args: &FrameArgs,
    ) -> Result<Verdict, RuleError> {
        Ok(self.has_next_corresponding_record(args)?.complement())
    }

    /* ─────────────────────── group cardinality ──────────────────────── */

    /// Each row answers whether its `within` group is larger than the
    /// minimum (the comparator, default 1). Output follows group iteration
    /// order.
    pub fn present_on_multiple_rows_within(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        self.target_column(args)?;
        let within = self.within_column(args)?;
        let min = match args.comparator.as_ref() {
            None => 1,
            Some(cell) => cell
                .to_f64()
                .map(|n| n as usize)
                .ok_or_else(|| RuleError::argument("minimum row count", cell))?,
        };
        let mut mask = Vec::with_capacity(self.frame.nrows());
        for rows in group_indices(&[within], 0..self.frame.nrows()) {
            let hit = rows.len() > min;
            mask.extend(std::iter::repeat_n(Some(hit), rows.len()));
        }
        Ok(Verdict::Mask(mask))
    }

    pub fn not_present_on_multiple_rows_within(
        &self,
        args: &FrameArgs,
    ) -> Result<Verdict, RuleError> {
        Ok(self.present_on_multiple_rows_within(args)?.complement())
    }

    /* ──────────────────────────── sets ──────────────────────────────── */

    /// The comparator values (a literal list, the flattened listed columns,
    /// or one column's uniques) must all occur among the target's values.
    pub fn contains_all(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let raw = args
            .comparator
            .as_ref()
            .ok_or_else(|| RuleError::precondition("operator requires a comparator"))?;
        let values: Vec<String> = if args.value_is_literal {
            match raw {
                CellValue::List(items) => items.iter().map(CellValue::canonical).collect(),
                scalar => vec![scalar.canonical()],
            }
        } else {
            match raw {
                CellValue::List(names) => {
                    let names: Vec<String> = names
                        .iter()
                        .map(|n| self.resolve_column_name(&n.canonical()))
                        .collect();
                    flatten_list(&self.frame, &names)?
                        .iter()
                        .map(CellValue::canonical)
                        .collect()
                }
                CellValue::Str(name) => {
                    let resolved = self.resolve_column_name(name);
                    match self.frame.column(&resolved) {
                        Some(col) => col.iter().map(CellValue::canonical).collect(),
                        None => vec![name.clone()],
                    }
                }
                scalar => vec![scalar.canonical()],
            }
        };
        let uniques: FxHashSet<String> = target.iter().map(CellValue::canonical).collect();
        Ok(Verdict::Scalar(
            values.iter().all(|value| uniques.contains(value)),
        ))
    }

    pub fn not_contains_all(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.contains_all(args)?.complement())
    }

    /* ───────────────────────── distinctness ─────────────────────────── */

    /// Uniformly true iff the target holds more than one distinct value.
    pub fn has_different_values(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let distinct: FxHashSet<String> = target.iter().map(CellValue::canonical).collect();
        let different = distinct.len() > 1;
        Ok(self.mask(|_| different))
    }

    pub fn has_same_values(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.has_different_values(args)?.complement())
    }

    /* ─────────────────────── column sortedness ──────────────────────── */

    /// True where the cell already sits at its sorted position's value.
    pub fn is_ordered_by(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let ascending = parse_order(args)?;
        let sorted = sorted_indices(target, ascending);
        Ok(self.mask(|i| target[i].loose_eq(&target[sorted[i]], false)))
    }

    pub fn is_not_ordered_by(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        Ok(self.is_ordered_by(args)?.complement())
    }
}
