//! The structured argument every dataframe operator receives, plus
//! column-name prefix rewriting and comparator resolution.

use std::collections::HashMap;

use clinrules_common::CellValue;

/// Arguments for one dataframe operator invocation. Only the fields an
/// operator documents are read; the rest are ignored.
#[derive(Debug, Clone, Default)]
pub struct FrameArgs {
    /// Name of the primary column under test (prefix-rewritten).
    pub target: Option<String>,
    /// Column name (prefix-rewritten) or, with `value_is_literal`, a
    /// verbatim literal — scalar or list.
    pub comparator: Option<CellValue>,
    pub value_is_literal: bool,
    /// Column selecting a sub-keyspace in the relationship data.
    pub context: Option<String>,
    /// Group-by column for windowed operators.
    pub within: Option<String>,
    /// Sort column for lag operators.
    pub ordering: Option<String>,
    /// `"asc"` (default) or `"dsc"`.
    pub order: Option<String>,
    /// Substring lengths for the prefix/suffix operators.
    pub prefix: Option<usize>,
    pub suffix: Option<usize>,
    /// Pattern used by `equals_string_part`.
    pub regex: Option<String>,
    /// Date sub-field for the date comparisons.
    pub date_component: Option<String>,
    /// Column whose cells hold per-variable metadata maps.
    pub metadata: Option<String>,
}

impl FrameArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, name: impl Into<String>) -> Self {
        self.target = Some(name.into());
        self
    }

    pub fn comparator(mut self, value: impl Into<CellValue>) -> Self {
        self.comparator = Some(value.into());
        self
    }

    pub fn value_is_literal(mut self, literal: bool) -> Self {
        self.value_is_literal = literal;
        self
    }

    pub fn context(mut self, name: impl Into<String>) -> Self {
        self.context = Some(name.into());
        self
    }

    pub fn within(mut self, name: impl Into<String>) -> Self {
        self.within = Some(name.into());
        self
    }

    pub fn ordering(mut self, name: impl Into<String>) -> Self {
        self.ordering = Some(name.into());
        self
    }

    pub fn order(mut self, token: impl Into<String>) -> Self {
        self.order = Some(token.into());
        self
    }

    pub fn prefix(mut self, len: usize) -> Self {
        self.prefix = Some(len);
        self
    }

    pub fn suffix(mut self, len: usize) -> Self {
        self.suffix = Some(len);
        self
    }

    pub fn regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    pub fn date_component(mut self, component: impl Into<String>) -> Self {
        self.date_component = Some(component.into());
        self
    }

    pub fn metadata(mut self, name: impl Into<String>) -> Self {
        self.metadata = Some(name.into());
        self
    }
}

/// A resolved comparator: a borrowed column aligned with rows, or one
/// literal applied to every row.
#[derive(Debug, Clone)]
pub enum Comparand<'a> {
    Column(&'a [CellValue]),
    Literal(CellValue),
}

impl Comparand<'_> {
    pub fn at(&self, row: usize) -> &CellValue {
        match self {
            Comparand::Column(col) => &col[row],
            Comparand::Literal(value) => value,
        }
    }

    pub fn is_column(&self) -> bool {
        matches!(self, Comparand::Column(_))
    }
}

/// Rewrite an abstract column-name prefix to its concrete form: the longest
/// map key matching the start of the name wins, and only that one prefix is
/// replaced. Names matching no key pass through unchanged.
pub(crate) fn replace_prefix(name: &str, map: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort_by_key(|k| std::cmp::Reverse(k.len()));
    for key in keys {
        if name.starts_with(key.as_str()) {
            return format!("{}{}", map[key], &name[key.len()..]);
        }
    }
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|&(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn longest_prefix_wins_once() {
        let map = prefix_map(&[("--", "AE"), ("--D", "XX")]);
        assert_eq!(replace_prefix("--DECOD", &map), "XXECOD");
        assert_eq!(replace_prefix("--SEV", &map), "AESEV");
    }

    #[test]
    fn unmatched_names_pass_through() {
        let map = prefix_map(&[("--", "AE")]);
        assert_eq!(replace_prefix("USUBJID", &map), "USUBJID");
        assert_eq!(replace_prefix("AEDECOD", &map), "AEDECOD");
    }

    #[test]
    fn builder_round_trip() {
        let args = FrameArgs::new()
            .target("--DECOD")
            .comparator("--TERM")
            .within("USUBJID")
            .order("dsc")
            .prefix(2);
        assert_eq!(args.target.as_deref(), Some("--DECOD"));
        assert_eq!(args.comparator, Some(CellValue::from("--TERM")));
        assert_eq!(args.within.as_deref(), Some("USUBJID"));
        assert_eq!(args.order.as_deref(), Some("dsc"));
        assert_eq!(args.prefix, Some(2));
        assert!(!args.value_is_literal);
    }
}
