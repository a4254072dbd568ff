//! The dataframe value type and its operator suite.
//!
//! One `DataframeValue` wraps a [`Frame`] plus the auxiliary metadata the
//! relational operators need: the column-prefix map, relationship data for
//! reference checks, value-level metadata records, and codelist maps. Every
//! operator is pure — the frame is never written to — and returns a
//! [`Verdict`]: a per-row boolean mask, or a scalar for the reducing
//! operators.

pub mod args;
mod codelist;
mod compare;
mod dates;
mod empties;
mod groups;
mod meta;
mod reference;
mod text;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use clinrules_common::{CellValue, Frame, InputShape, OperatorMeta, RowView, RuleError};

use crate::catalog::{OperatorDef, catalog};

pub use args::{Comparand, FrameArgs};

/// A boolean column aligned one-to-one with dataset rows. Cells are `None`
/// only where an operator defines no verdict (the last row of each lag
/// group).
pub type Mask = Vec<Option<bool>>;

/// A row predicate supplied with value-level metadata.
pub type RowPredicate = Arc<dyn Fn(&RowView<'_>) -> bool + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Scalar(bool),
    Mask(Mask),
}

impl Verdict {
    pub fn from_bools(bits: impl IntoIterator<Item = bool>) -> Self {
        Verdict::Mask(bits.into_iter().map(Some).collect())
    }

    /// Element-wise complement; undefined cells stay undefined.
    pub fn complement(self) -> Self {
        match self {
            Verdict::Scalar(b) => Verdict::Scalar(!b),
            Verdict::Mask(mask) => {
                Verdict::Mask(mask.into_iter().map(|cell| cell.map(|b| !b)).collect())
            }
        }
    }

    pub fn as_scalar(&self) -> Option<bool> {
        match self {
            Verdict::Scalar(b) => Some(*b),
            Verdict::Mask(_) => None,
        }
    }

    pub fn as_mask(&self) -> Option<&Mask> {
        match self {
            Verdict::Mask(mask) => Some(mask),
            Verdict::Scalar(_) => None,
        }
    }
}

/// One controlled-terminology codelist: its extensibility flag and the
/// terms it allows.
#[derive(Debug, Clone, Default)]
pub struct CodelistInfo {
    pub extensible: bool,
    pub allowed_terms: HashSet<String>,
}

/// External reference data for the foreign-key-style checks. Flat maps one
/// key to its referents; the two-level form adds a context keyspace.
#[derive(Debug, Clone)]
pub enum RelationshipData {
    Flat(HashMap<String, HashSet<String>>),
    ByContext(HashMap<String, HashMap<String, HashSet<String>>>),
}

/// One value-level-metadata record: where it applies, and the data-type and
/// length checks it imposes there.
#[derive(Clone)]
pub struct ValueLevelMetadata {
    pub filter: RowPredicate,
    pub type_check: RowPredicate,
    pub length_check: RowPredicate,
}

pub struct DataframeValue {
    pub(crate) frame: Frame,
    pub(crate) column_prefix_map: HashMap<String, String>,
    pub(crate) relationship_data: Option<RelationshipData>,
    pub(crate) value_level_metadata: Vec<ValueLevelMetadata>,
    pub(crate) column_codelist_map: HashMap<String, HashSet<String>>,
    pub(crate) codelist_term_maps: Vec<HashMap<String, CodelistInfo>>,
}

type FrameOp = fn(&DataframeValue, &FrameArgs) -> Result<Verdict, RuleError>;

struct FrameOpDef {
    name: &'static str,
    run: FrameOp,
}

macro_rules! frame_operators {
    ($( $name:ident ),* $(,)?) => {
        static FRAME_OPERATOR_IMPLS: &[FrameOpDef] = &[
            $( FrameOpDef { name: stringify!($name), run: DataframeValue::$name }, )*
        ];
        static FRAME_OPERATOR_DEFS: &[OperatorDef] = &[
            $(
                OperatorDef {
                    name: stringify!($name),
                    label: None,
                    input_shape: InputShape::Dataframe,
                    coerces_arguments: false,
                },
            )*
        ];
    };
}

frame_operators!(
    exists,
    not_exists,
    equal_to,
    not_equal_to,
    equal_to_case_insensitive,
    not_equal_to_case_insensitive,
    prefix_equal_to,
    suffix_equal_to,
    prefix_is_contained_by,
    prefix_is_not_contained_by,
    suffix_is_contained_by,
    suffix_is_not_contained_by,
    starts_with,
    ends_with,
    less_than,
    less_than_or_equal_to,
    greater_than,
    greater_than_or_equal_to,
    contains,
    does_not_contain,
    contains_case_insensitive,
    does_not_contain_case_insensitive,
    is_contained_by,
    is_not_contained_by,
    is_contained_by_case_insensitive,
    is_not_contained_by_case_insensitive,
    matches_regex,
    not_matches_regex,
    prefix_matches_regex,
    not_prefix_matches_regex,
    suffix_matches_regex,
    not_suffix_matches_regex,
    equals_string_part,
    has_equal_length,
    has_not_equal_length,
    longer_than,
    longer_than_or_equal_to,
    shorter_than,
    shorter_than_or_equal_to,
    empty,
    non_empty,
    empty_within_except_last_row,
    non_empty_within_except_last_row,
    contains_all,
    not_contains_all,
    invalid_date,
    is_complete_date,
    is_incomplete_date,
    date_equal_to,
    date_not_equal_to,
    date_less_than,
    date_less_than_or_equal_to,
    date_greater_than,
    date_greater_than_or_equal_to,
    is_unique_set,
    is_not_unique_set,
    is_unique_relationship,
    is_not_unique_relationship,
    is_ordered_set,
    is_not_ordered_set,
    target_is_sorted_by,
    target_is_not_sorted_by,
    is_valid_reference,
    is_not_valid_reference,
    is_valid_relationship,
    is_not_valid_relationship,
    non_conformant_value_data_type,
    conformant_value_data_type,
    non_conformant_value_length,
    conformant_value_length,
    has_next_corresponding_record,
    does_not_have_next_corresponding_record,
    present_on_multiple_rows_within,
    not_present_on_multiple_rows_within,
    additional_columns_empty,
    additional_columns_not_empty,
    references_correct_codelist,
    uses_valid_codelist_terms,
    has_same_values,
    has_different_values,
    is_ordered_by,
    is_not_ordered_by,
    value_has_multiple_references,
    value_does_not_have_multiple_references,
    variable_metadata_equal_to,
    variable_metadata_not_equal_to,
);

static FRAME_DISPATCH: Lazy<FxHashMap<&'static str, FrameOp>> = Lazy::new(|| {
    FRAME_OPERATOR_IMPLS
        .iter()
        .map(|def| (def.name, def.run))
        .collect()
});

impl DataframeValue {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            column_prefix_map: HashMap::new(),
            relationship_data: None,
            value_level_metadata: Vec::new(),
            column_codelist_map: HashMap::new(),
            codelist_term_maps: Vec::new(),
        }
    }

    pub fn with_column_prefix_map(mut self, map: HashMap<String, String>) -> Self {
        self.column_prefix_map = map;
        self
    }

    pub fn with_relationship_data(mut self, data: RelationshipData) -> Self {
        self.relationship_data = Some(data);
        self
    }

    pub fn with_value_level_metadata(mut self, records: Vec<ValueLevelMetadata>) -> Self {
        self.value_level_metadata = records;
        self
    }

    pub fn with_column_codelist_map(mut self, map: HashMap<String, HashSet<String>>) -> Self {
        self.column_codelist_map = map;
        self
    }

    pub fn with_codelist_term_maps(mut self, maps: Vec<HashMap<String, CodelistInfo>>) -> Self {
        self.codelist_term_maps = maps;
        self
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn get_all_operators() -> Vec<OperatorMeta> {
        catalog(FRAME_OPERATOR_DEFS)
    }

    pub(crate) fn operator_defs() -> &'static [OperatorDef] {
        FRAME_OPERATOR_DEFS
    }

    /// Invoke an operator by catalog name.
    pub fn evaluate(&self, operator: &str, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let run = FRAME_DISPATCH
            .get(operator)
            .ok_or_else(|| RuleError::UnknownOperator(operator.to_string()))?;
        #[cfg(feature = "tracing")]
        tracing::debug!(operator, rows = self.frame.nrows(), "evaluating dataframe operator");
        run(self, args)
    }

    /* ─────────────── shared argument resolution ─────────────── */

    pub(crate) fn resolve_column_name(&self, raw: &str) -> String {
        args::replace_prefix(raw, &self.column_prefix_map)
    }

    pub(crate) fn target_name(&self, args: &FrameArgs) -> Result<String, RuleError> {
        let raw = args
            .target
            .as_deref()
            .ok_or_else(|| RuleError::precondition("operator requires a target"))?;
        Ok(self.resolve_column_name(raw))
    }

    pub(crate) fn target_column<'a>(
        &'a self,
        args: &FrameArgs,
    ) -> Result<&'a [CellValue], RuleError> {
        let name = self.target_name(args)?;
        self.frame
            .column(&name)
            .ok_or(RuleError::MissingColumn(name))
    }

    /// Resolve a named column argument (prefix-rewritten, must exist).
    pub(crate) fn column_arg<'a>(&'a self, raw: &str) -> Result<&'a [CellValue], RuleError> {
        let name = self.resolve_column_name(raw);
        self.frame
            .column(&name)
            .ok_or(RuleError::MissingColumn(name))
    }

    /// Comparator resolution: a literal when flagged so, else a column when
    /// the rewritten name resolves, else the string degrades to a scalar
    /// literal.
    pub(crate) fn comparand<'a>(&'a self, args: &FrameArgs) -> Option<Comparand<'a>> {
        let raw = args.comparator.as_ref()?;
        if args.value_is_literal {
            return Some(Comparand::Literal(raw.clone()));
        }
        if let CellValue::Str(name) = raw {
            let resolved = self.resolve_column_name(name);
            if let Some(col) = self.frame.column(&resolved) {
                return Some(Comparand::Column(col));
            }
        }
        Some(Comparand::Literal(raw.clone()))
    }

    pub(crate) fn require_comparand<'a>(
        &'a self,
        args: &FrameArgs,
    ) -> Result<Comparand<'a>, RuleError> {
        self.comparand(args)
            .ok_or_else(|| RuleError::precondition("operator requires a comparator"))
    }

    /// Build a full-length mask from a per-row predicate.
    pub(crate) fn mask(&self, mut row: impl FnMut(usize) -> bool) -> Verdict {
        Verdict::Mask((0..self.frame.nrows()).map(|i| Some(row(i))).collect())
    }
}
