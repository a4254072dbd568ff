//! Typed predicate operators for clinical/tabular rule evaluation.
//!
//! A rule names an operator and a target; the engine wraps the target value
//! in the matching typed wrapper and invokes the operator with the rule's
//! arguments. Scalar wrappers return `bool`; the dataframe wrapper returns a
//! [`Verdict`] — either a scalar or a per-row boolean mask.
//!
//! ```
//! use clinrules_common::CellValue;
//! use clinrules_eval::StringValue;
//!
//! let value = StringValue::new(&CellValue::from("HEADACHE")).unwrap();
//! assert!(value.starts_with(&CellValue::from("HEAD")).unwrap());
//! ```

pub mod catalog;
pub mod frame;
pub mod generic;
pub mod scalar;
pub mod utils;

pub use catalog::OperatorDef;
pub use frame::{
    CodelistInfo, Comparand, DataframeValue, FrameArgs, Mask, RelationshipData, RowPredicate,
    ValueLevelMetadata, Verdict,
};
pub use generic::GenericValue;
pub use scalar::{
    BooleanValue, NumericValue, SelectMultipleValue, SelectValue, StringValue,
};

// Re-export for convenience
pub use clinrules_common::{
    CellValue, Frame, InputShape, OperatorMeta, RowView, RuleError, float_to_decimal,
    pretty_label,
};
