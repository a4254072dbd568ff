//! The one error type every predicate evaluation surfaces.
//!
//! Three things can go wrong: a wrapper is built around the wrong payload
//! shape, an operator argument fails the host type's coercion, or an
//! operator precondition does not hold. All of them abort the current
//! evaluation; nothing is retried and nothing is partial.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// Construction failure: the payload does not match the wrapper type.
    #[error("`{value}` is not a valid {expected} payload")]
    InvalidPayload { expected: &'static str, value: String },

    /// An operator argument failed coercion through the host type.
    #[error("`{value}` is not a valid {expected} argument")]
    InvalidArgument { expected: &'static str, value: String },

    /// The named operator is not in the catalog of the receiving type.
    #[error("unknown operator `{0}`")]
    UnknownOperator(String),

    /// A column named by the rule is not in the table.
    #[error("column `{0}` does not exist")]
    MissingColumn(String),

    /// An operator precondition does not hold (non-string cells in a
    /// string-part operator, a malformed sort token, and so on).
    #[error("{0}")]
    Precondition(String),
}

impl RuleError {
    pub fn payload(expected: &'static str, value: impl ToString) -> Self {
        RuleError::InvalidPayload {
            expected,
            value: value.to_string(),
        }
    }

    pub fn argument(expected: &'static str, value: impl ToString) -> Self {
        RuleError::InvalidArgument {
            expected,
            value: value.to_string(),
        }
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        RuleError::Precondition(msg.into())
    }
}
