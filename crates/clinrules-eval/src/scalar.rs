//! Scalar value wrappers: string, numeric, boolean, select, select-multiple.
//!
//! Each wrapper owns one validated payload. The validator doubles as the
//! argument coercion step: operator arguments pass through it before the
//! predicate body runs, so type errors surface explicitly instead of as
//! accidental comparisons. The select family is the exception — its
//! arguments are taken as-is.

use clinrules_common::{CellValue, EPSILON, OperatorMeta, RuleError, float_to_decimal};
use regex::Regex;
use rust_decimal::Decimal;

use crate::catalog::{
    BOOLEAN_OPERATORS, NUMERIC_OPERATORS, SELECT_MULTIPLE_OPERATORS, SELECT_OPERATORS,
    STRING_OPERATORS, catalog,
};

/* ───────────────────────────── string ───────────────────────────── */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringValue {
    value: String,
}

impl StringValue {
    pub fn new(value: &CellValue) -> Result<Self, RuleError> {
        Ok(Self {
            value: Self::cast(value)?,
        })
    }

    /// Validator shared by construction and argument coercion. Null and
    /// absent values coerce to the empty string.
    pub(crate) fn cast(value: &CellValue) -> Result<String, RuleError> {
        match value {
            CellValue::Null => Ok(String::new()),
            CellValue::Str(s) => Ok(s.clone()),
            other => Err(RuleError::payload("string", other)),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn equal_to(&self, other: &CellValue) -> Result<bool, RuleError> {
        Ok(self.value == Self::cast(other)?)
    }

    pub fn not_equal_to(&self, other: &CellValue) -> Result<bool, RuleError> {
        Ok(self.value != Self::cast(other)?)
    }

    pub fn equal_to_case_insensitive(&self, other: &CellValue) -> Result<bool, RuleError> {
        Ok(self.value.to_lowercase() == Self::cast(other)?.to_lowercase())
    }

    pub fn starts_with(&self, other: &CellValue) -> Result<bool, RuleError> {
        Ok(self.value.starts_with(&Self::cast(other)?))
    }

    pub fn ends_with(&self, other: &CellValue) -> Result<bool, RuleError> {
        Ok(self.value.ends_with(&Self::cast(other)?))
    }

    pub fn contains(&self, other: &CellValue) -> Result<bool, RuleError> {
        Ok(self.value.contains(&Self::cast(other)?))
    }

    /// Unanchored search, not a full match.
    pub fn matches_regex(&self, pattern: &CellValue) -> Result<bool, RuleError> {
        let pattern = Self::cast(pattern)?;
        let re = Regex::new(&pattern).map_err(|e| RuleError::argument("regex", e))?;
        Ok(re.is_match(&self.value))
    }

    pub fn non_empty(&self) -> bool {
        !self.value.is_empty()
    }

    pub fn get_all_operators() -> Vec<OperatorMeta> {
        catalog(STRING_OPERATORS)
    }

    pub fn evaluate(&self, operator: &str, arg: &CellValue) -> Result<bool, RuleError> {
        match operator {
            "equal_to" => self.equal_to(arg),
            "not_equal_to" => self.not_equal_to(arg),
            "equal_to_case_insensitive" => self.equal_to_case_insensitive(arg),
            "starts_with" => self.starts_with(arg),
            "ends_with" => self.ends_with(arg),
            "contains" => self.contains(arg),
            "matches_regex" => self.matches_regex(arg),
            "non_empty" => Ok(self.non_empty()),
            other => Err(RuleError::UnknownOperator(other.to_string())),
        }
    }
}

/* ───────────────────────────── numeric ──────────────────────────── */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericValue {
    value: Decimal,
}

impl NumericValue {
    pub fn new(value: &CellValue) -> Result<Self, RuleError> {
        Ok(Self {
            value: Self::cast(value)?,
        })
    }

    /// Integers convert exactly; floats go through their textual form so
    /// the decimal keeps the written digits. Strings do not coerce.
    pub(crate) fn cast(value: &CellValue) -> Result<Decimal, RuleError> {
        match value {
            CellValue::Int(i) => Ok(Decimal::from(*i)),
            CellValue::Num(n) => {
                float_to_decimal(*n).ok_or_else(|| RuleError::payload("numeric", value))
            }
            CellValue::Decimal(d) => Ok(*d),
            other => Err(RuleError::payload("numeric", other)),
        }
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn equal_to(&self, other: &CellValue) -> Result<bool, RuleError> {
        Ok((self.value - Self::cast(other)?).abs() <= *EPSILON)
    }

    pub fn not_equal_to(&self, other: &CellValue) -> Result<bool, RuleError> {
        Ok((self.value - Self::cast(other)?).abs() > *EPSILON)
    }

    pub fn greater_than(&self, other: &CellValue) -> Result<bool, RuleError> {
        Ok(self.value - Self::cast(other)? > *EPSILON)
    }

    pub fn greater_than_or_equal_to(&self, other: &CellValue) -> Result<bool, RuleError> {
        Ok(self.greater_than(other)? || self.equal_to(other)?)
    }

    pub fn less_than(&self, other: &CellValue) -> Result<bool, RuleError> {
        Ok(Self::cast(other)? - self.value > *EPSILON)
    }

    pub fn less_than_or_equal_to(&self, other: &CellValue) -> Result<bool, RuleError> {
        Ok(self.less_than(other)? || self.equal_to(other)?)
    }

    pub fn get_all_operators() -> Vec<OperatorMeta> {
        catalog(NUMERIC_OPERATORS)
    }

    pub fn evaluate(&self, operator: &str, arg: &CellValue) -> Result<bool, RuleError> {
        match operator {
            "equal_to" => self.equal_to(arg),
            "not_equal_to" => self.not_equal_to(arg),
            "greater_than" => self.greater_than(arg),
            "greater_than_or_equal_to" => self.greater_than_or_equal_to(arg),
            "less_than" => self.less_than(arg),
            "less_than_or_equal_to" => self.less_than_or_equal_to(arg),
            other => Err(RuleError::UnknownOperator(other.to_string())),
        }
    }
}

/* ───────────────────────────── boolean ──────────────────────────── */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BooleanValue {
    value: bool,
}

impl BooleanValue {
    pub fn new(value: &CellValue) -> Result<Self, RuleError> {
        match value {
            CellValue::Bool(b) => Ok(Self { value: *b }),
            other => Err(RuleError::payload("boolean", other)),
        }
    }

    pub fn is_true(&self) -> bool {
        self.value
    }

    pub fn is_false(&self) -> bool {
        !self.value
    }

    pub fn get_all_operators() -> Vec<OperatorMeta> {
        catalog(BOOLEAN_OPERATORS)
    }

    pub fn evaluate(&self, operator: &str) -> Result<bool, RuleError> {
        match operator {
            "is_true" => Ok(self.is_true()),
            "is_false" => Ok(self.is_false()),
            other => Err(RuleError::UnknownOperator(other.to_string())),
        }
    }
}

/* ───────────────────────────── select ───────────────────────────── */

/// Element equality for the select family: case-insensitive for strings,
/// ε-tolerant for numerics, exact otherwise.
pub(crate) fn select_eq(a: &CellValue, b: &CellValue) -> bool {
    a.loose_eq(b, true)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectValue {
    items: Vec<CellValue>,
}

impl SelectValue {
    pub fn new(value: &CellValue) -> Result<Self, RuleError> {
        match value {
            CellValue::List(items) => Ok(Self {
                items: items.clone(),
            }),
            other => Err(RuleError::payload("select", other)),
        }
    }

    pub(crate) fn from_items(items: Vec<CellValue>) -> Self {
        Self { items }
    }

    // Arguments are not coerced: any cell value may be probed for.
    pub fn contains(&self, other: &CellValue) -> bool {
        self.items.iter().any(|item| select_eq(item, other))
    }

    pub fn does_not_contain(&self, other: &CellValue) -> bool {
        !self.contains(other)
    }

    pub fn get_all_operators() -> Vec<OperatorMeta> {
        catalog(SELECT_OPERATORS)
    }

    pub fn evaluate(&self, operator: &str, arg: &CellValue) -> Result<bool, RuleError> {
        match operator {
            "contains" => Ok(self.contains(arg)),
            "does_not_contain" => Ok(self.does_not_contain(arg)),
            other => Err(RuleError::UnknownOperator(other.to_string())),
        }
    }
}

/* ────────────────────────── select multiple ─────────────────────── */

#[derive(Debug, Clone, PartialEq)]
pub struct SelectMultipleValue {
    items: Vec<CellValue>,
}

impl SelectMultipleValue {
    pub fn new(value: &CellValue) -> Result<Self, RuleError> {
        Ok(Self {
            items: Self::cast(value)?,
        })
    }

    pub(crate) fn cast(value: &CellValue) -> Result<Vec<CellValue>, RuleError> {
        match value {
            CellValue::List(items) => Ok(items.clone()),
            other => Err(RuleError::payload("select multiple", other)),
        }
    }

    pub(crate) fn from_items(items: Vec<CellValue>) -> Self {
        Self { items }
    }

    pub fn contains_all(&self, other: &CellValue) -> Result<bool, RuleError> {
        let other = Self::cast(other)?;
        let select = SelectValue::from_items(self.items.clone());
        Ok(other.iter().all(|item| select.contains(item)))
    }

    pub fn is_contained_by(&self, other: &CellValue) -> Result<bool, RuleError> {
        let container = SelectMultipleValue::new(other)?;
        container.contains_all(&CellValue::List(self.items.clone()))
    }

    pub fn is_not_contained_by(&self, other: &CellValue) -> Result<bool, RuleError> {
        Ok(!self.is_contained_by(other)?)
    }

    pub fn shares_at_least_one_element_with(&self, other: &CellValue) -> Result<bool, RuleError> {
        let other = Self::cast(other)?;
        let select = SelectValue::from_items(self.items.clone());
        Ok(other.iter().any(|item| select.contains(item)))
    }

    /// True iff exactly one of the comparator's elements is present.
    /// Duplicate matches in the comparator count separately.
    pub fn shares_exactly_one_element_with(&self, other: &CellValue) -> Result<bool, RuleError> {
        let other = Self::cast(other)?;
        let select = SelectValue::from_items(self.items.clone());
        let mut found_one = false;
        for item in &other {
            if select.contains(item) {
                if found_one {
                    return Ok(false);
                }
                found_one = true;
            }
        }
        Ok(found_one)
    }

    pub fn shares_no_elements_with(&self, other: &CellValue) -> Result<bool, RuleError> {
        Ok(!self.shares_at_least_one_element_with(other)?)
    }

    pub fn get_all_operators() -> Vec<OperatorMeta> {
        catalog(SELECT_MULTIPLE_OPERATORS)
    }

    pub fn evaluate(&self, operator: &str, arg: &CellValue) -> Result<bool, RuleError> {
        match operator {
            "contains_all" => self.contains_all(arg),
            "is_contained_by" => self.is_contained_by(arg),
            "is_not_contained_by" => self.is_not_contained_by(arg),
            "shares_at_least_one_element_with" => self.shares_at_least_one_element_with(arg),
            "shares_exactly_one_element_with" => self.shares_exactly_one_element_with(arg),
            "shares_no_elements_with" => self.shares_no_elements_with(arg),
            other => Err(RuleError::UnknownOperator(other.to_string())),
        }
    }
}

/* ─────────────────────────────── tests ──────────────────────────── */
