//! The generic wrapper: a type-dispatching facade for rules that do not
//! know the shape of the value they will receive. Equality routes to the
//! numeric comparator when the stored payload is a decimal and to the
//! string comparator otherwise; containment wraps scalars as singletons and
//! defers to the select-multiple family.

use clinrules_common::{CellValue, EPSILON, OperatorMeta, RuleError, float_to_decimal};
use rust_decimal::Decimal;

use crate::catalog::{
    BOOLEAN_OPERATORS, GENERIC_OPERATORS, NUMERIC_OPERATORS, SELECT_MULTIPLE_OPERATORS,
    SELECT_OPERATORS, STRING_OPERATORS, catalog_union,
};
use crate::frame::DataframeValue;
use crate::scalar::SelectMultipleValue;

#[derive(Debug, Clone, PartialEq)]
pub struct GenericValue {
    value: CellValue,
}

impl GenericValue {
    pub fn new(value: &CellValue) -> Result<Self, RuleError> {
        Ok(Self {
            value: Self::cast(value)?,
        })
    }

    /// Strings stay strings; integers and floats normalize to decimals
    /// (floats through their textual form); everything else is stored raw.
    pub(crate) fn cast(value: &CellValue) -> Result<CellValue, RuleError> {
        match value {
            CellValue::Int(i) => Ok(CellValue::Decimal(Decimal::from(*i))),
            CellValue::Num(n) => float_to_decimal(*n)
                .map(CellValue::Decimal)
                .ok_or_else(|| RuleError::payload("generic", value)),
            other => Ok(other.clone()),
        }
    }

    pub fn value(&self) -> &CellValue {
        &self.value
    }

    pub fn equal_to(&self, other: &CellValue) -> Result<bool, RuleError> {
        match self.value {
            CellValue::Decimal(_) => self.num_equal_to(other),
            _ => self.str_equal_to(other),
        }
    }

    pub fn not_equal_to(&self, other: &CellValue) -> Result<bool, RuleError> {
        match self.value {
            CellValue::Decimal(_) => self.num_not_equal_to(other),
            _ => self.str_not_equal_to(other),
        }
    }

    pub fn num_equal_to(&self, other: &CellValue) -> Result<bool, RuleError> {
        let mine = self
            .value
            .to_decimal()
            .ok_or_else(|| RuleError::argument("numeric", &self.value))?;
        let theirs = match Self::cast(other)? {
            CellValue::Decimal(d) => d,
            other => return Err(RuleError::argument("numeric", other)),
        };
        Ok((mine - theirs).abs() <= *EPSILON)
    }

    pub fn num_not_equal_to(&self, other: &CellValue) -> Result<bool, RuleError> {
        Ok(!self.num_equal_to(other)?)
    }

    pub fn str_equal_to(&self, other: &CellValue) -> Result<bool, RuleError> {
        Ok(self.value == Self::cast(other)?)
    }

    pub fn str_not_equal_to(&self, other: &CellValue) -> Result<bool, RuleError> {
        Ok(!self.str_equal_to(other)?)
    }

    /// Scalars are treated as singleton lists before deferring to the
    /// select-multiple containment check.
    pub fn is_contained_by(&self, other: &CellValue) -> Result<bool, RuleError> {
        let items = match &self.value {
            CellValue::List(items) => items.clone(),
            scalar => vec![scalar.clone()],
        };
        SelectMultipleValue::from_items(items).is_contained_by(other)
    }

    pub fn contains(&self, other: &CellValue) -> Result<bool, RuleError> {
        let haystack = match &self.value {
            CellValue::Str(s) => s,
            other => return Err(RuleError::argument("string", other)),
        };
        match Self::cast(other)? {
            CellValue::Str(needle) => Ok(haystack.contains(&needle)),
            other => Err(RuleError::argument("string", other)),
        }
    }

    /// The generic catalog is the union of the family catalogs.
    pub fn get_all_operators() -> Vec<OperatorMeta> {
        catalog_union(&[
            GENERIC_OPERATORS,
            SELECT_MULTIPLE_OPERATORS,
            SELECT_OPERATORS,
            STRING_OPERATORS,
            NUMERIC_OPERATORS,
            BOOLEAN_OPERATORS,
            DataframeValue::operator_defs(),
        ])
    }

    pub fn evaluate(&self, operator: &str, arg: &CellValue) -> Result<bool, RuleError> {
        match operator {
            "equal_to" => self.equal_to(arg),
            "not_equal_to" => self.not_equal_to(arg),
            "is_contained_by" => self.is_contained_by(arg),
            "num_equal_to" => self.num_equal_to(arg),
            "num_not_equal_to" => self.num_not_equal_to(arg),
            "str_equal_to" => self.str_equal_to(arg),
            "str_not_equal_to" => self.str_not_equal_to(arg),
            "contains" => self.contains(arg),
            other => Err(RuleError::UnknownOperator(other.to_string())),
        }
    }
}
