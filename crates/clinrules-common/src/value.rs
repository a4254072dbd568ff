use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::str::FromStr;

use once_cell::sync::Lazy;
use rust_decimal::Decimal;

/// Tolerance used for every numeric equality check in the engine.
pub static EPSILON: Lazy<Decimal> = Lazy::new(|| Decimal::new(1, 6));

/// One cell payload. This is distinct from the wrapper types in the
/// evaluation crate: a `CellValue` is what a table cell (or an operator
/// argument) holds, not what a predicate family accepts.
///
/// A cell is *empty* when it is `Null` or the empty string — clinical
/// datasets use the two interchangeably.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Str(String),
    Int(i64),
    Num(f64),
    Decimal(Decimal),
    Bool(bool),
    List(Vec<CellValue>),
    Map(BTreeMap<String, CellValue>),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Str(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            CellValue::Int(_) | CellValue::Num(_) | CellValue::Decimal(_)
        )
    }

    /// Numeric view of the cell. Numeric strings coerce; everything else
    /// yields `None`.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Num(n) => Some(*n),
            CellValue::Decimal(d) => f64::from_str(&d.to_string()).ok(),
            CellValue::Str(s) => f64::from_str(s.trim()).ok(),
            _ => None,
        }
    }

    /// Exact decimal view of the cell, for ε-tolerant equality. Only the
    /// numeric variants convert; floats go through their textual form so
    /// `1.1` survives the trip unchanged.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            CellValue::Int(i) => Some(Decimal::from(*i)),
            CellValue::Num(n) => float_to_decimal(*n),
            CellValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Canonical string form: the form used for group keys, reference-data
    /// lookups, and anywhere integer/string skew must not matter. `Null`
    /// canonicalizes to the empty string; floats with no fractional part
    /// drop the trailing `.0`.
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// ε-aware equality between two cells. Numeric kinds compare
    /// numerically within [`EPSILON`]; strings compare as text (optionally
    /// case-folded); lists compare element-wise. Cross-kind comparisons are
    /// unequal.
    pub fn loose_eq(&self, other: &CellValue, case_insensitive: bool) -> bool {
        match (self, other) {
            (a, b) if a.is_numeric() && b.is_numeric() => match (a.to_decimal(), b.to_decimal()) {
                (Some(x), Some(y)) => (x - y).abs() <= *EPSILON,
                _ => match (a.to_f64(), b.to_f64()) {
                    (Some(x), Some(y)) => (x - y).abs() <= 1e-6,
                    _ => false,
                },
            },
            (CellValue::Str(a), CellValue::Str(b)) => {
                if case_insensitive {
                    a.to_lowercase() == b.to_lowercase()
                } else {
                    a == b
                }
            }
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::List(a), CellValue::List(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|(x, y)| x.loose_eq(y, case_insensitive))
            }
            (a, b) => a == b,
        }
    }

    /// Total-ish ordering used by the sort-based operators: numerics before
    /// text, text by byte order, `Null` smallest. Lists and maps sort by
    /// their canonical string form.
    pub fn compare(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => Ordering::Equal,
            (CellValue::Null, _) => Ordering::Less,
            (_, CellValue::Null) => Ordering::Greater,
            (a, b) if a.is_numeric() && b.is_numeric() => {
                match (a.to_f64(), b.to_f64()) {
                    (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                    _ => Ordering::Equal,
                }
            }
            (a, b) if a.is_numeric() => {
                // Numeric text on the other side still compares numerically.
                match (a.to_f64(), b.to_f64()) {
                    (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                    _ => Ordering::Less,
                }
            }
            (a, b) if b.is_numeric() => match (a.to_f64(), b.to_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => Ordering::Greater,
            },
            (a, b) => a.canonical().cmp(&b.canonical()),
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, ""),
            CellValue::Str(s) => write!(f, "{s}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Num(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 9.0e18 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            CellValue::Decimal(d) => write!(f, "{}", d.normalize()),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            CellValue::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Str(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Str(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Num(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<Decimal> for CellValue {
    fn from(d: Decimal) -> Self {
        CellValue::Decimal(d)
    }
}

impl<T: Into<CellValue>> From<Vec<T>> for CellValue {
    fn from(items: Vec<T>) -> Self {
        CellValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Option<&str>> for CellValue {
    fn from(s: Option<&str>) -> Self {
        match s {
            Some(s) => CellValue::Str(s.to_string()),
            None => CellValue::Null,
        }
    }
}

/// Exact float→decimal conversion through the textual form, so the decimal
/// carries the digits the caller wrote rather than the binary expansion.
/// Non-finite and out-of-range floats yield `None`.
pub fn float_to_decimal(f: f64) -> Option<Decimal> {
    if !f.is_finite() {
        return None;
    }
    Decimal::from_str(&f.to_string()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cells() {
        assert!(CellValue::Null.is_empty());
        assert!(CellValue::Str(String::new()).is_empty());
        assert!(!CellValue::Str("x".into()).is_empty());
        assert!(!CellValue::Int(0).is_empty());
    }

    #[test]
    fn float_to_decimal_is_textual() {
        assert_eq!(float_to_decimal(1.1), Some(Decimal::new(11, 1)));
        assert_eq!(float_to_decimal(f64::NAN), None);
        assert_eq!(float_to_decimal(f64::INFINITY), None);
    }

    #[test]
    fn loose_eq_epsilon() {
        let a = CellValue::Num(1.0);
        assert!(a.loose_eq(&CellValue::Num(1.000001), false));
        assert!(!a.loose_eq(&CellValue::Num(1.00001), false));
        assert!(a.loose_eq(&CellValue::Int(1), false));
    }

    #[test]
    fn loose_eq_cross_kind_is_false() {
        assert!(!CellValue::Int(1).loose_eq(&CellValue::from("1"), false));
        assert!(!CellValue::Bool(true).loose_eq(&CellValue::Int(1), false));
    }

    #[test]
    fn canonical_forms() {
        assert_eq!(CellValue::Num(2.0).canonical(), "2");
        assert_eq!(CellValue::Num(2.5).canonical(), "2.5");
        assert_eq!(CellValue::Null.canonical(), "");
        assert_eq!(CellValue::Int(7).canonical(), "7");
    }

    #[test]
    fn compare_orders_numerics_and_text() {
        assert_eq!(
            CellValue::Int(2).compare(&CellValue::Num(10.0)),
            Ordering::Less
        );
        assert_eq!(
            CellValue::from("b").compare(&CellValue::from("a")),
            Ordering::Greater
        );
        assert_eq!(CellValue::Null.compare(&CellValue::Int(0)), Ordering::Less);
        assert_eq!(
            CellValue::from("10").compare(&CellValue::Int(2)),
            Ordering::Greater
        );
    }
}
