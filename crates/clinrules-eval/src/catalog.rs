//! Static operator catalogs.
//!
//! Each type family declares its operators in a startup-time table; no
//! runtime reflection. `get_all_operators()` on a wrapper reads its table
//! (the generic wrapper reads the union of the families it dispatches to).

use clinrules_common::{InputShape, OperatorMeta, pretty_label};

/// One table entry: the operator name, an optional explicit label (the
/// default is derived from the name), the expected input shape, and whether
/// arguments are coerced through the host type's validator before the body
/// runs.
#[derive(Debug, Clone, Copy)]
pub struct OperatorDef {
    pub name: &'static str,
    pub label: Option<&'static str>,
    pub input_shape: InputShape,
    pub coerces_arguments: bool,
}

macro_rules! operator_table {
    (@label) => {
        None
    };
    (@label $label:literal) => {
        Some($label)
    };
    ($vis:vis static $table:ident, coerce = $coerce:literal, [
        $( $name:literal => $shape:ident $(($label:literal))? ),* $(,)?
    ]) => {
        $vis static $table: &[OperatorDef] = &[
            $(
                OperatorDef {
                    name: $name,
                    label: operator_table!(@label $($label)?),
                    input_shape: InputShape::$shape,
                    coerces_arguments: $coerce,
                },
            )*
        ];
    };
}

operator_table!(pub static STRING_OPERATORS, coerce = true, [
    "equal_to" => Text,
    "not_equal_to" => Text,
    "equal_to_case_insensitive" => Text("Equal To (case insensitive)"),
    "starts_with" => Text,
    "ends_with" => Text,
    "contains" => Text,
    "matches_regex" => Text,
    "non_empty" => NoInput,
]);

operator_table!(pub static NUMERIC_OPERATORS, coerce = true, [
    "equal_to" => Numeric,
    "not_equal_to" => Numeric,
    "greater_than" => Numeric,
    "greater_than_or_equal_to" => Numeric,
    "less_than" => Numeric,
    "less_than_or_equal_to" => Numeric,
]);

operator_table!(pub static BOOLEAN_OPERATORS, coerce = true, [
    "is_true" => NoInput,
    "is_false" => NoInput,
]);

operator_table!(pub static SELECT_OPERATORS, coerce = false, [
    "contains" => Select,
    "does_not_contain" => Select,
]);

operator_table!(pub static SELECT_MULTIPLE_OPERATORS, coerce = true, [
    "contains_all" => SelectMultiple,
    "is_contained_by" => SelectMultiple,
    "is_not_contained_by" => SelectMultiple,
    "shares_at_least_one_element_with" => SelectMultiple,
    "shares_exactly_one_element_with" => SelectMultiple,
    "shares_no_elements_with" => SelectMultiple,
]);

operator_table!(pub static GENERIC_OPERATORS, coerce = true, [
    "equal_to" => Text,
    "not_equal_to" => Text,
    "is_contained_by" => SelectMultiple,
    "num_equal_to" => Numeric,
    "num_not_equal_to" => Numeric,
    "str_equal_to" => Text,
    "str_not_equal_to" => Text,
    "contains" => Text,
]);

/// Materialize a table into catalog records, deriving missing labels.
pub fn catalog(defs: &[OperatorDef]) -> Vec<OperatorMeta> {
    defs.iter()
        .map(|def| OperatorMeta {
            name: def.name,
            label: def
                .label
                .map(str::to_string)
                .unwrap_or_else(|| pretty_label(def.name)),
            input_shape: def.input_shape,
        })
        .collect()
}

/// Union of several catalogs, first definition of a name wins.
pub fn catalog_union(tables: &[&[OperatorDef]]) -> Vec<OperatorMeta> {
    let mut seen = rustc_hash::FxHashSet::default();
    let mut out = Vec::new();
    for table in tables {
        for meta in catalog(table) {
            if seen.insert(meta.name) {
                out.push(meta);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_default_from_names() {
        let metas = catalog(STRING_OPERATORS);
        let eq = metas.iter().find(|m| m.name == "equal_to").unwrap();
        assert_eq!(eq.label, "Equal To");
        let ci = metas
            .iter()
            .find(|m| m.name == "equal_to_case_insensitive")
            .unwrap();
        assert_eq!(ci.label, "Equal To (case insensitive)");
    }

    #[test]
    fn select_family_does_not_coerce() {
        assert!(SELECT_OPERATORS.iter().all(|d| !d.coerces_arguments));
        assert!(STRING_OPERATORS.iter().all(|d| d.coerces_arguments));
    }

    #[test]
    fn union_dedupes_by_name() {
        let union = catalog_union(&[GENERIC_OPERATORS, STRING_OPERATORS]);
        let count = union.iter().filter(|m| m.name == "equal_to").count();
        assert_eq!(count, 1);
    }
}
