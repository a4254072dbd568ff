//! Controlled-terminology checks against the wrapper's codelist maps.

use clinrules_common::{CellValue, RuleError};

use super::{DataframeValue, FrameArgs, Verdict};

impl DataframeValue {
    /// Undo the prefix rewriting: `AEDECOD` → `--DECOD` when `--` maps to
    /// `AE`. Longest concrete prefix wins.
    fn generic_column_name(&self, name: &str) -> Option<String> {
        let mut entries: Vec<(&String, &String)> = self.column_prefix_map.iter().collect();
        entries.sort_by_key(|(_, concrete)| std::cmp::Reverse(concrete.len()));
        for (generic, concrete) in entries {
            if name.starts_with(concrete.as_str()) {
                return Some(format!("{generic}{}", &name[concrete.len()..]));
            }
        }
        None
    }

    /// For each row, the codelist named in the comparator column must be
    /// among those permitted for the variable named in the target column —
    /// by its exact name first, then by its generic form. Variables known
    /// under neither name pass (open world).
    pub fn references_correct_codelist(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let codelists = self.require_comparand(args)?;
        Ok(self.mask(|i| {
            let variable = target[i].canonical();
            let permitted = self.column_codelist_map.get(&variable).or_else(|| {
                self.generic_column_name(&variable)
                    .and_then(|generic| self.column_codelist_map.get(&generic))
            });
            match permitted {
                Some(allowed) => allowed.contains(&codelists.at(i).canonical()),
                None => true,
            }
        }))
    }

    /// A row's codelist accepts its term list when some supplied term map
    /// knows the codelist and either marks it extensible or contains every
    /// term. Codelists found in no map fail.
    pub fn uses_valid_codelist_terms(&self, args: &FrameArgs) -> Result<Verdict, RuleError> {
        let target = self.target_column(args)?;
        let terms_col = self.require_comparand(args)?;
        Ok(self.mask(|i| {
            let codelist = target[i].canonical();
            let terms: Vec<String> = match terms_col.at(i) {
                CellValue::List(items) => items.iter().map(CellValue::canonical).collect(),
                CellValue::Null => Vec::new(),
                scalar => vec![scalar.canonical()],
            };
            self.codelist_term_maps.iter().any(|map| {
                map.get(&codelist).is_some_and(|info| {
                    info.extensible || terms.iter().all(|term| info.allowed_terms.contains(term))
                })
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use clinrules_common::Frame;

    use super::*;
    use crate::frame::CodelistInfo;

    fn col(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|&v| CellValue::from(v)).collect()
    }

    fn set(values: &[&str]) -> HashSet<String> {
        values.iter().map(|&v| v.to_string()).collect()
    }

    fn mask(verdict: Verdict) -> Vec<Option<bool>> {
        match verdict {
            Verdict::Mask(m) => m,
            Verdict::Scalar(b) => panic!("expected mask, got scalar {b}"),
        }
    }

    #[test]
    fn codelist_reference_by_exact_and_generic_name() {
        let frame = Frame::from_columns(vec![
            ("VARIABLE", col(&["AESEV", "AEDECOD", "AEWEIRD"])),
            ("CODELIST", col(&["C66769", "C99999", "C11111"])),
        ])
        .unwrap();
        let df = DataframeValue::new(frame)
            .with_column_prefix_map([("--".to_string(), "AE".to_string())].into_iter().collect())
            .with_column_codelist_map(HashMap::from([
                // Exact name for AESEV, generic form for --DECOD.
                ("AESEV".to_string(), set(&["C66769"])),
                ("--DECOD".to_string(), set(&["C12345"])),
            ]));
        let args = FrameArgs::new().target("VARIABLE").comparator("CODELIST");
        assert_eq!(
            mask(df.references_correct_codelist(&args).unwrap()),
            // AESEV matches exactly; AEDECOD resolves to --DECOD and its
            // codelist is wrong; AEWEIRD is unknown and passes open-world.
            vec![Some(true), Some(false), Some(true)]
        );
    }

    #[test]
    fn extensible_codelists_accept_new_terms() {
        let frame = Frame::from_columns(vec![
            ("CODELIST", col(&["C1", "C1"])),
            (
                "TERMS",
                vec![
                    CellValue::from(vec!["x", "y"]),
                    CellValue::from(vec!["x"]),
                ],
            ),
        ])
        .unwrap();
        let extensible = HashMap::from([(
            "C1".to_string(),
            CodelistInfo {
                extensible: true,
                allowed_terms: set(&["x"]),
            },
        )]);
        let df = DataframeValue::new(frame).with_codelist_term_maps(vec![extensible]);
        let args = FrameArgs::new().target("CODELIST").comparator("TERMS");
        assert_eq!(
            mask(df.uses_valid_codelist_terms(&args).unwrap()),
            vec![Some(true), Some(true)]
        );
    }

    #[test]
    fn closed_codelists_require_known_terms() {
        let frame = Frame::from_columns(vec![
            ("CODELIST", col(&["C1", "C1", "C9"])),
            (
                "TERMS",
                vec![
                    CellValue::from(vec!["x", "y"]),
                    CellValue::from(vec!["x"]),
                    CellValue::from(vec!["x"]),
                ],
            ),
        ])
        .unwrap();
        let closed = HashMap::from([(
            "C1".to_string(),
            CodelistInfo {
                extensible: false,
                allowed_terms: set(&["x"]),
            },
        )]);
        let df = DataframeValue::new(frame).with_codelist_term_maps(vec![closed]);
        let args = FrameArgs::new().target("CODELIST").comparator("TERMS");
        assert_eq!(
            mask(df.uses_valid_codelist_terms(&args).unwrap()),
            // "y" is out of vocabulary; C9 sits in no term map.
            vec![Some(false), Some(true), Some(false)]
        );
    }

    #[test]
    fn term_maps_or_together() {
        let frame = Frame::from_columns(vec![
            ("CODELIST", col(&["C1"])),
            ("TERMS", vec![CellValue::from(vec!["z"])]),
        ])
        .unwrap();
        let first = HashMap::from([(
            "C1".to_string(),
            CodelistInfo {
                extensible: false,
                allowed_terms: set(&["x"]),
            },
        )]);
        let second = HashMap::from([(
            "C1".to_string(),
            CodelistInfo {
                extensible: false,
                allowed_terms: set(&["z"]),
            },
        )]);
        let df = DataframeValue::new(frame).with_codelist_term_maps(vec![first, second]);
        let args = FrameArgs::new().target("CODELIST").comparator("TERMS");
        assert_eq!(
            mask(df.uses_valid_codelist_terms(&args).unwrap()),
            vec![Some(true)]
        );
    }
}
