//! Per-region source priority.
//!
//! Each region has an ordered list of source codes, highest priority first.
//! Discovered input layers are sorted by that order before the overlay runs;
//! a layer whose code is not configured for the region is a fatal
//! configuration mismatch, since the order decides which geometry survives.

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

/// Priority resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriorityError {
    /// The region has no priority entry at all.
    #[error("No priority order configured for region '{0}'")]
    UnknownRegion(String),

    /// A discovered source code is absent from the region's order.
    #[error("Source code '{code}' has no priority entry for region '{region}'")]
    MissingPriorityEntry { region: String, code: String },
}

/// A discovered input dataset and the code of the source it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerInput {
    pub path: PathBuf,
    pub source_code: String,
}

impl LayerInput {
    pub fn new(path: impl Into<PathBuf>, source_code: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source_code: source_code.into(),
        }
    }
}

/// Mapping from region code to its source codes, highest priority first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorityTable {
    entries: BTreeMap<String, Vec<String>>,
}

/// Built-in state priority order.
const BUILTIN: &[(&str, &[&str])] = &[
    ("AR", &["CLU"]),
    ("AZ", &["UCRBGS", "LCRVPD", "CLU"]),
    ("CO", &["UCRB", "CODSS", "CLU"]),
    ("CT", &["CLU"]),
    ("DE", &["CLU"]),
    ("FL", &["FLSAID"]),
    ("GA", &["CLU"]),
    ("IA", &["CLU"]),
    ("ID", &["IDWRSP", "IDWRTV", "BRC", "CLU"]),
    ("IL", &["CLU"]),
    ("IN", &["CLU"]),
    ("KS", &["CLU"]),
    ("KY", &["CLU"]),
    ("LA", &["CLU"]),
    ("MA", &["CLU"]),
    ("MD", &["CLU"]),
    ("ME", &["CLU"]),
    ("MI", &["CLU"]),
    ("MN", &["CLU"]),
    ("MO", &["CLU"]),
    ("MS", &["CLU"]),
    ("MT", &["MTDNRC", "CLU"]),
    ("NC", &["CLU"]),
    ("ND", &["CLU"]),
    ("NE", &["NEDNR", "CLU"]),
    ("NH", &["CLU"]),
    ("NJ", &["CLU"]),
    ("NY", &["CLU"]),
    ("OH", &["CLU"]),
    ("OK", &["CLU"]),
    ("OR", &["ORWD", "CLU"]),
    ("PA", &["CLU"]),
    ("RI", &["CLU"]),
    ("SC", &["CLU"]),
    ("SD", &["CLU"]),
    ("TN", &["CLU"]),
    ("TX", &["TWDB", "CLU"]),
    ("VA", &["CLU"]),
    ("VT", &["CLU"]),
    ("WV", &["CLU"]),
    ("WI", &["CLU"]),
    ("WY", &["UCRBGS", "BRC", "WYSWP"]),
];

impl PriorityTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in per-state table.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (region, codes) in BUILTIN {
            table.set(*region, codes.iter().map(|c| c.to_string()).collect());
        }
        table
    }

    /// Sets (or replaces) a region's order. Codes are stored upper-case.
    pub fn set(&mut self, region: impl Into<String>, codes: Vec<String>) {
        let codes = codes
            .into_iter()
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .collect();
        self.entries.insert(region.into().to_uppercase(), codes);
    }

    pub fn codes(&self, region: &str) -> Option<&[String]> {
        self.entries
            .get(&region.to_uppercase())
            .map(|codes| codes.as_slice())
    }

    /// Rank of `code` within `region` (0 = highest priority).
    pub fn rank(&self, region: &str, code: &str) -> Option<usize> {
        self.codes(region)?
            .iter()
            .position(|c| c.eq_ignore_ascii_case(code))
    }

    /// Sorts discovered inputs by the region's priority order.
    ///
    /// Inputs sharing a code keep their discovery order.
    pub fn resolve(
        &self,
        region: &str,
        inputs: Vec<LayerInput>,
    ) -> Result<Vec<LayerInput>, PriorityError> {
        if self.codes(region).is_none() {
            return Err(PriorityError::UnknownRegion(region.to_string()));
        }

        let mut ranked = inputs
            .into_iter()
            .map(|input| match self.rank(region, &input.source_code) {
                Some(rank) => Ok((rank, input)),
                None => Err(PriorityError::MissingPriorityEntry {
                    region: region.to_string(),
                    code: input.source_code.clone(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        ranked.sort_by_key(|(rank, _)| *rank);
        Ok(ranked.into_iter().map(|(_, input)| input).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_contains_montana() {
        let table = PriorityTable::builtin();
        assert_eq!(
            table.codes("MT").unwrap(),
            &["MTDNRC".to_string(), "CLU".to_string()]
        );
        assert_eq!(table.rank("mt", "clu"), Some(1));
    }

    #[test]
    fn test_resolve_sorts_by_rank() {
        let table = PriorityTable::builtin();
        let inputs = vec![
            LayerInput::new("/in/ID/a_CLU.geojson", "CLU"),
            LayerInput::new("/in/ID/b_BRC.geojson", "BRC"),
            LayerInput::new("/in/ID/c_IDWRSP.geojson", "IDWRSP"),
        ];

        let ordered = table.resolve("ID", inputs).unwrap();
        let codes: Vec<&str> = ordered.iter().map(|i| i.source_code.as_str()).collect();

        assert_eq!(codes, vec!["IDWRSP", "BRC", "CLU"]);
    }

    #[test]
    fn test_resolve_keeps_discovery_order_for_equal_codes() {
        let table = PriorityTable::builtin();
        let inputs = vec![
            LayerInput::new("second_CLU.geojson", "CLU"),
            LayerInput::new("first_MTDNRC.geojson", "MTDNRC"),
            LayerInput::new("third_CLU.geojson", "CLU"),
        ];

        let ordered = table.resolve("MT", inputs).unwrap();
        let paths: Vec<_> = ordered.iter().map(|i| i.path.to_str().unwrap()).collect();

        assert_eq!(
            paths,
            vec!["first_MTDNRC.geojson", "second_CLU.geojson", "third_CLU.geojson"]
        );
    }

    #[test]
    fn test_resolve_missing_code_is_fatal() {
        let table = PriorityTable::builtin();
        let inputs = vec![LayerInput::new("x_NEDNR.geojson", "NEDNR")];

        let err = table.resolve("MT", inputs).unwrap_err();
        assert_eq!(
            err,
            PriorityError::MissingPriorityEntry {
                region: "MT".to_string(),
                code: "NEDNR".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_unknown_region() {
        let table = PriorityTable::builtin();
        let err = table.resolve("ZZ", Vec::new()).unwrap_err();
        assert_eq!(err, PriorityError::UnknownRegion("ZZ".to_string()));
    }

    #[test]
    fn test_set_overrides_and_normalizes() {
        let mut table = PriorityTable::builtin();
        table.set("mt", vec![" clu ".to_string(), "MTDNRC".to_string(), "".to_string()]);

        assert_eq!(table.rank("MT", "CLU"), Some(0));
        assert_eq!(table.codes("MT").unwrap().len(), 2);
    }
}
