// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structured validation reporting.
//!
//! Every check can either raise on the first violation or collect all
//! violations as structured records for batch reporting.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How a validation check reports violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckMode {
    /// Return an error for the first violation found.
    #[default]
    RaiseFirst,
    /// Collect every violation as a structured record.
    Collect,
}

/// A single validation violation with enough context for batch reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRecord {
    /// Stable error code, e.g. "000104".
    pub code: String,
    /// Human-readable category, e.g. "Invalid Sub-Face Geometry".
    pub error_type: String,
    /// Full message describing the violation.
    pub message: String,
    /// Kind of element the violation is anchored on ("Face", "SubFace", ...).
    pub element_type: String,
    /// Identifiers of the offending elements.
    pub element_id: Vec<String>,
    /// Display names matching `element_id`.
    pub element_name: Vec<String>,
    /// Parent identifier chain per offending element (innermost first).
    pub parents: Vec<Vec<String>>,
    /// Optional geometry that helps locate the problem (e.g. the
    /// out-of-plane vertices), as XYZ triples.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub helper_geometry: Option<Vec<[f64; 3]>>,
}

impl ValidationRecord {
    pub fn new(
        code: &str,
        error_type: &str,
        message: String,
        element_type: &str,
        element_id: String,
        element_name: String,
        parents: Vec<String>,
    ) -> Self {
        Self {
            code: code.to_string(),
            error_type: error_type.to_string(),
            message,
            element_type: element_type.to_string(),
            element_id: vec![element_id],
            element_name: vec![element_name],
            parents: vec![parents],
            helper_geometry: None,
        }
    }
}

/// Resolves a list of violation records against the requested mode:
/// raise-on-first surfaces the first record as an error, collect returns
/// them all.
pub(crate) fn resolve(records: Vec<ValidationRecord>, mode: CheckMode) -> Result<Vec<ValidationRecord>> {
    match mode {
        CheckMode::RaiseFirst => match records.into_iter().next() {
            Some(first) => Err(Error::Validation(first)),
            None => Ok(Vec::new()),
        },
        CheckMode::Collect => Ok(records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str) -> ValidationRecord {
        ValidationRecord::new(
            code,
            "Test",
            "test violation".to_string(),
            "Face",
            "face_1".to_string(),
            "face_1".to_string(),
            vec![],
        )
    }

    #[test]
    fn raise_first_surfaces_the_first_record() {
        let result = resolve(vec![record("000101"), record("000102")], CheckMode::RaiseFirst);
        match result {
            Err(Error::Validation(rec)) => assert_eq!(rec.code, "000101"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn collect_returns_everything() {
        let records = resolve(vec![record("000101"), record("000102")], CheckMode::Collect)
            .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn no_violations_is_ok_in_both_modes() {
        assert!(resolve(Vec::new(), CheckMode::RaiseFirst).unwrap().is_empty());
        assert!(resolve(Vec::new(), CheckMode::Collect).unwrap().is_empty());
    }
}
