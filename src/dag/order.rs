// src/dag/order.rs

//! Order codes: the identifier and position key of a task in the
//! dependency ordering.
//!
//! Codes compare by length first and lexicographically second, so
//! `"A" < "B" < ... < "Z" < "AA" < "AB"`.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SeasonflowError};

static ORDER_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][A-Z0-9]*$").expect("order code pattern is valid")
});

/// Compare two raw codes under the (length, then lexicographic) rule.
pub fn compare_codes(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Returns `true` if `pred` sorts strictly before `owner`.
pub fn precedes(pred: &str, owner: &str) -> bool {
    compare_codes(pred, owner) == Ordering::Less
}

/// A normalized order code (trimmed, upper-case, `[A-Z][A-Z0-9]*`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderCode(String);

impl OrderCode {
    /// Normalize and validate a raw code.
    pub fn parse(raw: &str) -> Result<Self> {
        let code = raw.trim().to_uppercase();
        if !ORDER_CODE_RE.is_match(&code) {
            return Err(SeasonflowError::Validation(format!(
                "invalid order code '{}' (expected letters/digits starting with a letter)",
                raw
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for OrderCode {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_codes(&self.0, &other.0)
    }
}

impl PartialOrd for OrderCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for OrderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for OrderCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OrderCode {
    type Error = SeasonflowError;

    fn try_from(value: String) -> Result<Self> {
        OrderCode::parse(&value)
    }
}

impl From<OrderCode> for String {
    fn from(code: OrderCode) -> Self {
        code.0
    }
}

/// Normalize a department code (trimmed, upper-case, non-empty).
pub fn normalize_department(raw: &str) -> Result<String> {
    let dept = raw.trim().to_uppercase();
    if dept.is_empty() {
        return Err(SeasonflowError::Validation(
            "department code must not be empty".to_string(),
        ));
    }
    Ok(dept)
}
