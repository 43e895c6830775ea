//! Verification and search outcome types.

use serde::{Deserialize, Serialize};

use super::geo::Coordinates;
use super::location::PoiRecord;
use crate::error::ErrorKind;

/// Tri-state result of checking one location's menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationResult {
    /// The item was detected (or the override table says so)
    Found,
    /// At least one menu page was read and none carried the item
    NotFound,
    /// No menu page could be fetched at all
    Inconclusive,
}

impl VerificationResult {
    pub fn is_found(&self) -> bool {
        matches!(self, VerificationResult::Found)
    }
}

/// Which detection rule produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    /// Override table entry, no network
    Override,
    /// Case-insensitive substring anywhere in the page
    Keyword,
    /// Keyword inside a product/menu item element
    ItemElement,
    /// Transposition-tolerant regex
    Pattern,
}

/// Detailed result of `ContentVerifier::verify_detailed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub result: VerificationResult,

    /// Page the item was found on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_url: Option<String>,

    /// Rule that matched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heuristic: Option<Heuristic>,

    /// Text that matched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_text: Option<String>,

    /// Pages fetched successfully
    pub pages_fetched: usize,

    /// Pages whose retries were exhausted
    pub pages_failed: usize,
}

impl VerificationReport {
    pub(crate) fn empty(result: VerificationResult) -> Self {
        Self {
            result,
            matched_url: None,
            heuristic: None,
            matched_text: None,
            pages_fetched: 0,
            pages_failed: 0,
        }
    }
}

/// Diagnostics for one verified candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAttempt {
    pub record: PoiRecord,
    pub identifier: String,
    pub result: VerificationResult,
}

/// The only value a search returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub found: bool,

    /// The nearest location carrying the item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PoiRecord>,

    /// Set only for fatal failures and cancellation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,

    /// Resolved search origin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Coordinates>,

    /// Human-readable description of a failure or of "not found"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Every candidate verified, nearest first
    #[serde(default)]
    pub attempts: Vec<CandidateAttempt>,
}

impl SearchOutcome {
    pub fn found(location: PoiRecord) -> Self {
        Self {
            found: true,
            location: Some(location),
            error_kind: None,
            origin: None,
            message: None,
            attempts: Vec::new(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            found: false,
            location: None,
            error_kind: None,
            origin: None,
            message: Some(message.into()),
            attempts: Vec::new(),
        }
    }

    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            error_kind: Some(kind),
            ..Self::not_found(message)
        }
    }

    pub fn with_origin(mut self, origin: Option<Coordinates>) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_attempts(mut self, attempts: Vec<CandidateAttempt>) -> Self {
        self.attempts = attempts;
        self
    }

    /// True for geocode/locate failures and cancellation.
    pub fn is_error(&self) -> bool {
        self.error_kind.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serializes_without_empty_fields() {
        let outcome = SearchOutcome::not_found("nothing nearby");
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["found"], false);
        assert_eq!(json["message"], "nothing nearby");
        assert!(json.get("location").is_none());
        assert!(json.get("error_kind").is_none());
        assert!(!outcome.is_error());
    }

    #[test]
    fn test_failed_outcome_kind() {
        let outcome = SearchOutcome::failed(ErrorKind::Locate, "no sources");
        assert!(outcome.is_error());
        assert!(!outcome.found);

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["error_kind"], "locate");
    }
}
