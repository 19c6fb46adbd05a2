use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Final classification of one candidate address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "message", rename_all = "snake_case")]
pub enum ProbeResult {
    /// Mailbox accepted (250/251).
    Valid,
    /// Mailbox rejected with a definitive code, or address malformed.
    Invalid,
    /// Provider known to answer RCPT ambiguously.
    Tentative,
    /// Retries and hosts exhausted on soft failures or timeouts.
    Timeout,
    /// Domain has no usable mail exchanger.
    NoMx,
    /// Transport failure on every attempt.
    Error(String),
}

impl ProbeResult {
    pub fn is_conclusive(&self) -> bool {
        matches!(self, Self::Valid | Self::Invalid)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Tentative => "tentative",
            Self::Timeout => "timeout",
            Self::NoMx => "no_mx",
            Self::Error(_) => "error",
        }
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(message) => write!(f, "error ({message})"),
            other => f.write_str(other.label()),
        }
    }
}

/// Everything recorded about one address once it reached a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeOutcome {
    pub address: String,
    #[serde(flatten)]
    pub result: ProbeResult,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    pub attempts: u32,
}

impl ProbeOutcome {
    pub fn new(address: impl Into<String>, result: ProbeResult, detail: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            result,
            detail: detail.into(),
            host: None,
            code: None,
            attempts: 0,
        }
    }

    pub fn touched_network(&self) -> bool {
        self.attempts > 0
    }
}

/// Addresses classified `Valid`, unique, in first-verified order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifiedSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl VerifiedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the address was already present.
    pub fn insert(&mut self, address: impl Into<String>) -> bool {
        let address = address.into();
        if self.seen.insert(address.to_ascii_lowercase()) {
            self.order.push(address);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.order
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.order)
    }
}

/// Result of a batch run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub verified: VerifiedSet,
    pub outcomes: Vec<ProbeOutcome>,
    pub rotations: u32,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn count(&self, label: &str) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.result.label() == label)
            .count()
    }

    pub fn summary_line(&self) -> String {
        format!("verified {}/{}", self.verified.len(), self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verified_set_ignores_duplicates() {
        let mut set = VerifiedSet::new();
        assert!(set.insert("b@example.com"));
        assert!(!set.insert("B@example.com"));
        assert!(set.insert("a@example.com"));
        let parsed: Vec<String> = serde_json::from_str(&set.to_json().unwrap()).unwrap();
        assert_eq!(parsed, vec!["b@example.com", "a@example.com"]);
    }

    #[test]
    fn outcome_serializes_flat() {
        let mut outcome = ProbeOutcome::new("x@example.com", ProbeResult::Invalid, "550 no user");
        outcome.code = Some(550);
        outcome.attempts = 1;
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["result"], "invalid");
        assert_eq!(json["code"], 550);
        assert!(json.get("host").is_none());
    }

    #[test]
    fn error_result_keeps_message() {
        let outcome = ProbeOutcome::new("x@example.com", ProbeResult::Error("refused".into()), "");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["result"], "error");
        assert_eq!(json["message"], "refused");
    }
}
