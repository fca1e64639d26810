// 🌐 Remote Collaborators - seams for the three external APIs
// Blocking clients; each call is one round trip with no retry

pub mod fec;
pub mod littlesis;
pub mod llm;

use crate::error::{FinanceError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use fec::FecClient;
pub use littlesis::LittleSisClient;
pub use llm::ChatCompletionClient;

/// Blocking client shared by the remote collaborators
pub(crate) fn http_client(service: &str, timeout_secs: u64) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(format!("open-pockets/{}", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(|e| FinanceError::unavailable(service, format!("cannot build HTTP client: {}", e)))
}

/// Turn transport errors and non-success statuses into `DataSourceUnavailable`
pub(crate) fn check_response(
    service: &str,
    sent: reqwest::Result<reqwest::blocking::Response>,
) -> Result<reqwest::blocking::Response> {
    let response = sent.map_err(|e| FinanceError::unavailable(service, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(FinanceError::unavailable(
            service,
            format!("HTTP {}: {}", status.as_u16(), body.chars().take(200).collect::<String>()),
        ));
    }

    Ok(response)
}

// ============================================================================
// CAMPAIGN-FINANCE REGISTRY
// ============================================================================

/// One search hit from the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryCandidate {
    pub candidate_id: String,
    pub name: String,
    pub office: Option<String>,
    pub party: Option<String>,
    pub election_years: Vec<i32>,
}

impl RegistryCandidate {
    pub fn latest_election_year(&self) -> Option<i32> {
        self.election_years.iter().copied().max()
    }

    pub fn is_presidential(&self) -> bool {
        matches!(self.office.as_deref(), Some(o) if o.eq_ignore_ascii_case("P"))
    }
}

pub trait CandidateRegistry {
    fn search(&self, query: &str, page: u32, per_page: u32) -> Result<Vec<RegistryCandidate>>;

    /// Full detail record, None when the id is unknown
    fn get_candidate(&self, candidate_id: &str) -> Result<Option<serde_json::Value>>;
}

// ============================================================================
// ENTITY GRAPH
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: i64,
    pub name: String,
    pub entity_type: String,
    pub description: Option<String>,
}

pub trait EntityLookup {
    /// Best match for the name; None is a normal outcome
    fn lookup(&self, name: &str) -> Result<Option<EntityRecord>>;
}

// ============================================================================
// TEXT GENERATION
// ============================================================================

pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String>;
}
