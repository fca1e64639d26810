// 💵 Contributions - aggregated committee contributions and itemized transactions

use serde::{Deserialize, Serialize};

/// Entity type code for individual contributors
pub const INDIVIDUAL_ENTITY_TYPE: &str = "IND";

/// Amount given by one named contributor to one candidate in one year.
/// Keyed by (candidate_id, contributor_name, year); re-ingesting a key adds to `amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteeContribution {
    pub candidate_id: String,
    pub contributor_name: String,
    pub entity_type: String,
    pub amount: f64,
    pub year: i32,
}

impl CommitteeContribution {
    pub fn new(candidate_id: &str, contributor_name: &str, entity_type: &str, amount: f64, year: i32) -> Self {
        CommitteeContribution {
            candidate_id: candidate_id.to_string(),
            contributor_name: contributor_name.to_string(),
            entity_type: entity_type.to_string(),
            amount,
            year,
        }
    }

    pub fn is_individual(&self) -> bool {
        self.entity_type == INDIVIDUAL_ENTITY_TYPE
    }
}

/// A single itemized row, stored as loaded and aggregated on demand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualTransaction {
    pub committee_id: String,
    pub transaction_type: String,
    pub entity_type: String,
    pub recipient_name: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub employer: String,
    pub occupation: String,
    /// MMDDYYYY as published
    pub transaction_date: String,
    pub amount: f64,
    pub recipient_candidate_id: Option<String>,
    pub year: i32,
}
