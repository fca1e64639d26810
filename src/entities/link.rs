// 🔗 Candidate-Committee Link - explicit many-to-many association

use serde::{Deserialize, Serialize};

/// One linkage record from the candidate-committee linkage file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateCommitteeLink {
    pub linkage_id: String,
    pub candidate_id: String,
    pub candidate_election_year: i32,
    pub fec_election_year: i32,
    pub committee_id: String,
    pub committee_type: String,
    pub committee_designation: String,
    /// Data-drop year the link was loaded from
    pub year: i32,
}
