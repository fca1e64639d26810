// 🏛️ Committee Entity - yearly snapshots of a registered committee
//
// The same committee id appears once per reporting year. When a single
// snapshot is needed, the most recent year wins.

use serde::{Deserialize, Serialize};

/// Type codes that identify a PAC
pub const PAC_TYPE_CODES: [&str; 5] = ["N", "Q", "O", "V", "W"];

// ============================================================================
// COMMITTEE ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Committee {
    pub id: String,
    pub name: String,

    /// Single-letter committee type (see `type_description`)
    pub type_code: String,

    /// A, B, D, J, P or U
    pub designation_code: String,

    pub party_affiliation: Option<String>,

    /// FEC organization type; "C" is a corporation
    pub organization_type: Option<String>,

    pub connected_organization_name: Option<String>,

    /// Candidate referenced directly by the committee row
    pub candidate_id: Option<String>,

    pub treasurer_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,

    /// Reporting year of this snapshot
    pub year: i32,
}

impl Committee {
    pub fn new(id: impl Into<String>, name: impl Into<String>, type_code: &str, year: i32) -> Self {
        Committee {
            id: id.into(),
            name: name.into(),
            type_code: type_code.to_string(),
            designation_code: String::new(),
            party_affiliation: None,
            organization_type: None,
            connected_organization_name: None,
            candidate_id: None,
            treasurer_name: None,
            city: None,
            state: None,
            year,
        }
    }

    pub fn with_designation(mut self, code: &str) -> Self {
        self.designation_code = code.to_string();
        self
    }

    pub fn with_organization_type(mut self, org_type: &str) -> Self {
        self.organization_type = Some(org_type.to_string());
        self
    }

    pub fn with_connected_organization(mut self, org: &str) -> Self {
        self.connected_organization_name = Some(org.to_string());
        self
    }

    pub fn with_candidate(mut self, candidate_id: &str) -> Self {
        self.candidate_id = Some(candidate_id.to_string());
        self
    }

    /// Type code without surrounding padding
    pub fn type_code_trimmed(&self) -> &str {
        self.type_code.trim()
    }

    pub fn is_pac(&self) -> bool {
        PAC_TYPE_CODES.contains(&self.type_code_trimmed())
    }

    pub fn has_corporate_organization(&self) -> bool {
        match self.organization_type.as_deref() {
            Some(t) => t == "C" || t.eq_ignore_ascii_case("corporate"),
            None => false,
        }
    }

    /// Non-empty connected organization name, trimmed
    pub fn connected_organization(&self) -> Option<&str> {
        self.connected_organization_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn is_corporate_pac(&self) -> bool {
        self.is_pac() && (self.has_corporate_organization() || self.connected_organization().is_some())
    }

    pub fn type_description(&self) -> &'static str {
        type_description(self.type_code_trimmed())
    }

    pub fn designation_description(&self) -> &'static str {
        designation_description(&self.designation_code)
    }
}

// ============================================================================
// CODE DESCRIPTIONS
// ============================================================================

pub fn type_description(code: &str) -> &'static str {
    match code {
        "C" => "Communication Cost",
        "D" => "Delegate Committee",
        "E" => "Electioneering Communication",
        "H" => "House Campaign Committee",
        "I" => "Independent Expenditor (Person or Group)",
        "N" => "PAC - Nonqualified",
        "O" => "Independent Expenditure-Only (Super PAC)",
        "P" => "Presidential Campaign Committee",
        "Q" => "PAC - Qualified",
        "S" => "Senate Campaign Committee",
        "U" => "Single Candidate Independent Expenditure",
        "V" => "PAC with Non-Contribution Account - Nonqualified",
        "W" => "PAC with Non-Contribution Account - Qualified",
        "X" => "Party - Nonqualified",
        "Y" => "Party - Qualified",
        "Z" => "National Party Nonfederal Account",
        _ => "Unknown",
    }
}

pub fn designation_description(code: &str) -> &'static str {
    match code {
        "A" => "Authorized by a candidate",
        "B" => "Lobbyist/Registrant PAC",
        "D" => "Leadership PAC",
        "J" => "Joint fundraiser",
        "P" => "Principal campaign committee",
        "U" => "Unauthorized",
        _ => "Unknown",
    }
}
