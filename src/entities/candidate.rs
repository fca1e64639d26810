// 🧑‍⚖️ Candidate Entity - registry-issued identity, many display forms
//
// The id ("H2AR04083") is looked up, never derived. The display name arrives
// as "COTTON, THOMAS" in one table and "Thomas Cotton" in another.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// CANDIDATE ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Opaque registry id
    pub id: String,

    /// Name as written by the source table
    pub display_name: String,

    /// H, S or P
    pub office: Option<String>,

    pub party: Option<String>,

    pub office_state: Option<String>,

    pub office_district: Option<String>,

    /// Every election year the candidate filed for, ascending
    pub election_years: BTreeSet<i32>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Candidate {
            id: id.into(),
            display_name: display_name.into(),
            office: None,
            party: None,
            office_state: None,
            office_district: None,
            election_years: BTreeSet::new(),
        }
    }

    pub fn with_office(mut self, office: &str) -> Self {
        self.office = Some(office.to_string());
        self
    }

    pub fn with_party(mut self, party: &str) -> Self {
        self.party = Some(party.to_string());
        self
    }

    pub fn with_years(mut self, years: &[i32]) -> Self {
        self.election_years.extend(years.iter().copied());
        self
    }

    /// Most recent election year, if any
    pub fn latest_election_year(&self) -> Option<i32> {
        self.election_years.iter().next_back().copied()
    }

    pub fn is_presidential(&self) -> bool {
        matches!(self.office.as_deref(), Some(o) if o.eq_ignore_ascii_case("P"))
    }

    /// Fold another row for the same id into this one
    pub fn merge(&mut self, other: Candidate) {
        self.election_years.extend(other.election_years);
        if self.office.is_none() {
            self.office = other.office;
        }
        if self.party.is_none() {
            self.party = other.party;
        }
        if self.office_state.is_none() {
            self.office_state = other.office_state;
        }
        if self.office_district.is_none() {
            self.office_district = other.office_district;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_years_ordered() {
        let mut a = Candidate::new("H2AR04083", "COTTON, THOMAS").with_years(&[2014, 2012]);
        let b = Candidate::new("H2AR04083", "Thomas Cotton")
            .with_office("H")
            .with_years(&[2020, 2012]);

        a.merge(b);

        assert_eq!(a.election_years.iter().copied().collect::<Vec<_>>(), vec![2012, 2014, 2020]);
        assert_eq!(a.latest_election_year(), Some(2020));
        assert_eq!(a.office.as_deref(), Some("H"));
        assert_eq!(a.display_name, "COTTON, THOMAS");
    }
}
