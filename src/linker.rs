// 🔗 Record Linker - candidate id → committees
// Two discovery paths: explicit linkage records and the committee row's own
// candidate column. Linkage records win when both name the same (committee, year).

use crate::db;
use crate::entities::Committee;
use crate::error::Result;
use rusqlite::Connection;
use serde::{Serialize, Serializer};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

// ============================================================================
// LINK SOURCE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkSource {
    /// From a linkage record with this linkage id
    Linkage(String),
    /// From the committee row's candidate column
    Direct,
}

impl LinkSource {
    pub fn is_linkage(&self) -> bool {
        matches!(self, LinkSource::Linkage(_))
    }
}

impl fmt::Display for LinkSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkSource::Linkage(id) => write!(f, "linkage-{}", id),
            LinkSource::Direct => write!(f, "direct"),
        }
    }
}

impl Serialize for LinkSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedCommittee {
    pub committee_id: String,
    pub type_code: String,
    pub designation_code: String,
    pub year: i32,
    pub source: LinkSource,
}

/// Committee snapshot with its derived flags and code descriptions
#[derive(Debug, Clone, Serialize)]
pub struct CommitteeDetails {
    #[serde(flatten)]
    pub committee: Committee,
    pub is_pac: bool,
    pub is_corporate_pac: bool,
    pub type_description: &'static str,
    pub designation_description: &'static str,
}

impl From<Committee> for CommitteeDetails {
    fn from(committee: Committee) -> Self {
        CommitteeDetails {
            is_pac: committee.is_pac(),
            is_corporate_pac: committee.is_corporate_pac(),
            type_description: committee.type_description(),
            designation_description: committee.designation_description(),
            committee,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "connection_type")]
pub enum CommitteeConnection {
    CandidateRelationship { candidate_id: String },
    SameOrganization { organization: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectedCommittee {
    pub committee: Committee,
    #[serde(flatten)]
    pub connection: CommitteeConnection,
}

// ============================================================================
// RECORD LINKER
// ============================================================================

pub struct RecordLinker<'c> {
    conn: &'c Connection,
}

impl<'c> RecordLinker<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        RecordLinker { conn }
    }

    /// Linkage entries first (year desc, committee id, linkage id), then direct
    /// entries (year desc, committee id) not already present for the same
    /// (committee, year). Not re-sorted after the merge.
    pub fn linked_committees(&self, candidate_id: &str) -> Result<Vec<LinkedCommittee>> {
        let mut linked: Vec<LinkedCommittee> = db::get_links_for_candidate(self.conn, candidate_id)?
            .into_iter()
            .map(|link| LinkedCommittee {
                committee_id: link.committee_id,
                type_code: link.committee_type,
                designation_code: link.committee_designation,
                year: link.year,
                source: LinkSource::Linkage(link.linkage_id),
            })
            .collect();

        let mut seen: HashSet<(String, i32)> = linked
            .iter()
            .map(|l| (l.committee_id.clone(), l.year))
            .collect();

        for committee in db::get_direct_committees(self.conn, candidate_id)? {
            if !seen.insert((committee.id.clone(), committee.year)) {
                continue;
            }
            linked.push(LinkedCommittee {
                committee_id: committee.id,
                type_code: committee.type_code,
                designation_code: committee.designation_code,
                year: committee.year,
                source: LinkSource::Direct,
            });
        }

        Ok(linked)
    }

    /// Snapshot for `year`, or the most recent one
    pub fn committee_details(&self, committee_id: &str, year: Option<i32>) -> Result<Option<CommitteeDetails>> {
        Ok(db::get_committee(self.conn, committee_id, year)?.map(CommitteeDetails::from))
    }

    /// Linked committees that are PACs, one entry per committee id, in link order.
    /// Uses the snapshot for the link's year, else the most recent snapshot.
    pub fn pacs_for(&self, candidate_id: &str) -> Result<Vec<(LinkedCommittee, Committee)>> {
        let mut seen = HashSet::new();
        let mut pacs = Vec::new();

        for link in self.linked_committees(candidate_id)? {
            if seen.contains(&link.committee_id) {
                continue;
            }
            let snapshot = match db::get_committee(self.conn, &link.committee_id, Some(link.year))? {
                Some(c) => Some(c),
                None => db::get_committee(self.conn, &link.committee_id, None)?,
            };
            if let Some(committee) = snapshot.filter(Committee::is_pac) {
                seen.insert(link.committee_id.clone());
                pacs.push((link, committee));
            }
        }

        Ok(pacs)
    }

    /// Committees sharing a linked candidate with this one, then committees
    /// sponsored by the same connected organization
    pub fn connected_committees(&self, committee_id: &str) -> Result<Vec<ConnectedCommittee>> {
        let mut connected = Vec::new();

        let candidate_ids: BTreeSet<String> = db::get_links_for_committee(self.conn, committee_id)?
            .into_iter()
            .map(|l| l.candidate_id)
            .collect();

        let mut seen = HashSet::new();
        for candidate_id in &candidate_ids {
            for link in db::get_links_for_candidate(self.conn, candidate_id)? {
                if link.committee_id == committee_id || !seen.insert(link.committee_id.clone()) {
                    continue;
                }
                if let Some(committee) = db::get_committee(self.conn, &link.committee_id, None)? {
                    connected.push(ConnectedCommittee {
                        committee,
                        connection: CommitteeConnection::CandidateRelationship {
                            candidate_id: candidate_id.clone(),
                        },
                    });
                }
            }
        }

        if let Some(organization) = db::get_connected_organization(self.conn, committee_id)? {
            for committee in db::get_committees_by_connected_org(self.conn, &organization)? {
                if committee.id == committee_id {
                    continue;
                }
                connected.push(ConnectedCommittee {
                    committee,
                    connection: CommitteeConnection::SameOrganization {
                        organization: organization.clone(),
                    },
                });
            }
        }

        Ok(connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::seeded_store;
    use crate::db::{insert_link, open_in_memory_store, upsert_committee};
    use crate::entities::CandidateCommitteeLink;

    fn link(cand: &str, cmte: &str, linkage_id: &str, year: i32) -> CandidateCommitteeLink {
        CandidateCommitteeLink {
            linkage_id: linkage_id.to_string(),
            candidate_id: cand.to_string(),
            candidate_election_year: year,
            fec_election_year: year,
            committee_id: cmte.to_string(),
            committee_type: "H".to_string(),
            committee_designation: "P".to_string(),
            year,
        }
    }

    #[test]
    fn test_linkage_takes_precedence_over_direct() {
        let conn = open_in_memory_store().unwrap();
        upsert_committee(&conn, &Committee::new("C001", "COTTON FOR CONGRESS", "H", 2024).with_candidate("H2AR04083")).unwrap();
        insert_link(&conn, &link("H2AR04083", "C001", "55", 2024)).unwrap();

        let linked = RecordLinker::new(&conn).linked_committees("H2AR04083").unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].source.to_string(), "linkage-55");
    }

    #[test]
    fn test_ordering_and_merge() {
        let conn = open_in_memory_store().unwrap();
        insert_link(&conn, &link("H1", "C002", "2", 2022)).unwrap();
        insert_link(&conn, &link("H1", "C003", "9", 2024)).unwrap();
        insert_link(&conn, &link("H1", "C001", "7", 2024)).unwrap();

        // Same committee as a linkage entry but a different year: survives
        upsert_committee(&conn, &Committee::new("C002", "B", "H", 2024).with_candidate("H1")).unwrap();
        upsert_committee(&conn, &Committee::new("C004", "D", "Q", 2020).with_candidate("H1")).unwrap();
        // Same (committee, year) as a linkage entry: suppressed
        upsert_committee(&conn, &Committee::new("C001", "A", "H", 2024).with_candidate("H1")).unwrap();

        let linked = RecordLinker::new(&conn).linked_committees("H1").unwrap();
        let summary: Vec<(String, i32, String)> = linked
            .iter()
            .map(|l| (l.committee_id.clone(), l.year, l.source.to_string()))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("C001".to_string(), 2024, "linkage-7".to_string()),
                ("C003".to_string(), 2024, "linkage-9".to_string()),
                ("C002".to_string(), 2022, "linkage-2".to_string()),
                ("C002".to_string(), 2024, "direct".to_string()),
                ("C004".to_string(), 2020, "direct".to_string()),
            ]
        );
    }

    #[test]
    fn test_unknown_candidate_has_no_committees() {
        let conn = seeded_store();
        assert!(RecordLinker::new(&conn).linked_committees("P99999999").unwrap().is_empty());
    }

    #[test]
    fn test_pacs_for_and_details() {
        let conn = seeded_store();
        let linker = RecordLinker::new(&conn);

        let pacs = linker.pacs_for("H2AR04083").unwrap();
        assert_eq!(pacs.len(), 1);
        assert_eq!(pacs[0].1.name, "REPUBLIC PAC");

        let details = linker.committee_details("C00550000", None).unwrap().unwrap();
        assert!(details.is_pac);
        assert!(!details.is_corporate_pac);
        assert_eq!(details.designation_description, "Leadership PAC");
        assert!(linker.committee_details("C00000000", None).unwrap().is_none());
    }

    #[test]
    fn test_connected_committees() {
        let conn = seeded_store();
        insert_link(&conn, &link("H2AR04083", "C00499988", "101", 2024)).unwrap();
        upsert_committee(&conn, &Committee::new("C00600000", "ACME CORP PAC", "Q", 2024).with_connected_organization("ACME CORP")).unwrap();
        upsert_committee(&conn, &Committee::new("C00600001", "ACME EMPLOYEES FUND", "N", 2024).with_connected_organization("ACME CORP")).unwrap();

        let linker = RecordLinker::new(&conn);
        let connected = linker.connected_committees("C00550000").unwrap();
        assert_eq!(connected.len(), 1);
        assert_eq!(connected[0].committee.id, "C00499988");
        assert_eq!(
            connected[0].connection,
            CommitteeConnection::CandidateRelationship { candidate_id: "H2AR04083".to_string() }
        );

        let connected = linker.connected_committees("C00600000").unwrap();
        assert_eq!(connected.len(), 1);
        assert_eq!(connected[0].committee.id, "C00600001");
        assert!(matches!(connected[0].connection, CommitteeConnection::SameOrganization { .. }));
    }

    #[test]
    fn test_connected_org_from_older_snapshot() {
        let conn = open_in_memory_store().unwrap();
        upsert_committee(&conn, &Committee::new("C00600000", "ACME CORP PAC", "Q", 2022).with_connected_organization("ACME CORP")).unwrap();
        // Newest snapshot dropped the organization name
        upsert_committee(&conn, &Committee::new("C00600000", "ACME CORP PAC", "Q", 2024)).unwrap();
        upsert_committee(&conn, &Committee::new("C00600001", "ACME EMPLOYEES FUND", "N", 2024).with_connected_organization("ACME CORP")).unwrap();

        let connected = RecordLinker::new(&conn).connected_committees("C00600000").unwrap();
        assert_eq!(connected.len(), 1);
        assert_eq!(connected[0].committee.id, "C00600001");
        assert_eq!(
            connected[0].connection,
            CommitteeConnection::SameOrganization { organization: "ACME CORP".to_string() }
        );
    }
}
