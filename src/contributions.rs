// 💰 Contribution Aggregator - who gave how much, from which industry
// Read-only views over committee contributions and itemized transactions

use crate::db;
use crate::entities::{Committee, INDIVIDUAL_ENTITY_TYPE};
use crate::error::Result;
use crate::industry::{Industry, IndustryClassifier};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

// ============================================================================
// VIEWS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributorSummary {
    pub amount: f64,
    /// Entity type of the last row seen for this contributor
    pub entity_type: String,
    pub industry: Industry,
}

impl ContributorSummary {
    pub fn is_individual(&self) -> bool {
        self.entity_type == INDIVIDUAL_ENTITY_TYPE
    }
}

/// contributor_name → summary
pub type ContributorMap = BTreeMap<String, ContributorSummary>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndustryTotal {
    pub industry: Industry,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopContributor {
    pub name: String,
    pub amount: f64,
    pub entity_type: String,
    pub industry: Industry,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceTotals {
    pub total: f64,
    pub count: u64,
    pub years: BTreeSet<i32>,
}

impl SourceTotals {
    fn add(&mut self, amount: f64, year: i32) {
        self.total += amount;
        self.count += 1;
        self.years.insert(year);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContributionTotals {
    /// From aggregated committee contributions
    pub committee: SourceTotals,
    /// From itemized transactions naming the candidate as recipient
    pub individual: SourceTotals,
    pub combined_total: f64,
    pub combined_count: u64,
    pub years_covered: BTreeSet<i32>,
}

/// A committee that gave to the candidate under its own name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributingPac {
    pub committee: Committee,
    pub amounts_by_year: BTreeMap<i32, f64>,
    pub total: f64,
}

/// Sum per industry, institutional contributors only, largest first
pub fn industry_totals(contributors: &ContributorMap) -> Vec<IndustryTotal> {
    let mut by_industry: HashMap<Industry, f64> = HashMap::new();
    for summary in contributors.values().filter(|s| !s.is_individual()) {
        *by_industry.entry(summary.industry).or_insert(0.0) += summary.amount;
    }

    let mut totals: Vec<IndustryTotal> = by_industry
        .into_iter()
        .map(|(industry, total)| IndustryTotal { industry, total })
        .collect();
    totals.sort_by(|a, b| b.total.total_cmp(&a.total).then(a.industry.cmp(&b.industry)));
    totals
}

/// Largest amounts first, ties by name
pub fn rank_contributors(contributors: &ContributorMap, n: usize) -> Vec<TopContributor> {
    let mut ranked: Vec<TopContributor> = contributors
        .iter()
        .map(|(name, s)| TopContributor {
            name: name.clone(),
            amount: s.amount,
            entity_type: s.entity_type.clone(),
            industry: s.industry,
        })
        .collect();
    ranked.sort_by(|a, b| b.amount.total_cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(n);
    ranked
}

// ============================================================================
// AGGREGATOR
// ============================================================================

pub struct ContributionAggregator<'c> {
    conn: &'c Connection,
    classifier: IndustryClassifier,
}

impl<'c> ContributionAggregator<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        ContributionAggregator {
            conn,
            classifier: IndustryClassifier::new(),
        }
    }

    /// Amount per distinct contributor across all years. An unknown candidate
    /// or one without contributions gives an empty map.
    pub fn contributions_for(&self, candidate_id: &str) -> Result<ContributorMap> {
        let mut contributors = ContributorMap::new();

        for row in db::get_contributions_for_candidate(self.conn, candidate_id)? {
            match contributors.get_mut(&row.contributor_name) {
                Some(summary) => {
                    summary.amount += row.amount;
                    summary.entity_type = row.entity_type;
                }
                None => {
                    let industry = self.classifier.classify(&row.contributor_name);
                    contributors.insert(
                        row.contributor_name,
                        ContributorSummary {
                            amount: row.amount,
                            entity_type: row.entity_type,
                            industry,
                        },
                    );
                }
            }
        }

        Ok(contributors)
    }

    pub fn totals_by_industry(&self, candidate_id: &str) -> Result<Vec<IndustryTotal>> {
        Ok(industry_totals(&self.contributions_for(candidate_id)?))
    }

    pub fn top_contributors(&self, candidate_id: &str, n: usize) -> Result<Vec<TopContributor>> {
        Ok(rank_contributors(&self.contributions_for(candidate_id)?, n))
    }

    /// Committee-contribution and itemized-transaction totals side by side
    pub fn contribution_totals(&self, candidate_id: &str) -> Result<ContributionTotals> {
        let mut totals = ContributionTotals::default();

        for row in db::get_contributions_for_candidate(self.conn, candidate_id)? {
            totals.committee.add(row.amount, row.year);
        }
        for tx in db::get_transactions_by_candidate(self.conn, candidate_id)? {
            totals.individual.add(tx.amount, tx.year);
        }

        totals.combined_total = totals.committee.total + totals.individual.total;
        totals.combined_count = totals.committee.count + totals.individual.count;
        totals.years_covered = totals
            .committee
            .years
            .union(&totals.individual.years)
            .copied()
            .collect();

        Ok(totals)
    }

    /// Non-individual contributors whose name is a registered PAC, largest first
    pub fn contributing_pacs(&self, candidate_id: &str) -> Result<Vec<ContributingPac>> {
        let mut pacs = Vec::new();

        for (name, summary) in self.contributions_for(candidate_id)? {
            if summary.is_individual() {
                continue;
            }
            let Some(committee) = db::get_committee_by_name(self.conn, &name)? else {
                continue;
            };
            if !committee.is_pac() {
                continue;
            }
            let amounts_by_year = db::get_contribution_by_contributor(self.conn, candidate_id, &name)?;
            pacs.push(ContributingPac {
                total: amounts_by_year.values().sum(),
                amounts_by_year,
                committee,
            });
        }

        pacs.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.committee.id.cmp(&b.committee.id)));
        Ok(pacs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::{contribution, seeded_store, transaction};
    use crate::db::{accumulate_contribution, insert_individual_transaction, open_in_memory_store};

    #[test]
    fn test_individuals_excluded_from_industry_totals() {
        let conn = open_in_memory_store().unwrap();
        accumulate_contribution(&conn, &contribution("H1", "LOCKHEED MARTIN PAC", "COM", 1000.0, 2024)).unwrap();
        // Would classify as finance if it counted
        accumulate_contribution(&conn, &contribution("H1", "BANK TELLER JANE", "IND", 500.0, 2024)).unwrap();

        let totals = ContributionAggregator::new(&conn).totals_by_industry("H1").unwrap();
        assert_eq!(
            totals,
            vec![IndustryTotal {
                industry: Industry::Defense,
                total: 1000.0
            }]
        );
        println!("✅ Individual contributors excluded from industry totals");
    }

    #[test]
    fn test_accumulates_across_years_last_entity_type_wins() {
        let conn = open_in_memory_store().unwrap();
        accumulate_contribution(&conn, &contribution("H1", "ACME FUND", "PAC", 200.0, 2022)).unwrap();
        accumulate_contribution(&conn, &contribution("H1", "ACME FUND", "ORG", 300.0, 2024)).unwrap();
        accumulate_contribution(&conn, &contribution("H1", "GOOGLE NETPAC", "PAC", 50.0, 2024)).unwrap();
        accumulate_contribution(&conn, &contribution("H2", "ACME FUND", "PAC", 9999.0, 2024)).unwrap();

        let map = ContributionAggregator::new(&conn).contributions_for("H1").unwrap();
        assert_eq!(map.len(), 2);
        let acme = &map["ACME FUND"];
        assert_eq!(acme.amount, 500.0);
        assert_eq!(acme.entity_type, "ORG");
        assert_eq!(acme.industry, Industry::Finance);
        assert_eq!(map["GOOGLE NETPAC"].industry, Industry::Tech);
    }

    #[test]
    fn test_no_rows_is_empty_not_error() {
        let conn = seeded_store();
        let aggregator = ContributionAggregator::new(&conn);
        assert!(aggregator.contributions_for("H2AR04083").unwrap().is_empty());
        assert!(aggregator.totals_by_industry("H2AR04083").unwrap().is_empty());
        assert_eq!(aggregator.contribution_totals("H2AR04083").unwrap(), ContributionTotals::default());
    }

    #[test]
    fn test_top_contributors_order() {
        let conn = open_in_memory_store().unwrap();
        for (name, amount) in [("B PAC", 100.0), ("A PAC", 100.0), ("C PAC", 900.0)] {
            accumulate_contribution(&conn, &contribution("H1", name, "PAC", amount, 2024)).unwrap();
        }

        let top = ContributionAggregator::new(&conn).top_contributors("H1", 2).unwrap();
        let names: Vec<&str> = top.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["C PAC", "A PAC"]);
    }

    #[test]
    fn test_contribution_totals() {
        let conn = open_in_memory_store().unwrap();
        accumulate_contribution(&conn, &contribution("H1", "A PAC", "PAC", 1000.0, 2022)).unwrap();
        accumulate_contribution(&conn, &contribution("H1", "B PAC", "PAC", 500.0, 2024)).unwrap();
        insert_individual_transaction(&conn, &transaction("C001", "FRIENDS OF H1", Some("H1"), 250.0, 2024)).unwrap();
        insert_individual_transaction(&conn, &transaction("C001", "SOMEONE ELSE", Some("H9"), 75.0, 2020)).unwrap();

        let totals = ContributionAggregator::new(&conn).contribution_totals("H1").unwrap();
        assert_eq!(totals.committee.total, 1500.0);
        assert_eq!(totals.committee.count, 2);
        assert_eq!(totals.individual.total, 250.0);
        assert_eq!(totals.individual.count, 1);
        assert_eq!(totals.combined_total, 1750.0);
        assert_eq!(totals.combined_count, 3);
        assert_eq!(totals.years_covered.into_iter().collect::<Vec<_>>(), vec![2022, 2024]);
    }

    #[test]
    fn test_contributing_pacs() {
        let conn = seeded_store();
        accumulate_contribution(&conn, &contribution("H2AR04083", "REPUBLIC PAC", "PAC", 5000.0, 2022)).unwrap();
        accumulate_contribution(&conn, &contribution("H2AR04083", "REPUBLIC PAC", "PAC", 2500.0, 2024)).unwrap();
        // Campaign committee, not a PAC
        accumulate_contribution(&conn, &contribution("H2AR04083", "COTTON FOR CONGRESS", "CCM", 100.0, 2024)).unwrap();
        accumulate_contribution(&conn, &contribution("H2AR04083", "JOHN DOE", "IND", 100.0, 2024)).unwrap();

        let pacs = ContributionAggregator::new(&conn).contributing_pacs("H2AR04083").unwrap();
        assert_eq!(pacs.len(), 1);
        assert_eq!(pacs[0].committee.id, "C00550000");
        assert_eq!(pacs[0].total, 7500.0);
        assert_eq!(pacs[0].amounts_by_year.get(&2022), Some(&5000.0));
    }
}
