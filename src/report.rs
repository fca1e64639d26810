// 📊 Report Assembler - one nested money report per candidate
//
// Every section is a pure read. A section that fails is logged, recorded in
// `degraded_sections` and replaced with its empty value; the rest of the
// report is still built.

use crate::classifier::{PacCategory, PacClassifier};
use crate::contributions::{ContributionAggregator, ContributionTotals};
use crate::db;
use crate::entities::{Candidate, Committee, Company, SupportOppose, HIGH_RELEVANCE};
use crate::error::Result;
use crate::linker::RecordLinker;
use crate::remote::{EntityLookup, EntityRecord};
use crate::summary::format_money;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{info, warn};

/// Company directory entries shown per report
pub const MAX_DIRECTORY_COMPANIES: usize = 20;

// ============================================================================
// SECTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacEntry {
    pub committee_id: String,
    pub name: String,
    pub type_code: String,
    pub designation_code: String,
    pub party_affiliation: Option<String>,
    pub is_corporate_pac: bool,
    pub connected_organization: Option<String>,
    /// Given to the candidate under the committee's own name
    pub total_contributions: f64,
    pub years: BTreeSet<i32>,
    /// How the committee was found: link source tags and/or "contribution"
    pub found_via: Vec<String>,
}

impl PacEntry {
    fn from_committee(committee: &Committee) -> Self {
        PacEntry {
            committee_id: committee.id.clone(),
            name: committee.name.clone(),
            type_code: committee.type_code.clone(),
            designation_code: committee.designation_code.clone(),
            party_affiliation: committee.party_affiliation.clone(),
            is_corporate_pac: committee.is_corporate_pac(),
            connected_organization: committee.connected_organization().map(str::to_string),
            total_contributions: 0.0,
            years: BTreeSet::new(),
            found_via: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PacsByCategory {
    pub traditional_pacs: Vec<PacEntry>,
    pub super_pacs: Vec<PacEntry>,
    pub leadership_pacs: Vec<PacEntry>,
    pub corporate_pacs: Vec<PacEntry>,
    pub other_committees: Vec<PacEntry>,
}

impl PacsByCategory {
    pub fn get(&self, category: PacCategory) -> &[PacEntry] {
        match category {
            PacCategory::TraditionalPac => &self.traditional_pacs,
            PacCategory::SuperPac => &self.super_pacs,
            PacCategory::LeadershipPac => &self.leadership_pacs,
            PacCategory::CorporatePac => &self.corporate_pacs,
            PacCategory::OtherCommittee => &self.other_committees,
        }
    }

    fn get_mut(&mut self, category: PacCategory) -> &mut Vec<PacEntry> {
        match category {
            PacCategory::TraditionalPac => &mut self.traditional_pacs,
            PacCategory::SuperPac => &mut self.super_pacs,
            PacCategory::LeadershipPac => &mut self.leadership_pacs,
            PacCategory::CorporatePac => &mut self.corporate_pacs,
            PacCategory::OtherCommittee => &mut self.other_committees,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PacEntry> {
        PacCategory::ALL.into_iter().flat_map(move |c| self.get(c).iter())
    }

    pub fn len(&self) -> usize {
        PacCategory::ALL.iter().map(|c| self.get(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Independent expenditures by one spending committee
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuperPacSpending {
    pub committee_id: String,
    pub name: String,
    pub committee_type: Option<String>,
    pub is_corporate: bool,
    pub connected_organization: Option<String>,
    pub support_spending: f64,
    pub opposition_spending: f64,
    pub total_spending: f64,
    pub support_expenditures: u64,
    pub opposition_expenditures: u64,
    pub years: BTreeSet<i32>,
}

/// Organization behind a committee linked to or giving to the candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacSponsor {
    pub organization: String,
    pub committee_id: String,
    pub committee_name: String,
    pub committee_type: String,
    pub total_contributions: f64,
    pub entity: Option<EntityRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorporateConnections {
    pub pac_sponsors: Vec<PacSponsor>,
    /// High-relevance company directory entries (not candidate-specific)
    pub companies: Vec<Company>,
}

impl CorporateConnections {
    pub fn len(&self) -> usize {
        self.pac_sponsors.len() + self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_pacs_connected: usize,
    pub total_super_pacs: usize,
    pub total_corporate_connections: usize,
    pub total_pac_contributions: f64,
    pub total_super_pac_spending: f64,
    /// Contribution totals plus Super PAC spending
    pub grand_total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub candidate_id: String,
    pub candidate: Option<Candidate>,
    pub generated_at: DateTime<Utc>,
    pub pacs_by_category: PacsByCategory,
    pub super_pac_spending: Vec<SuperPacSpending>,
    pub corporate_connections: CorporateConnections,
    pub contribution_totals: ContributionTotals,
    pub summary_stats: SummaryStats,
    /// Sections replaced by their empty value after a failure
    pub degraded_sections: Vec<String>,
}

impl Report {
    pub fn display_name(&self) -> &str {
        self.candidate
            .as_ref()
            .map(|c| c.display_name.as_str())
            .unwrap_or(&self.candidate_id)
    }
}

// ============================================================================
// ASSEMBLER
// ============================================================================

pub struct ReportAssembler<'a> {
    conn: &'a Connection,
    entity_lookup: Option<&'a dyn EntityLookup>,
    company_directory: bool,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        ReportAssembler {
            conn,
            entity_lookup: None,
            company_directory: true,
        }
    }

    /// Enrich PAC sponsors from the entity graph
    pub fn with_entity_lookup(mut self, lookup: &'a dyn EntityLookup) -> Self {
        self.entity_lookup = Some(lookup);
        self
    }

    pub fn with_company_directory(mut self, enabled: bool) -> Self {
        self.company_directory = enabled;
        self
    }

    pub fn build_report(&self, candidate_id: &str) -> Report {
        let mut degraded = Vec::new();

        let candidate = section("candidate", &mut degraded, || db::get_candidate(self.conn, candidate_id));
        let pacs_by_category = section("pacs_by_category", &mut degraded, || self.pacs_by_category(candidate_id));
        let super_pac_spending = section("super_pac_spending", &mut degraded, || self.super_pac_spending(candidate_id));
        let corporate_connections = section("corporate_connections", &mut degraded, || {
            self.corporate_connections(candidate_id)
        });
        let contribution_totals = section("contribution_totals", &mut degraded, || {
            ContributionAggregator::new(self.conn).contribution_totals(candidate_id)
        });

        let summary_stats = summary_stats(
            &pacs_by_category,
            &super_pac_spending,
            &corporate_connections,
            &contribution_totals,
        );

        info!(
            candidate = candidate_id,
            pacs = summary_stats.total_pacs_connected,
            super_pacs = summary_stats.total_super_pacs,
            degraded = degraded.len(),
            "report assembled"
        );

        Report {
            candidate_id: candidate_id.to_string(),
            candidate,
            generated_at: Utc::now(),
            pacs_by_category,
            super_pac_spending,
            corporate_connections,
            contribution_totals,
            summary_stats,
            degraded_sections: degraded,
        }
    }

    /// Linked PACs then PACs that gave under their own name, one entry per
    /// committee, largest contributors first within each category
    pub fn pacs_by_category(&self, candidate_id: &str) -> Result<PacsByCategory> {
        let mut entries: Vec<(PacEntry, PacCategory)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (link, committee) in RecordLinker::new(self.conn).pacs_for(candidate_id)? {
            let mut entry = PacEntry::from_committee(&committee);
            for (year, amount) in db::get_contribution_by_contributor(self.conn, candidate_id, &committee.name)? {
                entry.total_contributions += amount;
                entry.years.insert(year);
            }
            entry.found_via.push(link.source.to_string());
            index.insert(committee.id.clone(), entries.len());
            entries.push((entry, PacClassifier::classify(&committee)));
        }

        for pac in ContributionAggregator::new(self.conn).contributing_pacs(candidate_id)? {
            if let Some(&i) = index.get(&pac.committee.id) {
                entries[i].0.found_via.push("contribution".to_string());
                continue;
            }
            let mut entry = PacEntry::from_committee(&pac.committee);
            entry.total_contributions = pac.total;
            entry.years = pac.amounts_by_year.keys().copied().collect();
            entry.found_via.push("contribution".to_string());
            index.insert(pac.committee.id.clone(), entries.len());
            entries.push((entry, PacClassifier::classify(&pac.committee)));
        }

        let mut by_category = PacsByCategory::default();
        for (entry, category) in entries {
            by_category.get_mut(category).push(entry);
        }
        for category in PacCategory::ALL {
            by_category
                .get_mut(category)
                .sort_by(|a, b| b.total_contributions.total_cmp(&a.total_contributions));
        }

        Ok(by_category)
    }

    /// Support and opposition summed separately per spending committee, biggest spenders first
    pub fn super_pac_spending(&self, candidate_id: &str) -> Result<Vec<SuperPacSpending>> {
        let mut by_spender: BTreeMap<String, SuperPacSpending> = BTreeMap::new();

        for ie in db::get_expenditures_for_candidate(self.conn, candidate_id)? {
            let spending = by_spender.entry(ie.spender_id.clone()).or_insert_with(|| SuperPacSpending {
                committee_id: ie.spender_id.clone(),
                name: ie.spender_name.clone(),
                committee_type: None,
                is_corporate: false,
                connected_organization: None,
                support_spending: 0.0,
                opposition_spending: 0.0,
                total_spending: 0.0,
                support_expenditures: 0,
                opposition_expenditures: 0,
                years: BTreeSet::new(),
            });

            match ie.support_oppose {
                SupportOppose::Support => {
                    spending.support_spending += ie.amount;
                    spending.support_expenditures += 1;
                }
                SupportOppose::Oppose => {
                    spending.opposition_spending += ie.amount;
                    spending.opposition_expenditures += 1;
                }
            }
            spending.total_spending += ie.amount;
            spending.years.insert(ie.year);
        }

        let mut spenders: Vec<SuperPacSpending> = by_spender.into_values().collect();
        for spending in &mut spenders {
            if let Some(committee) = db::get_committee(self.conn, &spending.committee_id, None)? {
                spending.is_corporate = committee.has_corporate_organization() || committee.connected_organization().is_some();
                spending.connected_organization = committee.connected_organization().map(str::to_string);
                spending.committee_type = Some(committee.type_code);
            }
        }

        spenders.sort_by(|a, b| b.total_spending.total_cmp(&a.total_spending));
        Ok(spenders)
    }

    /// Sponsors of linked or contributing committees, then the company directory
    pub fn corporate_connections(&self, candidate_id: &str) -> Result<CorporateConnections> {
        let mut committees: Vec<Committee> = Vec::new();
        let mut seen = HashSet::new();

        for link in RecordLinker::new(self.conn).linked_committees(candidate_id)? {
            if !seen.insert(link.committee_id.clone()) {
                continue;
            }
            if let Some(committee) = db::get_committee(self.conn, &link.committee_id, None)? {
                committees.push(committee);
            }
        }
        for (name, summary) in ContributionAggregator::new(self.conn).contributions_for(candidate_id)? {
            if summary.is_individual() {
                continue;
            }
            if let Some(committee) = db::get_committee_by_name(self.conn, &name)? {
                if seen.insert(committee.id.clone()) {
                    committees.push(committee);
                }
            }
        }

        let mut entities: HashMap<String, Option<EntityRecord>> = HashMap::new();
        let mut pac_sponsors = Vec::new();
        for committee in committees {
            let Some(organization) = committee.connected_organization().map(str::to_string) else {
                continue;
            };
            let total_contributions =
                db::get_contribution_by_contributor(self.conn, candidate_id, &committee.name)?.values().sum();
            let entity = entities
                .entry(organization.clone())
                .or_insert_with(|| self.lookup_entity(&organization))
                .clone();

            pac_sponsors.push(PacSponsor {
                organization,
                committee_id: committee.id,
                committee_name: committee.name,
                committee_type: committee.type_code,
                total_contributions,
                entity,
            });
        }
        pac_sponsors.sort_by(|a, b| b.total_contributions.total_cmp(&a.total_contributions));

        let companies = if self.company_directory {
            db::get_relevant_companies(self.conn, HIGH_RELEVANCE, MAX_DIRECTORY_COMPANIES)?
        } else {
            Vec::new()
        };

        Ok(CorporateConnections { pac_sponsors, companies })
    }

    fn lookup_entity(&self, organization: &str) -> Option<EntityRecord> {
        let lookup = self.entity_lookup?;
        match lookup.lookup(organization) {
            Ok(entity) => entity,
            Err(e) => {
                warn!(organization, error = %e, "entity lookup failed");
                None
            }
        }
    }
}

fn section<T: Default>(name: &str, degraded: &mut Vec<String>, build: impl FnOnce() -> Result<T>) -> T {
    match build() {
        Ok(value) => value,
        Err(e) => {
            warn!(section = name, error = %e, "report section unavailable, using empty result");
            degraded.push(name.to_string());
            T::default()
        }
    }
}

fn summary_stats(
    pacs: &PacsByCategory,
    super_pacs: &[SuperPacSpending],
    corporate: &CorporateConnections,
    totals: &ContributionTotals,
) -> SummaryStats {
    let total_super_pac_spending: f64 = super_pacs.iter().map(|s| s.total_spending).sum();

    SummaryStats {
        total_pacs_connected: pacs.len(),
        total_super_pacs: super_pacs.len(),
        total_corporate_connections: corporate.len(),
        total_pac_contributions: pacs.iter().map(|p| p.total_contributions).sum(),
        total_super_pac_spending,
        grand_total: totals.combined_total + total_super_pac_spending,
    }
}

// ============================================================================
// TEXT RENDERING
// ============================================================================

const RULE: &str = "--------------------------------------------------";

pub fn render_text(report: &Report) -> String {
    let mut out = Vec::new();
    let banner = "=".repeat(80);

    out.push(banner.clone());
    out.push("MONEY TRACKING REPORT".to_string());
    out.push(banner.clone());
    out.push(format!("Politician: {}", report.display_name()));
    out.push(format!("Candidate ID: {}", report.candidate_id));
    out.push(format!("Generated: {}", report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")));
    if !report.degraded_sections.is_empty() {
        out.push(format!("Unavailable sections: {}", report.degraded_sections.join(", ")));
    }
    out.push(String::new());

    let stats = &report.summary_stats;
    out.push("EXECUTIVE SUMMARY".to_string());
    out.push(RULE.to_string());
    out.push(format!("Total Money Tracked: {}", format_money(stats.grand_total)));
    out.push(format!("Connected PACs: {}", stats.total_pacs_connected));
    out.push(format!("Super PACs: {}", stats.total_super_pacs));
    out.push(format!("Corporate Connections: {}", stats.total_corporate_connections));
    out.push(format!("PAC Contributions: {}", format_money(stats.total_pac_contributions)));
    out.push(format!("Super PAC Spending: {}", format_money(stats.total_super_pac_spending)));
    out.push(String::new());

    let totals = &report.contribution_totals;
    out.push("TOTAL CONTRIBUTIONS RECEIVED".to_string());
    out.push(RULE.to_string());
    out.push(format!("Committee Contributions: {}", format_money(totals.committee.total)));
    out.push(format!("  ({} transactions)", totals.committee.count));
    out.push(format!("Individual Contributions: {}", format_money(totals.individual.total)));
    out.push(format!("  ({} transactions)", totals.individual.count));
    out.push(format!("TOTAL CONTRIBUTIONS: {}", format_money(totals.combined_total)));
    out.push(format!("Years with data: {}", join_years(&totals.years_covered)));
    out.push(String::new());

    out.push("POLITICAL ACTION COMMITTEES".to_string());
    out.push(RULE.to_string());
    for category in PacCategory::ALL {
        let pacs = report.pacs_by_category.get(category);
        if pacs.is_empty() {
            continue;
        }
        out.push(format!("{} ({}):", category.label(), pacs.len()));
        for (i, pac) in pacs.iter().enumerate() {
            out.push(format!("  {}. {}", i + 1, pac.name));
            out.push(format!("     ID: {}", pac.committee_id));
            out.push(format!("     Type: {}", pac.type_code));
            if let Some(party) = &pac.party_affiliation {
                out.push(format!("     Party: {}", party));
            }
            out.push(format!("     Contributions: {}", format_money(pac.total_contributions)));
            if !pac.years.is_empty() {
                out.push(format!("     Years: {}", join_years(&pac.years)));
            }
            if let (true, Some(org)) = (pac.is_corporate_pac, &pac.connected_organization) {
                out.push(format!("     Corporate: {}", org));
            }
        }
        out.push(String::new());
    }

    if !report.super_pac_spending.is_empty() {
        out.push("SUPER PAC INDEPENDENT EXPENDITURES".to_string());
        out.push(RULE.to_string());
        for (i, sp) in report.super_pac_spending.iter().enumerate() {
            out.push(format!("  {}. {}", i + 1, sp.name));
            out.push(format!("     ID: {}", sp.committee_id));
            out.push(format!(
                "     Support Spending: {} ({} expenditures)",
                format_money(sp.support_spending),
                sp.support_expenditures
            ));
            if sp.opposition_spending > 0.0 {
                out.push(format!(
                    "     Opposition Spending: {} ({} expenditures)",
                    format_money(sp.opposition_spending),
                    sp.opposition_expenditures
                ));
            }
            out.push(format!("     TOTAL SPENDING: {}", format_money(sp.total_spending)));
            if let (true, Some(org)) = (sp.is_corporate, &sp.connected_organization) {
                out.push(format!("     Corporate: {}", org));
            }
        }
        out.push(String::new());
    }

    let corporate = &report.corporate_connections;
    if !corporate.is_empty() {
        out.push("CORPORATE CONNECTIONS".to_string());
        out.push(RULE.to_string());
        if !corporate.pac_sponsors.is_empty() {
            out.push("Corporate PAC Sponsors:".to_string());
            for (i, sponsor) in corporate.pac_sponsors.iter().enumerate() {
                out.push(format!("  {}. {}", i + 1, sponsor.organization));
                out.push(format!(
                    "     Connection: Via {} ({})",
                    sponsor.committee_name, sponsor.committee_type
                ));
                if sponsor.total_contributions > 0.0 {
                    out.push(format!("     Contributions: {}", format_money(sponsor.total_contributions)));
                }
                if let Some(description) = sponsor.entity.as_ref().and_then(|e| e.description.as_deref()) {
                    out.push(format!("     About: {}", description));
                }
            }
        }
        if !corporate.companies.is_empty() {
            out.push("Company Directory (high relevance):".to_string());
            for (i, company) in corporate.companies.iter().take(10).enumerate() {
                out.push(format!("  {}. {}", i + 1, company.name));
                out.push(format!("     Industry: {}", company.industry.as_deref().unwrap_or("Unknown")));
                if let (Some(city), Some(state)) = (&company.city, &company.state) {
                    out.push(format!("     Location: {}, {}", city, state));
                }
                out.push(format!("     Relevance Score: {}/10", company.relevance_score));
            }
        }
        out.push(String::new());
    }

    out.push(banner);
    out.join("\n")
}

fn join_years(years: &BTreeSet<i32>) -> String {
    if years.is_empty() {
        return "none".to_string();
    }
    years.iter().map(|y| y.to_string()).collect::<Vec<_>>().join(", ")
}
