// 🗄️ Store - SQLite schema + row accessors
// Tables mirror the periodic FEC data drops; the core only reads them

use crate::entities::{
    Candidate, CandidateCommitteeLink, Committee, CommitteeContribution, Company,
    IndependentExpenditure, IndividualTransaction, SupportOppose,
};
use crate::error::{FinanceError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// CANDIDATE TABLES
// ============================================================================

/// The two candidate tables, in lookup priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateSource {
    /// Candidate master file ("LAST, FIRST" names)
    Master,
    /// Secondary candidate listing (names in either form)
    Listing,
}

impl CandidateSource {
    pub const ALL: [CandidateSource; 2] = [CandidateSource::Master, CandidateSource::Listing];

    pub fn table_name(&self) -> &'static str {
        match self {
            CandidateSource::Master => "candidates_master",
            CandidateSource::Listing => "candidates",
        }
    }
}

// ============================================================================
// INGEST RUN LOG
// ============================================================================

/// One loaded file (audit trail for bulk ingestion)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IngestRun {
    pub run_id: String,
    pub source_kind: String,
    pub file_path: String,
    pub sha256: String,
    pub year: Option<i32>,
    pub rows_loaded: u64,
    pub rows_skipped: u64,
    pub loaded_at: DateTime<Utc>,
}

impl IngestRun {
    pub fn new(source_kind: &str, file_path: &str, sha256: &str, year: Option<i32>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            source_kind: source_kind.to_string(),
            file_path: file_path.to_string(),
            sha256: sha256.to_string(),
            year,
            rows_loaded: 0,
            rows_skipped: 0,
            loaded_at: Utc::now(),
        }
    }
}

// ============================================================================
// SETUP
// ============================================================================

/// Open (or create) the store on disk
pub fn open_store(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn open_in_memory_store() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Candidate tables (same shape, different name formatting)
    // ==========================================================================
    for source in CandidateSource::ALL {
        let table = source.table_name();
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                cand_id TEXT NOT NULL,
                cand_name TEXT NOT NULL,
                party TEXT,
                election_year INTEGER NOT NULL DEFAULT 0,
                office TEXT,
                office_state TEXT,
                office_district TEXT,
                PRIMARY KEY (cand_id, election_year)
            );
            CREATE INDEX IF NOT EXISTS idx_{table}_name ON {table}(cand_name COLLATE NOCASE);"
        ))?;
    }

    // ==========================================================================
    // Committees (one snapshot per reporting year)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS committees (
            cmte_id TEXT NOT NULL,
            cmte_nm TEXT NOT NULL,
            tres_nm TEXT,
            cmte_city TEXT,
            cmte_st TEXT,
            cmte_dsgn TEXT,
            cmte_tp TEXT,
            cmte_pty_affiliation TEXT,
            org_tp TEXT,
            connected_org_nm TEXT,
            cand_id TEXT,
            year INTEGER NOT NULL,
            PRIMARY KEY (cmte_id, year)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS candidate_committee_links (
            cand_id TEXT NOT NULL,
            cand_election_yr INTEGER NOT NULL,
            fec_election_yr INTEGER,
            cmte_id TEXT NOT NULL,
            cmte_tp TEXT,
            cmte_dsgn TEXT,
            linkage_id TEXT,
            year INTEGER,
            PRIMARY KEY (cand_id, cmte_id, cand_election_yr)
        )",
        [],
    )?;

    // ==========================================================================
    // Money tables
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS committee_contributions (
            candidate_id TEXT NOT NULL,
            contributor_name TEXT NOT NULL,
            entity_type TEXT,
            amount REAL NOT NULL DEFAULT 0,
            year INTEGER NOT NULL,
            PRIMARY KEY (candidate_id, contributor_name, year)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS individual_transactions (
            cmte_id TEXT NOT NULL,
            transaction_tp TEXT,
            entity_tp TEXT,
            name TEXT NOT NULL,
            city TEXT,
            state TEXT,
            zip_code TEXT,
            employer TEXT,
            occupation TEXT,
            transaction_dt TEXT NOT NULL,
            transaction_amt REAL NOT NULL,
            cand_id TEXT,
            year INTEGER,
            PRIMARY KEY (cmte_id, name, transaction_dt, transaction_amt)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS independent_expenditures (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            cand_id TEXT NOT NULL,
            cand_name TEXT,
            spe_id TEXT NOT NULL,
            spe_nam TEXT,
            sup_opp TEXT NOT NULL,
            exp_amo REAL NOT NULL,
            exp_date TEXT,
            year INTEGER
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS companies (
            name TEXT PRIMARY KEY,
            industry TEXT,
            size TEXT,
            website TEXT,
            city TEXT,
            state TEXT,
            country_code TEXT,
            relevance_score INTEGER NOT NULL DEFAULT 0,
            size_priority INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    // ==========================================================================
    // Ingest runs (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id TEXT PRIMARY KEY,
            source_kind TEXT NOT NULL,
            file_path TEXT NOT NULL,
            sha256 TEXT NOT NULL,
            year INTEGER,
            rows_loaded INTEGER NOT NULL,
            rows_skipped INTEGER NOT NULL,
            loaded_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_committees_cand ON committees(cand_id);
         CREATE INDEX IF NOT EXISTS idx_committees_name ON committees(cmte_nm);
         CREATE INDEX IF NOT EXISTS idx_committees_org ON committees(connected_org_nm);
         CREATE INDEX IF NOT EXISTS idx_links_cand ON candidate_committee_links(cand_id);
         CREATE INDEX IF NOT EXISTS idx_links_cmte ON candidate_committee_links(cmte_id);
         CREATE INDEX IF NOT EXISTS idx_contrib_candidate ON committee_contributions(candidate_id);
         CREATE INDEX IF NOT EXISTS idx_indiv_cand ON individual_transactions(cand_id);
         CREATE INDEX IF NOT EXISTS idx_indiv_cmte ON individual_transactions(cmte_id);
         CREATE INDEX IF NOT EXISTS idx_ie_cand ON independent_expenditures(cand_id);
         CREATE INDEX IF NOT EXISTS idx_ingest_sha ON ingest_runs(sha256);",
    )?;

    Ok(())
}

// ============================================================================
// ROW HELPERS
// ============================================================================

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn candidate_from_row(row: &Row) -> rusqlite::Result<Candidate> {
    let year: i64 = row.get(3)?;
    let mut candidate = Candidate::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?);
    candidate.party = non_empty(row.get(2)?);
    candidate.office = non_empty(row.get(4)?);
    candidate.office_state = non_empty(row.get(5)?);
    candidate.office_district = non_empty(row.get(6)?);
    if year > 0 {
        candidate.election_years.insert(year as i32);
    }
    Ok(candidate)
}

const COMMITTEE_COLUMNS: &str = "cmte_id, cmte_nm, tres_nm, cmte_city, cmte_st, cmte_dsgn, cmte_tp,
     cmte_pty_affiliation, org_tp, connected_org_nm, cand_id, year";

fn committee_from_row(row: &Row) -> rusqlite::Result<Committee> {
    Ok(Committee {
        id: row.get(0)?,
        name: row.get(1)?,
        treasurer_name: non_empty(row.get(2)?),
        city: non_empty(row.get(3)?),
        state: non_empty(row.get(4)?),
        designation_code: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        type_code: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        party_affiliation: non_empty(row.get(7)?),
        organization_type: non_empty(row.get(8)?),
        connected_organization_name: non_empty(row.get(9)?),
        candidate_id: non_empty(row.get(10)?),
        year: row.get(11)?,
    })
}

// ============================================================================
// CANDIDATES
// ============================================================================

/// Insert or replace one candidate row (one row per election year)
pub fn upsert_candidate(
    conn: &Connection,
    source: CandidateSource,
    candidate: &Candidate,
) -> Result<()> {
    let sql = format!(
        "INSERT OR REPLACE INTO {} (
            cand_id, cand_name, party, election_year, office, office_state, office_district
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        source.table_name()
    );
    let mut stmt = conn.prepare_cached(&sql)?;

    let years: Vec<i32> = if candidate.election_years.is_empty() {
        vec![0]
    } else {
        candidate.election_years.iter().copied().collect()
    };

    for year in years {
        stmt.execute(params![
            candidate.id,
            candidate.display_name,
            candidate.party,
            year,
            candidate.office,
            candidate.office_state,
            candidate.office_district,
        ])?;
    }

    Ok(())
}

/// Candidate by id, merged across both candidate tables.
/// The display name comes from the highest-priority table that has the id.
pub fn get_candidate(conn: &Connection, candidate_id: &str) -> Result<Option<Candidate>> {
    let mut merged: Option<Candidate> = None;

    for source in CandidateSource::ALL {
        let sql = format!(
            "SELECT cand_id, cand_name, party, election_year, office, office_state, office_district
             FROM {} WHERE cand_id = ?1 ORDER BY election_year DESC",
            source.table_name()
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt
            .query_map(params![candidate_id], candidate_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for row in rows {
            match merged.as_mut() {
                Some(existing) => existing.merge(row),
                None => merged = Some(row),
            }
        }
    }

    Ok(merged)
}

// ============================================================================
// COMMITTEES
// ============================================================================

/// Replace semantics per (cmte_id, year)
pub fn upsert_committee(conn: &Connection, committee: &Committee) -> Result<()> {
    conn.prepare_cached(
        "INSERT OR REPLACE INTO committees (
            cmte_id, cmte_nm, tres_nm, cmte_city, cmte_st, cmte_dsgn, cmte_tp,
            cmte_pty_affiliation, org_tp, connected_org_nm, cand_id, year
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )?
    .execute(params![
        committee.id,
        committee.name,
        committee.treasurer_name,
        committee.city,
        committee.state,
        committee.designation_code,
        committee.type_code,
        committee.party_affiliation,
        committee.organization_type,
        committee.connected_organization_name,
        committee.candidate_id,
        committee.year,
    ])?;

    Ok(())
}

/// Committee snapshot for a year, or the most recent one when `year` is None
pub fn get_committee(
    conn: &Connection,
    committee_id: &str,
    year: Option<i32>,
) -> Result<Option<Committee>> {
    let committee = match year {
        Some(year) => conn
            .prepare_cached(&format!(
                "SELECT {COMMITTEE_COLUMNS} FROM committees WHERE cmte_id = ?1 AND year = ?2"
            ))?
            .query_row(params![committee_id, year], committee_from_row)
            .optional()?,
        None => conn
            .prepare_cached(&format!(
                "SELECT {COMMITTEE_COLUMNS} FROM committees WHERE cmte_id = ?1
                 ORDER BY year DESC LIMIT 1"
            ))?
            .query_row(params![committee_id], committee_from_row)
            .optional()?,
    };

    Ok(committee)
}

/// Most recent snapshot of the committee with exactly this name
pub fn get_committee_by_name(conn: &Connection, name: &str) -> Result<Option<Committee>> {
    let committee = conn
        .prepare_cached(&format!(
            "SELECT {COMMITTEE_COLUMNS} FROM committees WHERE cmte_nm = ?1
             ORDER BY year DESC, cmte_id LIMIT 1"
        ))?
        .query_row(params![name], committee_from_row)
        .optional()?;

    Ok(committee)
}

/// Committee rows whose own candidate column references the candidate
pub fn get_direct_committees(conn: &Connection, candidate_id: &str) -> Result<Vec<Committee>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {COMMITTEE_COLUMNS} FROM committees WHERE cand_id = ?1
         ORDER BY year DESC, cmte_id"
    ))?;

    let committees = stmt
        .query_map(params![candidate_id], committee_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(committees)
}

/// Connected organization from the newest snapshot that names one
pub fn get_connected_organization(conn: &Connection, committee_id: &str) -> Result<Option<String>> {
    let organization = conn
        .prepare_cached(
            "SELECT TRIM(connected_org_nm) FROM committees
             WHERE cmte_id = ?1 AND TRIM(COALESCE(connected_org_nm, '')) <> ''
             ORDER BY year DESC LIMIT 1",
        )?
        .query_row(params![committee_id], |row| row.get::<_, String>(0))
        .optional()?;

    Ok(organization)
}

/// Most recent snapshot of every committee sponsored by the organization
pub fn get_committees_by_connected_org(conn: &Connection, org_name: &str) -> Result<Vec<Committee>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {COMMITTEE_COLUMNS} FROM committees c
         WHERE c.connected_org_nm = ?1
           AND c.year = (SELECT MAX(year) FROM committees WHERE cmte_id = c.cmte_id)
         ORDER BY c.cmte_id"
    ))?;

    let committees = stmt
        .query_map(params![org_name], committee_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(committees)
}

// ============================================================================
// CANDIDATE-COMMITTEE LINKS
// ============================================================================

/// First write wins per (cand_id, cmte_id, cand_election_yr). Returns true if inserted.
pub fn insert_link(conn: &Connection, link: &CandidateCommitteeLink) -> Result<bool> {
    let changed = conn
        .prepare_cached(
            "INSERT OR IGNORE INTO candidate_committee_links (
                cand_id, cand_election_yr, fec_election_yr, cmte_id, cmte_tp, cmte_dsgn,
                linkage_id, year
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?
        .execute(params![
            link.candidate_id,
            link.candidate_election_year,
            link.fec_election_year,
            link.committee_id,
            link.committee_type,
            link.committee_designation,
            link.linkage_id,
            link.year,
        ])?;

    Ok(changed > 0)
}

fn link_from_row(row: &Row) -> rusqlite::Result<CandidateCommitteeLink> {
    Ok(CandidateCommitteeLink {
        candidate_id: row.get(0)?,
        candidate_election_year: row.get(1)?,
        fec_election_year: row.get::<_, Option<i32>>(2)?.unwrap_or_default(),
        committee_id: row.get(3)?,
        committee_type: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        committee_designation: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        linkage_id: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        year: row.get::<_, Option<i32>>(7)?.unwrap_or_default(),
    })
}

/// Linkage records for a candidate: year desc, committee id, linkage id
pub fn get_links_for_candidate(
    conn: &Connection,
    candidate_id: &str,
) -> Result<Vec<CandidateCommitteeLink>> {
    let mut stmt = conn.prepare_cached(
        "SELECT cand_id, cand_election_yr, fec_election_yr, cmte_id, cmte_tp, cmte_dsgn,
                linkage_id, year
         FROM candidate_committee_links
         WHERE cand_id = ?1
         ORDER BY year DESC, cmte_id, linkage_id",
    )?;

    let links = stmt
        .query_map(params![candidate_id], link_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(links)
}

pub fn get_links_for_committee(
    conn: &Connection,
    committee_id: &str,
) -> Result<Vec<CandidateCommitteeLink>> {
    let mut stmt = conn.prepare_cached(
        "SELECT cand_id, cand_election_yr, fec_election_yr, cmte_id, cmte_tp, cmte_dsgn,
                linkage_id, year
         FROM candidate_committee_links
         WHERE cmte_id = ?1
         ORDER BY year DESC, cand_id, linkage_id",
    )?;

    let links = stmt
        .query_map(params![committee_id], link_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(links)
}

// ============================================================================
// COMMITTEE CONTRIBUTIONS
// ============================================================================

/// Accumulate semantics: a recurring (candidate, contributor, year) key adds to the amount
pub fn accumulate_contribution(conn: &Connection, contribution: &CommitteeContribution) -> Result<()> {
    conn.prepare_cached(
        "INSERT INTO committee_contributions (candidate_id, contributor_name, entity_type, amount, year)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(candidate_id, contributor_name, year)
         DO UPDATE SET amount = amount + excluded.amount",
    )?
    .execute(params![
        contribution.candidate_id,
        contribution.contributor_name,
        contribution.entity_type,
        contribution.amount,
        contribution.year,
    ])?;

    Ok(())
}

/// Contribution rows for a candidate, oldest year first
pub fn get_contributions_for_candidate(
    conn: &Connection,
    candidate_id: &str,
) -> Result<Vec<CommitteeContribution>> {
    let mut stmt = conn.prepare_cached(
        "SELECT candidate_id, contributor_name, entity_type, amount, year
         FROM committee_contributions
         WHERE candidate_id = ?1
         ORDER BY year, rowid",
    )?;

    let rows = stmt
        .query_map(params![candidate_id], |row| {
            Ok(CommitteeContribution {
                candidate_id: row.get(0)?,
                contributor_name: row.get(1)?,
                entity_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                amount: row.get(3)?,
                year: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

/// Amount given by a named contributor to a candidate, per year
pub fn get_contribution_by_contributor(
    conn: &Connection,
    candidate_id: &str,
    contributor_name: &str,
) -> Result<BTreeMap<i32, f64>> {
    let mut stmt = conn.prepare_cached(
        "SELECT year, amount FROM committee_contributions
         WHERE candidate_id = ?1 AND contributor_name = ?2
         ORDER BY year",
    )?;

    let by_year = stmt
        .query_map(params![candidate_id, contributor_name], |row| {
            Ok((row.get::<_, i32>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;

    Ok(by_year)
}

// ============================================================================
// INDIVIDUAL TRANSACTIONS
// ============================================================================

/// First write wins. Returns true if inserted.
pub fn insert_individual_transaction(conn: &Connection, tx: &IndividualTransaction) -> Result<bool> {
    let changed = conn
        .prepare_cached(
            "INSERT OR IGNORE INTO individual_transactions (
                cmte_id, transaction_tp, entity_tp, name, city, state, zip_code,
                employer, occupation, transaction_dt, transaction_amt, cand_id, year
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )?
        .execute(params![
            tx.committee_id,
            tx.transaction_type,
            tx.entity_type,
            tx.recipient_name,
            tx.city,
            tx.state,
            tx.zip_code,
            tx.employer,
            tx.occupation,
            tx.transaction_date,
            tx.amount,
            tx.recipient_candidate_id,
            tx.year,
        ])?;

    Ok(changed > 0)
}

fn transaction_from_row(row: &Row) -> rusqlite::Result<IndividualTransaction> {
    Ok(IndividualTransaction {
        committee_id: row.get(0)?,
        transaction_type: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        entity_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        recipient_name: row.get(3)?,
        city: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        state: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        zip_code: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        employer: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        occupation: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        transaction_date: row.get(9)?,
        amount: row.get(10)?,
        recipient_candidate_id: non_empty(row.get(11)?),
        year: row.get::<_, Option<i32>>(12)?.unwrap_or_default(),
    })
}

const TRANSACTION_COLUMNS: &str = "cmte_id, transaction_tp, entity_tp, name, city, state, zip_code,
     employer, occupation, transaction_dt, transaction_amt, cand_id, year";

pub fn get_transactions_by_committee(
    conn: &Connection,
    committee_id: &str,
) -> Result<Vec<IndividualTransaction>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM individual_transactions
         WHERE cmte_id = ?1 ORDER BY year, transaction_dt"
    ))?;

    let rows = stmt
        .query_map(params![committee_id], transaction_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn get_transactions_by_candidate(
    conn: &Connection,
    candidate_id: &str,
) -> Result<Vec<IndividualTransaction>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM individual_transactions
         WHERE cand_id = ?1 ORDER BY year, transaction_dt"
    ))?;

    let rows = stmt
        .query_map(params![candidate_id], transaction_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

// ============================================================================
// INDEPENDENT EXPENDITURES
// ============================================================================

pub fn insert_independent_expenditure(conn: &Connection, ie: &IndependentExpenditure) -> Result<()> {
    conn.prepare_cached(
        "INSERT INTO independent_expenditures (
            cand_id, cand_name, spe_id, spe_nam, sup_opp, exp_amo, exp_date, year
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?
    .execute(params![
        ie.candidate_id,
        ie.candidate_name,
        ie.spender_id,
        ie.spender_name,
        ie.support_oppose.as_code(),
        ie.amount,
        ie.expenditure_date,
        ie.year,
    ])?;

    Ok(())
}

/// Expenditures targeting a candidate. Rows with an unknown support/oppose code are left out.
pub fn get_expenditures_for_candidate(
    conn: &Connection,
    candidate_id: &str,
) -> Result<Vec<IndependentExpenditure>> {
    let mut stmt = conn.prepare_cached(
        "SELECT cand_id, cand_name, spe_id, spe_nam, sup_opp, exp_amo, exp_date, year
         FROM independent_expenditures
         WHERE cand_id = ?1
         ORDER BY spe_id, year, id",
    )?;

    let rows = stmt
        .query_map(params![candidate_id], |row| {
            let code: String = row.get(4)?;
            Ok((
                code,
                IndependentExpenditure {
                    candidate_id: row.get(0)?,
                    candidate_name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    spender_id: row.get(2)?,
                    spender_name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    support_oppose: SupportOppose::Support,
                    amount: row.get(5)?,
                    expenditure_date: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                    year: row.get::<_, Option<i32>>(7)?.unwrap_or_default(),
                },
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let expenditures = rows
        .into_iter()
        .filter_map(|(code, mut ie)| {
            SupportOppose::from_code(&code).map(|so| {
                ie.support_oppose = so;
                ie
            })
        })
        .collect();

    Ok(expenditures)
}

// ============================================================================
// COMPANY DIRECTORY
// ============================================================================

pub fn upsert_company(conn: &Connection, company: &Company) -> Result<()> {
    conn.prepare_cached(
        "INSERT OR REPLACE INTO companies (
            name, industry, size, website, city, state, country_code,
            relevance_score, size_priority
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?
    .execute(params![
        company.name,
        company.industry,
        company.size,
        company.website,
        company.city,
        company.state,
        company.country_code,
        company.relevance_score,
        company.size_priority,
    ])?;

    Ok(())
}

fn company_from_row(row: &Row) -> rusqlite::Result<Company> {
    Ok(Company {
        name: row.get(0)?,
        industry: non_empty(row.get(1)?),
        size: non_empty(row.get(2)?),
        website: non_empty(row.get(3)?),
        city: non_empty(row.get(4)?),
        state: non_empty(row.get(5)?),
        country_code: non_empty(row.get(6)?),
        relevance_score: row.get(7)?,
        size_priority: row.get(8)?,
    })
}

pub fn get_company_by_name(conn: &Connection, name: &str) -> Result<Option<Company>> {
    let company = conn
        .prepare_cached(
            "SELECT name, industry, size, website, city, state, country_code,
                    relevance_score, size_priority
             FROM companies WHERE name = ?1 COLLATE NOCASE",
        )?
        .query_row(params![name], company_from_row)
        .optional()?;

    Ok(company)
}

/// Companies at or above `min_score`, most relevant first, larger companies first on ties
pub fn get_relevant_companies(conn: &Connection, min_score: i64, limit: usize) -> Result<Vec<Company>> {
    let mut stmt = conn.prepare_cached(
        "SELECT name, industry, size, website, city, state, country_code,
                relevance_score, size_priority
         FROM companies
         WHERE relevance_score >= ?1
         ORDER BY relevance_score DESC, size_priority ASC, name
         LIMIT ?2",
    )?;

    let companies = stmt
        .query_map(params![min_score, limit as i64], company_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(companies)
}

// ============================================================================
// INGEST RUNS
// ============================================================================

pub fn insert_ingest_run(conn: &Connection, run: &IngestRun) -> Result<()> {
    conn.execute(
        "INSERT INTO ingest_runs (
            run_id, source_kind, file_path, sha256, year, rows_loaded, rows_skipped, loaded_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            run.run_id,
            run.source_kind,
            run.file_path,
            run.sha256,
            run.year,
            run.rows_loaded as i64,
            run.rows_skipped as i64,
            run.loaded_at.to_rfc3339(),
        ],
    )?;

    Ok(())
}

/// True if a file with this digest has been loaded before
pub fn ingest_digest_seen(conn: &Connection, sha256: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM ingest_runs WHERE sha256 = ?1",
        params![sha256],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn get_ingest_runs(conn: &Connection) -> Result<Vec<IngestRun>> {
    let mut stmt = conn.prepare(
        "SELECT run_id, source_kind, file_path, sha256, year, rows_loaded, rows_skipped, loaded_at
         FROM ingest_runs
         ORDER BY loaded_at DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            let loaded_at: String = row.get(7)?;
            Ok((
                IngestRun {
                    run_id: row.get(0)?,
                    source_kind: row.get(1)?,
                    file_path: row.get(2)?,
                    sha256: row.get(3)?,
                    year: row.get(4)?,
                    rows_loaded: row.get::<_, i64>(5)? as u64,
                    rows_skipped: row.get::<_, i64>(6)? as u64,
                    loaded_at: Utc::now(),
                },
                loaded_at,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(mut run, loaded_at)| {
            run.loaded_at = DateTime::parse_from_rfc3339(&loaded_at)
                .map_err(|e| FinanceError::MalformedRecord {
                    line: 0,
                    reason: format!("ingest run {} has bad timestamp: {}", run.run_id, e),
                })?
                .with_timezone(&Utc);
            Ok(run)
        })
        .collect()
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::entities::Candidate;

    /// Store with Tom Cotton in both name forms, a principal campaign committee,
    /// a leadership PAC linked by linkage record and a Super PAC spending on him.
    pub fn seeded_store() -> Connection {
        let conn = open_in_memory_store().unwrap();

        upsert_candidate(
            &conn,
            CandidateSource::Master,
            &Candidate::new("H2AR04083", "COTTON, THOMAS")
                .with_office("H")
                .with_party("REP")
                .with_years(&[2012]),
        )
        .unwrap();
        upsert_candidate(
            &conn,
            CandidateSource::Listing,
            &Candidate::new("H2AR04083", "Thomas Cotton")
                .with_office("H")
                .with_party("REP")
                .with_years(&[2014]),
        )
        .unwrap();
        upsert_candidate(
            &conn,
            CandidateSource::Master,
            &Candidate::new("S4AR00000", "COTTONWOOD, JANE").with_office("S").with_years(&[2020]),
        )
        .unwrap();

        upsert_committee(
            &conn,
            &Committee::new("C00499988", "COTTON FOR CONGRESS", "H", 2024)
                .with_designation("P")
                .with_candidate("H2AR04083"),
        )
        .unwrap();
        upsert_committee(
            &conn,
            &Committee::new("C00550000", "REPUBLIC PAC", "Q", 2024).with_designation("D"),
        )
        .unwrap();
        insert_link(
            &conn,
            &CandidateCommitteeLink {
                linkage_id: "100".to_string(),
                candidate_id: "H2AR04083".to_string(),
                candidate_election_year: 2024,
                fec_election_year: 2024,
                committee_id: "C00550000".to_string(),
                committee_type: "Q".to_string(),
                committee_designation: "D".to_string(),
                year: 2024,
            },
        )
        .unwrap();

        conn
    }

    pub fn contribution(candidate_id: &str, name: &str, entity_type: &str, amount: f64, year: i32) -> CommitteeContribution {
        CommitteeContribution::new(candidate_id, name, entity_type, amount, year)
    }

    pub fn expenditure(spender_id: &str, spender_name: &str, code: SupportOppose, amount: f64) -> IndependentExpenditure {
        IndependentExpenditure {
            candidate_id: "H2AR04083".to_string(),
            candidate_name: "COTTON, THOMAS".to_string(),
            spender_id: spender_id.to_string(),
            spender_name: spender_name.to_string(),
            support_oppose: code,
            amount,
            expenditure_date: "2024-10-01".to_string(),
            year: 2024,
        }
    }

    pub fn transaction(cmte_id: &str, name: &str, cand_id: Option<&str>, amount: f64, year: i32) -> IndividualTransaction {
        IndividualTransaction {
            committee_id: cmte_id.to_string(),
            transaction_type: "24K".to_string(),
            entity_type: "CCM".to_string(),
            recipient_name: name.to_string(),
            city: "LITTLE ROCK".to_string(),
            state: "AR".to_string(),
            zip_code: "72201".to_string(),
            employer: String::new(),
            occupation: String::new(),
            transaction_date: format!("0101{}", year),
            amount,
            recipient_candidate_id: cand_id.map(str::to_string),
            year,
        }
    }
}
