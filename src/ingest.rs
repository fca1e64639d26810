// 📥 Bulk Ingestion - FEC data drops → SQLite
// Pipe-delimited bulk files (header row shipped separately) plus comma CSVs

use crate::db::{self, CandidateSource, IngestRun};
use crate::entities::{
    Candidate, CandidateCommitteeLink, Committee, CommitteeContribution, Company,
    IndependentExpenditure, IndividualTransaction, SupportOppose,
};
use crate::error::{FinanceError, Result};
use csv::{ReaderBuilder, StringRecord};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ============================================================================
// SOURCE KINDS
// ============================================================================

/// Which data drop a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    CandidateMaster,
    CandidateListing,
    CommitteeMaster,
    CandidateCommitteeLinks,
    CommitteeContributions,
    IndividualTransactions,
    IndependentExpenditures,
    Companies,
}

impl SourceKind {
    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            SourceKind::CandidateMaster => "Candidate master",
            SourceKind::CandidateListing => "Candidate listing",
            SourceKind::CommitteeMaster => "Committee master",
            SourceKind::CandidateCommitteeLinks => "Candidate-committee linkages",
            SourceKind::CommitteeContributions => "Contributions from committees",
            SourceKind::IndividualTransactions => "Itemized transactions",
            SourceKind::IndependentExpenditures => "Independent expenditures",
            SourceKind::Companies => "Company directory",
        }
    }

    /// Short code stored in the ingest run log
    pub fn code(&self) -> &str {
        match self {
            SourceKind::CandidateMaster => "cn_master",
            SourceKind::CandidateListing => "cn_listing",
            SourceKind::CommitteeMaster => "cm",
            SourceKind::CandidateCommitteeLinks => "ccl",
            SourceKind::CommitteeContributions => "pas2",
            SourceKind::IndividualTransactions => "pas2_itemized",
            SourceKind::IndependentExpenditures => "independent_expenditures",
            SourceKind::Companies => "companies",
        }
    }

    /// Bulk pipe files need a separate header file
    pub fn needs_header_file(&self) -> bool {
        !matches!(self, SourceKind::IndependentExpenditures | SourceKind::Companies)
    }

    /// Files whose rows carry no year of their own
    pub fn needs_year(&self) -> bool {
        matches!(
            self,
            SourceKind::CommitteeMaster
                | SourceKind::CandidateCommitteeLinks
                | SourceKind::CommitteeContributions
                | SourceKind::IndividualTransactions
        )
    }
}

/// Result of loading one file
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub run_id: String,
    pub source_kind: SourceKind,
    pub file_path: String,
    pub rows_loaded: u64,
    pub rows_skipped: u64,
}

// ============================================================================
// RAW ROWS (column names as published)
// ============================================================================

#[derive(Debug, Deserialize)]
struct CandidateRow {
    #[serde(rename = "CAND_ID")]
    cand_id: String,
    #[serde(rename = "CAND_NAME")]
    cand_name: String,
    #[serde(rename = "CAND_PTY_AFFILIATION", default)]
    party: String,
    #[serde(rename = "CAND_ELECTION_YR", default)]
    election_year: String,
    #[serde(rename = "CAND_OFFICE", default)]
    office: String,
    #[serde(rename = "CAND_OFFICE_ST", default)]
    office_state: String,
    #[serde(rename = "CAND_OFFICE_DISTRICT", default)]
    office_district: String,
}

#[derive(Debug, Deserialize)]
struct CommitteeRow {
    #[serde(rename = "CMTE_ID")]
    cmte_id: String,
    #[serde(rename = "CMTE_NM", default)]
    cmte_nm: String,
    #[serde(rename = "TRES_NM", default)]
    tres_nm: String,
    #[serde(rename = "CMTE_CITY", default)]
    city: String,
    #[serde(rename = "CMTE_ST", default)]
    state: String,
    #[serde(rename = "CMTE_DSGN", default)]
    designation: String,
    #[serde(rename = "CMTE_TP", default)]
    type_code: String,
    #[serde(rename = "CMTE_PTY_AFFILIATION", default)]
    party: String,
    #[serde(rename = "ORG_TP", default)]
    org_tp: String,
    #[serde(rename = "CONNECTED_ORG_NM", default)]
    connected_org: String,
    #[serde(rename = "CAND_ID", default)]
    cand_id: String,
}

#[derive(Debug, Deserialize)]
struct LinkRow {
    #[serde(rename = "CAND_ID")]
    cand_id: String,
    #[serde(rename = "CAND_ELECTION_YR", default)]
    cand_election_yr: String,
    #[serde(rename = "FEC_ELECTION_YR", default)]
    fec_election_yr: String,
    #[serde(rename = "CMTE_ID")]
    cmte_id: String,
    #[serde(rename = "CMTE_TP", default)]
    cmte_tp: String,
    #[serde(rename = "CMTE_DSGN", default)]
    cmte_dsgn: String,
    #[serde(rename = "LINKAGE_ID", default)]
    linkage_id: String,
}

/// Row of the contributions-from-committees file (also the itemized loader's input)
#[derive(Debug, Deserialize)]
struct ContributionRow {
    #[serde(rename = "CMTE_ID", default)]
    cmte_id: String,
    #[serde(rename = "TRANSACTION_TP", default)]
    transaction_tp: String,
    #[serde(rename = "ENTITY_TP", default)]
    entity_tp: String,
    #[serde(rename = "NAME", default)]
    name: String,
    #[serde(rename = "CITY", default)]
    city: String,
    #[serde(rename = "STATE", default)]
    state: String,
    #[serde(rename = "ZIP_CODE", default)]
    zip_code: String,
    #[serde(rename = "EMPLOYER", default)]
    employer: String,
    #[serde(rename = "OCCUPATION", default)]
    occupation: String,
    #[serde(rename = "TRANSACTION_DT", default)]
    transaction_dt: String,
    #[serde(rename = "TRANSACTION_AMT", default)]
    transaction_amt: String,
    #[serde(rename = "CAND_ID", default)]
    cand_id: String,
}

#[derive(Debug, Deserialize)]
struct ExpenditureRow {
    cand_id: String,
    #[serde(default)]
    cand_name: String,
    spe_id: String,
    #[serde(default)]
    spe_nam: String,
    #[serde(default)]
    exp_amo: String,
    #[serde(default)]
    exp_date: String,
    #[serde(default)]
    sup_opp: String,
    #[serde(default)]
    fec_election_yr: String,
}

#[derive(Debug, Deserialize)]
struct CompanyRow {
    name: String,
    #[serde(default)]
    industry: String,
    #[serde(default)]
    size: String,
    #[serde(default)]
    website: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    country_code: String,
    #[serde(default)]
    relevance_score: String,
    #[serde(default)]
    size_priority: String,
}

// ============================================================================
// FIELD PARSING
// ============================================================================

fn opt(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Empty is 0.0; anything else non-numeric is a malformed record
pub fn parse_amount(raw: &str, line: u64) -> Result<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != '$' && *c != ',').collect();
    if cleaned.is_empty() {
        return Ok(0.0);
    }
    cleaned.parse::<f64>().map_err(|_| FinanceError::MalformedRecord {
        line,
        reason: format!("non-numeric amount {:?}", raw),
    })
}

fn parse_year(raw: &str, line: u64) -> Result<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse::<i32>().map_err(|_| FinanceError::MalformedRecord {
        line,
        reason: format!("non-numeric year {:?}", raw),
    })
}

fn parse_int(raw: &str, line: u64) -> Result<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse::<i64>().map_err(|_| FinanceError::MalformedRecord {
        line,
        reason: format!("non-numeric value {:?}", raw),
    })
}

// ============================================================================
// READERS
// ============================================================================

/// First record of a header CSV
pub fn load_headers(path: &Path) -> Result<StringRecord> {
    let mut rdr = ReaderBuilder::new().has_headers(false).from_path(path)?;
    match rdr.records().next() {
        Some(record) => Ok(record?.iter().map(str::trim).collect()),
        None => Err(FinanceError::MalformedRecord {
            line: 1,
            reason: format!("header file {} is empty", path.display()),
        }),
    }
}

/// SHA-256 of a file, hex-encoded
pub fn file_digest(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

fn pipe_reader(path: &Path) -> Result<csv::Reader<File>> {
    Ok(ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_path(path)?)
}

fn comma_reader(path: &Path) -> Result<(csv::Reader<File>, StringRecord)> {
    let mut rdr = ReaderBuilder::new().has_headers(true).flexible(true).from_path(path)?;
    let headers: StringRecord = rdr.headers()?.iter().map(|h| h.trim().to_lowercase()).collect();
    Ok((rdr, headers))
}

/// Drive one file through `handle`, inside one transaction, recording an ingest run.
/// Malformed rows are skipped and counted; any other error aborts the file.
fn load_records<T, F>(
    conn: &Connection,
    kind: SourceKind,
    path: &Path,
    mut rdr: csv::Reader<File>,
    headers: &StringRecord,
    year: Option<i32>,
    mut handle: F,
) -> Result<IngestReport>
where
    T: DeserializeOwned,
    F: FnMut(&Connection, T, u64) -> Result<()>,
{
    let digest = file_digest(path)?;
    if db::ingest_digest_seen(conn, &digest)? {
        warn!(
            file = %path.display(),
            kind = kind.code(),
            "file was loaded before; contribution amounts will accumulate again"
        );
    }

    let mut run = IngestRun::new(kind.code(), &path.display().to_string(), &digest, year);
    let tx = conn.unchecked_transaction()?;

    for (idx, result) in rdr.byte_records().enumerate() {
        let line = idx as u64 + 1;

        let outcome = result
            .map_err(FinanceError::from)
            .and_then(|raw| {
                let record = StringRecord::from_byte_record_lossy(raw);
                if record.len() != headers.len() {
                    return Err(FinanceError::MalformedRecord {
                        line,
                        reason: format!("expected {} fields, found {}", headers.len(), record.len()),
                    });
                }
                record.deserialize::<T>(Some(headers)).map_err(|e| FinanceError::MalformedRecord {
                    line,
                    reason: e.to_string(),
                })
            })
            .and_then(|row| handle(&*tx, row, line));

        match outcome {
            Ok(()) => run.rows_loaded += 1,
            Err(FinanceError::MalformedRecord { line, reason }) => {
                warn!(file = %path.display(), line, %reason, "skipping malformed record");
                run.rows_skipped += 1;
            }
            Err(FinanceError::Csv(e)) => {
                warn!(file = %path.display(), line, error = %e, "skipping unreadable record");
                run.rows_skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    db::insert_ingest_run(&tx, &run)?;
    tx.commit()?;

    info!(
        kind = kind.code(),
        file = %path.display(),
        loaded = run.rows_loaded,
        skipped = run.rows_skipped,
        "ingested file"
    );

    Ok(IngestReport {
        run_id: run.run_id,
        source_kind: kind,
        file_path: run.file_path,
        rows_loaded: run.rows_loaded,
        rows_skipped: run.rows_skipped,
    })
}

// ============================================================================
// LOADERS
// ============================================================================

/// Candidate file into one of the two candidate tables (replace per id + election year)
pub fn load_candidates(
    conn: &Connection,
    source: CandidateSource,
    data: &Path,
    headers: &StringRecord,
) -> Result<IngestReport> {
    let kind = match source {
        CandidateSource::Master => SourceKind::CandidateMaster,
        CandidateSource::Listing => SourceKind::CandidateListing,
    };

    load_records(conn, kind, data, pipe_reader(data)?, headers, None, |conn, row: CandidateRow, line| {
        let year = parse_year(&row.election_year, line)?;
        let mut candidate = Candidate::new(row.cand_id.trim(), row.cand_name.trim());
        candidate.party = opt(row.party);
        candidate.office = opt(row.office);
        candidate.office_state = opt(row.office_state);
        candidate.office_district = opt(row.office_district);
        if year > 0 {
            candidate.election_years.insert(year);
        }
        db::upsert_candidate(conn, source, &candidate)
    })
}

/// Committee master file (replace per committee id + year)
pub fn load_committees(
    conn: &Connection,
    data: &Path,
    headers: &StringRecord,
    year: i32,
) -> Result<IngestReport> {
    load_records(
        conn,
        SourceKind::CommitteeMaster,
        data,
        pipe_reader(data)?,
        headers,
        Some(year),
        |conn, row: CommitteeRow, _line| {
            let committee = Committee {
                id: row.cmte_id.trim().to_string(),
                name: row.cmte_nm.trim().to_string(),
                type_code: row.type_code.trim().to_string(),
                designation_code: row.designation.trim().to_string(),
                party_affiliation: opt(row.party),
                organization_type: opt(row.org_tp),
                connected_organization_name: opt(row.connected_org),
                candidate_id: opt(row.cand_id),
                treasurer_name: opt(row.tres_nm),
                city: opt(row.city),
                state: opt(row.state),
                year,
            };
            db::upsert_committee(conn, &committee)
        },
    )
}

/// Candidate-committee linkage file (first write wins)
pub fn load_candidate_committee_links(
    conn: &Connection,
    data: &Path,
    headers: &StringRecord,
    year: i32,
) -> Result<IngestReport> {
    load_records(
        conn,
        SourceKind::CandidateCommitteeLinks,
        data,
        pipe_reader(data)?,
        headers,
        Some(year),
        |conn, row: LinkRow, line| {
            let link = CandidateCommitteeLink {
                linkage_id: row.linkage_id.trim().to_string(),
                candidate_id: row.cand_id.trim().to_string(),
                candidate_election_year: parse_year(&row.cand_election_yr, line)?,
                fec_election_year: parse_year(&row.fec_election_yr, line)?,
                committee_id: row.cmte_id.trim().to_string(),
                committee_type: row.cmte_tp.trim().to_string(),
                committee_designation: row.cmte_dsgn.trim().to_string(),
                year,
            };
            db::insert_link(conn, &link).map(|_| ())
        },
    )
}

/// Contributions-from-committees file (accumulate per candidate, contributor, year)
pub fn load_committee_contributions(
    conn: &Connection,
    data: &Path,
    headers: &StringRecord,
    year: i32,
) -> Result<IngestReport> {
    load_records(
        conn,
        SourceKind::CommitteeContributions,
        data,
        pipe_reader(data)?,
        headers,
        Some(year),
        |conn, row: ContributionRow, line| {
            let contribution = CommitteeContribution::new(
                row.cand_id.trim(),
                row.name.trim(),
                row.entity_tp.trim(),
                parse_amount(&row.transaction_amt, line)?,
                year,
            );
            db::accumulate_contribution(conn, &contribution)
        },
    )
}

/// Itemized transactions (stored row by row, first write wins)
pub fn load_individual_transactions(
    conn: &Connection,
    data: &Path,
    headers: &StringRecord,
    year: i32,
) -> Result<IngestReport> {
    load_records(
        conn,
        SourceKind::IndividualTransactions,
        data,
        pipe_reader(data)?,
        headers,
        Some(year),
        |conn, row: ContributionRow, line| {
            let tx = IndividualTransaction {
                committee_id: row.cmte_id.trim().to_string(),
                transaction_type: row.transaction_tp.trim().to_string(),
                entity_type: row.entity_tp.trim().to_string(),
                recipient_name: row.name.trim().to_string(),
                city: row.city.trim().to_string(),
                state: row.state.trim().to_string(),
                zip_code: row.zip_code.trim().to_string(),
                employer: row.employer.trim().to_string(),
                occupation: row.occupation.trim().to_string(),
                transaction_date: row.transaction_dt.trim().to_string(),
                amount: parse_amount(&row.transaction_amt, line)?,
                recipient_candidate_id: opt(row.cand_id),
                year,
            };
            db::insert_individual_transaction(conn, &tx).map(|_| ())
        },
    )
}

/// Independent-expenditure CSV (comma separated, with header row)
pub fn load_independent_expenditures(conn: &Connection, data: &Path) -> Result<IngestReport> {
    let (rdr, headers) = comma_reader(data)?;

    load_records(
        conn,
        SourceKind::IndependentExpenditures,
        data,
        rdr,
        &headers,
        None,
        |conn, row: ExpenditureRow, line| {
            let support_oppose =
                SupportOppose::from_code(&row.sup_opp).ok_or_else(|| FinanceError::MalformedRecord {
                    line,
                    reason: format!("support/oppose indicator {:?}", row.sup_opp),
                })?;

            let ie = IndependentExpenditure {
                candidate_id: row.cand_id.trim().to_string(),
                candidate_name: row.cand_name.trim().to_string(),
                spender_id: row.spe_id.trim().to_string(),
                spender_name: row.spe_nam.trim().to_string(),
                support_oppose,
                amount: parse_amount(&row.exp_amo, line)?,
                expenditure_date: row.exp_date.trim().to_string(),
                year: parse_year(&row.fec_election_yr, line)?,
            };
            db::insert_independent_expenditure(conn, &ie)
        },
    )
}

/// Company directory CSV (replace per name)
pub fn load_companies(conn: &Connection, data: &Path) -> Result<IngestReport> {
    let (rdr, headers) = comma_reader(data)?;

    load_records(conn, SourceKind::Companies, data, rdr, &headers, None, |conn, row: CompanyRow, line| {
        let company = Company {
            name: row.name.trim().to_string(),
            industry: opt(row.industry),
            size: opt(row.size),
            website: opt(row.website),
            city: opt(row.city),
            state: opt(row.state),
            country_code: opt(row.country_code),
            relevance_score: parse_int(&row.relevance_score, line)?,
            size_priority: parse_int(&row.size_priority, line)?,
        };
        db::upsert_company(conn, &company)
    })
}

// ============================================================================
// MANIFEST
// ============================================================================

/// One file to import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub kind: SourceKind,
    pub path: PathBuf,
    #[serde(default)]
    pub header_path: Option<PathBuf>,
    #[serde(default)]
    pub year: Option<i32>,
}

/// A list of files to import, in order. Relative paths resolve against the manifest's directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportManifest {
    pub files: Vec<ManifestEntry>,
}

impl ImportManifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Load every manifest entry in order
pub fn run_manifest(conn: &Connection, manifest: &ImportManifest, base_dir: &Path) -> Result<Vec<IngestReport>> {
    let mut reports = Vec::with_capacity(manifest.files.len());

    for entry in &manifest.files {
        let data = resolve(base_dir, &entry.path);

        let year = match (entry.kind.needs_year(), entry.year) {
            (true, None) => {
                return Err(FinanceError::Config(format!(
                    "{} entry {} has no year",
                    entry.kind.name(),
                    data.display()
                )))
            }
            (_, year) => year.unwrap_or_default(),
        };

        let headers = if entry.kind.needs_header_file() {
            let header_path = entry.header_path.as_ref().ok_or_else(|| {
                FinanceError::Config(format!("{} entry {} has no header_path", entry.kind.name(), data.display()))
            })?;
            Some(load_headers(&resolve(base_dir, header_path))?)
        } else {
            None
        };

        let headers = headers.unwrap_or_default();
        let report = match entry.kind {
            SourceKind::CandidateMaster => load_candidates(conn, CandidateSource::Master, &data, &headers)?,
            SourceKind::CandidateListing => load_candidates(conn, CandidateSource::Listing, &data, &headers)?,
            SourceKind::CommitteeMaster => load_committees(conn, &data, &headers, year)?,
            SourceKind::CandidateCommitteeLinks => load_candidate_committee_links(conn, &data, &headers, year)?,
            SourceKind::CommitteeContributions => load_committee_contributions(conn, &data, &headers, year)?,
            SourceKind::IndividualTransactions => load_individual_transactions(conn, &data, &headers, year)?,
            SourceKind::IndependentExpenditures => load_independent_expenditures(conn, &data)?,
            SourceKind::Companies => load_companies(conn, &data)?,
        };
        reports.push(report);
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_committee, get_contributions_for_candidate, get_ingest_runs, open_in_memory_store};
    use std::io::Write;
    use tempfile::TempDir;

    const PAS2_HEADER: &str = "CMTE_ID,AMNDT_IND,RPT_TP,TRANSACTION_PGI,IMAGE_NUM,TRANSACTION_TP,ENTITY_TP,NAME,CITY,STATE,ZIP_CODE,EMPLOYER,OCCUPATION,TRANSACTION_DT,TRANSACTION_AMT,OTHER_ID,CAND_ID,TRAN_ID,FILE_NUM,MEMO_CD,MEMO_TEXT,SUB_ID\n";
    const CN_HEADER: &str = "CAND_ID,CAND_NAME,CAND_PTY_AFFILIATION,CAND_ELECTION_YR,CAND_OFFICE_ST,CAND_OFFICE,CAND_OFFICE_DISTRICT,CAND_ICI,CAND_STATUS,CAND_PCC,CAND_ST1,CAND_ST2,CAND_CITY,CAND_ST,CAND_ZIP\n";
    const CCL_HEADER: &str = "CAND_ID,CAND_ELECTION_YR,FEC_ELECTION_YR,CMTE_ID,CMTE_TP,CMTE_DSGN,LINKAGE_ID\n";
    const CM_HEADER: &str = "CMTE_ID,CMTE_NM,TRES_NM,CMTE_ST1,CMTE_ST2,CMTE_CITY,CMTE_ST,CMTE_ZIP,CMTE_DSGN,CMTE_TP,CMTE_PTY_AFFILIATION,CMTE_FILING_FREQ,ORG_TP,CONNECTED_ORG_NM,CAND_ID\n";

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn pas2_line(cmte: &str, entity: &str, name: &str, amount: &str, cand: &str) -> String {
        format!(
            "{cmte}|N|Q3|G2024|2024|24K|{entity}|{name}|LITTLE ROCK|AR|72201|||10012024|{amount}||{cand}|T1|1|||1\n"
        )
    }

    #[test]
    fn test_contributions_accumulate_and_skip_malformed() {
        let dir = TempDir::new().unwrap();
        let header = write_file(&dir, "pas2_header.csv", PAS2_HEADER);
        let mut body = String::new();
        body.push_str(&pas2_line("C001", "PAC", "LOCKHEED MARTIN PAC", "1000", "H2AR04083"));
        body.push_str(&pas2_line("C001", "PAC", "LOCKHEED MARTIN PAC", "500", "H2AR04083"));
        body.push_str(&pas2_line("C002", "PAC", "EMPTY AMOUNT PAC", "", "H2AR04083"));
        body.push_str(&pas2_line("C003", "PAC", "BAD AMOUNT PAC", "12x", "H2AR04083"));
        body.push_str("C004|too|short\n");
        let data = write_file(&dir, "itpas2.txt", &body);

        let conn = open_in_memory_store().unwrap();
        let headers = load_headers(&header).unwrap();
        assert_eq!(headers.len(), 22);

        let report = load_committee_contributions(&conn, &data, &headers, 2024).unwrap();
        assert_eq!(report.rows_loaded, 3);
        assert_eq!(report.rows_skipped, 2);

        let rows = get_contributions_for_candidate(&conn, "H2AR04083").unwrap();
        let lockheed = rows.iter().find(|r| r.contributor_name == "LOCKHEED MARTIN PAC").unwrap();
        assert_eq!(lockheed.amount, 1500.0);
        let empty = rows.iter().find(|r| r.contributor_name == "EMPTY AMOUNT PAC").unwrap();
        assert_eq!(empty.amount, 0.0);

        // Loading the same file again accumulates again
        load_committee_contributions(&conn, &data, &headers, 2024).unwrap();
        let rows = get_contributions_for_candidate(&conn, "H2AR04083").unwrap();
        let lockheed = rows.iter().find(|r| r.contributor_name == "LOCKHEED MARTIN PAC").unwrap();
        assert_eq!(lockheed.amount, 3000.0);

        let runs = get_ingest_runs(&conn).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].sha256, runs[1].sha256);
    }

    #[test]
    fn test_candidate_master_load() {
        let dir = TempDir::new().unwrap();
        let header = write_file(&dir, "cn_header.csv", CN_HEADER);
        let data = write_file(
            &dir,
            "cn.txt",
            "H2AR04083|COTTON, THOMAS|REP|2012|AR|H|04|O|C|C00499988|PO BOX 1||LITTLE ROCK|AR|72201\n\
             H2AR04083|COTTON, THOMAS|REP|2014|AR|H|04|I|C|C00499988|PO BOX 1||LITTLE ROCK|AR|72201\n\
             S4AR00000|COTTONWOOD, JANE|DEM|20X4|AR|S|00|C|C||||LITTLE ROCK|AR|72201\n\
             H0XX00000|SHORT ROW\n",
        );

        let conn = open_in_memory_store().unwrap();
        let headers = load_headers(&header).unwrap();
        let report = load_candidates(&conn, CandidateSource::Master, &data, &headers).unwrap();
        assert_eq!(report.source_kind, SourceKind::CandidateMaster);
        assert_eq!(report.rows_loaded, 2);
        assert_eq!(report.rows_skipped, 2);

        let cotton = db::get_candidate(&conn, "H2AR04083").unwrap().unwrap();
        assert_eq!(cotton.display_name, "COTTON, THOMAS");
        assert_eq!(cotton.office.as_deref(), Some("H"));
        assert_eq!(cotton.party.as_deref(), Some("REP"));
        assert_eq!(cotton.election_years.iter().copied().collect::<Vec<_>>(), vec![2012, 2014]);
        assert!(db::get_candidate(&conn, "S4AR00000").unwrap().is_none());
    }

    #[test]
    fn test_linkage_load_and_reload_keeps_one_link() {
        let dir = TempDir::new().unwrap();
        let header = write_file(&dir, "ccl_header.csv", CCL_HEADER);
        let data = write_file(
            &dir,
            "ccl.txt",
            "H2AR04083|2024|2024|C00499988|H|P|100\n\
             H2AR04083|2024|2024|C00550000|Q|D|101\n\
             H2AR04083|20X4|2024|C00600000|Q|D|102\n\
             H2AR04083|2024\n",
        );

        let conn = open_in_memory_store().unwrap();
        let headers = load_headers(&header).unwrap();
        let report = load_candidate_committee_links(&conn, &data, &headers, 2024).unwrap();
        assert_eq!(report.rows_loaded, 2);
        assert_eq!(report.rows_skipped, 2);

        // Same rows again: first write wins, nothing duplicated
        let again = load_candidate_committee_links(&conn, &data, &headers, 2024).unwrap();
        assert_eq!(again.rows_skipped, 2);

        let links = db::get_links_for_candidate(&conn, "H2AR04083").unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].committee_id, "C00499988");
        assert_eq!(links[0].linkage_id, "100");
        assert_eq!(links[1].committee_id, "C00550000");
        assert_eq!(links[1].committee_designation, "D");
        assert_eq!(get_ingest_runs(&conn).unwrap().len(), 2);
    }

    #[test]
    fn test_committee_reload_replaces() {
        let dir = TempDir::new().unwrap();
        let header = write_file(&dir, "cm_header.csv", CM_HEADER);
        let first = write_file(
            &dir,
            "cm_a.txt",
            "C00550000|REPUBLIC PAC|DOE, JOHN|1 MAIN||LITTLE ROCK|AR|72201|D|Q|REP|Q|C|ACME CORP|\n",
        );
        let second = write_file(
            &dir,
            "cm_b.txt",
            "C00550000|REPUBLIC PAC II|DOE, JANE|1 MAIN||LITTLE ROCK|AR|72201|D|N|REP|Q|||H2AR04083\n",
        );

        let conn = open_in_memory_store().unwrap();
        let headers = load_headers(&header).unwrap();
        load_committees(&conn, &first, &headers, 2024).unwrap();
        load_committees(&conn, &second, &headers, 2024).unwrap();

        let c = get_committee(&conn, "C00550000", Some(2024)).unwrap().unwrap();
        assert_eq!(c.name, "REPUBLIC PAC II");
        assert_eq!(c.type_code, "N");
        assert_eq!(c.organization_type, None);
        assert_eq!(c.connected_organization_name, None);
        assert_eq!(c.candidate_id.as_deref(), Some("H2AR04083"));
    }

    #[test]
    fn test_independent_expenditures_csv() {
        let dir = TempDir::new().unwrap();
        let data = write_file(
            &dir,
            "independent_expenditure_2024.csv",
            "cand_id,cand_name,spe_id,spe_nam,exp_amo,exp_date,sup_opp,fec_election_yr\n\
             H2AR04083,\"COTTON, THOMAS\",C00700000,FREEDOM FUND,\"$1,500.00\",01-OCT-24,S,2024\n\
             H2AR04083,\"COTTON, THOMAS\",C00700001,OTHER SIDE PAC,200,02-OCT-24,O,2024\n\
             H2AR04083,\"COTTON, THOMAS\",C00700002,MYSTERY PAC,200,02-OCT-24,X,2024\n",
        );

        let conn = open_in_memory_store().unwrap();
        let report = load_independent_expenditures(&conn, &data).unwrap();
        assert_eq!(report.rows_loaded, 2);
        assert_eq!(report.rows_skipped, 1);

        let rows = db::get_expenditures_for_candidate(&conn, "H2AR04083").unwrap();
        assert_eq!(rows[0].amount, 1500.0);
        assert_eq!(rows[0].support_oppose, SupportOppose::Support);
        assert_eq!(rows[1].support_oppose, SupportOppose::Oppose);
    }

    #[test]
    fn test_manifest_requires_year_and_headers() {
        let conn = open_in_memory_store().unwrap();
        let dir = TempDir::new().unwrap();

        let manifest: ImportManifest = serde_json::from_str(
            r#"{"files": [{"kind": "committee_master", "path": "cm.txt", "header_path": "cm_header.csv"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            run_manifest(&conn, &manifest, dir.path()),
            Err(FinanceError::Config(_))
        ));

        let manifest: ImportManifest = serde_json::from_str(
            r#"{"files": [{"kind": "candidate_committee_links", "path": "ccl.txt", "year": 2024}]}"#,
        )
        .unwrap();
        assert!(matches!(
            run_manifest(&conn, &manifest, dir.path()),
            Err(FinanceError::Config(_))
        ));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("", 1).unwrap(), 0.0);
        assert_eq!(parse_amount(" 2,500.50 ", 1).unwrap(), 2500.5);
        assert_eq!(parse_amount("-100", 1).unwrap(), -100.0);
        assert!(matches!(
            parse_amount("N/A", 9),
            Err(FinanceError::MalformedRecord { line: 9, .. })
        ));
    }
}
