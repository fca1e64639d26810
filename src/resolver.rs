// 🎯 Candidate Resolver - free-text name → candidate id
// Ordered cascade of pure matching strategies; first success wins.
// Precision drops as the cascade descends (strategies 4-5 are low confidence).

use crate::db::CandidateSource;
use crate::error::Result;
use crate::names::{NameNormalizer, NameVariants};
use crate::remote::{CandidateRegistry, RegistryCandidate};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

// ============================================================================
// CANDIDATE TABLES
// ============================================================================

/// A source of (id, display name) rows. All comparisons are case-insensitive;
/// prefix and substring lookups return the lexicographically first display name.
pub trait CandidateTable {
    fn table_name(&self) -> &str;

    fn find_exact(&self, name: &str) -> Result<Option<String>>;

    fn find_prefix(&self, prefix: &str) -> Result<Option<String>>;

    fn find_containing(&self, fragment: &str) -> Result<Option<String>>;
}

/// Escape LIKE wildcards so user text matches literally
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// One of the candidate tables in the store.
///
/// `COLLATE NOCASE` and `LIKE` fold ASCII letters only, so accented letters
/// must match case exactly here, while `MemoryCandidateTable` folds them.
/// FEC bulk names are upper-case ASCII in practice.
pub struct SqliteCandidateTable<'c> {
    conn: &'c Connection,
    source: CandidateSource,
}

impl<'c> SqliteCandidateTable<'c> {
    pub fn new(conn: &'c Connection, source: CandidateSource) -> Self {
        Self { conn, source }
    }

    fn first_like(&self, pattern: &str) -> Result<Option<String>> {
        let sql = format!(
            "SELECT cand_id FROM {} WHERE cand_name LIKE ?1 ESCAPE '\\'
             ORDER BY cand_name, cand_id LIMIT 1",
            self.source.table_name()
        );
        let id = self
            .conn
            .prepare_cached(&sql)?
            .query_row(params![pattern], |row| row.get(0))
            .optional()?;
        Ok(id)
    }
}

impl CandidateTable for SqliteCandidateTable<'_> {
    fn table_name(&self) -> &str {
        self.source.table_name()
    }

    fn find_exact(&self, name: &str) -> Result<Option<String>> {
        let sql = format!(
            "SELECT cand_id FROM {} WHERE cand_name = ?1 COLLATE NOCASE
             ORDER BY cand_name, cand_id LIMIT 1",
            self.source.table_name()
        );
        let id = self
            .conn
            .prepare_cached(&sql)?
            .query_row(params![name], |row| row.get(0))
            .optional()?;
        Ok(id)
    }

    fn find_prefix(&self, prefix: &str) -> Result<Option<String>> {
        self.first_like(&format!("{}%", escape_like(prefix)))
    }

    fn find_containing(&self, fragment: &str) -> Result<Option<String>> {
        self.first_like(&format!("%{}%", escape_like(fragment)))
    }
}

/// In-memory table (tests, cached registry listings)
pub struct MemoryCandidateTable {
    name: String,
    /// (display_name, id), kept sorted by display name
    rows: Vec<(String, String)>,
}

impl MemoryCandidateTable {
    pub fn new(name: &str, rows: &[(&str, &str)]) -> Self {
        let mut rows: Vec<(String, String)> = rows
            .iter()
            .map(|(id, display)| (display.to_string(), id.to_string()))
            .collect();
        rows.sort();
        Self {
            name: name.to_string(),
            rows,
        }
    }

    fn first_where<F: Fn(&str) -> bool>(&self, pred: F) -> Option<String> {
        self.rows
            .iter()
            .find(|(display, _)| pred(&display.to_lowercase()))
            .map(|(_, id)| id.clone())
    }
}

impl CandidateTable for MemoryCandidateTable {
    fn table_name(&self) -> &str {
        &self.name
    }

    fn find_exact(&self, name: &str) -> Result<Option<String>> {
        let needle = name.to_lowercase();
        Ok(self.first_where(|d| d == needle))
    }

    fn find_prefix(&self, prefix: &str) -> Result<Option<String>> {
        let needle = prefix.to_lowercase();
        Ok(self.first_where(|d| d.starts_with(&needle)))
    }

    fn find_containing(&self, fragment: &str) -> Result<Option<String>> {
        let needle = fragment.to_lowercase();
        Ok(self.first_where(|d| d.contains(&needle)))
    }
}

// ============================================================================
// MATCH STRATEGIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Input equals a display name
    Exact,

    /// "Last, First" form equals a display name
    Reversed,

    /// "First Last" form equals a display name
    Normalized,

    /// Display name starts with "{surname},"
    SurnamePrefix,

    /// Display name contains one of the input's tokens
    TokenSubstring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Low,
}

/// A strategy: pure lookup of the variants against the tables, in table order
pub type StrategyFn =
    for<'t> fn(&NameVariants, &[Box<dyn CandidateTable + 't>]) -> Result<Option<String>>;

fn first_table_hit<F>(tables: &[Box<dyn CandidateTable + '_>], mut lookup: F) -> Result<Option<String>>
where
    F: FnMut(&dyn CandidateTable) -> Result<Option<String>>,
{
    for table in tables {
        if let Some(id) = lookup(table.as_ref())? {
            debug!(table = table.table_name(), %id, "candidate table hit");
            return Ok(Some(id));
        }
    }
    Ok(None)
}

pub fn match_exact(v: &NameVariants, tables: &[Box<dyn CandidateTable + '_>]) -> Result<Option<String>> {
    first_table_hit(tables, |t| t.find_exact(&v.trimmed))
}

pub fn match_reversed(v: &NameVariants, tables: &[Box<dyn CandidateTable + '_>]) -> Result<Option<String>> {
    match &v.reversed {
        Some(reversed) => first_table_hit(tables, |t| t.find_exact(reversed)),
        None => Ok(None),
    }
}

pub fn match_normalized(v: &NameVariants, tables: &[Box<dyn CandidateTable + '_>]) -> Result<Option<String>> {
    match &v.normalized {
        Some(normalized) => first_table_hit(tables, |t| t.find_exact(normalized)),
        None => Ok(None),
    }
}

pub fn match_surname_prefix(v: &NameVariants, tables: &[Box<dyn CandidateTable + '_>]) -> Result<Option<String>> {
    if v.surname.is_empty() {
        return Ok(None);
    }
    let prefix = format!("{},", v.surname);
    first_table_hit(tables, |t| t.find_prefix(&prefix))
}

pub fn match_token_substring(v: &NameVariants, tables: &[Box<dyn CandidateTable + '_>]) -> Result<Option<String>> {
    for token in &v.tokens {
        if let Some(id) = first_table_hit(tables, |t| t.find_containing(token))? {
            return Ok(Some(id));
        }
    }
    Ok(None)
}

impl MatchStrategy {
    /// Cascade order
    pub const ALL: [MatchStrategy; 5] = [
        MatchStrategy::Exact,
        MatchStrategy::Reversed,
        MatchStrategy::Normalized,
        MatchStrategy::SurnamePrefix,
        MatchStrategy::TokenSubstring,
    ];

    pub fn function(&self) -> StrategyFn {
        match self {
            MatchStrategy::Exact => match_exact,
            MatchStrategy::Reversed => match_reversed,
            MatchStrategy::Normalized => match_normalized,
            MatchStrategy::SurnamePrefix => match_surname_prefix,
            MatchStrategy::TokenSubstring => match_token_substring,
        }
    }

    pub fn confidence(&self) -> Confidence {
        match self {
            MatchStrategy::Exact | MatchStrategy::Reversed | MatchStrategy::Normalized => Confidence::High,
            MatchStrategy::SurnamePrefix | MatchStrategy::TokenSubstring => Confidence::Low,
        }
    }
}

/// Run strategies in order; the first one that yields an id wins
pub fn first_success(
    strategies: &[MatchStrategy],
    variants: &NameVariants,
    tables: &[Box<dyn CandidateTable + '_>],
) -> Result<Option<(MatchStrategy, String)>> {
    for strategy in strategies {
        let hit = (strategy.function())(variants, tables)?;
        debug!(?strategy, name = %variants.trimmed, hit = ?hit, "resolver strategy");
        if let Some(id) = hit {
            return Ok(Some((*strategy, id)));
        }
    }
    Ok(None)
}

// ============================================================================
// DISAMBIGUATION (remote search results)
// ============================================================================

/// Chooses one of several registry hits. `None` abandons the lookup.
pub trait CandidateSelector {
    fn select(&self, query: &str, candidates: &[RegistryCandidate]) -> Result<Option<usize>>;
}

pub enum DisambiguationPolicy {
    /// Most recent election year wins; non-presidential preferred on ties
    AutoSelect,
    /// Caller picks from the full list
    Explicit(Box<dyn CandidateSelector>),
}

/// Index picked by the auto-select tie-break; earlier entries win remaining ties
pub fn auto_select(candidates: &[RegistryCandidate]) -> Option<usize> {
    let key = |c: &RegistryCandidate| (c.latest_election_year(), !c.is_presidential());

    let mut best: Option<usize> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        match best {
            Some(b) if key(candidate) <= key(&candidates[b]) => {}
            _ => best = Some(idx),
        }
    }
    best
}

// ============================================================================
// RESOLVER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ResolvedBy {
    Local { strategy: MatchStrategy },
    Registry { candidates_considered: usize, auto_selected: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub candidate_id: String,
    pub resolved_by: ResolvedBy,
    pub confidence: Confidence,
}

impl Resolution {
    pub fn is_low_confidence(&self) -> bool {
        self.confidence == Confidence::Low
    }
}

pub struct CandidateResolver<'a> {
    tables: Vec<Box<dyn CandidateTable + 'a>>,
    strategies: Vec<MatchStrategy>,
    registry: Option<&'a dyn CandidateRegistry>,
    policy: DisambiguationPolicy,
    per_page: u32,
}

impl<'a> CandidateResolver<'a> {
    /// Both store tables, master first, full cascade, no remote fallback
    pub fn new(conn: &'a Connection) -> Self {
        let tables: Vec<Box<dyn CandidateTable + 'a>> = CandidateSource::ALL
            .iter()
            .map(|source| Box::new(SqliteCandidateTable::new(conn, *source)) as Box<dyn CandidateTable + 'a>)
            .collect();
        Self::with_tables(tables)
    }

    pub fn with_tables(tables: Vec<Box<dyn CandidateTable + 'a>>) -> Self {
        CandidateResolver {
            tables,
            strategies: MatchStrategy::ALL.to_vec(),
            registry: None,
            policy: DisambiguationPolicy::AutoSelect,
            per_page: 20,
        }
    }

    /// Restrict or reorder the cascade
    pub fn with_strategies(mut self, strategies: &[MatchStrategy]) -> Self {
        self.strategies = strategies.to_vec();
        self
    }

    /// Fall back to the remote registry when no local strategy matches
    pub fn with_registry(
        mut self,
        registry: &'a dyn CandidateRegistry,
        policy: DisambiguationPolicy,
        per_page: u32,
    ) -> Self {
        self.registry = Some(registry);
        self.policy = policy;
        self.per_page = per_page.max(1);
        self
    }

    pub fn resolve(&self, name: &str) -> Result<Option<String>> {
        Ok(self.resolve_detailed(name)?.map(|r| r.candidate_id))
    }

    /// Resolution with the strategy that produced it and its confidence
    pub fn resolve_detailed(&self, name: &str) -> Result<Option<Resolution>> {
        let variants = NameNormalizer::normalize(name);
        if variants.is_empty() {
            return Ok(None);
        }

        if let Some(resolution) = self.resolve_local(&variants)? {
            if resolution.is_low_confidence() {
                info!(name = %variants.trimmed, id = %resolution.candidate_id, by = ?resolution.resolved_by, "low-confidence match");
            }
            return Ok(Some(resolution));
        }

        self.resolve_remote(&variants)
    }

    fn resolve_local(&self, variants: &NameVariants) -> Result<Option<Resolution>> {
        let hit = first_success(&self.strategies, variants, &self.tables)?;

        Ok(hit.map(|(strategy, candidate_id)| Resolution {
            candidate_id,
            resolved_by: ResolvedBy::Local { strategy },
            confidence: strategy.confidence(),
        }))
    }

    fn resolve_remote(&self, variants: &NameVariants) -> Result<Option<Resolution>> {
        let Some(registry) = self.registry else {
            return Ok(None);
        };

        let candidates = match registry.search(&variants.trimmed, 1, self.per_page) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(name = %variants.trimmed, error = %e, "registry search failed");
                return Ok(None);
            }
        };

        if candidates.is_empty() {
            return Ok(None);
        }

        let (index, auto_selected) = if candidates.len() == 1 {
            (Some(0), false)
        } else {
            match &self.policy {
                DisambiguationPolicy::AutoSelect => (auto_select(&candidates), true),
                DisambiguationPolicy::Explicit(selector) => (selector.select(&variants.trimmed, &candidates)?, false),
            }
        };

        let Some(index) = index else {
            return Ok(None);
        };
        let Some(chosen) = candidates.get(index) else {
            warn!(index, available = candidates.len(), "selection out of range");
            return Ok(None);
        };

        Ok(Some(Resolution {
            candidate_id: chosen.candidate_id.clone(),
            resolved_by: ResolvedBy::Registry {
                candidates_considered: candidates.len(),
                auto_selected,
            },
            confidence: if auto_selected { Confidence::Low } else { Confidence::High },
        }))
    }
}
