// 🏢 Company Directory Entry - optional third-party company metadata

use serde::{Deserialize, Serialize};

/// Relevance at or above this is treated as "high relevance"
pub const HIGH_RELEVANCE: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub industry: Option<String>,
    /// Headcount band, e.g. "10001+"
    pub size: Option<String>,
    pub website: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country_code: Option<String>,
    pub relevance_score: i64,
    /// Lower sorts first among equally relevant companies
    pub size_priority: i64,
}
