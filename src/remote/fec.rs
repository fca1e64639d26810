// 🗳️ OpenFEC Client - remote candidate search and detail lookup

use super::{check_response, http_client, CandidateRegistry, RegistryCandidate};
use crate::config::FecConfig;
use crate::error::{FinanceError, Result};
use serde_json::Value;
use tracing::debug;

const SERVICE: &str = "openfec";

pub struct FecClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl FecClient {
    pub fn new(config: &FecConfig, timeout_secs: u64) -> Result<Self> {
        Ok(FecClient {
            http: http_client(SERVICE, timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "registry request");

        let response = check_response(
            SERVICE,
            self.http
                .get(&url)
                .query(&[("api_key", self.api_key.as_str())])
                .query(query)
                .send(),
        )?;

        response
            .json::<Value>()
            .map_err(|e| FinanceError::unavailable(SERVICE, format!("unreadable response: {}", e)))
    }
}

/// `results[]` of a search response. Entries without an id are dropped.
pub fn parse_search_results(body: &Value) -> Vec<RegistryCandidate> {
    let Some(results) = body.get("results").and_then(Value::as_array) else {
        return Vec::new();
    };

    results
        .iter()
        .filter_map(|r| {
            let candidate_id = r.get("candidate_id")?.as_str()?.to_string();
            let text = |key: &str| r.get(key).and_then(Value::as_str).map(str::to_string);
            Some(RegistryCandidate {
                name: text("name").unwrap_or_default(),
                office: text("office"),
                party: text("party"),
                election_years: r
                    .get("election_years")
                    .and_then(Value::as_array)
                    .map(|years| years.iter().filter_map(|y| y.as_i64()).map(|y| y as i32).collect())
                    .unwrap_or_default(),
                candidate_id,
            })
        })
        .collect()
}

impl CandidateRegistry for FecClient {
    fn search(&self, query: &str, page: u32, per_page: u32) -> Result<Vec<RegistryCandidate>> {
        let body = self.get_json(
            "/candidates/search/",
            &[
                ("q", query.to_string()),
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
                ("sort", "name".to_string()),
            ],
        )?;
        Ok(parse_search_results(&body))
    }

    fn get_candidate(&self, candidate_id: &str) -> Result<Option<Value>> {
        let body = self.get_json(&format!("/candidate/{}/", urlencoding::encode(candidate_id)), &[])?;
        Ok(body
            .get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_search_results() {
        let body = json!({
            "pagination": {"count": 2},
            "results": [
                {"candidate_id": "H2AR04083", "name": "COTTON, THOMAS", "office": "H", "party": "REP", "election_years": [2012]},
                {"candidate_id": "S4AR00172", "name": "COTTON, TOM", "office": "S", "party": "REP", "election_years": [2014, 2020, 2026]},
                {"name": "NO ID"}
            ]
        });

        let hits = parse_search_results(&body);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].candidate_id, "S4AR00172");
        assert_eq!(hits[1].latest_election_year(), Some(2026));
        assert_eq!(hits[0].office.as_deref(), Some("H"));
    }

    #[test]
    fn test_parse_unexpected_shape() {
        assert!(parse_search_results(&json!({"error": "rate limited"})).is_empty());
    }
}
