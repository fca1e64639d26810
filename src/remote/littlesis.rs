// 🕸️ LittleSis Client - entity-graph lookup for organizations

use super::{check_response, http_client, EntityLookup, EntityRecord};
use crate::error::{FinanceError, Result};
use serde_json::Value;

const SERVICE: &str = "littlesis";

pub struct LittleSisClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl LittleSisClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        Ok(LittleSisClient {
            http: http_client(SERVICE, timeout_secs)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// First entry of a JSON:API search response
pub fn parse_entity_search(body: &Value) -> Option<EntityRecord> {
    let first = body.get("data")?.as_array()?.first()?;
    let attributes = first.get("attributes")?;

    let id = first
        .get("id")
        .and_then(|id| id.as_i64().or_else(|| id.as_str().and_then(|s| s.parse().ok())))?;

    Some(EntityRecord {
        id,
        name: attributes.get("name")?.as_str()?.to_string(),
        entity_type: attributes
            .get("primary_ext")
            .and_then(Value::as_str)
            .unwrap_or("Entity")
            .to_string(),
        description: attributes
            .get("blurb")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    })
}

impl EntityLookup for LittleSisClient {
    fn lookup(&self, name: &str) -> Result<Option<EntityRecord>> {
        let url = format!("{}/entities/search", self.base_url);
        let response = check_response(SERVICE, self.http.get(&url).query(&[("q", name)]).send())?;
        let body: Value = response
            .json()
            .map_err(|e| FinanceError::unavailable(SERVICE, format!("unreadable response: {}", e)))?;

        Ok(parse_entity_search(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_entity_search() {
        let body = json!({
            "data": [
                {"type": "entities", "id": 14199, "attributes": {
                    "name": "Lockheed Martin", "primary_ext": "Org", "blurb": "Defense contractor"
                }}
            ]
        });
        let entity = parse_entity_search(&body).unwrap();
        assert_eq!(entity.id, 14199);
        assert_eq!(entity.entity_type, "Org");
        assert_eq!(entity.description.as_deref(), Some("Defense contractor"));

        assert!(parse_entity_search(&json!({"data": []})).is_none());
    }
}
