// 🏷️ Industry Keywords - fixed keyword table, first match wins
// Coarse, heuristic industry tagging of contributor names. Not ground truth.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// INDUSTRY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Industry {
    Defense,
    Tech,
    Media,
    Finance,
    Printing,
    Politics,
    Other,
}

impl Industry {
    pub fn as_str(&self) -> &'static str {
        match self {
            Industry::Defense => "defense",
            Industry::Tech => "tech",
            Industry::Media => "media",
            Industry::Finance => "finance",
            Industry::Printing => "printing",
            Industry::Politics => "politics",
            Industry::Other => "other",
        }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Scan order and keyword lists (lower-case substrings of the contributor name)
pub const INDUSTRY_KEYWORDS: [(Industry, &[&str]); 6] = [
    (
        Industry::Defense,
        &["defense", "military", "army", "navy", "lockheed", "marine", "force", "security"],
    ),
    (
        Industry::Tech,
        &["tech", "electronics", "digital", "communications", "google", "facebook", "meta", "software"],
    ),
    (
        Industry::Media,
        &["media", "news", "broadcast", "television", "radio", "entertainment", "film", "cable"],
    ),
    (
        Industry::Finance,
        &["insurance", "finance", "fund", "financial", "capital", "invest", "bank"],
    ),
    (
        Industry::Printing,
        &["printing", "print", "press", "graphics", "mailing", "paper"],
    ),
    (
        Industry::Politics,
        &["political", "politics", "campaign", "committee", "party", "victory", "republican", "democrat", "election"],
    ),
];

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndustryRule {
    pub industry: Industry,
    pub keywords: Vec<String>,
}

impl IndustryRule {
    /// Case-insensitive containment of any keyword
    pub fn matches(&self, text_lower: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && text_lower.contains(&k.to_lowercase()))
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

pub struct IndustryClassifier {
    rules: Vec<IndustryRule>,
}

impl IndustryClassifier {
    /// Built-in keyword table
    pub fn new() -> Self {
        let rules = INDUSTRY_KEYWORDS
            .iter()
            .map(|(industry, keywords)| IndustryRule {
                industry: *industry,
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
            })
            .collect();
        IndustryClassifier { rules }
    }

    /// Rules are scanned in the given order
    pub fn from_rules(rules: Vec<IndustryRule>) -> Self {
        IndustryClassifier { rules }
    }

    /// First matching rule wins; `Other` when nothing matches
    pub fn classify(&self, contributor_name: &str) -> Industry {
        let lower = contributor_name.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lower))
            .map(|rule| rule.industry)
            .unwrap_or(Industry::Other)
    }
}

impl Default for IndustryClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_classification() {
        let classifier = IndustryClassifier::new();

        assert_eq!(classifier.classify("LOCKHEED MARTIN EMPLOYEES PAC"), Industry::Defense);
        assert_eq!(classifier.classify("Google LLC NetPAC"), Industry::Tech);
        assert_eq!(classifier.classify("NATIONAL ASSOCIATION OF BROADCASTERS"), Industry::Media);
        assert_eq!(classifier.classify("AMERICAN BANKERS ASSOCIATION"), Industry::Finance);
        assert_eq!(classifier.classify("ACME PRINTING CO"), Industry::Printing);
        assert_eq!(classifier.classify("REPUBLICAN NATIONAL COMMITTEE"), Industry::Politics);
        assert_eq!(classifier.classify("JOHN DOE"), Industry::Other);
    }

    #[test]
    fn test_first_category_wins() {
        let classifier = IndustryClassifier::new();

        // "security" (defense) beats "fund" (finance)
        assert_eq!(classifier.classify("HOMELAND SECURITY FUND"), Industry::Defense);
        // "communications" (tech) beats "media"
        assert_eq!(classifier.classify("MEDIA COMMUNICATIONS GROUP"), Industry::Tech);
    }

    #[test]
    fn test_custom_rules_from_json() {
        let rules: Vec<IndustryRule> = serde_json::from_str(
            r#"[{"industry": "finance", "keywords": ["Acme"]}, {"industry": "defense", "keywords": ["acme"]}]"#,
        )
        .unwrap();
        let classifier = IndustryClassifier::from_rules(rules);
        assert_eq!(classifier.classify("ACME PAC"), Industry::Finance);
        assert_eq!(classifier.classify("Lockheed"), Industry::Other);
    }
}
