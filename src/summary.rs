// 📝 Narrative Summary - LLM prompt assembly with a deterministic fallback

use crate::contributions::{industry_totals, rank_contributors, ContributionAggregator, ContributorMap, IndustryTotal};
use crate::error::Result;
use crate::remote::TextGenerator;
use serde::Serialize;
use tracing::warn;

pub const NO_DATA_MESSAGE: &str = "No financial data available for analysis.";

const PROMPT_TOP_N: usize = 10;
const FALLBACK_TOP_N: usize = 5;

const INSTRUCTIONS: &str = "Please provide:
1. A summary of the contribution patterns, including major industries and types of contributors
2. Notable concentrations of funding by industry or contributor type
3. Potential areas of concern based on the contribution patterns
4. Overall assessment of financial transparency

Keep the tone professional and factual, focusing only on verifiable data.";

/// `$1,234.56`
pub fn format_money(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}

// ============================================================================
// INPUT
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct SummaryInput {
    pub total_amount: f64,
    pub contributors: ContributorMap,
    pub industry_totals: Vec<IndustryTotal>,
}

impl SummaryInput {
    pub fn from_contributors(contributors: ContributorMap) -> Self {
        SummaryInput {
            total_amount: contributors.values().map(|s| s.amount).sum(),
            industry_totals: industry_totals(&contributors),
            contributors,
        }
    }

    pub fn for_candidate(aggregator: &ContributionAggregator, candidate_id: &str) -> Result<Self> {
        Ok(Self::from_contributors(aggregator.contributions_for(candidate_id)?))
    }

    pub fn has_data(&self) -> bool {
        !self.contributors.is_empty()
    }
}

pub fn build_prompt(input: &SummaryInput) -> String {
    let mut prompt = format!(
        "As a Political Finance Analysis Agent, analyze the following campaign finance data:\n\n\
         Total Contributions: {}\n\nTop 10 Contributors:\n",
        format_money(input.total_amount)
    );

    for top in rank_contributors(&input.contributors, PROMPT_TOP_N) {
        prompt.push_str(&format!("- {}: {} ({})\n", top.name, format_money(top.amount), top.industry));
    }

    if !input.industry_totals.is_empty() {
        prompt.push_str("\nIndustry Breakdown:\n");
        for total in &input.industry_totals {
            prompt.push_str(&format!("- {}: {}\n", total.industry, format_money(total.total)));
        }
    }

    prompt.push('\n');
    prompt.push_str(INSTRUCTIONS);
    prompt
}

pub fn fallback_summary(input: &SummaryInput) -> String {
    if !input.has_data() {
        return NO_DATA_MESSAGE.to_string();
    }

    let mut lines = vec![
        "Analysis of campaign contributions:".to_string(),
        format!("\nTotal contributions: {}", format_money(input.total_amount)),
        "\nTop 5 contributors:".to_string(),
    ];

    for top in rank_contributors(&input.contributors, FALLBACK_TOP_N) {
        lines.push(format!("- {}: {} ({})", top.name, format_money(top.amount), top.industry));
    }

    if !input.industry_totals.is_empty() {
        lines.push("\nIndustry breakdown:".to_string());
        for total in &input.industry_totals {
            lines.push(format!("- {}: {}", total.industry, format_money(total.total)));
        }
    }

    lines.join("\n")
}

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarySource {
    Llm,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub text: String,
    pub source: SummarySource,
}

/// Never fails: generator errors and empty replies fall back to the local template
pub fn summarize(input: &SummaryInput, generator: Option<&dyn TextGenerator>) -> Summary {
    let fallback = || Summary {
        text: fallback_summary(input),
        source: SummarySource::Fallback,
    };

    let Some(generator) = generator.filter(|_| input.has_data()) else {
        return fallback();
    };

    match generator.generate(&build_prompt(input)) {
        Ok(text) if !text.trim().is_empty() => Summary {
            text: text.trim().to_string(),
            source: SummarySource::Llm,
        },
        Ok(_) => {
            warn!("text generator returned an empty reply, using fallback summary");
            fallback()
        }
        Err(e) => {
            warn!(error = %e, "text generation failed, using fallback summary");
            fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contributions::ContributorSummary;
    use crate::error::FinanceError;
    use crate::industry::Industry;
    use std::cell::RefCell;

    fn input() -> SummaryInput {
        let mut contributors = ContributorMap::new();
        for (name, amount, entity_type, industry) in [
            ("LOCKHEED MARTIN PAC", 10000.0, "PAC", Industry::Defense),
            ("JANE DOE", 2500.5, "IND", Industry::Other),
            ("AMERICAN BANKERS ASSOCIATION PAC", 5000.0, "PAC", Industry::Finance),
        ] {
            contributors.insert(
                name.to_string(),
                ContributorSummary {
                    amount,
                    entity_type: entity_type.to_string(),
                    industry,
                },
            );
        }
        SummaryInput::from_contributors(contributors)
    }

    struct Recorder {
        reply: Result<String>,
        prompts: RefCell<Vec<String>>,
    }

    impl TextGenerator for Recorder {
        fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(FinanceError::unavailable("llm", "connection refused")),
            }
        }
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(999.5), "$999.50");
        assert_eq!(format_money(1234567.891), "$1,234,567.89");
        assert_eq!(format_money(-1000.0), "-$1,000.00");
    }

    #[test]
    fn test_prompt_contents() {
        let prompt = build_prompt(&input());
        assert!(prompt.starts_with("As a Political Finance Analysis Agent"));
        assert!(prompt.contains("Total Contributions: $17,500.50"));
        assert!(prompt.contains("- LOCKHEED MARTIN PAC: $10,000.00 (defense)"));
        assert!(prompt.contains("Industry Breakdown:\n- defense: $10,000.00\n- finance: $5,000.00\n"));
        assert!(prompt.ends_with("focusing only on verifiable data."));
    }

    #[test]
    fn test_fallback_lists_top_contributors() {
        let text = fallback_summary(&input());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Analysis of campaign contributions:");
        assert!(text.contains("Total contributions: $17,500.50"));
        assert!(text.contains("- JANE DOE: $2,500.50 (other)"));
        assert!(text.contains("Industry breakdown:"));

        assert_eq!(fallback_summary(&SummaryInput::default()), NO_DATA_MESSAGE);
    }

    #[test]
    fn test_summarize_uses_generator_then_falls_back() {
        let ok = Recorder {
            reply: Ok("  Defense money dominates.  ".to_string()),
            prompts: RefCell::new(Vec::new()),
        };
        let summary = summarize(&input(), Some(&ok));
        assert_eq!(summary.source, SummarySource::Llm);
        assert_eq!(summary.text, "Defense money dominates.");
        assert_eq!(ok.prompts.borrow().len(), 1);

        let failing = Recorder {
            reply: Err(FinanceError::unavailable("llm", "down")),
            prompts: RefCell::new(Vec::new()),
        };
        let summary = summarize(&input(), Some(&failing));
        assert_eq!(summary.source, SummarySource::Fallback);
        assert!(summary.text.starts_with("Analysis of campaign contributions:"));

        let empty = Recorder {
            reply: Ok("   ".to_string()),
            prompts: RefCell::new(Vec::new()),
        };
        assert_eq!(summarize(&input(), Some(&empty)).source, SummarySource::Fallback);

        // No data: the generator is not consulted
        let unused = Recorder {
            reply: Ok("x".to_string()),
            prompts: RefCell::new(Vec::new()),
        };
        let summary = summarize(&SummaryInput::default(), Some(&unused));
        assert_eq!(summary.text, NO_DATA_MESSAGE);
        assert!(unused.prompts.borrow().is_empty());
    }
}
