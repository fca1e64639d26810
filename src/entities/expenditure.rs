// 📣 Independent Expenditures - outside spending for or against a candidate

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupportOppose {
    Support,
    Oppose,
}

impl SupportOppose {
    /// "S" / "O" indicator as published
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "S" => Some(SupportOppose::Support),
            "O" => Some(SupportOppose::Oppose),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            SupportOppose::Support => "S",
            SupportOppose::Oppose => "O",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndependentExpenditure {
    pub candidate_id: String,
    pub candidate_name: String,
    /// Spending committee
    pub spender_id: String,
    pub spender_name: String,
    pub support_oppose: SupportOppose,
    pub amount: f64,
    pub expenditure_date: String,
    pub year: i32,
}
