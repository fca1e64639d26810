// 🗂️ PAC Classifier - one category per committee, corporate influence first

use crate::entities::Committee;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacCategory {
    TraditionalPac,
    SuperPac,
    LeadershipPac,
    CorporatePac,
    OtherCommittee,
}

impl PacCategory {
    /// Report section order
    pub const ALL: [PacCategory; 5] = [
        PacCategory::TraditionalPac,
        PacCategory::SuperPac,
        PacCategory::LeadershipPac,
        PacCategory::CorporatePac,
        PacCategory::OtherCommittee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PacCategory::TraditionalPac => "traditional_pac",
            PacCategory::SuperPac => "super_pac",
            PacCategory::LeadershipPac => "leadership_pac",
            PacCategory::CorporatePac => "corporate_pac",
            PacCategory::OtherCommittee => "other_committee",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PacCategory::TraditionalPac => "Traditional PACs",
            PacCategory::SuperPac => "Super PACs",
            PacCategory::LeadershipPac => "Leadership PACs",
            PacCategory::CorporatePac => "Corporate PACs",
            PacCategory::OtherCommittee => "Other Committees",
        }
    }
}

impl fmt::Display for PacCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

pub struct PacClassifier;

impl PacClassifier {
    /// First match wins: corporate, then type O, then V/W, then N/Q
    pub fn classify(committee: &Committee) -> PacCategory {
        if committee.is_corporate_pac() {
            return PacCategory::CorporatePac;
        }

        match committee.type_code_trimmed() {
            "O" => PacCategory::SuperPac,
            "V" | "W" => PacCategory::LeadershipPac,
            "N" | "Q" => PacCategory::TraditionalPac,
            _ => PacCategory::OtherCommittee,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_super_pac_with_connected_org_is_corporate() {
        let committee = Committee::new("C00700000", "DEFENSE FUTURE PAC", "O", 2024)
            .with_connected_organization("LOCKHEED MARTIN CORPORATION");
        assert_eq!(PacClassifier::classify(&committee), PacCategory::CorporatePac);

        let blank = Committee::new("C00700001", "PLAIN SUPER PAC", "O", 2024).with_connected_organization("   ");
        assert_eq!(PacClassifier::classify(&blank), PacCategory::SuperPac);
    }

    #[test]
    fn test_type_code_categories() {
        let cases = [
            ("O", PacCategory::SuperPac),
            ("V", PacCategory::LeadershipPac),
            ("W", PacCategory::LeadershipPac),
            ("N", PacCategory::TraditionalPac),
            ("Q", PacCategory::TraditionalPac),
            ("H", PacCategory::OtherCommittee),
            ("X", PacCategory::OtherCommittee),
        ];
        for (code, expected) in cases {
            let committee = Committee::new("C1", "X", code, 2024);
            assert_eq!(PacClassifier::classify(&committee), expected, "type {}", code);
        }
    }

    #[test]
    fn test_corporate_org_type_needs_pac_type() {
        let pac = Committee::new("C1", "ACME PAC", "Q", 2024).with_organization_type("C");
        assert_eq!(PacClassifier::classify(&pac), PacCategory::CorporatePac);

        // A campaign committee is never a corporate PAC
        let campaign = Committee::new("C2", "ACME FOR SENATE", "S", 2024).with_connected_organization("ACME");
        assert_eq!(PacClassifier::classify(&campaign), PacCategory::OtherCommittee);
    }

    #[test]
    fn test_padded_type_code_agrees_with_is_pac() {
        let padded = Committee::new("C1", "PADDED PAC", " O ", 2024);
        assert!(padded.is_pac());
        assert_eq!(PacClassifier::classify(&padded), PacCategory::SuperPac);

        let corporate = Committee::new("C2", "PADDED CORP PAC", "Q ", 2024).with_connected_organization("ACME");
        assert!(corporate.is_corporate_pac());
        assert_eq!(PacClassifier::classify(&corporate), PacCategory::CorporatePac);
    }

    #[test]
    fn test_category_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&PacCategory::CorporatePac).unwrap(), "\"corporate_pac\"");
        assert_eq!(PacCategory::OtherCommittee.to_string(), "other_committee");
    }
}
