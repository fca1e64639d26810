// 🔤 Name Normalizer - "First Last" ↔ "Last, First"
// Pure function of the input; produces every form worth looking up

use serde::Serialize;

/// Tokens shorter than this are too noisy for substring matching
pub const MIN_TOKEN_LEN: usize = 3;

/// Comparable forms of one free-text name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameVariants {
    /// Input with surrounding whitespace removed
    pub trimmed: String,

    /// "Last, First" (only when the input had a space and no comma)
    pub reversed: Option<String>,

    /// "First Last" (only when the input had a comma)
    pub normalized: Option<String>,

    /// Standalone surname token
    pub surname: String,

    /// Word tokens of at least `MIN_TOKEN_LEN` characters, in input order
    pub tokens: Vec<String>,
}

impl NameVariants {
    /// Exact-match candidates in lookup order, without duplicates
    pub fn exact_forms(&self) -> Vec<&str> {
        let mut forms: Vec<&str> = vec![self.trimmed.as_str()];
        for extra in [self.reversed.as_deref(), self.normalized.as_deref()].into_iter().flatten() {
            if !forms.iter().any(|f| f.eq_ignore_ascii_case(extra)) {
                forms.push(extra);
            }
        }
        forms
    }

    pub fn is_empty(&self) -> bool {
        self.trimmed.is_empty()
    }
}

pub struct NameNormalizer;

impl NameNormalizer {
    pub fn normalize(input: &str) -> NameVariants {
        let trimmed = input.trim().to_string();
        let has_comma = trimmed.contains(',');
        let words: Vec<&str> = trimmed.split_whitespace().collect();
        let has_whitespace = words.len() > 1;

        let reversed = if has_whitespace && !has_comma {
            let (surname, given) = words.split_last().map(|(s, g)| (*s, g.join(" "))).unwrap_or_default();
            Some(format!("{}, {}", surname, given))
        } else {
            None
        };

        let normalized = if has_comma {
            let (surname_part, given_part) = trimmed.split_once(',').unwrap_or((trimmed.as_str(), ""));
            Some(format!("{} {}", given_part.trim(), surname_part.trim()).trim().to_string())
        } else {
            None
        };

        let surname = if has_comma {
            trimmed.split(',').next().unwrap_or_default().trim().to_string()
        } else if has_whitespace {
            words.last().copied().unwrap_or_default().to_string()
        } else {
            trimmed.clone()
        };

        let tokens = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
            .map(str::to_string)
            .collect();

        NameVariants {
            trimmed,
            reversed,
            normalized,
            surname,
            tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_last_produces_reversed() {
        let v = NameNormalizer::normalize("  Thomas Cotton ");
        assert_eq!(v.trimmed, "Thomas Cotton");
        assert_eq!(v.reversed.as_deref(), Some("Cotton, Thomas"));
        assert_eq!(v.normalized, None);
        assert_eq!(v.surname, "Cotton");
        assert_eq!(v.tokens, vec!["Thomas", "Cotton"]);
        assert!(v.exact_forms().contains(&"Cotton, Thomas"));
    }

    #[test]
    fn test_last_first_produces_normalized() {
        let v = NameNormalizer::normalize("COTTON, THOMAS");
        assert_eq!(v.normalized.as_deref(), Some("THOMAS COTTON"));
        assert_eq!(v.reversed, None);
        assert_eq!(v.surname, "COTTON");
        assert!(v
            .exact_forms()
            .iter()
            .any(|f| f.eq_ignore_ascii_case("Thomas Cotton")));
    }

    #[test]
    fn test_middle_names_and_suffixes() {
        let v = NameNormalizer::normalize("Mary Gay Scanlon");
        assert_eq!(v.reversed.as_deref(), Some("Scanlon, Mary Gay"));
        assert_eq!(v.surname, "Scanlon");

        let v = NameNormalizer::normalize("SCANLON, MARY GAY, JR");
        assert_eq!(v.normalized.as_deref(), Some("MARY GAY, JR SCANLON"));
        assert_eq!(v.surname, "SCANLON");
    }

    #[test]
    fn test_single_word_and_short_tokens() {
        let v = NameNormalizer::normalize("Cotton");
        assert_eq!(v.reversed, None);
        assert_eq!(v.normalized, None);
        assert_eq!(v.surname, "Cotton");
        assert_eq!(v.exact_forms(), vec!["Cotton"]);

        let v = NameNormalizer::normalize("Al Jo Lee,Kim");
        assert_eq!(v.tokens, vec!["Lee", "Kim"]);
    }

    #[test]
    fn test_empty_input() {
        let v = NameNormalizer::normalize("   ");
        assert!(v.is_empty());
        assert!(v.tokens.is_empty());
        assert_eq!(v.surname, "");
    }
}
