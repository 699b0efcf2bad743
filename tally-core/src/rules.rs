//! The category rule table: an ordered list of (label, keywords) pairs plus a
//! fallback label.
//!
//! Order is priority. The first rule with a keyword found in a description
//! wins, so reordering the table changes classification results.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const FALLBACK_CATEGORY: &str = "Miscellaneous";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RuleTableError {
    #[error("category label cannot be empty")]
    EmptyLabel,

    #[error("fallback label cannot be empty")]
    EmptyFallback,

    #[error("category {0:?} appears more than once")]
    DuplicateLabel(String),

    #[error("category {0:?} reuses the fallback label")]
    FallbackReused(String),

    #[error("category {0:?} has no keywords")]
    NoKeywords(String),

    #[error("category {0:?} has a blank keyword")]
    BlankKeyword(String),

    #[error("keyword {keyword:?} in {label:?} could not be compiled: {reason}")]
    InvalidKeyword {
        label: String,
        keyword: String,
        reason: String,
    },

    #[error("could not parse rule table: {0}")]
    Parse(String),

    #[error("could not serialize rule table: {0}")]
    Serialize(String),
}

/// How a keyword is compared against a lower-cased description
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Plain containment. "car" matches inside "scar".
    #[default]
    Substring,
    /// Keyword must start and end on a word boundary
    WholeWord,
}

/// One row of the rule table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub label: String,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(label: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            label: label.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    #[serde(default = "default_fallback")]
    pub fallback: String,
    #[serde(default)]
    pub match_mode: MatchMode,
    #[serde(rename = "category", default)]
    pub categories: Vec<CategoryRule>,
}

fn default_fallback() -> String {
    FALLBACK_CATEGORY.to_string()
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleTable {
    pub fn new(categories: Vec<CategoryRule>) -> Self {
        Self {
            fallback: default_fallback(),
            match_mode: MatchMode::default(),
            categories,
        }
    }

    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// The stock spending categories.
    ///
    /// Transport deliberately has no "gas" keyword: utility gas belongs to
    /// Bills, and fuel is covered by "fuel".
    pub fn builtin() -> Self {
        Self::new(vec![
            CategoryRule::new(
                "Food",
                &[
                    "food", "coffee", "tea", "grocery", "dining", "restaurant", "meal", "cafe",
                    "snack", "breakfast", "lunch", "dinner", "takeout", "fast food",
                ],
            ),
            CategoryRule::new(
                "Transport",
                &[
                    "transport", "fuel", "taxi", "uber", "bus", "train", "ride", "parking", "car",
                    "ride-share", "subway",
                ],
            ),
            CategoryRule::new(
                "Entertainment",
                &[
                    "entertainment", "movie", "film", "show", "concert", "event", "performance",
                    "theater", "music", "game", "amusement", "tickets",
                ],
            ),
            CategoryRule::new(
                "Health",
                &[
                    "health", "medicine", "medications", "doctor", "clinic", "hospital",
                    "prescription", "treatment", "pharmacy", "wellness", "checkup", "therapy",
                    "dentist",
                ],
            ),
            CategoryRule::new(
                "Shopping",
                &[
                    "shopping", "clothes", "apparel", "fashion", "retail", "store", "boutique",
                    "purchase", "buy", "accessories", "footwear", "jewelry",
                ],
            ),
            CategoryRule::new(
                "Bills",
                &[
                    "bill", "electricity", "loan", "water", "gas", "utility", "internet", "phone",
                    "mobile", "cable", "rent", "mortgage", "insurance", "subscription",
                ],
            ),
            CategoryRule::new(
                "Education",
                &[
                    "education", "school", "college", "university", "tuition", "course", "class",
                    "training", "workshop", "seminar", "exam", "books", "supplies",
                ],
            ),
            CategoryRule::new(
                "Travel",
                &[
                    "travel", "flight", "hotel", "accommodation", "airfare", "vacation", "holiday",
                    "tour", "cruise", "reservation", "booking", "passport", "visa",
                ],
            ),
            CategoryRule::new(
                "Home",
                &[
                    "home", "furniture", "appliance", "decor", "renovation", "repair",
                    "maintenance", "cleaning", "gardening", "tool", "equipment",
                ],
            ),
            CategoryRule::new(
                "Technology",
                &[
                    "tech", "technology", "software", "hardware", "computer", "laptop", "phone",
                    "tablet", "gadget", "electronics", "app", "subscription", "license",
                ],
            ),
            CategoryRule::new(
                "Charity",
                &[
                    "charity", "donation", "contribution", "fundraising", "support", "aid",
                    "relief", "nonprofit", "volunteer", "cause", "foundation", "campaign",
                ],
            ),
            CategoryRule::new(
                "PersonalCare",
                &[
                    "personal care", "haircut", "spa", "salon", "cosmetics", "skincare", "makeup",
                    "manicure", "pedicure", "fragrance", "hygiene", "wellness",
                ],
            ),
            CategoryRule::new(
                "Pets",
                &[
                    "pets", "pet food", "veterinary", "vet", "grooming", "boarding", "adoption",
                    "accessories", "toys", "training", "supplies", "pet care",
                ],
            ),
            CategoryRule::new(
                "Investments",
                &[
                    "investment", "stocks", "bonds", "mutual funds", "real estate", "property",
                    "crypto", "cryptocurrency", "savings", "retirement", "portfolio",
                ],
            ),
            CategoryRule::new(
                "Utilities",
                &[
                    "utility", "water", "electricity", "gas", "waste", "sewer", "heating",
                    "cooling", "solar", "internet", "phone", "mobile", "cable",
                ],
            ),
            CategoryRule::new(
                "Groceries",
                &[
                    "Grocery shopping", "supermarket", "market", "vegetables", "fruits", "meat",
                    "fish", "poultry", "dairy", "bakery", "snacks", "beverages",
                    "household items",
                ],
            ),
            CategoryRule::new(
                "Dining",
                &[
                    "dining", "restaurant", "takeout", "delivery", "food", "beverage", "cafe",
                    "brunch", "lunch", "dinner", "snack", "dessert",
                ],
            ),
            CategoryRule::new(
                "Medical",
                &[
                    "medical", "doctor", "hospital", "clinic", "prescription", "medicine",
                    "treatment", "surgery", "therapy", "checkup", "pharmacy",
                ],
            ),
            CategoryRule::new(
                "Fitness",
                &[
                    "fitness", "gym", "workout", "yoga", "pilates", "exercise", "trainer",
                    "membership", "class", "equipment", "sports", "nutrition",
                ],
            ),
            CategoryRule::new(
                "Childcare",
                &[
                    "childcare", "babysitting", "daycare", "preschool", "school", "tuition",
                    "toys", "clothing", "books", "activities", "education", "child",
                ],
            ),
        ])
    }

    /// Check the table invariants without compiling anything
    pub fn validate(&self) -> Result<(), RuleTableError> {
        if self.fallback.trim().is_empty() {
            return Err(RuleTableError::EmptyFallback);
        }

        let mut seen = HashSet::new();
        for rule in &self.categories {
            if rule.label.trim().is_empty() {
                return Err(RuleTableError::EmptyLabel);
            }
            if rule.label == self.fallback {
                return Err(RuleTableError::FallbackReused(rule.label.clone()));
            }
            if !seen.insert(rule.label.as_str()) {
                return Err(RuleTableError::DuplicateLabel(rule.label.clone()));
            }
            if rule.keywords.is_empty() {
                return Err(RuleTableError::NoKeywords(rule.label.clone()));
            }
            if rule.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(RuleTableError::BlankKeyword(rule.label.clone()));
            }
        }

        Ok(())
    }

    pub fn from_toml_str(s: &str) -> Result<Self, RuleTableError> {
        let table: RuleTable =
            toml::from_str(s).map_err(|e| RuleTableError::Parse(e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    pub fn to_toml_string(&self) -> Result<String, RuleTableError> {
        toml::to_string_pretty(self).map_err(|e| RuleTableError::Serialize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_is_valid() {
        let table = RuleTable::builtin();
        assert_eq!(table.validate(), Ok(()));
        assert_eq!(table.categories.len(), 20);
        assert_eq!(table.fallback, FALLBACK_CATEGORY);
        assert_eq!(table.match_mode, MatchMode::Substring);
    }

    #[test]
    fn test_builtin_order() {
        let table = RuleTable::builtin();
        let labels: Vec<_> = table.categories.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels[0], "Food");
        assert_eq!(labels[1], "Transport");
        assert_eq!(labels[5], "Bills");
        assert_eq!(labels[19], "Childcare");
        assert!(!labels.contains(&"Miscellaneous"));
    }

    #[test]
    fn test_transport_has_no_gas_keyword() {
        let table = RuleTable::builtin();
        let transport = table.categories.iter().find(|r| r.label == "Transport").unwrap();
        assert!(!transport.keywords.iter().any(|k| k == "gas"));
    }

    #[test]
    fn test_rejects_duplicate_label() {
        let table = RuleTable::new(vec![
            CategoryRule::new("Food", &["coffee"]),
            CategoryRule::new("Food", &["tea"]),
        ]);
        assert_eq!(
            table.validate(),
            Err(RuleTableError::DuplicateLabel("Food".into()))
        );
    }

    #[test]
    fn test_rejects_empty_keywords() {
        let table = RuleTable::new(vec![CategoryRule::new("Food", &[])]);
        assert_eq!(table.validate(), Err(RuleTableError::NoKeywords("Food".into())));

        let table = RuleTable::new(vec![CategoryRule::new("Food", &["coffee", "  "])]);
        assert_eq!(table.validate(), Err(RuleTableError::BlankKeyword("Food".into())));
    }

    #[test]
    fn test_rejects_fallback_collision() {
        let table = RuleTable::new(vec![CategoryRule::new("Miscellaneous", &["misc"])]);
        assert_eq!(
            table.validate(),
            Err(RuleTableError::FallbackReused("Miscellaneous".into()))
        );

        let table = RuleTable::new(vec![]).with_fallback(" ");
        assert_eq!(table.validate(), Err(RuleTableError::EmptyFallback));
    }

    #[test]
    fn test_empty_table_is_valid() {
        assert_eq!(RuleTable::new(vec![]).validate(), Ok(()));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
fallback = "Other"
match_mode = "whole-word"

[[category]]
label = "Coffee"
keywords = ["latte", "espresso"]

[[category]]
label = "Books"
keywords = ["bookshop"]
"#;
        let table = RuleTable::from_toml_str(toml).unwrap();
        assert_eq!(table.fallback, "Other");
        assert_eq!(table.match_mode, MatchMode::WholeWord);
        assert_eq!(table.categories.len(), 2);
        assert_eq!(table.categories[0].label, "Coffee");
        assert_eq!(table.categories[1].keywords, vec!["bookshop".to_string()]);
    }

    #[test]
    fn test_parse_toml_defaults() {
        let toml = r#"
[[category]]
label = "Coffee"
keywords = ["latte"]
"#;
        let table = RuleTable::from_toml_str(toml).unwrap();
        assert_eq!(table.fallback, FALLBACK_CATEGORY);
        assert_eq!(table.match_mode, MatchMode::Substring);
    }

    #[test]
    fn test_parse_toml_rejects_invalid_table() {
        let toml = r#"
[[category]]
label = "Coffee"
keywords = []
"#;
        assert_eq!(
            RuleTable::from_toml_str(toml),
            Err(RuleTableError::NoKeywords("Coffee".into()))
        );
        assert!(matches!(
            RuleTable::from_toml_str("category = 3"),
            Err(RuleTableError::Parse(_))
        ));
    }

    #[test]
    fn test_builtin_survives_toml_export() {
        let table = RuleTable::builtin();
        let text = table.to_toml_string().unwrap();
        assert_eq!(RuleTable::from_toml_str(&text).unwrap(), table);
    }
}
