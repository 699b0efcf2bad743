//! Keyword classifier: maps a free-text description to a category label.
//!
//! Pure and infallible once built. Anything it cannot place, including a
//! missing or empty description, lands in the table's fallback category.

use regex::Regex;

use crate::rules::{MatchMode, RuleTable, RuleTableError};

#[derive(Debug, Clone)]
enum Matcher {
    Substring(String),
    WholeWord(Regex),
}

impl Matcher {
    fn is_match(&self, desc: &str) -> bool {
        match self {
            Matcher::Substring(keyword) => desc.contains(keyword.as_str()),
            Matcher::WholeWord(re) => re.is_match(desc),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    label: String,
    matchers: Vec<Matcher>,
}

/// A rule table compiled for matching.
///
/// Keywords are lower-cased here so authored capitals never stop a match.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<CompiledRule>,
    fallback: String,
    match_mode: MatchMode,
}

impl Default for Classifier {
    /// The built-in table in substring mode; cannot fail to compile
    fn default() -> Self {
        let table = RuleTable::builtin();
        let rules = table
            .categories
            .iter()
            .map(|rule| CompiledRule {
                label: rule.label.clone(),
                matchers: rule
                    .keywords
                    .iter()
                    .map(|k| Matcher::Substring(k.to_lowercase()))
                    .collect(),
            })
            .collect();

        Self {
            rules,
            fallback: table.fallback,
            match_mode: MatchMode::Substring,
        }
    }
}

impl Classifier {
    /// Validate and compile a rule table
    pub fn new(table: &RuleTable) -> Result<Self, RuleTableError> {
        table.validate()?;

        let mut rules = Vec::with_capacity(table.categories.len());
        for rule in &table.categories {
            let mut matchers = Vec::with_capacity(rule.keywords.len());
            for keyword in &rule.keywords {
                let keyword = keyword.to_lowercase();
                let matcher = match table.match_mode {
                    MatchMode::Substring => Matcher::Substring(keyword),
                    MatchMode::WholeWord => {
                        let pattern = format!(r"\b{}\b", regex::escape(&keyword));
                        let re = Regex::new(&pattern).map_err(|e| RuleTableError::InvalidKeyword {
                            label: rule.label.clone(),
                            keyword: keyword.clone(),
                            reason: e.to_string(),
                        })?;
                        Matcher::WholeWord(re)
                    }
                };
                matchers.push(matcher);
            }
            rules.push(CompiledRule {
                label: rule.label.clone(),
                matchers,
            });
        }

        Ok(Self {
            rules,
            fallback: table.fallback.clone(),
            match_mode: table.match_mode,
        })
    }

    /// Classify a description.
    ///
    /// Accepts `&str` or `Option<&str>`. First rule in table order with any
    /// matching keyword wins.
    pub fn classify<'a>(&self, description: impl Into<Option<&'a str>>) -> &str {
        let desc = match description.into() {
            Some(d) if !d.is_empty() => d.to_lowercase(),
            _ => return &self.fallback,
        };

        self.rules
            .iter()
            .find(|rule| rule.matchers.iter().any(|m| m.is_match(&desc)))
            .map(|rule| rule.label.as_str())
            .unwrap_or(self.fallback.as_str())
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    /// Number of non-fallback categories
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Classify with the built-in table.
///
/// Builds the table on every call; hold a [`Classifier`] for repeated use.
pub fn classify(description: &str) -> String {
    Classifier::default().classify(description).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::CategoryRule;

    #[test]
    fn test_single_category_match() {
        let c = Classifier::default();
        assert_eq!(c.classify("Coffee"), "Food");
        assert_eq!(c.classify("Bus fare"), "Transport");
        assert_eq!(c.classify("flight to paris"), "Travel");
        assert_eq!(c.classify("Dentist appointment"), "Health");
        assert_eq!(c.classify("gas bill"), "Bills");
    }

    #[test]
    fn test_missing_or_empty_is_fallback() {
        let c = Classifier::default();
        assert_eq!(c.classify(""), "Miscellaneous");
        assert_eq!(c.classify(None), "Miscellaneous");
        assert_eq!(c.classify(Some("")), "Miscellaneous");
    }

    #[test]
    fn test_no_match_is_fallback() {
        let c = Classifier::default();
        assert_eq!(c.classify("zzz qqq"), "Miscellaneous");
        assert_eq!(c.classify("   "), "Miscellaneous");
    }

    #[test]
    fn test_case_insensitive() {
        let c = Classifier::default();
        assert_eq!(c.classify("UBER TRIP"), "Transport");
        assert_eq!(c.classify("Monthly RENT"), "Bills");
    }

    #[test]
    fn test_earlier_category_wins() {
        let c = Classifier::default();
        // Food precedes Transport
        assert_eq!(c.classify("coffee on the train"), "Food");
        // Bills precedes Technology for "phone"
        assert_eq!(c.classify("phone"), "Bills");
        // Health precedes Medical
        assert_eq!(c.classify("doctor visit"), "Health");
        // Food precedes Dining
        assert_eq!(c.classify("dessert at a restaurant"), "Food");
    }

    #[test]
    fn test_substring_matches_inside_words() {
        let c = Classifier::default();
        assert_eq!(c.classify("scar treatment cream"), "Transport");
    }

    #[test]
    fn test_whole_word_mode() {
        let table = RuleTable::builtin().with_match_mode(MatchMode::WholeWord);
        let c = Classifier::new(&table).unwrap();
        assert_eq!(c.match_mode(), MatchMode::WholeWord);
        assert_eq!(c.classify("scar treatment cream"), "Health");
        assert_eq!(c.classify("car wash"), "Transport");
        assert_eq!(c.classify("fast food"), "Food");
        assert_eq!(c.classify("scarf"), "Miscellaneous");
    }

    #[test]
    fn test_keywords_are_lowercased() {
        let c = Classifier::default();
        // "Grocery shopping" is authored with a capital G; Food's "grocery" would
        // take it first, so check a Groceries-only keyword list instead.
        let table = RuleTable::new(vec![CategoryRule::new("Groceries", &["Grocery Shopping"])]);
        let custom = Classifier::new(&table).unwrap();
        assert_eq!(custom.classify("weekly grocery shopping"), "Groceries");
        assert_eq!(c.classify("weekly grocery shopping"), "Food");
    }

    #[test]
    fn test_custom_table_and_fallback() {
        let table = RuleTable::new(vec![
            CategoryRule::new("Coffee", &["latte"]),
            CategoryRule::new("Drinks", &["latte", "soda"]),
        ])
        .with_fallback("Other");
        let c = Classifier::new(&table).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.classify("oat latte"), "Coffee");
        assert_eq!(c.classify("soda"), "Drinks");
        assert_eq!(c.classify("bread"), "Other");
        assert_eq!(c.fallback(), "Other");
    }

    #[test]
    fn test_empty_table_always_falls_back() {
        let c = Classifier::new(&RuleTable::new(vec![])).unwrap();
        assert!(c.is_empty());
        assert_eq!(c.classify("coffee"), "Miscellaneous");
    }

    #[test]
    fn test_invalid_table_rejected() {
        let table = RuleTable::new(vec![CategoryRule::new("Food", &[])]);
        assert!(Classifier::new(&table).is_err());
    }

    #[test]
    fn test_free_function_uses_builtin_table() {
        assert_eq!(classify("hotel booking"), "Travel");
        assert_eq!(classify(""), "Miscellaneous");
    }

    fn keyword_hits(mode: MatchMode, keyword: &str, text: &str) -> bool {
        let (keyword, text) = (keyword.to_lowercase(), text.to_lowercase());
        match mode {
            MatchMode::Substring => text.contains(&keyword),
            MatchMode::WholeWord => {
                let is_word = |c: char| c.is_alphanumeric() || c == '_';
                (0..text.len())
                    .filter(|&at| text.is_char_boundary(at) && text[at..].starts_with(&keyword))
                    .any(|at| {
                        let before = text[..at].chars().next_back();
                        let after = text[at + keyword.len()..].chars().next();
                        !before.is_some_and(is_word) && !after.is_some_and(is_word)
                    })
            }
        }
    }

    /// Assert `text` lands on rule `at_most` or an earlier rule, and that any
    /// earlier rule it lands on really has a keyword in `text`.
    fn assert_earliest_hit(table: &RuleTable, c: &Classifier, text: &str, at_most: usize) {
        let got = c.classify(text);
        let j = table
            .categories
            .iter()
            .position(|r| r.label == got)
            .unwrap_or_else(|| panic!("{text:?} fell back to {got:?}"));
        assert!(j <= at_most, "{text:?} -> {got:?}, past rule {at_most}");

        let first_hit = table
            .categories
            .iter()
            .position(|r| r.keywords.iter().any(|k| keyword_hits(table.match_mode, k, text)));
        assert_eq!(first_hit, Some(j), "{text:?} -> {got:?}");
    }

    #[test]
    fn test_every_builtin_keyword_hits_its_rule_or_earlier() {
        for mode in [MatchMode::Substring, MatchMode::WholeWord] {
            let table = RuleTable::builtin().with_match_mode(mode);
            let c = Classifier::new(&table).unwrap();

            for (i, rule) in table.categories.iter().enumerate() {
                for keyword in &rule.keywords {
                    assert_earliest_hit(&table, &c, keyword, i);
                    assert_earliest_hit(&table, &c, &keyword.to_uppercase(), i);
                }
            }
        }
    }

    #[test]
    fn test_every_builtin_pair_resolves_to_earlier_rule() {
        for mode in [MatchMode::Substring, MatchMode::WholeWord] {
            let table = RuleTable::builtin().with_match_mode(mode);
            let c = Classifier::new(&table).unwrap();
            let rules = &table.categories;

            for (i, earlier) in rules.iter().enumerate() {
                for later in &rules[i + 1..] {
                    for a in &earlier.keywords {
                        let b = &later.keywords[0];
                        assert_earliest_hit(&table, &c, &format!("{a} {b}"), i);
                        assert_earliest_hit(&table, &c, &format!("{b} and {a}"), i);
                    }
                }
            }
        }
    }
}
