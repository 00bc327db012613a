//! Genre rule table and filename classifier.
//!
//! This module holds the single source of domain knowledge for sorting: an
//! ordered table of rules, each mapping a set of filename patterns to a
//! destination category folder. Classification walks the table in ascending
//! priority order (declaration order breaks ties) and the first rule with any
//! matching pattern wins.
//!
//! # Examples
//!
//! ```
//! use tunesort::rules::{FALLBACK_CATEGORY, RuleTable};
//!
//! let table = RuleTable::default();
//! assert_eq!(table.category_for("Techno Night.wav"), "01_Electronic_Dance/Techno");
//! assert_eq!(table.category_for("Untitled.wav"), FALLBACK_CATEGORY);
//! ```

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};
use thiserror::Error;
use tracing::trace;

/// Category assigned when no rule matches.
pub const FALLBACK_CATEGORY: &str = "99_Uncategorized/Other";

/// Priority reported for the fallback category.
///
/// Only reported, never compared: the fallback is chosen after every rule has
/// been tried, so it loses to any rule regardless of that rule's number.
pub const FALLBACK_PRIORITY: u32 = 999;

/// Errors raised while building a rule table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleError {
    /// A rule was declared without a name.
    #[error("rule with category '{category}' has an empty name")]
    EmptyName { category: String },
    /// A rule was declared without any pattern.
    #[error("rule '{rule}' has no patterns")]
    NoPatterns { rule: String },
    /// A pattern failed to compile.
    #[error("rule '{rule}': invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        reason: String,
    },
    /// The destination category is not a plain relative folder path.
    #[error("rule '{rule}': category '{category}' must be a relative folder path")]
    InvalidCategory { rule: String, category: String },
}

/// Uncompiled description of a rule, as written in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    pub category: String,
    pub priority: u32,
    pub patterns: Vec<String>,
}

impl RuleSpec {
    fn new(name: &str, category: &str, priority: u32, patterns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            priority,
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// A compiled classification rule.
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    name: String,
    category: String,
    priority: u32,
    patterns: Vec<Regex>,
}

impl ClassificationRule {
    /// Compiles a rule from its specification.
    ///
    /// Patterns are compiled case-insensitively. Word boundaries are the
    /// pattern author's business: `\bpop\b` will not match `poppy`.
    pub fn compile(spec: &RuleSpec) -> Result<Self, RuleError> {
        if spec.name.trim().is_empty() {
            return Err(RuleError::EmptyName {
                category: spec.category.clone(),
            });
        }
        if spec.patterns.is_empty() {
            return Err(RuleError::NoPatterns {
                rule: spec.name.clone(),
            });
        }
        if !is_relative_folder(&spec.category) {
            return Err(RuleError::InvalidCategory {
                rule: spec.name.clone(),
                category: spec.category.clone(),
            });
        }

        let patterns = spec
            .patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| RuleError::InvalidPattern {
                        rule: spec.name.clone(),
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: spec.name.clone(),
            category: spec.category.clone(),
            priority: spec.priority,
            patterns,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Returns true if any pattern of this rule occurs in `filename`.
    pub fn matches(&self, filename: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(filename))
    }
}

/// Outcome of classifying one filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
    /// Destination category folder, relative to the output root.
    pub category: &'a str,
    /// Name of the winning rule, `None` for the fallback.
    pub rule: Option<&'a str>,
    pub priority: u32,
}

impl Classification<'_> {
    pub fn is_fallback(&self) -> bool {
        self.rule.is_none()
    }
}

/// Ordered, immutable set of classification rules.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<ClassificationRule>,
    fallback_category: String,
}

impl RuleTable {
    /// Builds a table from rule specifications.
    ///
    /// Rules are stably sorted by priority, so rules sharing a priority keep
    /// their declaration order.
    pub fn new(specs: &[RuleSpec]) -> Result<Self, RuleError> {
        let mut rules = specs
            .iter()
            .map(ClassificationRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        rules.sort_by_key(|rule| rule.priority);

        Ok(Self {
            rules,
            fallback_category: FALLBACK_CATEGORY.to_string(),
        })
    }

    /// Replaces the category returned when nothing matches.
    pub fn with_fallback_category(mut self, category: &str) -> Result<Self, RuleError> {
        if !is_relative_folder(category) {
            return Err(RuleError::InvalidCategory {
                rule: "fallback".to_string(),
                category: category.to_string(),
            });
        }
        self.fallback_category = category.to_string();
        Ok(self)
    }

    /// The built-in genre rules, in declaration order.
    pub fn builtin_specs() -> Vec<RuleSpec> {
        vec![
            // Stems and production files
            RuleSpec::new(
                "stems_vocals",
                "06_Stems_Production/Vocals",
                1,
                &[r"\(vocals?\)"],
            ),
            RuleSpec::new(
                "stems_instrumental",
                "06_Stems_Production/Instrumental",
                1,
                &[r"\binstrumental\b", r"\(instrumental\)"],
            ),
            RuleSpec::new(
                "stems_other",
                "06_Stems_Production/Stems",
                1,
                &[r"\(bass\)", r"\(drums?\)", r"\(other\)", r"\(stem"],
            ),
            // Remixes and edits
            RuleSpec::new(
                "remixes_artists",
                "05_Remixes_Edits/Artist_Remixes",
                2,
                &[
                    r"\banyma\b",
                    r"\bargy\b",
                    r"\bklingande\b",
                    r"\bjubel\b",
                    r"son of son",
                ],
            ),
            RuleSpec::new(
                "remixes_extended",
                "05_Remixes_Edits/Extended_Versions",
                2,
                &[r"\bremix\b", r"\bedit\b", r"\bext v\d+", r"\bextended\b"],
            ),
            // Electronic subgenres
            RuleSpec::new(
                "electronic_house",
                "01_Electronic_Dance/House",
                3,
                &[r"\bhouse\b", r"\bdeep house\b", r"\bprogressive house\b"],
            ),
            RuleSpec::new(
                "electronic_techno",
                "01_Electronic_Dance/Techno",
                3,
                &[r"\btechno\b", r"\bmelodic techno\b"],
            ),
            RuleSpec::new(
                "electronic_psytrance",
                "01_Electronic_Dance/Psytrance",
                3,
                &[r"\bpsytrance\b", r"\bpsychedelic\b", r"\bpsych\b"],
            ),
            RuleSpec::new(
                "electronic_idm",
                "01_Electronic_Dance/IDM",
                3,
                &[r"\bidm\b", r"\bintelligent dance\b"],
            ),
            RuleSpec::new(
                "electronic_electro",
                "01_Electronic_Dance/Electro",
                3,
                &[r"\belectro\b", r"\belectronic\b", r"\belectronica\b"],
            ),
            // Atmospheric electronic
            RuleSpec::new(
                "atmospheric_hypnotic",
                "02_Atmospheric_Electronic/Hypnotic",
                4,
                &[r"\bhypnotic\b", r"\btrance\b"],
            ),
            RuleSpec::new(
                "atmospheric_ethereal",
                "02_Atmospheric_Electronic/Ethereal",
                4,
                &[r"\bethereal\b", r"\bdream\b", r"\bdreamy\b"],
            ),
            RuleSpec::new(
                "atmospheric_melodic",
                "02_Atmospheric_Electronic/Melodic",
                4,
                &[r"\bmelodic\b", r"\beuphoric\b", r"\bmellow\b", r"\bsoothing\b"],
            ),
            RuleSpec::new(
                "atmospheric_ambient",
                "02_Atmospheric_Electronic/Ambient",
                4,
                &[r"\bambient\b", r"\batmospheric\b", r"\bcosmic\b", r"\bspace\b"],
            ),
            // Rock and pop
            RuleSpec::new(
                "rock",
                "03_Rock_Alternative/Rock",
                5,
                &[
                    r"\brock\b",
                    r"\balternative\b",
                    r"\bindie\b",
                    r"\bpunk\b",
                    r"\bmetal\b",
                ],
            ),
            RuleSpec::new(
                "pop",
                "04_Pop_Mainstream/Pop",
                5,
                &[r"\bpop\b", r"\bsynthpop\b"],
            ),
            // German tracks that nothing above claimed
            RuleSpec::new(
                "german",
                "07_German_Electronic/Deutsche_Tracks",
                6,
                &[
                    r"\bder\b",
                    r"\bdie\b",
                    r"\bdas\b",
                    r"\bzeit\b",
                    r"\btanz\b",
                    r"\bwald\b",
                    r"\bschwingung\b",
                    r"\bkreist\b",
                    r"\bhalsband\b",
                    r"\bflimmern\b",
                    r"\bsymbole\b",
                    r"\binkubation\b",
                    r"\bnur\b",
                ],
            ),
        ]
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    pub fn fallback_category(&self) -> &str {
        &self.fallback_category
    }

    /// Classifies a base filename.
    ///
    /// First match wins: the result is the first rule in evaluation order with
    /// any matching pattern, not the rule with the most or longest matches.
    /// Every rule is tried before falling back.
    pub fn classify(&self, filename: &str) -> Classification<'_> {
        for rule in &self.rules {
            if rule.matches(filename) {
                trace!(filename, rule = rule.name(), "rule matched");
                return Classification {
                    category: rule.category(),
                    rule: Some(rule.name()),
                    priority: rule.priority(),
                };
            }
        }

        Classification {
            category: &self.fallback_category,
            rule: None,
            priority: FALLBACK_PRIORITY,
        }
    }

    /// Shorthand for `classify(filename).category`.
    pub fn category_for(&self, filename: &str) -> &str {
        self.classify(filename).category
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new(&Self::builtin_specs()).expect("Invalid built-in rule table")
    }
}

/// True for non-empty relative paths made only of normal components.
fn is_relative_folder(category: &str) -> bool {
    let path = Path::new(category);
    !category.trim().is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, category: &str, priority: u32, patterns: &[&str]) -> RuleSpec {
        RuleSpec::new(name, category, priority, patterns)
    }

    #[test]
    fn test_builtin_table_compiles() {
        let table = RuleTable::default();
        assert_eq!(table.rules().len(), RuleTable::builtin_specs().len());
        assert_eq!(table.fallback_category(), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_builtin_rules_are_in_priority_order() {
        let table = RuleTable::default();
        let priorities: Vec<u32> = table.rules().iter().map(|r| r.priority()).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);
        assert!(priorities.iter().all(|p| *p < FALLBACK_PRIORITY));
    }

    #[test]
    fn test_classify_keywords() {
        let table = RuleTable::default();
        assert_eq!(
            table.category_for("Techno Night.wav"),
            "01_Electronic_Dance/Techno"
        );
        assert_eq!(
            table.category_for("+++Pop Anthem.wav"),
            "04_Pop_Mainstream/Pop"
        );
        assert_eq!(
            table.category_for("Song (Vocals).wav"),
            "06_Stems_Production/Vocals"
        );
        assert_eq!(
            table.category_for("Der Wald.wav"),
            "07_German_Electronic/Deutsche_Tracks"
        );
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let table = RuleTable::default();
        assert_eq!(
            table.category_for("DEEP HOUSE SESSION.WAV"),
            "01_Electronic_Dance/House"
        );
        assert_eq!(
            table.category_for("deep house session.wav"),
            "01_Electronic_Dance/House"
        );
    }

    #[test]
    fn test_lower_priority_number_wins() {
        let table = RuleTable::default();
        // "remix" (priority 2) beats "techno" (priority 3)
        assert_eq!(
            table.category_for("Techno Techno Techno Remix.wav"),
            "05_Remixes_Edits/Extended_Versions"
        );
        // stems beat everything
        assert_eq!(
            table.category_for("Ambient Pop Remix (Drums).wav"),
            "06_Stems_Production/Stems"
        );
    }

    #[test]
    fn test_declaration_order_breaks_ties() {
        let table = RuleTable::default();
        // ethereal is declared before melodic, both priority 4
        let result = table.classify("Melodic Dream.wav");
        assert_eq!(result.category, "02_Atmospheric_Electronic/Ethereal");
        assert_eq!(result.rule, Some("atmospheric_ethereal"));
        assert_eq!(result.priority, 4);
    }

    #[test]
    fn test_word_boundaries_respected() {
        let table = RuleTable::default();
        assert_eq!(table.category_for("Poppy Fields.wav"), FALLBACK_CATEGORY);
        assert_eq!(table.category_for("Rocket.wav"), FALLBACK_CATEGORY);
        assert_eq!(table.category_for("Space Rocket.wav"), "02_Atmospheric_Electronic/Ambient");
    }

    #[test]
    fn test_empty_and_unmatched_filenames_fall_back() {
        let table = RuleTable::default();
        let empty = table.classify("");
        assert!(empty.is_fallback());
        assert_eq!(empty.category, FALLBACK_CATEGORY);
        assert_eq!(empty.priority, FALLBACK_PRIORITY);
        assert_eq!(table.category_for("Untitled 01.wav"), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_fallback_loses_to_very_high_priority_rule() {
        let table = RuleTable::new(&[spec("late", "Late", FALLBACK_PRIORITY + 1000, &["x"])])
            .unwrap();
        let result = table.classify("x.wav");
        assert_eq!(result.category, "Late");
        assert!(!result.is_fallback());
    }

    #[test]
    fn test_sort_is_stable_within_priority() {
        let table = RuleTable::new(&[
            spec("second_tier", "B", 2, &["beat"]),
            spec("first", "A1", 1, &["beat"]),
            spec("also_first", "A2", 1, &["beat"]),
        ])
        .unwrap();
        let names: Vec<&str> = table.rules().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["first", "also_first", "second_tier"]);
        assert_eq!(table.category_for("beat.wav"), "A1");
    }

    #[test]
    fn test_rule_without_patterns_rejected() {
        let result = RuleTable::new(&[spec("empty", "Empty", 1, &[])]);
        assert_eq!(
            result.unwrap_err(),
            RuleError::NoPatterns {
                rule: "empty".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let result = RuleTable::new(&[spec("broken", "Broken", 1, &["(unclosed"])]);
        assert!(matches!(
            result.unwrap_err(),
            RuleError::InvalidPattern { ref rule, .. } if rule == "broken"
        ));
    }

    #[test]
    fn test_category_must_be_relative() {
        assert!(RuleTable::new(&[spec("abs", "/etc", 1, &["a"])]).is_err());
        assert!(RuleTable::new(&[spec("up", "../outside", 1, &["a"])]).is_err());
        assert!(RuleTable::new(&[spec("blank", "  ", 1, &["a"])]).is_err());
        assert!(RuleTable::new(&[spec("nested", "A/B/C", 1, &["a"])]).is_ok());
    }

    #[test]
    fn test_custom_fallback_category() {
        let table = RuleTable::default()
            .with_fallback_category("00_Unsorted")
            .unwrap();
        assert_eq!(table.category_for("nothing here.wav"), "00_Unsorted");
        assert!(RuleTable::default().with_fallback_category("../x").is_err());
    }
}
