//! Concept classification of diagnostics
//!
//! Each diagnostic is mapped onto a small vocabulary of error categories so
//! that two tools' differently worded messages can be compared. The mapping
//! is a registry of `(tag, matcher)` rules; adding a category means adding a
//! rule, never touching [`ConceptRegistry::classify`].

use crate::config::ConceptRuleConfig;
use crate::error::ParityError;
use crate::extract::ErrorRecord;
use crate::result::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

/// One error category
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptTag(Cow<'static, str>);

impl ConceptTag {
    pub const OVERLAP: ConceptTag = ConceptTag(Cow::Borrowed("overlap"));
    pub const BOUNDARY: ConceptTag = ConceptTag(Cow::Borrowed("boundary"));
    pub const POWER_OF_2: ConceptTag = ConceptTag(Cow::Borrowed("power_of_2"));

    pub fn new(tag: impl Into<String>) -> Self {
        Self(Cow::Owned(tag.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConceptTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The categories found in one tool's diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptSet(BTreeSet<ConceptTag>);

impl ConceptSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: ConceptTag) -> bool {
        self.0.insert(tag)
    }

    pub fn contains(&self, tag: &ConceptTag) -> bool {
        self.0.contains(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConceptTag> {
        self.0.iter()
    }

    /// Two sets are similar when they share a tag or are both empty
    pub fn is_similar_to(&self, other: &ConceptSet) -> bool {
        if self.is_empty() && other.is_empty() {
            return true;
        }
        !self.0.is_disjoint(&other.0)
    }
}

impl FromIterator<ConceptTag> for ConceptSet {
    fn from_iter<I: IntoIterator<Item = ConceptTag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ConceptSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self.0.iter().map(ConceptTag::as_str).collect();
        write!(f, "{{{}}}", tags.join(", "))
    }
}

/// How a rule recognises its category in a lowercased message
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Any of these lowercase substrings
    Substring(Vec<String>),
    Pattern(Regex),
}

impl Matcher {
    pub fn substrings<I, S>(needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Substring(
            needles
                .into_iter()
                .map(|needle| needle.as_ref().to_lowercase())
                .collect(),
        )
    }

    fn matches(&self, lowered: &str) -> bool {
        match self {
            Matcher::Substring(needles) => needles.iter().any(|n| lowered.contains(n.as_str())),
            Matcher::Pattern(regex) => regex.is_match(lowered),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConceptRule {
    pub tag: ConceptTag,
    pub matcher: Matcher,
}

/// Ordered set of concept rules
#[derive(Debug, Clone, Default)]
pub struct ConceptRegistry {
    rules: Vec<ConceptRule>,
}

impl ConceptRegistry {
    /// An empty registry, classifying nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in `overlap`, `boundary` and `power_of_2` vocabulary
    pub fn builtin() -> Self {
        Self::empty()
            .with_rule(ConceptTag::OVERLAP, Matcher::substrings(["overlap"]))
            .with_rule(
                ConceptTag::BOUNDARY,
                Matcher::substrings(["exceed", "boundary"]),
            )
            .with_rule(ConceptTag::POWER_OF_2, Matcher::substrings(["power of 2"]))
    }

    /// Built-in vocabulary extended by configured rules
    pub fn from_config(extra: &[ConceptRuleConfig]) -> Result<Self> {
        let mut registry = Self::builtin();
        for rule in extra {
            let tag = ConceptTag::new(rule.tag.clone());
            if !rule.substrings.is_empty() {
                registry.register(tag.clone(), Matcher::substrings(&rule.substrings));
            }
            if let Some(pattern) = &rule.pattern {
                let regex =
                    Regex::new(pattern).map_err(|e| ParityError::invalid_pattern(pattern, e))?;
                registry.register(tag, Matcher::Pattern(regex));
            }
        }
        Ok(registry)
    }

    pub fn with_rule(mut self, tag: ConceptTag, matcher: Matcher) -> Self {
        self.register(tag, matcher);
        self
    }

    pub fn register(&mut self, tag: ConceptTag, matcher: Matcher) {
        self.rules.push(ConceptRule { tag, matcher });
    }

    pub fn rules(&self) -> &[ConceptRule] {
        &self.rules
    }

    /// Tags of every rule matching any record; unmatched records add nothing
    pub fn classify(&self, records: &[ErrorRecord]) -> ConceptSet {
        let mut concepts = ConceptSet::new();
        for record in records {
            let lowered = record.as_str().to_lowercase();
            for rule in &self.rules {
                if rule.matcher.matches(&lowered) {
                    concepts.insert(rule.tag.clone());
                }
            }
        }
        concepts
    }
}
