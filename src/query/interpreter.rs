// src/query/interpreter.rs
//! Rule-based interpreter turning a free-text utterance into a job query.

use super::patterns::{CaptureShape, PatternSet, Roles};
use super::vocabulary::{normalize, Vocabulary};
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Structured intent extracted from one utterance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedQuery {
    /// Canonical skills in discovery order, unique.
    pub skills: Vec<String>,
    pub location: Option<String>,
}

impl ExtractedQuery {
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.location.is_none()
    }

    /// Skills joined into the single comma-separated filter value.
    pub fn skill_filter(&self) -> Option<String> {
        if self.skills.is_empty() {
            None
        } else {
            Some(self.skills.join(","))
        }
    }
}

/// Skill-length window for phrases accepted without a dictionary match.
const MIN_ADHOC_LEN: usize = 3;
const MAX_ADHOC_LEN: usize = 19;

/// Interprets utterances against an immutable vocabulary.
///
/// Construct once and share (`Arc<QueryInterpreter>`); `extract` takes `&self`
/// and never mutates.
#[derive(Debug)]
pub struct QueryInterpreter {
    vocabulary: Vocabulary,
    patterns: PatternSet,
    /// Word-boundary matcher per surface form, same order as the vocabulary.
    dictionary: Vec<(Regex, String)>,
}

impl QueryInterpreter {
    pub fn new(vocabulary: Vocabulary) -> Result<Self> {
        let patterns = PatternSet::compile()?;

        let dictionary = vocabulary
            .surface_forms()
            .iter()
            .map(|form| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(&form.text));
                Regex::new(&pattern)
                    .with_context(|| format!("Failed to compile surface form: {}", form.text))
                    .map(|regex| (regex, form.canonical.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            vocabulary,
            patterns,
            dictionary,
        })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Extract skills and location. Unmatched input yields an empty query.
    pub fn extract(&self, text: &str) -> ExtractedQuery {
        if text.trim().is_empty() {
            return ExtractedQuery::default();
        }
        let lower = text.to_lowercase();

        let (mut location, incidental_skill) = self.combined_patterns(text);

        let mut skills = self.skill_phrases(&lower);

        if location.is_none() {
            location = self.location_phrases(&lower);
        }

        if let Some(candidate) = incidental_skill {
            if let Some(skill) = self.resolve_skill_phrase(&candidate) {
                skills.push(skill);
            }
        }

        skills.extend(self.dictionary_scan(&lower));

        if skills.is_empty() {
            if let Some(category) = self.vocabulary.semantic_fallback(&lower) {
                debug!("Semantic fallback on theme '{}'", category.theme);
                skills.extend(category.skills.iter().cloned());
            }
        }

        if skills.is_empty() {
            skills.extend(self.fallback_word(text));
        }

        let query = ExtractedQuery {
            skills: dedupe(skills),
            location,
        };
        debug!(
            "Interpreted {:?} as skills={:?} location={:?}",
            text, query.skills, query.location
        );
        query
    }

    /// Stage 1: combined templates. Returns the accepted location and, for
    /// two-capture templates, the other phrase as a skill candidate.
    fn combined_patterns(&self, text: &str) -> (Option<String>, Option<String>) {
        for pattern in &self.patterns.combined {
            let Some(caps) = pattern.regex.captures(text) else {
                continue;
            };

            let roles = match pattern.shape {
                CaptureShape::Location => caps.get(1).map(|m| Roles {
                    location: normalize(m.as_str()),
                    skill: String::new(),
                }),
                CaptureShape::Pair(disambiguate) => match (caps.get(1), caps.get(2)) {
                    (Some(first), Some(second)) => disambiguate(
                        &self.vocabulary,
                        &normalize(first.as_str()),
                        &normalize(second.as_str()),
                    ),
                    _ => None,
                },
            };

            let Some(roles) = roles else {
                continue;
            };

            if let Some(location) = self.accept_location(&roles.location) {
                debug!("Pattern '{}' matched location '{}'", pattern.name, location);
                let skill = Some(roles.skill).filter(|s| !s.is_empty());
                return (Some(location), skill);
            }
        }
        (None, None)
    }

    /// A location candidate is kept if it is a gazetteer member, or if it is not
    /// a stopword, not skill-like, free of filler/theme tokens and longer than 2.
    fn accept_location(&self, candidate: &str) -> Option<String> {
        let vocab = &self.vocabulary;
        if candidate.is_empty() || vocab.is_stopword(candidate) || vocab.looks_like_skill(candidate)
        {
            return None;
        }
        if let Some(place) = vocab.gazetteer().resolve(candidate) {
            return Some(place);
        }
        if vocab.has_noise_token(candidate) || candidate.chars().count() <= 2 {
            return None;
        }
        Some(candidate.to_string())
    }

    /// Stage 2: self-descriptive phrases such as "I am good at X and Y".
    fn skill_phrases(&self, lower: &str) -> Vec<String> {
        let mut found = Vec::new();
        for pattern in &self.patterns.skill_phrases {
            for caps in pattern.regex.captures_iter(lower) {
                let Some(phrase) = caps.get(1) else {
                    continue;
                };
                for part in self.patterns.splitter.split(phrase.as_str().trim()) {
                    let cleaned = self.patterns.skill_filler.replace(part.trim(), "");
                    if let Some(skill) = self.resolve_skill_phrase(cleaned.trim()) {
                        debug!("Pattern '{}' matched skill '{}'", pattern.name, skill);
                        found.push(skill);
                    }
                }
            }
        }
        found
    }

    /// Dictionary match to the canonical form, or the phrase itself when it is a
    /// plausible ad-hoc skill.
    fn resolve_skill_phrase(&self, phrase: &str) -> Option<String> {
        let phrase = normalize(phrase);
        let len = phrase.chars().count();
        let vocab = &self.vocabulary;
        if len < MIN_ADHOC_LEN || vocab.is_location(&phrase) || vocab.is_stopword(&phrase) {
            return None;
        }
        if let Some(canonical) = vocab.match_skill(&phrase) {
            return Some(canonical.to_string());
        }
        (len <= MAX_ADHOC_LEN).then_some(phrase)
    }

    /// Stage 3: "I live in X" style phrases; only exact gazetteer places are accepted.
    fn location_phrases(&self, lower: &str) -> Option<String> {
        self.patterns
            .location_phrases
            .iter()
            .flat_map(|pattern| pattern.regex.captures_iter(lower))
            .filter_map(|caps| caps.get(1))
            .find_map(|m| {
                let cleaned = normalize(&self.patterns.location_tail.replace(m.as_str().trim(), ""));
                self.vocabulary.is_location(&cleaned).then_some(cleaned)
            })
    }

    /// Stage 5: word-boundary scan for every surface form.
    fn dictionary_scan(&self, lower: &str) -> Vec<String> {
        self.dictionary
            .iter()
            .filter(|(regex, _)| regex.is_match(lower))
            .map(|(_, canonical)| canonical.clone())
            .collect()
    }

    /// Stage 7: first plausible word after "need", "work as" and similar.
    fn fallback_word(&self, text: &str) -> Option<String> {
        self.patterns
            .fallback
            .iter()
            .filter_map(|pattern| pattern.regex.captures(text))
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_lowercase())
            .find(|word| {
                !self.vocabulary.is_stopword(word)
                    && !self.vocabulary.is_location(word)
                    && word.chars().count() > 2
            })
    }
}

/// Case-insensitive dedupe keeping first-seen order; output is lower-cased.
fn dedupe(skills: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    skills
        .into_iter()
        .map(|s| s.to_lowercase())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
