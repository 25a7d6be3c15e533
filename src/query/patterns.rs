// src/query/patterns.rs
//! Ordered pattern tables for each extraction stage.
//!
//! Order inside every table is precedence: the interpreter walks them front to
//! back and the first acceptable match wins.

use super::vocabulary::Vocabulary;
use anyhow::{Context, Result};
use regex::Regex;

/// Location and skill roles assigned to the two captures of a combined pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roles {
    pub location: String,
    pub skill: String,
}

/// Decides which of two captured phrases is the location and which the skill.
pub type Disambiguator = fn(&Vocabulary, &str, &str) -> Option<Roles>;

/// How a combined pattern's captures map onto query roles.
#[derive(Clone, Copy)]
pub enum CaptureShape {
    /// One capture that can only be a location.
    Location,
    /// Two captures whose roles are settled by the disambiguator.
    Pair(Disambiguator),
}

impl std::fmt::Debug for CaptureShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureShape::Location => f.write_str("Location"),
            CaptureShape::Pair(_) => f.write_str("Pair"),
        }
    }
}

/// A location+skill template, e.g. "jobs of SKILL in LOCATION".
#[derive(Debug)]
pub struct CombinedPattern {
    pub name: &'static str,
    pub regex: Regex,
    pub shape: CaptureShape,
}

/// A single-capture template used by the phrase and fallback stages.
#[derive(Debug)]
pub struct PhrasePattern {
    pub name: &'static str,
    pub regex: Regex,
}

const PHRASE: &str = r"([a-z]+(?:\s+[a-z]+)?)";

/// Compiled pattern tables, built once with the interpreter.
#[derive(Debug)]
pub struct PatternSet {
    pub combined: Vec<CombinedPattern>,
    pub skill_phrases: Vec<PhrasePattern>,
    pub location_phrases: Vec<PhrasePattern>,
    pub fallback: Vec<PhrasePattern>,
    /// Splits a captured skill phrase into separate candidates.
    pub splitter: Regex,
    /// Trailing filler removed from a skill candidate.
    pub skill_filler: Regex,
    /// Trailing connective removed from a location candidate.
    pub location_tail: Regex,
}

impl PatternSet {
    pub fn compile() -> Result<Self> {
        let combined = vec![
            combined(
                "skill_then_location",
                &format!(r"(?i)\bjobs?\s+(?:of|for)\s+{PHRASE}\s+(?:in|near|at|around)\s+{PHRASE}"),
                CaptureShape::Pair(disambiguate),
            )?,
            combined(
                "location_then_skill",
                &format!(r"(?i)\bjobs?\s+(?:near|in|at|around)\s+{PHRASE}\s+(?:of|for)\s+{PHRASE}"),
                CaptureShape::Pair(disambiguate),
            )?,
            combined(
                "preposition",
                &format!(r"(?i)\b(?:in|at|near|around|for)\s+{PHRASE}"),
                CaptureShape::Location,
            )?,
            combined(
                "trailing_noun",
                &format!(r"(?i)\b{PHRASE}\s+(?:jobs?|work|position)\b"),
                CaptureShape::Location,
            )?,
            combined(
                "jobs_in",
                &format!(r"(?i)\bjobs?\s+in\s+{PHRASE}"),
                CaptureShape::Location,
            )?,
            combined(
                "jobs_near",
                &format!(r"(?i)\b(?:jobs?|work)\s+(?:near|in|at|around)\s+{PHRASE}"),
                CaptureShape::Location,
            )?,
        ];

        // Run against lower-cased text.
        let tail = r"(?:\s+(?:and|also|,)\s+.*)?$";
        let skill_phrases = vec![
            phrase(
                "good_at",
                &format!(r"(?:\bi(?:\s+am|['’]m)\s+)?\b(?:good|great|skilled|experienced|proficient)\s+(?:at|in|with)\s+(.+?){tail}"),
            )?,
            phrase(
                "can_do",
                &format!(r"\bi\s+(?:can|know how to)\s+(?:do\s+)?(.+?){tail}"),
            )?,
            phrase(
                "have_experience",
                &format!(r"(?:\bi\s+)?\b(?:have|had)\s+(?:experience|skills|expertise|knowledge)\s+(?:in|with|at)\s+(.+?){tail}"),
            )?,
            phrase(
                "know",
                &format!(r"\bi\s+(?:know|learned|learn)\s+(?:how to\s+)?(.+?){tail}"),
            )?,
            phrase(
                "i_am_a",
                r"\bi(?:\s+am|['’]m)\s+(?:a|an|the)\s+(.+?)(?:\s+(?:and|also|,)\s+(?:a|an|the)?\s*.*)?$",
            )?,
            phrase(
                "my_skills",
                &format!(r"(?:\bmy\s+)?\b(?:skills|abilities|expertise)\s+(?:include|are|is)\s+(.+?){tail}"),
            )?,
        ];

        let location_phrases = vec![
            phrase(
                "i_live_in",
                &format!(r"\bi(?:\s+(?:am|live|living)|['’]m)\s+(?:in|at|near|around|from)\s+{PHRASE}"),
            )?,
            phrase(
                "based_in",
                &format!(r"\b(?:located|living|based|from)\s+(?:in|at|near)\s+{PHRASE}"),
            )?,
            phrase(
                "i_am_from",
                &format!(r"\bi(?:\s+am|['’]m)\s+from\s+{PHRASE}"),
            )?,
        ];

        let fallback = vec![
            phrase("work_as", r"(?i)\b(?:jobs?|work)\s+(?:of|as|for)\s+(\w+)")?,
            phrase(
                "looking_for",
                r"(?i)\b(?:need|want|looking(?:\s+for)?|find)\s+(?:a\s+)?(\w+)",
            )?,
            phrase(
                "opportunity_in",
                r"(?i)\b(?:jobs?|work|opportunity)\s+(?:in|for)\s+(\w+)",
            )?,
        ];

        Ok(Self {
            combined,
            skill_phrases,
            location_phrases,
            fallback,
            splitter: compile(r"\s*,\s*|\s+(?:and|also)\s+")?,
            skill_filler: compile(r"\s+(?:work|job|etc|and|also).*$")?,
            location_tail: compile(r"\s*(?:\s(?:and|also)\b|,).*$")?,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).with_context(|| format!("Failed to compile pattern: {}", pattern))
}

fn combined(name: &'static str, pattern: &str, shape: CaptureShape) -> Result<CombinedPattern> {
    Ok(CombinedPattern {
        name,
        regex: compile(pattern)?,
        shape,
    })
}

fn phrase(name: &'static str, pattern: &str) -> Result<PhrasePattern> {
    Ok(PhrasePattern {
        name,
        regex: compile(pattern)?,
    })
}

/// Gazetteer membership first (exactly one member wins), then skill likeness.
/// Returns `None` when the roles stay ambiguous.
pub fn disambiguate(vocab: &Vocabulary, first: &str, second: &str) -> Option<Roles> {
    let roles = |location: &str, skill: &str| Roles {
        location: location.to_string(),
        skill: skill.to_string(),
    };

    let first_place = vocab.gazetteer().resolve(first).is_some();
    let second_place = vocab.gazetteer().resolve(second).is_some();
    match (first_place, second_place) {
        (false, true) => return Some(roles(second, first)),
        (true, false) => return Some(roles(first, second)),
        _ => {}
    }

    match (vocab.looks_like_skill(first), vocab.looks_like_skill(second)) {
        (true, false) => Some(roles(second, first)),
        (false, true) => Some(roles(first, second)),
        _ => None,
    }
}
