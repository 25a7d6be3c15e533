// src/query/vocabulary.rs
//! Skill dictionary, semantic themes and location gazetteer used by the interpreter.
//!
//! A `Vocabulary` is built once at startup (either the built-in tables or a TOML
//! override) and is never mutated afterwards.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

/// Words that are never accepted as a location or an ad-hoc skill.
pub const STOPWORDS: &[&str] = &[
    "near",
    "in",
    "at",
    "around",
    "jobs",
    "job",
    "work",
    "position",
    "positions",
];

/// Connective and filler tokens that disqualify a non-gazetteer location phrase.
const FILLER_WORDS: &[&str] = &[
    "a", "an", "the", "and", "also", "or", "etc", "please", "i", "me", "my", "some", "any",
    "need", "want", "find", "looking",
];

/// A canonical skill plus the surface forms a user might type for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillTerm {
    pub canonical: String,
    #[serde(default)]
    pub variants: Vec<String>,
}

impl SkillTerm {
    pub fn new(canonical: &str, variants: &[&str]) -> Self {
        Self {
            canonical: canonical.to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Canonical form first, then variants in declaration order.
    pub fn surface_forms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical.as_str()).chain(self.variants.iter().map(String::as_str))
    }
}

/// A theme word that implies a cluster of skills when nothing explicit was named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticCategory {
    pub theme: String,
    pub skills: Vec<String>,
}

impl SemanticCategory {
    pub fn new(theme: &str, skills: &[&str]) -> Self {
        Self {
            theme: theme.to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Fixed set of recognised place names.
#[derive(Debug, Clone, Default)]
pub struct LocationGazetteer {
    places: HashSet<String>,
}

impl LocationGazetteer {
    pub fn new<I, S>(places: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            places: places
                .into_iter()
                .map(|p| normalize(p.as_ref()))
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Case-insensitive exact membership on the trimmed phrase.
    pub fn contains(&self, phrase: &str) -> bool {
        self.places.contains(&normalize(phrase))
    }

    /// Exact member, or the leading word of a longer phrase when that word is a member.
    pub fn resolve(&self, phrase: &str) -> Option<String> {
        let phrase = normalize(phrase);
        if self.places.contains(&phrase) {
            return Some(phrase);
        }
        phrase
            .split_whitespace()
            .next()
            .filter(|head| self.places.contains(*head))
            .map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

/// One typed-in form of a skill, indexed back to its canonical term.
#[derive(Debug, Clone)]
pub struct SurfaceForm {
    pub text: String,
    /// First whitespace-delimited word, used for containment matching.
    pub head: String,
    pub canonical: String,
}

/// The immutable dictionary set shared by every interpreter call.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    skills: Vec<SkillTerm>,
    surface_forms: Vec<SurfaceForm>,
    semantic: Vec<SemanticCategory>,
    gazetteer: LocationGazetteer,
    stopwords: HashSet<String>,
}

/// On-disk shape of a vocabulary override.
#[derive(Debug, Deserialize)]
struct VocabularyFile {
    #[serde(default)]
    skills: Vec<SkillTerm>,
    #[serde(default)]
    semantic: Vec<SemanticCategory>,
    #[serde(default)]
    locations: Vec<String>,
}

impl Vocabulary {
    /// Build a vocabulary, enforcing that canonicals are unique and every surface
    /// form belongs to exactly one canonical skill.
    pub fn new(
        skills: Vec<SkillTerm>,
        semantic: Vec<SemanticCategory>,
        gazetteer: LocationGazetteer,
    ) -> Result<Self> {
        let skills: Vec<SkillTerm> = skills
            .into_iter()
            .map(|term| SkillTerm {
                canonical: normalize(&term.canonical),
                variants: term.variants.iter().map(|v| normalize(v)).collect(),
            })
            .collect();

        let mut canonicals = HashSet::new();
        let mut owners: HashMap<String, String> = HashMap::new();
        let mut surface_forms = Vec::new();

        for term in &skills {
            if term.canonical.is_empty() {
                anyhow::bail!("Skill term with empty canonical name");
            }
            if !canonicals.insert(term.canonical.clone()) {
                anyhow::bail!("Duplicate canonical skill: {}", term.canonical);
            }
            for form in term.surface_forms() {
                if form.is_empty() {
                    continue;
                }
                match owners.get(form) {
                    Some(owner) if owner == &term.canonical => continue,
                    Some(owner) => anyhow::bail!(
                        "Surface form '{}' is claimed by both '{}' and '{}'",
                        form,
                        owner,
                        term.canonical
                    ),
                    None => {
                        owners.insert(form.to_string(), term.canonical.clone());
                    }
                }
                surface_forms.push(SurfaceForm {
                    text: form.to_string(),
                    head: form.split_whitespace().next().unwrap_or(form).to_string(),
                    canonical: term.canonical.clone(),
                });
            }
        }

        let semantic = semantic
            .into_iter()
            .map(|category| SemanticCategory {
                theme: normalize(&category.theme),
                skills: category.skills.iter().map(|s| normalize(s)).collect(),
            })
            .filter(|category| !category.theme.is_empty())
            .collect();

        Ok(Self {
            skills,
            surface_forms,
            semantic,
            gazetteer,
            stopwords: STOPWORDS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// The dictionary the marketplace ships with, checked like any override.
    pub fn builtin() -> Result<Self> {
        let skills = vec![
            SkillTerm::new("gardening", &["garden", "gardener"]),
            SkillTerm::new("driving", &["driver"]),
            SkillTerm::new("construction", &["construction worker"]),
            SkillTerm::new("cleaning", &["cleaner", "housekeeping"]),
            SkillTerm::new("electrician", &["electrical", "electric"]),
            SkillTerm::new("plumber", &["plumbing"]),
            SkillTerm::new("cook", &["cooking", "chef"]),
            SkillTerm::new("security", &["guard"]),
            SkillTerm::new("delivery", &["delivery driver"]),
            SkillTerm::new("helper", &["help"]),
            SkillTerm::new("painting", &["painter"]),
            SkillTerm::new("maintenance", &["maintenance worker"]),
            SkillTerm::new("labour", &["labor", "laborer", "labourer"]),
            SkillTerm::new("welder", &["welding"]),
            SkillTerm::new("carpenter", &["carpentry"]),
            SkillTerm::new("mason", &["masonry"]),
            SkillTerm::new("waiter", &["waitress", "serving"]),
            SkillTerm::new("teacher", &["teaching", "tutor"]),
            SkillTerm::new("supervisor", &["supervising"]),
            SkillTerm::new("nursing", &["nurse", "caregiver"]),
            SkillTerm::new("childcare", &["babysitter", "nanny"]),
        ];

        let semantic = vec![
            SemanticCategory::new(
                "activity",
                &["driving", "gardening", "construction", "delivery", "outdoor"],
            ),
            SemanticCategory::new(
                "outdoor",
                &["driving", "gardening", "construction", "delivery", "outdoor"],
            ),
            SemanticCategory::new("environment", &["gardening", "cleaning", "construction"]),
            SemanticCategory::new(
                "physical",
                &["construction", "welder", "carpenter", "mason", "labour", "helper"],
            ),
            SemanticCategory::new(
                "service",
                &["delivery", "waiter", "cook", "cleaning", "security"],
            ),
            SemanticCategory::new(
                "technical",
                &["electrician", "plumber", "welder", "maintenance"],
            ),
            SemanticCategory::new(
                "indoor",
                &["cook", "waiter", "cleaning", "electrician", "plumber"],
            ),
            SemanticCategory::new("field", &["driving", "delivery", "construction", "gardening"]),
        ];

        let gazetteer = LocationGazetteer::new([
            "mumbai",
            "delhi",
            "bangalore",
            "pune",
            "hyderabad",
            "chennai",
            "kolkata",
            "ahmedabad",
            "jaipur",
            "lucknow",
            "kanpur",
            "nagpur",
            "indore",
            "thane",
            "bhopal",
            "visakhapatnam",
            "patna",
            "vadodara",
            "ghaziabad",
            "ludhiana",
            "agra",
            "nashik",
            "faridabad",
            "meerut",
            "rajkot",
            "varanasi",
            "srinagar",
            "amritsar",
        ]);

        Self::new(skills, semantic, gazetteer).context("Built-in vocabulary is invalid")
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: VocabularyFile =
            toml::from_str(content).context("Failed to parse vocabulary TOML")?;
        Self::new(
            file.skills,
            file.semantic,
            LocationGazetteer::new(file.locations),
        )
    }

    /// Load a vocabulary override from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read vocabulary file: {}", path.display()))?;
        let vocabulary = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid vocabulary file: {}", path.display()))?;

        info!(
            "Loaded vocabulary from {}: {} skills, {} themes, {} locations",
            path.display(),
            vocabulary.skills.len(),
            vocabulary.semantic.len(),
            vocabulary.gazetteer.len()
        );
        Ok(vocabulary)
    }

    pub fn skills(&self) -> &[SkillTerm] {
        &self.skills
    }

    pub fn surface_forms(&self) -> &[SurfaceForm] {
        &self.surface_forms
    }

    pub fn semantic_categories(&self) -> &[SemanticCategory] {
        &self.semantic
    }

    pub fn gazetteer(&self) -> &LocationGazetteer {
        &self.gazetteer
    }

    pub fn is_location(&self, phrase: &str) -> bool {
        self.gazetteer.contains(phrase)
    }

    pub fn is_stopword(&self, phrase: &str) -> bool {
        self.stopwords.contains(&normalize(phrase))
    }

    pub fn is_theme(&self, phrase: &str) -> bool {
        let phrase = normalize(phrase);
        self.semantic.iter().any(|c| c.theme == phrase)
    }

    /// Canonical skill of the first surface form whose head word contains, or is
    /// contained in, the phrase.
    pub fn match_skill(&self, phrase: &str) -> Option<&str> {
        let phrase = normalize(phrase);
        if phrase.is_empty() {
            return None;
        }
        self.surface_forms
            .iter()
            .find(|form| phrase.contains(&form.head) || form.head.contains(&phrase))
            .map(|form| form.canonical.as_str())
    }

    pub fn looks_like_skill(&self, phrase: &str) -> bool {
        self.match_skill(phrase).is_some()
    }

    /// True when any token of the phrase is a stopword, a filler word or a theme word.
    pub fn has_noise_token(&self, phrase: &str) -> bool {
        phrase.split_whitespace().any(|token| {
            self.is_stopword(token) || FILLER_WORDS.contains(&token) || self.is_theme(token)
        })
    }

    /// First semantic category whose theme appears anywhere in the text.
    pub fn semantic_fallback(&self, lower_text: &str) -> Option<&SemanticCategory> {
        self.semantic
            .iter()
            .find(|category| lower_text.contains(&category.theme))
    }
}

/// Trim and lower-case a phrase.
pub fn normalize(phrase: &str) -> String {
    phrase.trim().to_lowercase()
}
