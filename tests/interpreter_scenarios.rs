use labour_assist::query::{ExtractedQuery, QueryInterpreter, Vocabulary};
use proptest::prelude::*;
use std::collections::HashSet;

fn interpreter() -> QueryInterpreter {
    QueryInterpreter::new(Vocabulary::builtin().unwrap()).unwrap()
}

fn query(skills: &[&str], location: Option<&str>) -> ExtractedQuery {
    ExtractedQuery {
        skills: skills.iter().map(|s| s.to_string()).collect(),
        location: location.map(str::to_string),
    }
}

#[test]
fn self_description_with_two_skills() {
    assert_eq!(
        interpreter().extract("I am good at gardening and driving"),
        query(&["gardening", "driving"], None)
    );
}

#[test]
fn combined_pattern_picks_city_and_canonical_skill() {
    assert_eq!(
        interpreter().extract("jobs of cooking in delhi"),
        query(&["cook"], Some("delhi"))
    );
}

#[test]
fn theme_word_expands_to_category() {
    assert_eq!(
        interpreter().extract("outdoor work please"),
        query(
            &["driving", "gardening", "construction", "delivery", "outdoor"],
            None
        )
    );
}

#[test]
fn residence_phrase_gives_location_only() {
    assert_eq!(
        interpreter().extract("I live in mumbai"),
        query(&[], Some("mumbai"))
    );
}

#[test]
fn empty_utterance() {
    assert_eq!(interpreter().extract(""), ExtractedQuery::default());
}

#[test]
fn dictionary_scan_finds_plumber() {
    let result = interpreter().extract("need a plumber");
    assert!(result.skills.contains(&"plumber".to_string()));
    assert_eq!(result.location, None);
}

#[test]
fn explicit_skill_beats_theme_word() {
    let result = interpreter().extract("I like outdoor gardening");
    assert_eq!(result.skills, vec!["gardening".to_string()]);
}

#[test]
fn custom_vocabulary_is_honoured() {
    let vocabulary = Vocabulary::from_toml_str(
        r#"
locations = ["kochi"]

[[skills]]
canonical = "fishing"
variants = ["fisherman"]

[[semantic]]
theme = "coastal"
skills = ["fishing"]
"#,
    )
    .unwrap();
    let interpreter = QueryInterpreter::new(vocabulary).unwrap();

    assert_eq!(
        interpreter.extract("fisherman jobs in kochi"),
        query(&["fishing"], Some("kochi"))
    );
    assert_eq!(
        interpreter.extract("something coastal"),
        query(&["fishing"], None)
    );
}

const WORDS: &[&str] = &[
    "i", "am", "good", "at", "in", "near", "jobs", "job", "work", "for", "of", "and", "also",
    "need", "a", "the", "please", "my", "skills", "are", "live", "from", "pune", "delhi",
    "mumbai", "jaipur", "springfield", "driver", "driving", "cook", "cooking", "plumber",
    "gardening", "outdoor", "technical", "welding", "tailor", "looking", ",",
];

fn sentence() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS.to_vec()), 0..10).prop_map(|w| w.join(" "))
}

proptest! {
    #[test]
    fn extraction_is_idempotent(text in "\\PC{0,60}") {
        let interpreter = interpreter();
        prop_assert_eq!(interpreter.extract(&text), interpreter.extract(&text));
    }

    #[test]
    fn skills_have_no_case_insensitive_duplicates(text in sentence()) {
        let result = interpreter().extract(&text);
        let unique: HashSet<String> = result.skills.iter().map(|s| s.to_lowercase()).collect();
        prop_assert_eq!(unique.len(), result.skills.len());
    }

    #[test]
    fn location_is_never_a_stopword_or_skill(text in sentence()) {
        let interpreter = interpreter();
        let vocabulary = interpreter.vocabulary();
        if let Some(location) = interpreter.extract(&text).location {
            let location = location.trim().to_lowercase();
            prop_assert!(
                vocabulary.is_location(&location)
                    || (!vocabulary.is_stopword(&location)
                        && !vocabulary.looks_like_skill(&location)
                        && location.chars().count() > 2),
                "unexpected location {:?} from {:?}",
                location,
                text
            );
        }
    }
}
