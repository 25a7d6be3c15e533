// src/query/mod.rs
//! Natural-language job-query interpreter shared by the chat and search-box handlers.

pub mod interpreter;
pub mod patterns;
pub mod vocabulary;

pub use interpreter::{ExtractedQuery, QueryInterpreter};
pub use vocabulary::{LocationGazetteer, SemanticCategory, SkillTerm, Vocabulary};
