//! Curated FAQ fallback: parsing the FAQ source and matching queries to it.

pub mod matcher;
pub mod parser;

pub use matcher::{FaqMatch, FaqMatcher, FaqSuggestion};
pub use parser::{load_faq, parse_faq, FaqEntry};
