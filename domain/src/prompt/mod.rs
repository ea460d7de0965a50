//! Prompt templates and response parsing for keyword extraction and
//! recommendations.

pub mod parsing;
pub mod research;

pub use parsing::{parse_bullet_list, parse_keyword_list};
pub use research::ResearchPromptTemplate;
