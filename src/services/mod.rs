pub mod analytics;
pub mod matching;
