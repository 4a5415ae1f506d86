//! Task classification
//!
//! Maps a free-text request onto one of the catalog task types through a
//! cascade of progressively more expensive strategies.

pub mod booster;
mod cascade;
pub mod keyword;
pub mod normalizer;
mod oracle;
pub mod phrase;
pub mod synonyms;

pub use cascade::{
    ACCEPT_THRESHOLD, CascadeState, Classification, KeywordBoostStrategy, ORACLE_THRESHOLD, OraclePrimaryStrategy,
    OracleTiebreakStrategy, PhraseStrategy, Stage, Step, Strategy, TaskClassifier,
};
pub use keyword::KeywordMatch;
pub use oracle::{LlmOracle, NullOracle, OracleClassifier, OracleError, parse_oracle_reply};
pub use phrase::PhraseMatch;
