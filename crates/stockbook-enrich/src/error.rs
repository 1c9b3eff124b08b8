use thiserror::Error;

use crate::step::Step;

/// Failures inside an orchestration run. Each one halts the current mode;
/// completed steps are preserved in the outcome.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("fetch error: {0}")]
    Fetch(#[from] stockbook_fetch::FetchError),

    #[error("model error: {0}")]
    Ai(#[from] stockbook_ai::AiError),

    #[error("database error: {0}")]
    Db(#[from] stockbook_db::DbError),

    /// The run loop attempted an ordering the step table forbids. A
    /// programming error, surfaced instead of panicking.
    #[error("illegal step transition: {from} -> {to}")]
    IllegalTransition { from: Step, to: Step },
}
