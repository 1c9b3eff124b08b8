//! Enrichment orchestration: a closed step machine sequencing the resolver,
//! fetcher, synthesizer, image pipeline, and classifier per requested mode.

pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod step;

pub use error::EnrichError;
pub use orchestrator::{EnrichmentOutcome, EnrichmentRequest, Orchestrator};
pub use progress::EnrichmentProgress;
pub use step::{can_transition, Step};
