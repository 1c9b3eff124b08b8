//! Barcode lookup chain: public and keyed product databases tried in
//! priority order, with a model-backed fallback at the end.

pub mod chain;
pub mod error;
pub mod llm;
pub mod sources;

pub use chain::{LookupChain, LookupResult, LookupSource, SourceStatus};
pub use error::LookupError;
