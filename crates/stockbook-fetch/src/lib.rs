pub mod candidates;
pub mod error;
pub mod headless;
pub mod static_fetch;
pub mod types;

pub use error::FetchError;
pub use headless::{HeadlessFetcher, HeadlessOptions};
pub use static_fetch::StaticFetcher;
pub use types::{CandidateImage, ScrapedPage, Section};
