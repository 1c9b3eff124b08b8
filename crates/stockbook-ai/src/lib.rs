//! Model-backed enrichment calls: URL resolution, content synthesis, and
//! batch image classification over the Anthropic Messages API.

pub mod classify;
pub mod client;
pub mod error;
pub mod ocr;
pub mod resolver;
pub mod synthesize;

pub use classify::{classify_images, ClassificationResult};
pub use client::{strip_code_fences, AnthropicClient};
pub use error::AiError;
pub use ocr::{extract_image_text, identify_from_text};
pub use resolver::resolve_product_url;
pub use synthesize::{synthesize, SynthesisRequest, SynthesisStyle, Synthesized};
