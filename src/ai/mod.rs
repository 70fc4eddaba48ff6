//! AI service integration for plant identification
//!
//! Provides the narrow seam to the external multimodal model: a prompt and an
//! image go in, free-form text comes out.

pub mod gemini;
pub mod mock;

pub use gemini::GeminiVisionClient;
pub use mock::MockVisionClient;

use crate::submission::ImageSubmission;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn generate(&self, prompt: &str, image: &ImageSubmission) -> Result<String>;
}
