//! Plant safety identification service
//!
//! Accepts a photo of a plant, asks a hosted multimodal model to identify it,
//! and turns the model's free-form reply into a complete safety report.

pub mod ai;
pub mod app;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod models;
pub mod prompts;
pub mod service;
pub mod submission;

pub use error::{Error, Result};
