//! AI provider implementations
//!
//! Concrete implementations of [`crate::AnalysisClient`].

pub mod gemini;

pub use gemini::GeminiClient;
