//! Google Gemini provider implementation
//!
//! Schedule and roster lookups use `generateContent`; the matchup analysis
//! streams from `streamGenerateContent?alt=sse`. All three requests are
//! grounded with Google Search, and grounding chunks become citations.

pub mod client;
pub mod types;

pub use client::{GeminiClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
