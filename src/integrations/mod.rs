//! External integrations module.
//!
//! Provides clients for OpenAI-compatible chat completion endpoints.

pub mod openai;

pub use openai::OpenAIClient;
