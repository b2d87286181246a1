//! Remote text-generation service: client, prompts and reply parsing

pub mod client;
pub mod parser;
pub mod prompt;

pub use client::{BlockingClient, CompletionBackend, CompletionRequest, LlmClient};
