//! LLM provider backend implementations.

pub mod openai;

pub use openai::OpenAiProvider;
