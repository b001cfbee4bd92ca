//! Study-note generation against OpenAI-compatible chat-completion APIs.

pub mod prompts;
mod provider;

pub use provider::{GeneratedNotes, NoteGenerator};
