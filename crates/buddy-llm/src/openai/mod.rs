mod client;

pub use client::{OpenAIClient, USAGE_LIMIT_MARKER};
