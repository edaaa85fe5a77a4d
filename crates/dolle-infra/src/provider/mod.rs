//! Image generation providers.

mod openai;

pub use openai::{OpenAiConfig, OpenAiImageGenerator};
