pub mod groq;
pub mod model;

pub use groq::GroqClient;
pub use model::{LlmProvider, Message, MessageRole, ModelConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
