// AI assist gateway: prompts, the completion service boundary, and the
// per-panel request lifecycle

pub mod client;
pub mod gemini;
pub mod prompt;
pub mod ranking;
pub mod session;

pub use client::*;
pub use gemini::{GeminiClient, GeminiConfig, DEFAULT_API_KEY_ENV};
pub use prompt::*;
pub use ranking::{parse_ranking, RankedProspect};
pub use session::*;
