//! # Agnes LLM
//!
//! The generative-text collaborator boundary. The role-play engine only ever
//! sees [`LlmProvider`]: give it a prompt, get text back or an error.
//!
//! ## Backends
//!
//! | Provider | Type | Key Required |
//! |----------|------|--------------|
//! | Gemini | API | `GEMINI_API_KEY` |
//! | Mock | Testing | None |
//!
//! ## Quick Start
//!
//! ```rust
//! use agnes_llm::{MockProvider, LlmProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let llm = MockProvider::constant("Sounds good, when can you come by?");
//!     let reply = llm.ask("Respond as a homeowner").await.unwrap();
//!     assert_eq!(reply, "Sounds good, when can you come by?");
//! }
//! ```
//!
//! ## With Gemini
//!
//! ```rust,ignore
//! use agnes_llm::{GeminiProvider, ResilientProvider};
//!
//! let api_key = std::env::var("GEMINI_API_KEY").unwrap();
//! let llm = ResilientProvider::wrap(GeminiProvider::flash(&api_key));
//!
//! let reply = llm.ask("Say hello as a skeptical homeowner").await.unwrap();
//! ```

pub mod config;
pub mod gemini;
pub mod mock;
pub mod provider;
pub mod resilient_provider;

pub use config::{ConfigError, LlmConfig, ProviderKind};
pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};
pub use resilient_provider::{Backoff, ResilientProvider};
