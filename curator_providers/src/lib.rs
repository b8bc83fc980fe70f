#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod envelope;
mod gemini;
mod openai;
mod retry;
mod router;
mod scripted;

pub use envelope::response_text;
pub use gemini::GeminiProvider;
pub use openai::OpenAiCompatProvider;
pub use retry::retry_with_delays;
pub use router::ProviderRouter;
pub use scripted::ScriptedProvider;
