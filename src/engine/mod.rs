pub mod fences;
pub mod interp;
pub mod pipeline;
pub mod policy;

use thiserror::Error;

/// Errors that cross the pipeline boundary.
///
/// Everything downstream of successful generation (a policy
/// rejection, a fault inside the executed code) is reported as data
/// in [`RunReport`], never as an `Err`, so the caller can always
/// render something.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No API credential was configured for the completion provider.
    /// Checked before any network call is attempted.
    #[error("no API key configured: set OPENAI_API_KEY or [llm] api_key in the config")]
    MissingCredential,

    /// The prompt was empty or whitespace-only; generation was never
    /// attempted.
    #[error("empty prompt")]
    EmptyPrompt,

    /// The completion service failed (network or API error). Surfaced
    /// verbatim, no retry.
    #[error("code generation failed: {0}")]
    Generation(#[from] anyhow::Error),
}

pub use interp::{execute_source, ExecutionResult};
pub use pipeline::{Engine, ExecOutcome, RunReport};
