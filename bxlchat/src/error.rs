//! Chat execution error types.

use thiserror::Error;

/// Error from one chat turn (LLM call or request construction).
///
/// Tool failures are not surfaced here; they are reported back to the model as tool results.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. LLM request could not be built or sent).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The model kept requesting tools past the per-turn limit.
    #[error("tool call limit of {0} rounds reached")]
    ToolRoundsExceeded(usize),
}
