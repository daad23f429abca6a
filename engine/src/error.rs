//! Error taxonomy for dispatch and host calls.
//!
//! Failures below the dispatch trampoline propagate with `?`; the
//! trampoline is the only place they are caught, where they are wrapped in
//! a [`DispatchFailure`] recording the stage the call had reached.

use std::error::Error as StdError;
use std::fmt;

use plugwire_primitives::CodecError;
use thiserror::Error;

/// Result type for plugin-authored export bodies.
pub type PluginResult<T> = anyhow::Result<T>;

/// Errors reported by a host-provided primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The primitive is not provided by this host.
    #[error("host primitive `{0}` is not available")]
    Unavailable(&'static str),

    /// The host reported a failure.
    #[error("host call failed: {0}")]
    Failed(String),

    /// No host function is bound to this import slot.
    #[error("no host function at slot {0}")]
    UnknownSlot(u32),
}

/// Errors raised by an import stub.
#[derive(Debug, Error)]
pub enum HostCallError {
    /// The host-call shim only has entry points for up to `max` arguments.
    #[error("host functions take at most {max} arguments, got {got}")]
    TooManyArguments { max: usize, got: usize },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Errors raised while dispatching an export.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("export index {index} out of range ({len} registered)")]
    IndexOutOfRange { index: u32, len: usize },

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The export body itself failed.
    #[error("{0}")]
    Guest(anyhow::Error),

    #[error("expected {expected} arguments, got {got}")]
    ArgumentCount { expected: usize, got: usize },
}

impl DispatchError {
    /// The cause chain below the top-level message, outermost first.
    fn causes(&self) -> Vec<String> {
        match self {
            Self::Guest(err) => err.chain().skip(1).map(|c| c.to_string()).collect(),
            other => {
                let mut causes = Vec::new();
                let mut source = other.source();
                while let Some(err) = source {
                    causes.push(err.to_string());
                    source = err.source();
                }
                causes
            }
        }
    }
}

/// Point in the dispatch state machine at which a call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolving,
    MarshallingIn,
    Invoking,
    MarshallingOut,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolving => "resolving",
            Self::MarshallingIn => "marshalling arguments",
            Self::Invoking => "invoking",
            Self::MarshallingOut => "marshalling result",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure returned by the dispatch trampoline.
#[derive(Debug)]
pub struct DispatchFailure {
    pub index: u32,
    /// `None` when the index never resolved to an export.
    pub name: Option<String>,
    pub stage: Stage,
    pub message: String,
    /// Cause chain, one frame per entry.
    pub trace: Vec<String>,
    pub error: DispatchError,
}

impl DispatchFailure {
    pub fn new(index: u32, name: Option<String>, stage: Stage, error: DispatchError) -> Self {
        Self {
            index,
            name,
            stage,
            message: error.to_string(),
            trace: error.causes(),
            error,
        }
    }

    /// Text written to the host's error channel.
    pub fn render(&self) -> String {
        let mut out = match &self.name {
            Some(name) => format!(
                "export `{name}` (#{}) failed while {}: {}",
                self.index, self.stage, self.message
            ),
            None => format!("export #{} failed while {}: {}", self.index, self.stage, self.message),
        };
        for frame in &self.trace {
            out.push_str("\n  caused by: ");
            out.push_str(frame);
        }
        out
    }

    pub fn is_index_out_of_range(&self) -> bool {
        matches!(self.error, DispatchError::IndexOutOfRange { .. })
    }
}

impl fmt::Display for DispatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl StdError for DispatchFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.error)
    }
}
