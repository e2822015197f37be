//! Error types and exit codes for solver communication.

use std::fmt;
use thiserror::Error;

/// Exit codes a solver subprocess reports back to the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Solver returned an outcome (check `converged` for the numerics)
    Success = 0,
    /// Invalid input (unknown case, malformed request)
    InvalidInput = 1,
    /// Solver error (singular Jacobian, internal failure)
    SolverError = 2,
    /// Segfault (SIGSEGV) - native crash
    Segfault = 139,
}

impl ExitCode {
    /// Convert from raw exit code to ExitCode enum.
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => ExitCode::Success,
            1 => ExitCode::InvalidInput,
            2 => ExitCode::SolverError,
            139 => ExitCode::Segfault,
            _ => ExitCode::SolverError, // Unknown codes treated as solver error
        }
    }

    /// Check if this exit code indicates success.
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExitCode::Success => "success",
            ExitCode::InvalidInput => "invalid input",
            ExitCode::SolverError => "solver error",
            ExitCode::Segfault => "segfault",
        };
        write!(f, "{label} ({})", *self as i32)
    }
}

/// Errors raised across the solver boundary.
///
/// Every variant is a per-scenario failure: the harness records the rendered
/// message and moves on to the next scenario.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The solver itself reported a failure (numerical blow-up, bad case data).
    #[error("{0}")]
    Failed(String),

    /// Solver binary could not be located.
    #[error("Solver binary '{binary}' is not installed. Place it in ~/.acdc/solvers/ or on PATH")]
    NotInstalled { binary: String },

    /// Solver process failed to start.
    #[error("Failed to start solver process: {0}")]
    ProcessStart(#[source] std::io::Error),

    /// Solver process exited with a failure status.
    #[error("Solver exited with {exit_code}: {message}")]
    ProcessFailed { exit_code: ExitCode, message: String },

    /// Request/response transport error.
    #[error("IPC error: {0}")]
    Ipc(String),

    /// Solver output could not be decoded.
    #[error("Malformed solver output: {0}")]
    MalformedOutcome(String),

    /// JSON encoding/decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SolverError {
    /// Shorthand for a solver-reported failure message.
    pub fn failed(message: impl Into<String>) -> Self {
        SolverError::Failed(message.into())
    }
}

/// Result type alias for solver operations.
pub type SolverResult<T> = Result<T, SolverError>;
