//! Subprocess backend for external AC/DC solvers.
//!
//! The solver binary receives one [`SolveRequest`] as JSON on stdin and
//! answers with one [`SolverOutcome`] as JSON on stdout. Failures are
//! signalled with a nonzero exit status and a message on stderr.
//!
//! ```text
//! acdc-cli (harness) ──stdin──> acdc-solver (subprocess)
//!                    <─stdout──
//!                    <─stderr── (failure message)
//! ```
//!
//! There is no timeout: a solver that never exits blocks the harness.

use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::debug;

use crate::error::{ExitCode, SolverError, SolverResult};
use crate::options::{AcDcOptions, OPTION_SLOTS};
use crate::outcome::SolverOutcome;
use crate::{AcDcSolver, PROTOCOL_VERSION};

/// Default solver binary name looked up by [`SolverProcess::find_binary`].
pub const DEFAULT_SOLVER_BINARY: &str = "acdc-solver";

/// Request written to the solver's stdin.
#[derive(Debug, Serialize)]
pub struct SolveRequest<'a> {
    pub protocol_version: i32,
    pub ac_case: &'a str,
    pub dc_case: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_root: Option<&'a Path>,
    pub options: &'a AcDcOptions,
    /// The same options in positional MatACDC slot order.
    pub option_vector: [f64; OPTION_SLOTS],
}

/// Handle to an external solver binary.
#[derive(Debug, Clone)]
pub struct SolverProcess {
    binary_path: PathBuf,
    case_root: Option<PathBuf>,
}

impl SolverProcess {
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
            case_root: None,
        }
    }

    /// Directory the solver should resolve case identifiers against.
    pub fn with_case_root(mut self, case_root: impl Into<PathBuf>) -> Self {
        self.case_root = Some(case_root.into());
        self
    }

    /// Find a solver binary in standard locations.
    ///
    /// Search order:
    /// 1. ~/.acdc/solvers/<binary_name>
    /// 2. System PATH
    pub fn find_binary(binary_name: &str) -> SolverResult<PathBuf> {
        if let Some(home) = dirs::home_dir() {
            let local = home.join(".acdc").join("solvers").join(binary_name);
            if local.exists() {
                return Ok(local);
            }
        }

        if let Ok(path) = which::which(binary_name) {
            return Ok(path);
        }

        Err(SolverError::NotInstalled {
            binary: binary_name.to_string(),
        })
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    pub fn case_root(&self) -> Option<&Path> {
        self.case_root.as_deref()
    }

    /// Run one solve, blocking until the solver exits.
    pub fn solve_blocking(
        &self,
        ac_case: &str,
        dc_case: &str,
        options: &AcDcOptions,
    ) -> SolverResult<SolverOutcome> {
        let start = Instant::now();

        let request = SolveRequest {
            protocol_version: PROTOCOL_VERSION,
            ac_case,
            dc_case,
            case_root: self.case_root.as_deref(),
            options,
            option_vector: options.to_vector(),
        };
        let request_bytes = serde_json::to_vec(&request)?;

        let mut child = Command::new(&self.binary_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(SolverError::ProcessStart)?;

        // Dropping the handle closes stdin so the solver sees end of input.
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&request_bytes) {
                Ok(()) => {}
                // Solver exited without reading; its status and stderr are reported below.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    debug!("solver closed stdin before the request was written");
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SolverError::Ipc(format!("Failed to write request: {e}")));
                }
            }
        }

        let output = child.wait_with_output().map_err(SolverError::ProcessStart)?;
        let elapsed = start.elapsed();
        debug!(
            binary = %self.binary_path.display(),
            elapsed_ms = elapsed.as_millis() as u64,
            "solver process exited"
        );

        let exit_code = ExitCode::from_raw(output.status.code().unwrap_or(-1));
        if !exit_code.is_success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SolverError::ProcessFailed {
                exit_code,
                message: stderr.trim().to_string(),
            });
        }

        if output.stdout.is_empty() {
            return Err(SolverError::Ipc("Empty outcome from solver".to_string()));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| SolverError::MalformedOutcome(e.to_string()))
    }
}

impl AcDcSolver for SolverProcess {
    fn solve(
        &self,
        ac_case: &str,
        dc_case: &str,
        options: &AcDcOptions,
    ) -> SolverResult<SolverOutcome> {
        self.solve_blocking(ac_case, dc_case, options)
    }
}
