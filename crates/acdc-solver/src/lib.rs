//! Solver boundary for the AC/DC power-flow regression harness.
//!
//! The harness never looks inside the power-flow mathematics. It talks to a
//! solver through [`AcDcSolver`]: two case identifiers and an options set go
//! in, a [`SolverOutcome`] or a [`SolverError`] comes out.
//!
//! Two kinds of solver are provided:
//!
//! - [`SolverProcess`] runs an external solver binary over JSON on
//!   stdin/stdout (see [`subprocess`]).
//! - Any `Fn(&str, &str, &AcDcOptions) -> SolverResult<SolverOutcome>`
//!   closure, which is how tests stub the solver.
//!
//! # Protocol Version
//!
//! Requests carry [`PROTOCOL_VERSION`]; breaking changes to the request or
//! outcome layout increment it.

pub mod error;
pub mod options;
pub mod outcome;
pub mod subprocess;

pub use error::{ExitCode, SolverError, SolverResult};
pub use options::{AcDcOptions, ConverterPlot, OPTION_SLOTS, OUTPUT_SLOT};
pub use outcome::{AcResults, ConvergenceFlag, DcResults, Matrix, SolverOutcome};
pub use subprocess::{SolveRequest, SolverProcess, DEFAULT_SOLVER_BINARY};

/// Protocol version for request/outcome compatibility checking.
pub const PROTOCOL_VERSION: i32 = 1;

/// A hybrid AC/DC power-flow solver.
///
/// Calls are synchronous and expected to be deterministic per input. A
/// normal return is a completed solve even when `converged` is false; an
/// `Err` is a failed solve.
pub trait AcDcSolver {
    fn solve(
        &self,
        ac_case: &str,
        dc_case: &str,
        options: &AcDcOptions,
    ) -> SolverResult<SolverOutcome>;
}

impl<F> AcDcSolver for F
where
    F: Fn(&str, &str, &AcDcOptions) -> SolverResult<SolverOutcome>,
{
    fn solve(
        &self,
        ac_case: &str,
        dc_case: &str,
        options: &AcDcOptions,
    ) -> SolverResult<SolverOutcome> {
        self(ac_case, dc_case, options)
    }
}
