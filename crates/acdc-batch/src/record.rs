use acdc_solver::outcome::scalar;
use acdc_solver::{AcResults, ConvergenceFlag, DcResults, SolverOutcome};
use serde::{Deserialize, Serialize};

/// Result of one scenario: the solved case, or the reason it failed.
///
/// Serialized without a tag: a failure is an object with an `error` string,
/// a success carries `resultsac`/`resultsdc`. An object that has `error`
/// reads back as a failure whatever else it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultRecord {
    Failure(FailureRecord),
    Success(SuccessRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessRecord {
    pub resultsac: AcResults,
    pub resultsdc: DcResults,
    pub converged: ConvergenceFlag,
    #[serde(rename = "timecalc", with = "scalar")]
    pub elapsed_seconds: f64,
    #[serde(rename = "case_ac")]
    pub ac_case_id: String,
    #[serde(rename = "case_dc")]
    pub dc_case_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    #[serde(rename = "error")]
    pub error_message: String,
    #[serde(rename = "case_ac", default)]
    pub ac_case_id: String,
    #[serde(rename = "case_dc", default)]
    pub dc_case_id: String,
}

impl ResultRecord {
    /// Wrap a solver outcome, tagging it with the cases it was run on.
    pub fn success(outcome: SolverOutcome, ac_case_id: &str, dc_case_id: &str) -> Self {
        let SolverOutcome {
            ac,
            dc,
            converged,
            elapsed_seconds,
        } = outcome;
        ResultRecord::Success(SuccessRecord {
            resultsac: ac,
            resultsdc: dc,
            converged,
            elapsed_seconds,
            ac_case_id: ac_case_id.to_string(),
            dc_case_id: dc_case_id.to_string(),
        })
    }

    pub fn failure(
        error_message: impl Into<String>,
        ac_case_id: &str,
        dc_case_id: &str,
    ) -> Self {
        ResultRecord::Failure(FailureRecord {
            error_message: error_message.into(),
            ac_case_id: ac_case_id.to_string(),
            dc_case_id: dc_case_id.to_string(),
        })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ResultRecord::Failure(_))
    }

    pub fn ac_case_id(&self) -> &str {
        match self {
            ResultRecord::Success(s) => &s.ac_case_id,
            ResultRecord::Failure(f) => &f.ac_case_id,
        }
    }

    pub fn dc_case_id(&self) -> &str {
        match self {
            ResultRecord::Success(s) => &s.dc_case_id,
            ResultRecord::Failure(f) => &f.dc_case_id,
        }
    }

    /// Solver-reported convergence; `None` for failures.
    pub fn converged(&self) -> Option<ConvergenceFlag> {
        match self {
            ResultRecord::Success(s) => Some(s.converged),
            ResultRecord::Failure(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ResultRecord::Failure(f) => Some(&f.error_message),
            ResultRecord::Success(_) => None,
        }
    }

    pub fn as_success(&self) -> Option<&SuccessRecord> {
        match self {
            ResultRecord::Success(s) => Some(s),
            ResultRecord::Failure(_) => None,
        }
    }
}
