use acdc_solver::{AcDcOptions, AcDcSolver};
use anyhow::Result;
use std::time::Instant;
use tracing::{info, info_span, warn};

use crate::record::ResultRecord;
use crate::scenario::ScenarioSuite;
use crate::store::ResultStore;

/// Drives a solver through scenarios one at a time.
///
/// Each solver call is contained: an `Err` from the solver becomes a failure
/// record and the next scenario runs as if nothing happened. Calls are never
/// retried and have no timeout.
pub struct ScenarioRunner<'a, S: AcDcSolver + ?Sized> {
    solver: &'a S,
}

impl<'a, S: AcDcSolver + ?Sized> ScenarioRunner<'a, S> {
    pub fn new(solver: &'a S) -> Self {
        Self { solver }
    }

    /// Solve one case pair and turn whatever happens into a record.
    pub fn run(&self, ac_case_id: &str, dc_case_id: &str, options: &AcDcOptions) -> ResultRecord {
        info!(ac_case = ac_case_id, dc_case = dc_case_id, "start");
        let start = Instant::now();
        match self.solver.solve(ac_case_id, dc_case_id, options) {
            Ok(outcome) => {
                info!(
                    converged = %outcome.converged,
                    elapsed_s = outcome.elapsed_seconds,
                    "done"
                );
                ResultRecord::success(outcome, ac_case_id, dc_case_id)
            }
            Err(err) => {
                let message = err.to_string();
                warn!(
                    elapsed_s = start.elapsed().as_secs_f64(),
                    error = %message,
                    "failed"
                );
                ResultRecord::failure(message, ac_case_id, dc_case_id)
            }
        }
    }

    /// Run every scenario in suite order and collect one record per name.
    pub fn run_suite(&self, suite: &ScenarioSuite) -> Result<ResultStore> {
        let mut store = ResultStore::with_capacity(suite.len());
        for scenario in suite.scenarios() {
            let span = info_span!("scenario", name = %scenario.name);
            let _enter = span.enter();
            if let Some(description) = &scenario.description {
                info!("{description}");
            }
            let record = self.run(
                &scenario.ac_case_id,
                &scenario.dc_case_id,
                &scenario.options,
            );
            store.insert(scenario.name.clone(), record)?;
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioDefinition;
    use acdc_solver::{
        AcResults, ConvergenceFlag, DcResults, Matrix, SolverError, SolverOutcome, SolverResult,
    };
    use std::cell::RefCell;

    fn outcome(converged: ConvergenceFlag, elapsed_seconds: f64) -> SolverOutcome {
        SolverOutcome {
            ac: AcResults {
                base_mva: 100.0,
                bus: Matrix::from_rows(vec![vec![1.0, 3.0, 0.0, 0.0, 1.06, 0.0]]).unwrap(),
                ..Default::default()
            },
            dc: DcResults {
                busdc: Matrix::from_rows(vec![vec![1.0, 1.0, 345.0]]).unwrap(),
                ..Default::default()
            },
            converged,
            elapsed_seconds,
        }
    }

    #[test]
    fn success_is_tagged_with_cases() {
        let solver = |_: &str, _: &str, _: &AcDcOptions| -> SolverResult<SolverOutcome> {
            Ok(outcome(ConvergenceFlag::Code(1), 0.0123))
        };
        let runner = ScenarioRunner::new(&solver);
        let record = runner.run("case5_stagg", "case5_stagg_MTDCslack", &AcDcOptions::quiet());
        let success = record.as_success().expect("success record");
        assert_eq!(success.ac_case_id, "case5_stagg");
        assert_eq!(success.dc_case_id, "case5_stagg_MTDCslack");
        assert_eq!(success.converged, ConvergenceFlag::Code(1));
        assert_eq!(success.elapsed_seconds, 0.0123);
        assert_eq!(success.resultsdc.busdc.get(0, 2), Some(345.0));
    }

    #[test]
    fn solver_error_becomes_failure_record() {
        let solver = |_: &str, _: &str, _: &AcDcOptions| -> SolverResult<SolverOutcome> {
            Err(SolverError::failed("Matrix is singular"))
        };
        let runner = ScenarioRunner::new(&solver);
        let record = runner.run("case5_stagg", "case5_stagg_MTDCslack", &AcDcOptions::quiet());
        assert_eq!(record.error_message(), Some("Matrix is singular"));
        assert_eq!(record.ac_case_id(), "case5_stagg");
        assert_eq!(record.dc_case_id(), "case5_stagg_MTDCslack");
    }

    #[test]
    fn non_convergence_is_not_a_failure() {
        let solver = |_: &str, _: &str, _: &AcDcOptions| -> SolverResult<SolverOutcome> {
            Ok(outcome(ConvergenceFlag::Flag(false), 1.5))
        };
        let record = ScenarioRunner::new(&solver).run("a", "b", &AcDcOptions::default());
        assert!(!record.is_failure());
        assert_eq!(record.converged(), Some(ConvergenceFlag::Flag(false)));
    }

    #[test]
    fn failure_is_contained_to_its_scenario() {
        let calls = RefCell::new(Vec::new());
        let solver = |ac: &str, dc: &str, _: &AcDcOptions| -> SolverResult<SolverOutcome> {
            calls.borrow_mut().push(format!("{ac}/{dc}"));
            if ac == "bad" {
                Err(SolverError::failed("Matrix is singular"))
            } else {
                Ok(outcome(ConvergenceFlag::Code(1), 0.01))
            }
        };
        let suite = ScenarioSuite::new(vec![
            ScenarioDefinition::new("A", "bad", "dc", AcDcOptions::quiet()),
            ScenarioDefinition::new("B", "good", "dc", AcDcOptions::quiet()),
        ])
        .unwrap();
        let store = ScenarioRunner::new(&solver).run_suite(&suite).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get("A").unwrap().is_failure());
        assert!(!store.get("B").unwrap().is_failure());
        assert_eq!(*calls.borrow(), ["bad/dc", "good/dc"]);
    }

    #[test]
    fn every_scenario_yields_exactly_one_record_in_order() {
        let solver = |ac: &str, _: &str, _: &AcDcOptions| -> SolverResult<SolverOutcome> {
            match ac {
                "case3_inf" => Ok(outcome(ConvergenceFlag::Code(0), 0.2)),
                "case24_ieee_rts1996_3zones" => Err(SolverError::failed("diverged")),
                _ => Ok(outcome(ConvergenceFlag::Code(1), 0.1)),
            }
        };
        let suite = ScenarioSuite::builtin();
        let store = ScenarioRunner::new(&solver).run_suite(&suite).unwrap();
        assert_eq!(store.len(), suite.len());
        assert!(store.names().eq(suite.names()));
    }

    #[test]
    fn options_reach_the_solver_unchanged() {
        let seen = RefCell::new(None);
        let solver = |_: &str, _: &str, opts: &AcDcOptions| -> SolverResult<SolverOutcome> {
            *seen.borrow_mut() = Some(opts.clone());
            Ok(outcome(ConvergenceFlag::Code(1), 0.0))
        };
        let options = AcDcOptions {
            itmax_acdc: 42,
            ..AcDcOptions::quiet()
        };
        ScenarioRunner::new(&solver).run("a", "b", &options);
        assert_eq!(seen.borrow().as_ref(), Some(&options));
    }
}
