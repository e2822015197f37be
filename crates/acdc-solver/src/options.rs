//! Named AC/DC power-flow options.
//!
//! Solvers in the MatACDC family read their settings from a flat 14-slot
//! vector. The harness only ever works with [`AcDcOptions`]; the positional
//! form is produced by [`AcDcOptions::to_vector`] at the subprocess boundary.
//!
//! | Slot | Field | Default |
//! |------|-------|---------|
//! | 0 | `tol_acdc` | 1e-8 |
//! | 1 | `itmax_acdc` | 10 |
//! | 2 | `tol_dc` | 1e-8 |
//! | 3 | `itmax_dc` | 10 |
//! | 4 | `tol_slack_droop` | 1e-8 |
//! | 5 | `itmax_slack_droop` | 10 |
//! | 6 | `tol_slack_droop_int` | 1e-8 |
//! | 7 | `itmax_slack_droop_int` | 10 |
//! | 8 | `multi_slack` | false |
//! | 9 | `limit_ac` | false |
//! | 10 | `limit_dc` | false |
//! | 11 | `tol_lim` | 1e-2 |
//! | 12 | print output (`!suppress_output`) | print |
//! | 13 | `converter_plot` | none |

use serde::{Deserialize, Serialize};

/// Number of slots in the positional options vector.
pub const OPTION_SLOTS: usize = 14;

/// Slot holding the "print output" flag in the positional vector.
pub const OUTPUT_SLOT: usize = 12;

/// Converter limit violation plotting mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConverterPlot {
    /// Do not plot converter limit violations.
    #[default]
    None,
    /// Plot only converter limit violations.
    Violations,
    /// Plot limit violations and the final operating point.
    ViolationsAndFinal,
}

impl ConverterPlot {
    fn slot_value(self) -> f64 {
        match self {
            ConverterPlot::None => 0.0,
            ConverterPlot::Violations => 1.0,
            ConverterPlot::ViolationsAndFinal => 2.0,
        }
    }
}

/// Options handed to the solver for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcDcOptions {
    /// Tolerance of the outer AC/DC iteration.
    pub tol_acdc: f64,
    /// Maximum outer AC/DC iterations.
    pub itmax_acdc: u32,
    /// Tolerance of the DC network Newton iteration.
    pub tol_dc: f64,
    /// Maximum DC network Newton iterations.
    pub itmax_dc: u32,
    /// Tolerance of the DC slack bus iteration.
    pub tol_slack_droop: f64,
    /// Maximum DC slack bus iterations.
    pub itmax_slack_droop: u32,
    /// Tolerance of the internal slack bus Newton iteration.
    pub tol_slack_droop_int: f64,
    /// Maximum internal slack bus Newton iterations.
    pub itmax_slack_droop_int: u32,
    /// Allow more than one DC voltage-controlling converter per DC grid.
    pub multi_slack: bool,
    /// Enforce AC converter current and voltage limits.
    pub limit_ac: bool,
    /// Enforce DC converter limits.
    pub limit_dc: bool,
    /// Maximum difference between subsequent limit violations.
    pub tol_lim: f64,
    /// Silence the solver's own progress output. No effect on numerics.
    pub suppress_output: bool,
    /// Converter limit plotting.
    pub converter_plot: ConverterPlot,
}

impl Default for AcDcOptions {
    fn default() -> Self {
        Self {
            tol_acdc: 1e-8,
            itmax_acdc: 10,
            tol_dc: 1e-8,
            itmax_dc: 10,
            tol_slack_droop: 1e-8,
            itmax_slack_droop: 10,
            tol_slack_droop_int: 1e-8,
            itmax_slack_droop_int: 10,
            multi_slack: false,
            limit_ac: false,
            limit_dc: false,
            tol_lim: 1e-2,
            suppress_output: false,
            converter_plot: ConverterPlot::None,
        }
    }
}

impl AcDcOptions {
    /// Defaults with solver output silenced, the usual harness setting.
    pub fn quiet() -> Self {
        Self {
            suppress_output: true,
            ..Self::default()
        }
    }

    /// Positional vector in MatACDC slot order.
    pub fn to_vector(&self) -> [f64; OPTION_SLOTS] {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        [
            self.tol_acdc,
            f64::from(self.itmax_acdc),
            self.tol_dc,
            f64::from(self.itmax_dc),
            self.tol_slack_droop,
            f64::from(self.itmax_slack_droop),
            self.tol_slack_droop_int,
            f64::from(self.itmax_slack_droop_int),
            flag(self.multi_slack),
            flag(self.limit_ac),
            flag(self.limit_dc),
            self.tol_lim,
            flag(!self.suppress_output),
            self.converter_plot.slot_value(),
        ]
    }
}
