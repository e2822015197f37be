//! Field-level comparison of one scenario.
//!
//! Where [`compare_stores`](crate::compare::compare_stores) reports whole
//! tables, this looks at the physical quantities that usually explain a
//! difference: bus voltages, generator injections, DC bus voltages and
//! powers, and converter flows and losses. Columns follow the MATPOWER and
//! MatACDC layouts, zero-based.

use acdc_solver::Matrix;
use anyhow::{bail, Result};
use serde::Serialize;
use std::fmt::Write as _;

use crate::compare::Tolerance;
use crate::record::SuccessRecord;
use crate::store::ResultStore;

/// Rows listed per field before the rest are only counted.
pub const MAX_LISTED_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Bus,
    Gen,
    Busdc,
    Convdc,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Bus => "bus",
            Table::Gen => "gen",
            Table::Busdc => "busdc",
            Table::Convdc => "convdc",
        }
    }

    /// How a row of this table is named in listings.
    fn row_label(&self) -> &'static str {
        match self {
            Table::Bus => "Bus",
            Table::Gen => "Gen at bus",
            Table::Busdc => "DC bus",
            Table::Convdc => "Converter at DC bus",
        }
    }

    fn of<'a>(&self, record: &'a SuccessRecord) -> &'a Matrix {
        match self {
            Table::Bus => &record.resultsac.bus,
            Table::Gen => &record.resultsac.gen,
            Table::Busdc => &record.resultsdc.busdc,
            Table::Convdc => &record.resultsdc.convdc,
        }
    }
}

struct FieldSpec {
    table: Table,
    column: usize,
    field: &'static str,
    description: &'static str,
    unit: &'static str,
    totals: bool,
}

impl FieldSpec {
    const fn new(
        table: Table,
        column: usize,
        field: &'static str,
        description: &'static str,
        unit: &'static str,
        totals: bool,
    ) -> Self {
        Self {
            table,
            column,
            field,
            description,
            unit,
            totals,
        }
    }
}

const FIELDS: [FieldSpec; 9] = [
    FieldSpec::new(Table::Bus, 7, "VM", "Voltage magnitude", "p.u.", false),
    FieldSpec::new(Table::Bus, 8, "VA", "Voltage angle", "degrees", false),
    FieldSpec::new(Table::Gen, 1, "PG", "Active power", "MW", true),
    FieldSpec::new(Table::Gen, 2, "QG", "Reactive power", "MVAr", true),
    FieldSpec::new(Table::Busdc, 4, "VDC", "DC bus voltage", "p.u.", false),
    FieldSpec::new(Table::Busdc, 3, "PDC", "DC bus power", "MW", false),
    FieldSpec::new(Table::Convdc, 3, "PCONV", "Converter active power", "MW", true),
    FieldSpec::new(Table::Convdc, 4, "QCONV", "Converter reactive power", "MVAr", false),
    FieldSpec::new(Table::Convdc, 28, "PCLOSS", "Converter losses", "MW", true),
];

/// One row whose difference exceeds the threshold. `id` is the row's first
/// column (bus number, or the bus a generator or converter sits on).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RowDiff {
    pub id: f64,
    pub reference: f64,
    pub candidate: f64,
    pub diff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldStats {
    pub max_abs_diff: f64,
    pub mean_abs_diff: f64,
    /// Column sums, reference then candidate.
    pub totals: Option<(f64, f64)>,
    pub exceeding_rows: usize,
    pub listed: Vec<RowDiff>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FieldDiff {
    Unavailable(String),
    Compared(FieldStats),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldComparison {
    pub table: Table,
    pub field: &'static str,
    pub description: &'static str,
    pub unit: &'static str,
    pub diff: FieldDiff,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedComparison {
    pub name: String,
    /// Absolute difference above which a row is listed.
    pub threshold: f64,
    pub fields: Vec<FieldComparison>,
}

impl DetailedComparison {
    pub fn field(&self, table: Table, field: &str) -> Option<&FieldComparison> {
        self.fields
            .iter()
            .find(|f| f.table == table && f.field == field)
    }
}

fn compare_field(
    spec: &FieldSpec,
    reference: &SuccessRecord,
    candidate: &SuccessRecord,
    threshold: f64,
    tolerance: Tolerance,
) -> FieldDiff {
    let (r, c) = (spec.table.of(reference), spec.table.of(candidate));
    if r.nrows() != c.nrows() {
        return FieldDiff::Unavailable(format!(
            "row count differs: {} vs {}",
            r.nrows(),
            c.nrows()
        ));
    }
    if r.nrows() > 0 && (r.ncols() <= spec.column || c.ncols() <= spec.column) {
        return FieldDiff::Unavailable(format!(
            "column {} not present ({} vs {} columns)",
            spec.column + 1,
            r.ncols(),
            c.ncols()
        ));
    }

    let (mut max_abs, mut sum_abs) = (0.0_f64, 0.0_f64);
    let (mut total_r, mut total_c) = (0.0_f64, 0.0_f64);
    let mut exceeding_rows = 0;
    let mut listed = Vec::new();

    for (r_row, c_row) in r.rows().iter().zip(c.rows()) {
        let (a, b) = (r_row[spec.column], c_row[spec.column]);
        let diff = tolerance.abs_diff(a, b);
        max_abs = max_abs.max(diff);
        sum_abs += diff;
        total_r += a;
        total_c += b;
        if diff > threshold {
            exceeding_rows += 1;
            if listed.len() < MAX_LISTED_ROWS {
                listed.push(RowDiff {
                    id: r_row[0],
                    reference: a,
                    candidate: b,
                    diff,
                });
            }
        }
    }

    let mean_abs = if r.nrows() == 0 {
        0.0
    } else {
        sum_abs / r.nrows() as f64
    };
    FieldDiff::Compared(FieldStats {
        max_abs_diff: max_abs,
        mean_abs_diff: mean_abs,
        totals: spec.totals.then_some((total_r, total_c)),
        exceeding_rows,
        listed,
    })
}

/// Compare one scenario field by field. Rows are listed when their absolute
/// difference exceeds `tolerance.rtol`.
///
/// The scenario must be present and solved in both stores.
pub fn detail_scenario(
    name: &str,
    reference: &ResultStore,
    candidate: &ResultStore,
    tolerance: Tolerance,
) -> Result<DetailedComparison> {
    let (Some(r), Some(c)) = (reference.get(name), candidate.get(name)) else {
        bail!("scenario '{name}' not found in both result stores");
    };
    let (Some(r), Some(c)) = (r.as_success(), c.as_success()) else {
        bail!("scenario '{name}' has a recorded failure and cannot be compared in detail");
    };

    let threshold = tolerance.rtol;
    let fields = FIELDS
        .iter()
        .map(|spec| FieldComparison {
            table: spec.table,
            field: spec.field,
            description: spec.description,
            unit: spec.unit,
            diff: compare_field(spec, r, c, threshold, tolerance),
        })
        .collect();
    Ok(DetailedComparison {
        name: name.to_string(),
        threshold,
        fields,
    })
}

pub fn render_detail(detail: &DetailedComparison) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(80));
    let _ = writeln!(out, "Detailed comparison - {}", detail.name);
    let _ = writeln!(out, "{}", "=".repeat(80));

    for field in &detail.fields {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{} {} ({}):",
            field.table.as_str(),
            field.description,
            field.field
        );
        let stats = match &field.diff {
            FieldDiff::Unavailable(reason) => {
                let _ = writeln!(out, "  unavailable: {reason}");
                continue;
            }
            FieldDiff::Compared(stats) => stats,
        };
        let _ = writeln!(out, "  Max difference: {:.2e} {}", stats.max_abs_diff, field.unit);
        let _ = writeln!(out, "  Mean difference: {:.2e} {}", stats.mean_abs_diff, field.unit);
        if let Some((r, c)) = stats.totals {
            let _ = writeln!(out, "  Total reference: {r:.2} {}", field.unit);
            let _ = writeln!(out, "  Total candidate: {c:.2} {}", field.unit);
        }
        if stats.exceeding_rows > 0 {
            let _ = writeln!(out, "  Rows with difference > {:e}:", detail.threshold);
            for row in &stats.listed {
                let _ = writeln!(
                    out,
                    "    {} {}: reference={:.6}, candidate={:.6}, diff={:.2e}",
                    field.table.row_label(),
                    row.id,
                    row.reference,
                    row.candidate,
                    row.diff
                );
            }
            let hidden = stats.exceeding_rows - stats.listed.len();
            if hidden > 0 {
                let _ = writeln!(out, "    ... and {hidden} more");
            }
        }
    }
    out
}

pub fn print_detail(detail: &DetailedComparison) {
    println!();
    print!("{}", render_detail(detail));
}
