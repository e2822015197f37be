//! Solver outcome types.
//!
//! A successful solve returns the AC tables (`bus`, `gen`, `branch` with the
//! system `baseMVA`), the DC tables (`busdc`, `convdc`, `branchdc`), the
//! solver-reported convergence flag and the elapsed solve time. Tables are
//! row-major numeric matrices in MATPOWER/MatACDC column layout; the harness
//! never interprets columns.
//!
//! JSON has no encoding for non-finite numbers, so matrix cells and scalars
//! are written as plain numbers when finite and as the strings `"NaN"`,
//! `"Inf"` or `"-Inf"` otherwise. `null` is read as NaN.

use serde::de::{self, Deserializer, SeqAccess, Unexpected, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{SolverError, SolverResult};

/// A single numeric value with non-finite values spelled out.
#[derive(Debug, Clone, Copy)]
struct Cell(f64);

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0;
        if v.is_finite() {
            serializer.serialize_f64(v)
        } else if v.is_nan() {
            serializer.serialize_str("NaN")
        } else if v > 0.0 {
            serializer.serialize_str("Inf")
        } else {
            serializer.serialize_str("-Inf")
        }
    }
}

struct CellVisitor;

impl<'de> Visitor<'de> for CellVisitor {
    type Value = Cell;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number or one of \"NaN\", \"Inf\", \"-Inf\"")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Cell, E> {
        Ok(Cell(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Cell, E> {
        Ok(Cell(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Cell, E> {
        Ok(Cell(v as f64))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Cell, E> {
        Ok(Cell(if v { 1.0 } else { 0.0 }))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Cell, E> {
        Ok(Cell(f64::NAN))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Cell, E> {
        match v {
            "NaN" | "nan" => Ok(Cell(f64::NAN)),
            "Inf" | "inf" | "Infinity" => Ok(Cell(f64::INFINITY)),
            "-Inf" | "-inf" | "-Infinity" => Ok(Cell(f64::NEG_INFINITY)),
            other => Err(E::invalid_value(Unexpected::Str(other), &self)),
        }
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CellVisitor)
    }
}

/// Serde adapter for scalar `f64` fields that may be non-finite.
pub mod scalar {
    use super::Cell;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        Cell(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Cell::deserialize(deserializer).map(|cell| cell.0)
    }
}

/// Rectangular row-major table of `f64`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matrix {
    rows: Vec<Vec<f64>>,
    ncols: usize,
}

impl Matrix {
    /// Build a matrix, rejecting ragged rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> SolverResult<Self> {
        let ncols = rows.first().map_or(0, Vec::len);
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != ncols) {
            return Err(SolverError::MalformedOutcome(format!(
                "row {idx} has {} columns, expected {ncols}",
                row.len()
            )));
        }
        Ok(Self { rows, ncols })
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Cells in row-major order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().flat_map(|row| row.iter().copied())
    }

    /// Equality on the bit patterns of every cell, so NaN matches NaN and
    /// `-0.0` differs from `0.0`.
    pub fn bitwise_eq(&self, other: &Matrix) -> bool {
        self.shape() == other.shape()
            && self
                .values()
                .zip(other.values())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Serialize for Matrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Row<'a>(&'a [f64]);

        impl Serialize for Row<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
                for v in self.0 {
                    seq.serialize_element(&Cell(*v))?;
                }
                seq.end()
            }
        }

        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&Row(row))?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Matrix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MatrixVisitor;

        impl<'de> Visitor<'de> for MatrixVisitor {
            type Value = Vec<Vec<f64>>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a list of numeric rows")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut rows = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(row) = seq.next_element::<Vec<Cell>>()? {
                    rows.push(row.into_iter().map(|c| c.0).collect());
                }
                Ok(rows)
            }
        }

        let rows = deserializer.deserialize_seq(MatrixVisitor)?;
        Matrix::from_rows(rows).map_err(de::Error::custom)
    }
}

/// Convergence flag exactly as the solver reported it.
///
/// MatACDC-style solvers report `0`/`1`; others report a boolean. The
/// harness keeps whichever form arrived so the persisted store reproduces it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConvergenceFlag {
    Flag(bool),
    Code(i64),
    Value(f64),
}

impl ConvergenceFlag {
    /// `true`, or any nonzero number.
    pub fn is_converged(&self) -> bool {
        match *self {
            ConvergenceFlag::Flag(b) => b,
            ConvergenceFlag::Code(c) => c != 0,
            ConvergenceFlag::Value(v) => v != 0.0 && !v.is_nan(),
        }
    }
}

impl From<bool> for ConvergenceFlag {
    fn from(value: bool) -> Self {
        ConvergenceFlag::Flag(value)
    }
}

impl From<i64> for ConvergenceFlag {
    fn from(value: i64) -> Self {
        ConvergenceFlag::Code(value)
    }
}

impl fmt::Display for ConvergenceFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvergenceFlag::Flag(b) => write!(f, "{b}"),
            ConvergenceFlag::Code(c) => write!(f, "{c}"),
            ConvergenceFlag::Value(v) => write!(f, "{v}"),
        }
    }
}

/// AC side of a solved case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcResults {
    #[serde(rename = "baseMVA", with = "scalar")]
    pub base_mva: f64,
    pub bus: Matrix,
    pub gen: Matrix,
    pub branch: Matrix,
}

/// DC side of a solved case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DcResults {
    pub busdc: Matrix,
    pub convdc: Matrix,
    pub branchdc: Matrix,
}

/// Everything a solver returns on a normal (possibly non-converged) exit.
///
/// On the wire the AC and DC fields sit side by side in one flat object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOutcome {
    #[serde(flatten)]
    pub ac: AcResults,
    #[serde(flatten)]
    pub dc: DcResults,
    pub converged: ConvergenceFlag,
    #[serde(with = "scalar")]
    pub elapsed_seconds: f64,
}
