//! Line-oriented result report
//!
//! Every record is `key<TAB>value<LF>`. Matrices are rendered inline as
//! nested lists, e.g. `output\t[[19,22],[43,50]]`. Matrices only appear when
//! they are small enough to read; the gates are the `*_displayable` functions.
//! A blank line ends the report.

use std::fmt::Display;
use std::io::{self, Write};
use std::time::Duration;

use crate::problem::ErrorMap;
use crate::verify::{Outcome, RegularVerdict, TiledVerdict};
use crate::{I8mmError, Problem, Result};

/// Largest dimension shown in a matrix dump
pub const DISPLAY_MAX_DIM: usize = 17;

/// Largest element count shown in a matrix dump
pub const DISPLAY_MAX_ELEMENTS: usize = 128;

/// Exclusive dimension bound for a locations-only dump
pub const LOCATIONS_MAX_DIM: usize = 60;

/// Whether `A` and `B` are small enough to print
pub fn inputs_displayable(p: &Problem) -> bool {
    p.m() <= DISPLAY_MAX_DIM
        && p.n() <= DISPLAY_MAX_DIM
        && p.k() <= DISPLAY_MAX_DIM
        && p.m() * p.k() <= DISPLAY_MAX_ELEMENTS
        && p.k() * p.n() <= DISPLAY_MAX_ELEMENTS
}

/// Whether `C` (and its error map) is small enough to print
pub fn output_displayable(p: &Problem) -> bool {
    p.m() <= DISPLAY_MAX_DIM
        && p.n() <= DISPLAY_MAX_DIM
        && p.m() * p.n() <= DISPLAY_MAX_ELEMENTS
}

/// Whether an error map alone is small enough to print
pub fn locations_displayable(p: &Problem) -> bool {
    p.m() < LOCATIONS_MAX_DIM && p.n() < LOCATIONS_MAX_DIM
}

/// Writes report records to a sink
pub struct ReportWriter<W: Write> {
    sink: W,
}

impl<W: Write> ReportWriter<W> {
    /// Wraps a sink
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Writes `key\tvalue`
    pub fn field(&mut self, key: &str, value: impl Display) -> Result<()> {
        writeln!(self.sink, "{key}\t{value}").map_err(I8mmError::Report)
    }

    /// Writes `key\t[[..],..]` for a row-major `rows × cols` matrix
    pub fn matrix<T: Display>(
        &mut self,
        key: &str,
        rows: usize,
        cols: usize,
        data: &[T],
    ) -> Result<()> {
        debug_assert_eq!(data.len(), rows * cols);
        write_matrix(&mut self.sink, key, cols, data).map_err(I8mmError::Report)
    }

    /// Writes the kernel wall time in seconds
    pub fn time(&mut self, elapsed: Duration) -> Result<()> {
        self.field("time", format_args!("{:.9}", elapsed.as_secs_f64()))
    }

    /// Writes `m`, `n` and `k`
    pub fn shape(&mut self, p: &Problem) -> Result<()> {
        self.field("m", p.m())?;
        self.field("n", p.n())?;
        self.field("k", p.k())
    }

    /// Writes `result\tdone` for an unverified run
    pub fn done(&mut self) -> Result<()> {
        self.field("result", "done")
    }

    /// Writes the verdict and, on failure, its diagnostics
    pub fn outcome(
        &mut self,
        problem: &Problem,
        output: &[i32],
        outcome: &Outcome,
    ) -> Result<()> {
        if outcome.passed() {
            return self.field("result", "pass");
        }
        self.field("result", "fail")?;
        self.field("size", outcome.size_class())?;
        match outcome {
            Outcome::Regular(v) => self.regular_failure(problem, output, v),
            Outcome::Tiled(v) => self.tiled_failure(v),
        }
    }

    /// Ends the report and flushes the sink
    pub fn finish(mut self) -> Result<W> {
        writeln!(self.sink)
            .and_then(|()| self.sink.flush())
            .map_err(I8mmError::Report)?;
        Ok(self.sink)
    }

    fn inputs(&mut self, p: &Problem) -> Result<()> {
        if inputs_displayable(p) {
            self.matrix("input_a", p.m(), p.k(), p.a())?;
            self.matrix("input_b", p.k(), p.n(), p.b())?;
        }
        Ok(())
    }

    fn locations(&mut self, errors: &ErrorMap) -> Result<()> {
        self.matrix("locations", errors.rows(), errors.cols(), errors.as_slice())
    }

    fn regular_failure(
        &mut self,
        p: &Problem,
        output: &[i32],
        v: &RegularVerdict,
    ) -> Result<()> {
        self.inputs(p)?;
        if output_displayable(p) {
            self.matrix("output", p.m(), p.n(), output)?;
            if let Some(errors) = &v.errors {
                self.locations(errors)?;
            }
        } else if let Some(errors) = &v.errors {
            if locations_displayable(p) {
                self.locations(errors)?;
            }
        }
        Ok(())
    }

    fn tiled_failure(&mut self, v: &TiledVerdict) -> Result<()> {
        self.field("tile_size", v.tile_size)?;
        let small = &v.reduced;
        self.inputs(small)?;
        if output_displayable(small) {
            self.matrix("output", small.m(), small.n(), &v.reduced_output)?;
            self.locations(&v.errors)?;
        }
        Ok(())
    }
}

fn write_matrix<W: Write, T: Display>(
    sink: &mut W,
    key: &str,
    cols: usize,
    data: &[T],
) -> io::Result<()> {
    write!(sink, "{key}\t[")?;
    for (i, row) in data.chunks(cols.max(1)).enumerate() {
        if i > 0 {
            write!(sink, ",")?;
        }
        write!(sink, "[")?;
        for (j, v) in row.iter().enumerate() {
            if j > 0 {
                write!(sink, ",")?;
            }
            write!(sink, "{v}")?;
        }
        write!(sink, "]")?;
    }
    writeln!(sink, "]")
}
