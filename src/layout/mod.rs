//! Column layout of a report: activation, ordering and width allocation.
//!
//! Columns are addressed by key rather than position. Mutations work on an
//! owned copy of the report's column list; callers write the result back
//! with [`ColumnLayout::into_columns`] once they are done.

use std::fmt;

use crate::model::{Column, PaperSize, Report, SheetGeometry, WidthUnit};

/// Tolerance used when comparing width totals.
pub const WIDTH_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("report has no column '{0}'")]
    UnknownColumn(String),

    #[error("invalid width {width} for column '{key}'")]
    InvalidWidth { key: String, width: f64 },
}

pub type LayoutResult<T> = Result<T, LayoutError>;

/// Direction of a [`ColumnLayout::reorder`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Editable column list of one report.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnLayout {
    columns: Vec<Column>,
}

impl ColumnLayout {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn from_report(report: &Report) -> Self {
        Self::new(report.columns.clone())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    fn position(&self, key: &str) -> LayoutResult<usize> {
        self.columns
            .iter()
            .position(|c| c.key == key)
            .ok_or_else(|| LayoutError::UnknownColumn(key.to_string()))
    }

    pub fn set_active(&mut self, key: &str, active: bool) -> LayoutResult<()> {
        let idx = self.position(key)?;
        self.columns[idx].active = active;
        Ok(())
    }

    pub fn set_width(&mut self, key: &str, width: f64) -> LayoutResult<()> {
        if !width.is_finite() || width < 0.0 {
            return Err(LayoutError::InvalidWidth {
                key: key.to_string(),
                width,
            });
        }
        let idx = self.position(key)?;
        self.columns[idx].width = width;
        Ok(())
    }

    /// Move a column past its nearest active neighbour in `direction`.
    ///
    /// Inactive columns in between are skipped over, not swapped with.
    /// Returns `false` when there is no active neighbour on that side.
    pub fn reorder(&mut self, key: &str, direction: Direction) -> LayoutResult<bool> {
        let idx = self.position(key)?;

        let target = match direction {
            Direction::Down => self
                .columns
                .iter()
                .enumerate()
                .skip(idx + 1)
                .find(|(_, c)| c.active)
                .map(|(i, _)| i),
            Direction::Up => self.columns[..idx].iter().rposition(|c| c.active),
        };

        let Some(target) = target else {
            return Ok(false);
        };

        let column = self.columns.remove(idx);
        self.columns.insert(target, column);
        Ok(true)
    }

    /// Sum of widths over columns that are active and enabled.
    pub fn active_width_total(&self) -> f64 {
        active_width_total(&self.columns)
    }
}

/// Width the shown columns of a report must add up to.
///
/// Millimetre mode yields the printable width of the oriented page;
/// percent mode always yields 100.
pub fn expected_width(paper: PaperSize, landscape: bool, padding_mm: f64, unit: WidthUnit) -> f64 {
    match unit {
        WidthUnit::Millimeters => SheetGeometry::new(paper, landscape, padding_mm)
            .content()
            .width_mm,
        WidthUnit::Percent => 100.0,
    }
}

pub fn active_width_total(columns: &[Column]) -> f64 {
    columns.iter().filter(|c| c.is_shown()).map(|c| c.width).sum()
}

/// Shown column widths do not add up to the printable width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthMismatch {
    pub expected: f64,
    pub actual: f64,
    pub unit: WidthUnit,
}

impl fmt::Display for WidthMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let delta = self.expected - self.actual;
        let (amount, side) = if delta > 0.0 {
            (delta, "short")
        } else {
            (-delta, "over")
        };
        write!(
            f,
            "column widths total {}{} but must total {}{} ({}{} {})",
            trim(self.actual),
            self.unit.suffix(),
            trim(self.expected),
            self.unit.suffix(),
            trim(amount),
            self.unit.suffix(),
            side
        )
    }
}

fn trim(n: f64) -> String {
    let rounded = (n * 1000.0).round() / 1000.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}", rounded)
    } else {
        rounded.to_string()
    }
}

/// Check the width invariant of a report.
pub fn validate_widths(report: &Report) -> Result<(), WidthMismatch> {
    let expected = expected_width(
        report.paper_size,
        report.is_landscape,
        report.padding,
        report.width_unit,
    );
    let actual = active_width_total(&report.columns);
    if (expected - actual).abs() <= WIDTH_TOLERANCE {
        Ok(())
    } else {
        Err(WidthMismatch {
            expected,
            actual,
            unit: report.width_unit,
        })
    }
}
