//! Print pagination.
//!
//! Rows are packed greedily onto sheets in input order. Each sheet repeats
//! the header band, so the space left for rows is the printable height
//! minus the measured header height. Row heights come from a
//! [`RowHeightMeasurer`], which keeps the packing independent of whatever
//! layout engine produces the final output.
//!
//! ```text
//! Start(sheet, row) -> MeasureHeader -> MeasureRow --fits--> MeasureRow(next)
//!                                            |
//!                                            +--overflow--> EmitSheet -> Start(sheet + 1, row)
//! ```

pub mod text;

use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{Column, Record, SheetGeometry, WidthUnit};

pub use text::TextMeasurer;

/// Slack allowed when checking whether a row still fits.
const FIT_EPSILON: f64 = 1e-9;

/// A shown column with its physical width.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutColumn {
    pub key: String,
    pub title: String,
    pub width_mm: f64,
}

/// Shown columns of a report, in display order, with widths in millimetres.
///
/// Percent widths are resolved against `content_width_mm`.
pub fn layout_columns(columns: &[Column], unit: WidthUnit, content_width_mm: f64) -> Vec<LayoutColumn> {
    columns
        .iter()
        .filter(|c| c.is_shown())
        .map(|c| LayoutColumn {
            key: c.key.clone(),
            title: c.title().to_string(),
            width_mm: match unit {
                WidthUnit::Millimeters => c.width,
                WidthUnit::Percent => c.width * content_width_mm / 100.0,
            },
        })
        .collect()
}

/// Measures rendered heights, in millimetres, in the target output medium.
pub trait RowHeightMeasurer {
    /// Height of the band repeated on every sheet.
    fn header_height(&self, columns: &[LayoutColumn]) -> f64;

    /// Height of one rendered record.
    fn row_height(&self, record: &Record, columns: &[LayoutColumn]) -> f64;
}

impl<M: RowHeightMeasurer + ?Sized> RowHeightMeasurer for &M {
    fn header_height(&self, columns: &[LayoutColumn]) -> f64 {
        (**self).header_height(columns)
    }

    fn row_height(&self, record: &Record, columns: &[LayoutColumn]) -> f64 {
        (**self).row_height(record, columns)
    }
}

/// One printed page: a contiguous run of rows `start..end`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub header_height_mm: f64,
    /// Header plus row heights.
    pub used_height_mm: f64,
    /// The sheet holds a single row taller than an empty sheet.
    pub overflowed: bool,
}

impl Sheet {
    pub fn rows<'r>(&self, records: &'r [Record]) -> &'r [Record] {
        &records[self.start..self.end]
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Paginate all records from the first sheet.
pub fn paginate<M: RowHeightMeasurer>(
    records: &[Record],
    columns: &[LayoutColumn],
    geometry: &SheetGeometry,
    measurer: &M,
) -> Vec<Sheet> {
    paginate_from(0, 0, records, columns, geometry, measurer)
}

/// Paginate records from `start_row` onward, numbering sheets from
/// `sheet_index`.
///
/// A row is moved to the next sheet only when it would leave negative
/// space; an exact fit stays. A row that does not fit even an empty sheet
/// is placed alone and the sheet is flagged `overflowed`. With no rows to
/// place a single empty sheet is produced.
pub fn paginate_from<M: RowHeightMeasurer>(
    sheet_index: usize,
    start_row: usize,
    records: &[Record],
    columns: &[LayoutColumn],
    geometry: &SheetGeometry,
    measurer: &M,
) -> Vec<Sheet> {
    let content_height = geometry.content().height_mm;
    let header_height = measurer.header_height(columns);
    let capacity = content_height - header_height;

    let mut sheets = Vec::new();
    let mut index = sheet_index;
    let mut row = start_row.min(records.len());

    loop {
        let start = row;
        let mut remaining = capacity;
        let mut overflowed = false;

        while row < records.len() {
            let height = measurer.row_height(&records[row], columns);
            if height > remaining + FIT_EPSILON {
                if row == start {
                    warn!(
                        row,
                        height_mm = height,
                        capacity_mm = capacity,
                        "row is taller than a sheet; placing it alone"
                    );
                    overflowed = true;
                    remaining -= height;
                    row += 1;
                }
                break;
            }
            remaining -= height;
            row += 1;
        }

        sheets.push(Sheet {
            index,
            start,
            end: row,
            header_height_mm: header_height,
            used_height_mm: header_height + (capacity - remaining),
            overflowed,
        });
        index += 1;

        if row >= records.len() {
            break;
        }
    }

    debug!(
        rows = records.len() - start_row.min(records.len()),
        sheets = sheets.len(),
        "paginated records"
    );
    sheets
}
