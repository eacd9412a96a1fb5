//! Text-metric row measurer.
//!
//! Approximates the printed height of a row by word-wrapping each cell's
//! text into its column width using a fixed character advance. Display width
//! follows Unicode East Asian width rules, so wide characters count double.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

use super::{LayoutColumn, RowHeightMeasurer};
use crate::config::PrintSettings;
use crate::filter::display_value;
use crate::model::Record;

static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</(p|div|li|tr)>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Measures rows with fixed text metrics, in millimetres.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMeasurer {
    pub char_width_mm: f64,
    pub line_height_mm: f64,
    pub cell_padding_mm: f64,
    pub title_band_mm: f64,
    pub footer_band_mm: f64,
}

impl Default for TextMeasurer {
    fn default() -> Self {
        Self::from(&PrintSettings::default())
    }
}

impl From<&PrintSettings> for TextMeasurer {
    fn from(settings: &PrintSettings) -> Self {
        Self {
            char_width_mm: settings.char_width_mm,
            line_height_mm: settings.line_height_mm,
            cell_padding_mm: settings.cell_padding_mm,
            title_band_mm: settings.title_band_mm,
            footer_band_mm: settings.footer_band_mm,
        }
    }
}

impl TextMeasurer {
    /// Characters that fit on one line of a cell `width_mm` wide.
    fn capacity(&self, width_mm: f64) -> usize {
        let usable = width_mm - 2.0 * self.cell_padding_mm;
        ((usable / self.char_width_mm).floor() as usize).max(1)
    }

    /// Number of wrapped lines `text` occupies in a cell `width_mm` wide.
    pub fn line_count(&self, text: &str, width_mm: f64) -> usize {
        let capacity = self.capacity(width_mm);
        plain_text(text)
            .split('\n')
            .map(|paragraph| wrap_count(paragraph, capacity))
            .sum::<usize>()
            .max(1)
    }

    pub fn cell_height(&self, text: &str, width_mm: f64) -> f64 {
        self.line_count(text, width_mm) as f64 * self.line_height_mm + 2.0 * self.cell_padding_mm
    }

    fn single_line(&self) -> f64 {
        self.line_height_mm + 2.0 * self.cell_padding_mm
    }
}

impl RowHeightMeasurer for TextMeasurer {
    /// Title band, column header row and footer band.
    fn header_height(&self, columns: &[LayoutColumn]) -> f64 {
        let header_row = columns
            .iter()
            .map(|c| self.cell_height(&c.title, c.width_mm))
            .fold(self.single_line(), f64::max);
        self.title_band_mm + header_row + self.footer_band_mm
    }

    fn row_height(&self, record: &Record, columns: &[LayoutColumn]) -> f64 {
        columns
            .iter()
            .map(|c| {
                let text = match record.get(&c.key) {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => display_value(other),
                    None => String::new(),
                };
                self.cell_height(&text, c.width_mm)
            })
            .fold(self.single_line(), f64::max)
    }
}

/// Strip markup, turning block breaks into newlines and decoding the
/// common entities.
pub fn plain_text(markup: &str) -> String {
    let broken = LINE_BREAK.replace_all(markup, "\n");
    let stripped = TAG.replace_all(&broken, "");
    stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Greedy word wrap; words longer than a line are split across lines.
fn wrap_count(paragraph: &str, capacity: usize) -> usize {
    let mut lines = 1;
    let mut used = 0;

    for word in paragraph.split_whitespace() {
        let width = UnicodeWidthStr::width(word);
        let needed = if used == 0 { width } else { used + 1 + width };

        if needed <= capacity {
            used = needed;
            continue;
        }

        if used > 0 {
            lines += 1;
        }
        if width > capacity {
            lines += (width - 1) / capacity;
            used = width - (width - 1) / capacity * capacity;
        } else {
            used = width;
        }
    }

    lines
}
