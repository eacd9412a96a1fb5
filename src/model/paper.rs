//! Physical paper geometry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaperSize {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
}

/// Paper dimensions in millimetres, portrait orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperDimensions {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PaperDimensions {
    /// Swap axes for landscape orientation.
    pub fn oriented(self, landscape: bool) -> Self {
        if landscape {
            Self {
                width_mm: self.height_mm,
                height_mm: self.width_mm,
            }
        } else {
            self
        }
    }

    /// Area left after removing `padding_mm` from every edge.
    pub fn inset(self, padding_mm: f64) -> Self {
        Self {
            width_mm: self.width_mm - 2.0 * padding_mm,
            height_mm: self.height_mm - 2.0 * padding_mm,
        }
    }
}

impl PaperSize {
    pub const ALL: [PaperSize; 5] = [
        PaperSize::A3,
        PaperSize::A4,
        PaperSize::A5,
        PaperSize::Letter,
        PaperSize::Legal,
    ];

    pub fn dimensions(&self) -> PaperDimensions {
        let (width_mm, height_mm) = match self {
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::Letter => (216.0, 279.0),
            PaperSize::Legal => (216.0, 356.0),
        };
        PaperDimensions {
            width_mm,
            height_mm,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaperSize::A3 => "A3",
            PaperSize::A4 => "A4",
            PaperSize::A5 => "A5",
            PaperSize::Letter => "Letter",
            PaperSize::Legal => "Legal",
        }
    }

    /// Parse a paper size name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Oriented, padded sheet geometry for one report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetGeometry {
    pub paper: PaperSize,
    pub landscape: bool,
    pub padding_mm: f64,
}

impl SheetGeometry {
    pub fn new(paper: PaperSize, landscape: bool, padding_mm: f64) -> Self {
        Self {
            paper,
            landscape,
            padding_mm,
        }
    }

    /// Full page size, oriented.
    pub fn page(&self) -> PaperDimensions {
        self.paper.dimensions().oriented(self.landscape)
    }

    /// Printable area inside the padding.
    pub fn content(&self) -> PaperDimensions {
        self.page().inset(self.padding_mm)
    }
}
