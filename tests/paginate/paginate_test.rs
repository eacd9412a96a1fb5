use folio::model::{Column, PaperSize, Record, SheetGeometry, WidthUnit};
use folio::paginate::{
    layout_columns, paginate, paginate_from, LayoutColumn, RowHeightMeasurer, TextMeasurer,
};
use serde_json::{json, Value};

/// Fixed header height; each row declares its own height in `h`.
struct Declared {
    header: f64,
}

impl RowHeightMeasurer for Declared {
    fn header_height(&self, _: &[LayoutColumn]) -> f64 {
        self.header
    }

    fn row_height(&self, record: &Record, _: &[LayoutColumn]) -> f64 {
        record.get("h").and_then(Value::as_f64).unwrap_or(0.0)
    }
}

fn rows(heights: &[f64]) -> Vec<Record> {
    heights
        .iter()
        .enumerate()
        .map(|(i, h)| {
            json!({"id": i, "h": h})
                .as_object()
                .cloned()
                .unwrap_or_default()
        })
        .collect()
}

/// A5 portrait with 55mm padding leaves a 100mm tall content area.
fn hundred_mm() -> SheetGeometry {
    let geometry = SheetGeometry::new(PaperSize::A5, false, 55.0);
    assert_eq!(geometry.content().height_mm, 100.0);
    geometry
}

#[test]
fn test_exact_fit_stays_on_sheet() {
    let records = rows(&[10.0; 9]);
    let sheets = paginate(&records, &[], &hundred_mm(), &Declared { header: 20.0 });

    assert_eq!(sheets.len(), 2);
    assert_eq!((sheets[0].start, sheets[0].end), (0, 8));
    assert_eq!((sheets[1].start, sheets[1].end), (8, 9));
    assert_eq!(sheets[0].used_height_mm, 100.0);
    assert_eq!(sheets[1].used_height_mm, 30.0);
    assert!(sheets.iter().all(|s| s.header_height_mm == 20.0));
    assert!(sheets.iter().all(|s| !s.overflowed));
}

#[test]
fn test_sheets_reconstruct_input() {
    let heights = [12.0, 30.5, 7.0, 44.0, 1.0, 19.5, 25.0, 25.0, 25.0, 3.0, 60.0, 2.0];
    let records = rows(&heights);
    let measurer = Declared { header: 15.0 };
    let sheets = paginate(&records, &[], &hundred_mm(), &measurer);

    let rebuilt: Vec<Record> = sheets
        .iter()
        .flat_map(|s| s.rows(&records).iter().cloned())
        .collect();
    assert_eq!(rebuilt, records);

    for (i, sheet) in sheets.iter().enumerate() {
        assert_eq!(sheet.index, i);
        assert!(!sheet.is_empty());
        assert!(sheet.used_height_mm <= 100.0 + 1e-9);
        if i > 0 {
            assert_eq!(sheet.start, sheets[i - 1].end);
        }
    }

    let again = paginate(&records, &[], &hundred_mm(), &measurer);
    assert_eq!(sheets, again);
}

#[test]
fn test_oversized_row_is_placed_alone() {
    let records = rows(&[10.0, 95.0, 10.0]);
    let sheets = paginate(&records, &[], &hundred_mm(), &Declared { header: 20.0 });

    assert_eq!(sheets.len(), 3);
    assert_eq!(sheets[1].len(), 1);
    assert_eq!(sheets[1].start, 1);
    assert!(sheets[1].overflowed);
    assert_eq!(sheets[1].used_height_mm, 115.0);
    assert!(!sheets[0].overflowed && !sheets[2].overflowed);
}

#[test]
fn test_empty_input_yields_one_sheet() {
    let sheets = paginate(&[], &[], &hundred_mm(), &Declared { header: 20.0 });
    assert_eq!(sheets.len(), 1);
    assert!(sheets[0].is_empty());
    assert_eq!(sheets[0].used_height_mm, 20.0);
}

#[test]
fn test_resume_from_row() {
    let records = rows(&[40.0; 6]);
    let measurer = Declared { header: 20.0 };
    let full = paginate(&records, &[], &hundred_mm(), &measurer);
    assert_eq!(full.len(), 3);

    let tail = paginate_from(1, full[1].start, &records, &[], &hundred_mm(), &measurer);
    assert_eq!(tail, full[1..].to_vec());
}

#[test]
fn test_layout_columns_from_report_widths() {
    let columns = vec![
        Column::new("a", "Int").named("Alpha").enabled(true).active(true).width(25.0),
        Column::new("b", "Int").enabled(true).active(false).width(50.0),
        Column::new("c", "Int").enabled(true).active(true).width(75.0),
    ];

    let mm = layout_columns(&columns, WidthUnit::Millimeters, 190.0);
    assert_eq!(mm.len(), 2);
    assert_eq!(mm[0].title, "Alpha");
    assert_eq!(mm[1].title, "c");
    assert_eq!(mm[1].width_mm, 75.0);

    let pct = layout_columns(&columns, WidthUnit::Percent, 200.0);
    assert_eq!(pct[0].width_mm, 50.0);
    assert_eq!(pct[1].width_mm, 150.0);
}

#[test]
fn test_text_measurer_paginates_wrapped_rows() {
    // 2mm per character, 5mm lines, 1mm cell padding, no bands.
    let measurer = TextMeasurer {
        char_width_mm: 2.0,
        line_height_mm: 5.0,
        cell_padding_mm: 1.0,
        title_band_mm: 0.0,
        footer_band_mm: 0.0,
    };
    let columns = vec![LayoutColumn {
        key: "text".to_string(),
        title: "Text".to_string(),
        width_mm: 22.0,
    }];
    let text = |s: &str| -> Record {
        json!({"text": s}).as_object().cloned().unwrap_or_default()
    };
    // 10 characters per line: 1 line = 7mm, 5 lines = 27mm
    let records = vec![
        text("short"),
        text("one two three four five six seven eight nine"),
        text("<b>bold</b>"),
    ];
    assert_eq!(measurer.row_height(&records[0], &columns), 7.0);
    assert_eq!(measurer.row_height(&records[1], &columns), 27.0);
    assert_eq!(measurer.header_height(&columns), 7.0);

    // 38 x 100 content; 93mm left for rows.
    let sheets = paginate(&records, &columns, &hundred_mm(), &measurer);
    assert_eq!(sheets.len(), 1);
    assert_eq!(sheets[0].used_height_mm, 7.0 + 7.0 + 27.0 + 7.0);
}
