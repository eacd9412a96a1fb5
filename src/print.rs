//! HTML print surface.
//!
//! Every [`Sheet`] becomes one physically sized `<section>` with the report
//! title, a repeated column header, its rows and a page-number footer.
//! Rendered cell content is embedded as markup; titles are escaped.

use serde::Serialize;
use serde_json::Value;

use crate::filter::display_value;
use crate::model::{Record, SheetGeometry};
use crate::paginate::{LayoutColumn, Sheet};
use crate::render::helpers::escape_html;

/// A paginated report ready to print.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintJob {
    pub title: String,
    #[serde(skip)]
    pub geometry: SheetGeometry,
    pub columns: Vec<LayoutColumn>,
    pub sheets: Vec<Sheet>,
    pub records: Vec<Record>,
}

impl PrintJob {
    pub fn page_count(&self) -> usize {
        self.sheets.len()
    }

    /// Records of one sheet.
    pub fn sheet_rows(&self, sheet: &Sheet) -> &[Record] {
        sheet.rows(&self.records)
    }

    pub fn render_html(&self) -> String {
        render_html(
            &self.title,
            &self.sheets,
            &self.records,
            &self.columns,
            &self.geometry,
        )
    }
}

/// Render sheets as a standalone printable HTML document.
pub fn render_html(
    title: &str,
    sheets: &[Sheet],
    records: &[Record],
    columns: &[LayoutColumn],
    geometry: &SheetGeometry,
) -> String {
    let page = geometry.page();
    let title = escape_html(title);
    let total = sheets.len();

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", title));
    html.push_str(&format!(
        r#"<style>
@page {{ size: {w}mm {h}mm; margin: 0; }}
body {{ margin: 0; font-size: 10px; font-family: sans-serif; }}
.sheet {{ width: {w}mm; height: {h}mm; padding: {p}mm; box-sizing: border-box; overflow: hidden; display: flex; flex-direction: column; page-break-after: always; }}
.sheet:last-child {{ page-break-after: auto; }}
.title {{ text-align: center; font-weight: bold; }}
.row {{ display: flex; border-bottom: 1px solid rgba(0,0,0,0.3); }}
.cell {{ flex-shrink: 0; overflow: hidden; box-sizing: border-box; }}
.body {{ flex: 1; }}
.footer {{ text-align: right; }}
</style>
"#,
        w = page.width_mm,
        h = page.height_mm,
        p = geometry.padding_mm
    ));
    html.push_str("</head>\n<body>\n");

    for sheet in sheets {
        html.push_str(&format!(
            "<section class=\"sheet {}{}\">\n",
            geometry.paper,
            if geometry.landscape { " landscape" } else { "" }
        ));
        html.push_str(&format!("<div class=\"title\">{}</div>\n", title));

        html.push_str("<div class=\"row header\">");
        for column in columns {
            html.push_str(&format!(
                "<div class=\"cell\" style=\"width: {}mm\">{}</div>",
                column.width_mm,
                escape_html(&column.title)
            ));
        }
        html.push_str("</div>\n<div class=\"body\">\n");

        for record in sheet.rows(records) {
            html.push_str("<div class=\"row\">");
            for column in columns {
                html.push_str(&format!(
                    "<div class=\"cell\" style=\"width: {}mm\">{}</div>",
                    column.width_mm,
                    cell_markup(record.get(&column.key))
                ));
            }
            html.push_str("</div>\n");
        }

        html.push_str("</div>\n");
        html.push_str(&format!(
            "<div class=\"footer\">Page {} of {}</div>\n</section>\n",
            sheet.index + 1,
            total
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Rendered strings are trusted markup; other values are escaped text.
fn cell_markup(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => escape_html(&display_value(other)),
        None => String::new(),
    }
}
