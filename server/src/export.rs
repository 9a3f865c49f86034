//! Spreadsheet rendering for the reportes export endpoint.
//!
//! Layout: three merged banner rows (username, title, date range), a blank
//! spacer, a bold header row, the data rows and an optional totals row.
//! Columns listed in `currency_cols` get a `#,##0.00` number format.

use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet, XlsxError};
use serde_json::Value;

const COLUMN_WIDTH: f64 = 16.0;
const HEADER_ROW: u32 = 4;

pub struct ReportSheet<'a> {
    pub username: &'a str,
    pub title: &'a str,
    pub date_range: &'a str,
    pub headers: &'a [String],
    pub rows: &'a [Vec<Value>],
    pub currency_cols: &'a [usize],
    pub totals: Option<&'a [Value]>,
}

pub fn build_workbook(sheet: &ReportSheet<'_>) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    ws.set_name("Reportes")?;

    let last_col = sheet.headers.len().saturating_sub(1) as u16;

    let banner = Format::new().set_bold().set_align(FormatAlign::Center);
    let header = Format::new().set_bold().set_align(FormatAlign::Center);
    let currency = Format::new()
        .set_num_format("#,##0.00")
        .set_align(FormatAlign::Right);
    let totals_text = Format::new().set_bold();
    let totals_currency = Format::new()
        .set_bold()
        .set_num_format("#,##0.00")
        .set_align(FormatAlign::Right);

    write_banner(ws, 0, last_col, sheet.username, &banner)?;
    write_banner(ws, 1, last_col, sheet.title, &banner)?;
    write_banner(ws, 2, last_col, sheet.date_range, &banner)?;

    for (col, name) in sheet.headers.iter().enumerate() {
        ws.write_string_with_format(HEADER_ROW, col as u16, name, &header)?;
    }

    let mut row_idx = HEADER_ROW + 1;
    for row in sheet.rows {
        for (col, value) in row.iter().enumerate() {
            let format = sheet.currency_cols.contains(&col).then_some(&currency);
            write_value(ws, row_idx, col as u16, value, format)?;
        }
        row_idx += 1;
    }

    if let Some(totals) = sheet.totals {
        for (col, value) in totals.iter().enumerate() {
            let format = if sheet.currency_cols.contains(&col) {
                &totals_currency
            } else {
                &totals_text
            };
            write_value(ws, row_idx, col as u16, value, Some(format))?;
        }
    }

    for col in 0..=last_col {
        ws.set_column_width(col, COLUMN_WIDTH)?;
    }

    workbook.save_to_buffer()
}

fn write_banner(
    ws: &mut Worksheet,
    row: u32,
    last_col: u16,
    text: &str,
    format: &Format,
) -> Result<(), XlsxError> {
    // merge_range needs at least two cells
    if last_col > 0 {
        ws.merge_range(row, 0, row, last_col, text, format)?;
    } else {
        ws.write_string_with_format(row, 0, text, format)?;
    }
    Ok(())
}

fn write_value(
    ws: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
    format: Option<&Format>,
) -> Result<(), XlsxError> {
    match (value, format) {
        (Value::Null, _) => {}
        (Value::Number(n), Some(f)) => {
            ws.write_number_with_format(row, col, n.as_f64().unwrap_or(0.0), f)?;
        }
        (Value::Number(n), None) => {
            ws.write_number(row, col, n.as_f64().unwrap_or(0.0))?;
        }
        (Value::Bool(b), Some(f)) => {
            ws.write_boolean_with_format(row, col, *b, f)?;
        }
        (Value::Bool(b), None) => {
            ws.write_boolean(row, col, *b)?;
        }
        (Value::String(s), Some(f)) => {
            ws.write_string_with_format(row, col, s, f)?;
        }
        (Value::String(s), None) => {
            ws.write_string(row, col, s)?;
        }
        (other, Some(f)) => {
            ws.write_string_with_format(row, col, other.to_string(), f)?;
        }
        (other, None) => {
            ws.write_string(row, col, other.to_string())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_sheet<'a>(headers: &'a [String], rows: &'a [Vec<Value>]) -> ReportSheet<'a> {
        ReportSheet {
            username: "alice",
            title: "Reporte General",
            date_range: "2026-05-01 - 2026-05-31",
            headers,
            rows,
            currency_cols: &[2],
            totals: None,
        }
    }

    #[test]
    fn produces_xlsx_zip_container() {
        let headers = vec!["Fecha".to_string(), "Obra".to_string(), "Total".to_string()];
        let rows = vec![vec![json!("2026-05-01"), json!("Torre A"), json!(1250.5)]];

        let bytes = build_workbook(&sample_sheet(&headers, &rows)).unwrap();
        // xlsx is a zip archive: local file header magic
        assert_eq!(&bytes[..4], b"PK\x03\x04");
    }

    #[test]
    fn single_column_sheet_builds() {
        let headers = vec!["Obra".to_string()];
        let rows = vec![vec![json!("Torre A")]];

        build_workbook(&sample_sheet(&headers, &rows)).expect("single-column sheet should build");
    }

    #[test]
    fn totals_row_and_mixed_values_build() {
        let headers = vec!["Obra".to_string(), "Pagado".to_string(), "Monto".to_string()];
        let rows = vec![
            vec![json!("Torre A"), json!(true), json!(10.0)],
            vec![json!(null), json!(false), json!(5)],
        ];
        let totals = vec![json!("Total"), json!(null), json!(15.0)];

        let sheet = ReportSheet {
            totals: Some(&totals),
            ..sample_sheet(&headers, &rows)
        };
        let bytes = build_workbook(&sheet).unwrap();
        assert!(!bytes.is_empty());
    }
}
