//! Export preview and result records to CSV or Excel.

use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, FormatBorder, Workbook};

use crate::batch_rename::preview::PreviewRecord;

const HEADERS: [&str; 5] = ["Index", "Matched key", "Source name", "Target name", "Status"];

/// Write records to `path`, choosing the format from the file extension.
/// Paths ending in `.xlsx` are written as Excel workbooks, anything else as CSV.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_report(records: &[PreviewRecord], path: &Path) -> Result<()> {
    let is_excel = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));

    let result = if is_excel {
        write_excel(records, path)
    } else {
        write_csv(records, path)
    };
    result.with_context(|| format!("Failed to write report: {}", path.display()))
}

fn row(record: &PreviewRecord) -> [String; 5] {
    [
        record.index.to_string(),
        record.key_label().to_string(),
        record.source_name.clone(),
        record.target_name.clone(),
        record.outcome.to_string(),
    ]
}

fn write_csv(records: &[PreviewRecord], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADERS)?;
    for record in records {
        writer.write_record(row(record))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_excel(records: &[PreviewRecord], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet().set_name("Rename")?;
    let header_format = Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_background_color("C6E0B4");

    for (col, header) in (0u16..).zip(HEADERS) {
        sheet.write_string_with_format(0, col, header, &header_format)?;
    }
    for (row_number, record) in (1u32..).zip(records) {
        sheet.write_number(row_number, 0, u32::try_from(record.index)?)?;
        for (col, value) in (1u16..).zip(row(record).into_iter().skip(1)) {
            sheet.write_string(row_number, col, value)?;
        }
    }
    sheet.autofit();

    workbook.save(path)?;
    Ok(())
}
