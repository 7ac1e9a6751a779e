use rust_xlsxwriter::{Format, Workbook};
use tracing::debug;

use crate::{
    error::AppError,
    models::{
        session::Session,
        trip::{CellValue, COLUMN_HEADERS},
    },
};

pub const SHEET_NAME: &str = "Ritadministratie";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const SOURCE_EXTENSION: &str = ".xml";
const OUTPUT_SUFFIX: &str = "_output.xlsx";

#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// `trips.xml` becomes `trips_output.xlsx`; names without `.xml` get the suffix appended.
pub fn output_filename(source: &str) -> String {
    let cut = source.len().saturating_sub(SOURCE_EXTENSION.len());
    match source.get(cut..) {
        Some(ext) if ext.eq_ignore_ascii_case(SOURCE_EXTENSION) => {
            format!("{}{OUTPUT_SUFFIX}", &source[..cut])
        }
        _ => format!("{source}{OUTPUT_SUFFIX}"),
    }
}

/// Writes every record of the session, unfiltered and in document order.
pub fn export_session(session: &Session) -> Result<ExportFile, AppError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in COLUMN_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (index, record) in session.records().iter().enumerate() {
        let row = u32::try_from(index + 1)
            .map_err(|_| AppError::Export("te veel ritten voor één werkblad".into()))?;
        for (col, cell) in record.cells().into_iter().enumerate() {
            let col = col as u16;
            match cell {
                CellValue::Text(text) => {
                    worksheet.write_string(row, col, text)?;
                }
                CellValue::Number(number) => {
                    worksheet.write_number(row, col, number)?;
                }
                CellValue::Empty => {}
            }
        }
    }
    worksheet.autofit();

    let bytes = workbook.save_to_buffer()?;
    debug!(
        session_id = %session.id(),
        rows = session.total_records(),
        bytes = bytes.len(),
        "exported session"
    );

    Ok(ExportFile {
        filename: output_filename(session.source_filename()),
        bytes,
    })
}
