use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};

use crate::error::ResultsError;
use crate::model::{MarkGrid, MarkValue, TableCell};

const IDENTIFIER_WIDTH: f64 = 14.0;
const SUBJECT_WIDTH: f64 = 11.0;

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_background_color(rust_xlsxwriter::Color::RGB(0x1F_4E_79))
        .set_font_color(rust_xlsxwriter::Color::RGB(0xFF_FF_FF))
}

fn column_index(index: usize) -> Result<u16, ResultsError> {
    u16::try_from(index)
        .map_err(|_| ResultsError::InvalidTable(format!("column {index} exceeds the sheet width")))
}

fn row_index(index: usize) -> Result<u32, ResultsError> {
    u32::try_from(index)
        .map_err(|_| ResultsError::InvalidTable(format!("row {index} exceeds the sheet height")))
}

#[allow(clippy::cast_precision_loss)]
fn fill_sheet<T: MarkGrid>(
    worksheet: &mut Worksheet,
    sheet_name: &str,
    table: &T,
) -> Result<(), ResultsError> {
    worksheet.set_name(sheet_name)?;

    let header = header_format();
    let centered = Format::new().set_align(FormatAlign::Center);

    for (index, title) in table.header().iter().enumerate() {
        let col = column_index(index)?;
        worksheet.write_string_with_format(0, col, title, &header)?;
        let width = if col == 0 { IDENTIFIER_WIDTH } else { SUBJECT_WIDTH };
        worksheet.set_column_width(col, width)?;
    }

    for (index, row) in table.rows().iter().enumerate() {
        let excel_row = row_index(index + 1)?;
        worksheet.write_string(excel_row, 0, &row.usn)?;
        for (cell_index, cell) in row.cells.iter().enumerate() {
            let col = column_index(cell_index + 1)?;
            match cell {
                TableCell::Mark(MarkValue::Numeric(value)) => {
                    worksheet.write_number_with_format(excel_row, col, *value as f64, &centered)?;
                }
                TableCell::Mark(MarkValue::Symbolic(_)) | TableCell::Missing => {
                    worksheet.write_string_with_format(
                        excel_row,
                        col,
                        cell.to_string(),
                        &centered,
                    )?;
                }
            }
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn build_workbook<T: MarkGrid>(table: &T, sheet_name: &str) -> Result<Workbook, ResultsError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    fill_sheet(worksheet, sheet_name, table)?;
    Ok(workbook)
}

pub(crate) fn write_xlsx<T: MarkGrid>(
    path: &Path,
    table: &T,
    sheet_name: &str,
) -> Result<(), ResultsError> {
    let mut workbook = build_workbook(table, sheet_name)?;
    workbook.save(path)?;
    Ok(())
}

pub(crate) fn write_xlsx_to_bytes<T: MarkGrid>(
    table: &T,
    sheet_name: &str,
) -> Result<Vec<u8>, ResultsError> {
    let mut workbook = build_workbook(table, sheet_name)?;
    Ok(workbook.save_to_buffer()?)
}
