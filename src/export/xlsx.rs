use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use std::path::Path;

use crate::models::{CartItem, CartTable, CartVariant};

pub const XLSX_FILE_NAME: &str = "cart_items.xlsx";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const SHEET_NAME: &str = "장바구니";

const HEADER_FILL: u32 = 0xD9E1F2;
const NAME_WIDTH: f64 = 40.0;
const SPEC_WIDTH: f64 = 24.0;
const NUMBER_WIDTH: f64 = 14.0;

enum Cell<'a> {
    Text(&'a str),
    Number(i64),
    Blank,
}

/// 변형별 컬럼 순서대로 한 행의 값 (마지막은 금액)
fn row_cells(item: &CartItem, variant: CartVariant) -> Vec<Cell<'_>> {
    let mut cells = match variant {
        CartVariant::Basic => vec![
            Cell::Text(&item.name),
            Cell::Number(item.quantity),
            Cell::Number(item.unit_price),
            item.total.map(Cell::Number).unwrap_or(Cell::Blank),
        ],
        CartVariant::Procurement => vec![
            Cell::Text(&item.name),
            Cell::Text(&item.spec),
            Cell::Number(item.quantity),
            Cell::Number(item.unit_price),
        ],
    };
    cells.push(Cell::Number(item.amount()));
    cells
}

fn column_widths(variant: CartVariant) -> &'static [f64] {
    match variant {
        CartVariant::Basic => &[NAME_WIDTH, NUMBER_WIDTH, NUMBER_WIDTH, NUMBER_WIDTH, NUMBER_WIDTH],
        CartVariant::Procurement => &[NAME_WIDTH, SPEC_WIDTH, NUMBER_WIDTH, NUMBER_WIDTH, NUMBER_WIDTH],
    }
}

fn write_sheet(table: &CartTable, sheet: &mut Worksheet) -> Result<(), XlsxError> {
    sheet.set_name(SHEET_NAME)?;

    let header = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center);
    let money = Format::new().set_num_format("#,##0");

    for (col, width) in column_widths(table.variant).iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }
    for (col, title) in table.columns().iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }
    sheet.set_freeze_panes(1, 0)?;

    for (idx, item) in table.items.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, cell) in row_cells(item, table.variant).into_iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(text) => {
                    sheet.write_string(row, col, text)?;
                }
                Cell::Number(n) => {
                    sheet.write_number_with_format(row, col, n as f64, &money)?;
                }
                Cell::Blank => {}
            }
        }
    }
    Ok(())
}

/// 장바구니 시트 하나짜리 통합 문서를 메모리에 생성
pub fn to_xlsx_bytes(table: &CartTable) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    write_sheet(table, workbook.add_worksheet())?;
    workbook.save_to_buffer()
}

/// 추출 결과를 xlsx 파일로 저장
pub fn export_to_xlsx(
    table: &CartTable,
    output_path: &Path,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let bytes = to_xlsx_bytes(table)?;
    std::fs::write(output_path, bytes)?;
    tracing::info!("Exported {} rows to {}", table.len(), output_path.display());
    Ok(())
}
