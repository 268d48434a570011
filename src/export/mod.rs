use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::models::CartTable;

mod xlsx;

pub use xlsx::{export_to_xlsx, to_xlsx_bytes, SHEET_NAME, XLSX_CONTENT_TYPE, XLSX_FILE_NAME};

/// 엑셀에서 한글이 깨지지 않도록 붙이는 UTF-8 BOM
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const CSV_FILE_NAME: &str = "cart_items.csv";
pub const TEXT_FILE_NAME: &str = "expense_document.txt";

/// 헤더(변형 컬럼 + 금액) 한 줄과 품목별 한 줄을 기록
pub fn write_csv<W: Write>(table: &CartTable, mut writer: W) -> Result<(), csv::Error> {
    writer.write_all(UTF8_BOM)?;

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(table.columns())?;
    for item in &table.items {
        csv_writer.write_record(item.cells(table.variant))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn to_csv_bytes(table: &CartTable) -> Result<Vec<u8>, csv::Error> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    Ok(buf)
}

/// 추출 결과를 CSV 파일로 저장
pub fn export_to_csv(
    table: &CartTable,
    output_path: &Path,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let file = File::create(output_path)?;
    write_csv(table, file)?;
    tracing::info!("Exported {} rows to {}", table.len(), output_path.display());
    Ok(())
}
