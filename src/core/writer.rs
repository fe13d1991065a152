use crate::domain::model::{ExportTable, COLUMNS};
use crate::utils::error::{EtlError, Result};

/// 固定標頭，之後每列一筆；不輸出索引欄
pub fn to_csv_bytes(table: &ExportTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS)?;

    for row in &table.rows {
        writer.write_record(row.cells())?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}
