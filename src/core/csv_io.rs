use crate::domain::model::{EventTable, ScoredTable};
use crate::utils::error::{Result, RiskError};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 解析上傳的 CSV。這是唯一會明確回報錯誤的輸入路徑。
pub fn parse_csv(bytes: &[u8]) -> Result<EventTable> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| RiskError::invalid_input(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(RiskError::invalid_input("No columns to parse from file"));
    }

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| RiskError::invalid_input(e.to_string()))?;

        // header 佔第 1 行
        let line = index + 2;
        if record.len() > headers.len() {
            return Err(RiskError::invalid_input(format!(
                "Expected {} fields in line {}, saw {}",
                headers.len(),
                line,
                record.len()
            )));
        }

        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    tracing::debug!("Parsed CSV: {} columns, {} rows", headers.len(), rows.len());
    Ok(EventTable { headers, rows })
}

/// Input columns in their original order, then `risk_probability` (and `risk_label`).
pub fn write_scored(scored: &ScoredTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(scored.headers())?;
    for index in 0..scored.len() {
        writer.write_record(scored.row(index))?;
    }
    writer.into_inner().map_err(|e| RiskError::IoError(e.into_error()))
}
