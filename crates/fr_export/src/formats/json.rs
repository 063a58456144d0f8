use crate::ReportRow;
use fr_core::Result;

pub fn render(rows: &[ReportRow]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(rows)?)
}
