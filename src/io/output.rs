//! Command output
//!
//! Results are written to the output as pretty-printed JSON followed by a
//! newline.

use crate::types::LedgerError;
use serde::Serialize;
use std::io::Write;

/// Write `value` as pretty JSON
pub fn write_json<T: Serialize>(value: &T, output: &mut dyn Write) -> Result<(), LedgerError> {
    serde_json::to_writer_pretty(&mut *output, value)
        .map_err(|e| LedgerError::store("write output", e))?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaginationEnvelope;

    #[test]
    fn test_write_envelope() {
        let mut output = Vec::new();

        write_json(&PaginationEnvelope::new(Some(1), 0, Vec::new()), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.ends_with("}\n"));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["pageSize"], 3);
        assert_eq!(value["page"], 1);
    }
}
