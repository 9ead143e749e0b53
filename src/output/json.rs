//! JSON output formatting

use serde::Serialize;

/// Format any table as pretty JSON
pub fn format<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize output: {}"}}"#, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::ImportRow;

    #[test]
    fn test_rows_as_json() {
        let rows = vec![ImportRow::new("pkg.a", "pkg.b")];
        let out = format(&rows);
        assert!(out.contains("\"module\": \"pkg.a\""));
        assert!(out.contains("\"import_reference\": \"pkg.b\""));
    }
}
