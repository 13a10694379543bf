//! CSV serialization of a completed batch.

use benchrig_core::ExecutionResult;

/// Fixed column order of the report. The compiled-size field is empty on
/// compile failure; the error field is empty on success.
const HEADERS: [&str; 10] = [
    "Filename",
    "Source Size (bytes)",
    "Compiled Size (bytes)",
    "Compile Time (microseconds)",
    "Compile Memory (bytes)",
    "Run Time (microseconds)",
    "Run Memory (bytes)",
    "Status",
    "Error",
    "Dataset Elements",
];

/// Serialize one row per result, preceded by the header row.
pub fn generate_csv_report(results: &[ExecutionResult]) -> String {
    let mut out = String::new();
    out.push_str(&HEADERS.join(","));
    out.push('\n');

    for result in results {
        let fields = [
            escape(&result.unit),
            result.source_size_bytes.to_string(),
            result
                .artifact_size_bytes
                .map(|s| s.to_string())
                .unwrap_or_default(),
            result.compile_time.as_micros().to_string(),
            result.compile_peak_memory_bytes.to_string(),
            result.run_time.as_micros().to_string(),
            result.run_peak_memory_bytes.to_string(),
            result.status.to_string(),
            escape(result.error.as_deref().unwrap_or("")),
            result.dataset_elements.to_string(),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    out
}

/// Quote a field when it embeds a delimiter, quote, or line break: compiler
/// diagnostics routinely contain all three.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
