use serde_json::Value;

/// Pretty-print a command's JSON (an envelope, or a bare loan/transaction
/// record for lifecycle commands) to stdout.
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}
