//! JSON output for CLI
//!
//! Every command prints exactly one JSON object on stdout:
//! `{"status":"ok","data":...}` or `{"status":"error","code":..,"message":..}`.

use std::io::{self, Write};

use serde_json::Value;

use super::errors::CliResult;

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    write_line(&response)
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_line(&error_response(code, message))
}

fn error_response(code: &str, message: &str) -> Value {
    serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

fn write_line(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_shape() {
        let response = error_response("SEGQ_CLI_STORE_ERROR", "checksum mismatch on line 3");
        assert_eq!(response["status"], "error");
        assert_eq!(response["code"], "SEGQ_CLI_STORE_ERROR");
        assert_eq!(response["message"], "checksum mismatch on line 3");
    }
}
