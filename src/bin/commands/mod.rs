pub mod config;
pub mod read;
pub mod write;

use serde::Serialize;
use sqlmanager::ColumnData;

/// Interpret a command-line value
///
/// `NULL` becomes SQL NULL. Canonical integers (`42`, `-3`) and plain
/// decimals (`1.5`, `-0.25`) keep their numeric type. Everything else,
/// including `007`, `+47...`, `1e3` and `nan`, is stored as text unchanged.
pub(crate) fn parse_value(s: &str) -> ColumnData {
    if s == "NULL" {
        return ColumnData::Null;
    }
    if let Ok(n) = s.parse::<i64>() {
        if n.to_string() == s {
            return ColumnData::Integer(n);
        }
    }
    if is_plain_decimal(s) {
        if let Ok(r) = s.parse::<f64>() {
            if r.is_finite() {
                return ColumnData::Real(r);
            }
        }
    }
    ColumnData::Text(s.to_string())
}

/// `-?digits.digits` with no redundant leading zero in the integer part
fn is_plain_decimal(s: &str) -> bool {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let Some((int_part, frac_part)) = unsigned.split_once('.') else {
        return false;
    };
    let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    all_digits(int_part)
        && all_digits(frac_part)
        && (int_part == "0" || !int_part.starts_with('0'))
}

/// Interpret a command-line value as JSON, falling back to a JSON string
pub(crate) fn parse_json_value(s: &str) -> serde_json::Value {
    serde_json::from_str(s).unwrap_or_else(|_| serde_json::Value::String(s.to_string()))
}

pub(crate) fn print_json<T: Serialize>(value: &T, pretty: bool) {
    let result = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match result {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("ERROR: Failed to serialize to JSON: {}", e),
    }
}
