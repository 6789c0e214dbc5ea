//! Row encoding and decoding
//!
//! One row per line: the timestamp and each value joined by a single space,
//! terminated by `\n`. Fields must not themselves contain the delimiter or a
//! newline; the codec does not validate this (caller responsibility, the
//! encoding of such fields is undefined). Decoding is stateless per line.

use crate::config::DELIMITER;
use crate::{DaybookError, Result, Row};

/// Encode a row as one newline-terminated line
pub fn encode(row: &Row) -> String {
    let capacity = row.timestamp.as_str().len()
        + row.values.iter().map(|v| v.len() + 1).sum::<usize>()
        + 1;
    let mut line = String::with_capacity(capacity);

    line.push_str(row.timestamp.as_str());
    for value in &row.values {
        line.push(DELIMITER);
        line.push_str(value);
    }
    line.push('\n');

    line
}

/// Decode one line into a row.
///
/// Splits on whitespace runs, so decoding is tolerant of extra padding between
/// fields. The first token is the timestamp, the remaining tokens are the
/// values. Fails if the line is empty or holds a timestamp with no values.
pub fn decode(line: &str) -> Result<Row> {
    let mut tokens = line.split_ascii_whitespace();

    let timestamp = tokens
        .next()
        .ok_or_else(|| DaybookError::MalformedRow("empty line".to_string()))?;

    let values: Vec<String> = tokens.map(str::to_owned).collect();
    if values.is_empty() {
        return Err(DaybookError::MalformedRow(format!(
            "row {:?} has a timestamp but no values",
            timestamp
        )));
    }

    Ok(Row::new(timestamp, values))
}
