use sgp4::{Constants, Elements};

use super::error::ParseError;
use super::types::{ElementRecord, ParsedElements};

/// Staleness limit applied when the caller does not choose one: 14 days.
pub const DEFAULT_DECAY_LIMIT_MINUTES: f64 = 14.0 * 24.0 * 60.0;

const MIN_LINE_LEN: usize = 69;

pub fn parse(record: &ElementRecord) -> Result<ParsedElements, ParseError> {
    parse_with_limit(record, DEFAULT_DECAY_LIMIT_MINUTES)
}

/// Parses a record and stamps it with `decay_limit_minutes`.
pub fn parse_with_limit(
    record: &ElementRecord,
    decay_limit_minutes: f64,
) -> Result<ParsedElements, ParseError> {
    let name = record.name.trim();
    if name.is_empty() {
        return Err(ParseError::Malformed("empty name".into()));
    }

    let line1 = record.line1.trim();
    let line2 = record.line2.trim();
    check_line(line1, '1')?;
    check_line(line2, '2')?;

    let elements = Elements::from_tle(Some(name.to_string()), line1.as_bytes(), line2.as_bytes())
        .map_err(|e| ParseError::InvalidElements(e.to_string()))?;
    let constants = Constants::from_elements(&elements)
        .map_err(|e| ParseError::InvalidElements(e.to_string()))?;

    Ok(ParsedElements {
        name: name.to_string(),
        epoch: elements.datetime.and_utc(),
        decay_limit_minutes,
        elements,
        constants,
    })
}

fn check_line(line: &str, marker: char) -> Result<(), ParseError> {
    let mut chars = line.chars();
    if chars.next() != Some(marker) || chars.next() != Some(' ') {
        return Err(ParseError::Malformed(format!(
            "line {marker} must start with \"{marker} \""
        )));
    }
    if line.len() < MIN_LINE_LEN {
        return Err(ParseError::Malformed(format!(
            "line {marker} is {} characters, expected at least {MIN_LINE_LEN}",
            line.len()
        )));
    }
    Ok(())
}
