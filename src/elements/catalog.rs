use std::fs;
use std::path::Path;

use thiserror::Error;

use super::types::ElementRecord;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog read error: {0}")]
    Read(#[from] std::io::Error),
    #[error("no element sets found in {0}")]
    NoRecords(String),
}

/// Reads a catalog file. An empty or unrecognisable file is an error, unlike
/// individual malformed records which are left for the parser to reject.
pub fn load_catalog_file(path: &Path) -> Result<Vec<ElementRecord>, CatalogError> {
    let content = fs::read_to_string(path)?;
    let records = load_catalog(&content);
    if records.is_empty() {
        return Err(CatalogError::NoRecords(path.display().to_string()));
    }
    log::info!(
        "Loaded {} element records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Splits catalog text into records.
///
/// Accepts the usual three-line form (name, line 1, line 2). Bare two-line sets are
/// named after their catalog number. Lines that fit neither form are skipped.
pub fn load_catalog(content: &str) -> Vec<ElementRecord> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            let name = format!("NORAD {}", catalog_number(lines[i]));
            result.push(ElementRecord::new(name, lines[i], lines[i + 1]));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            result.push(ElementRecord::new(lines[i], lines[i + 1], lines[i + 2]));
            i += 3;
        } else {
            log::debug!("Skipping unrecognised catalog line: {:.40}", lines[i]);
            i += 1;
        }
    }

    result
}

fn catalog_number(line1: &str) -> &str {
    line1.get(2..7).map(str::trim).unwrap_or_default()
}
