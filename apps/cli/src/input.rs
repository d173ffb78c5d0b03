//! Seed rows from a JSON file: an array of flat objects, key order preserved.

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr, eyre};
use serde_json::Value;

use intelscout_core::RawRow;

pub(crate) fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read input file '{}'", path.display()))?;
    parse_rows(&content).wrap_err_with(|| format!("invalid input file '{}'", path.display()))
}

pub(crate) fn parse_rows(json: &str) -> Result<Vec<RawRow>> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(items) = value else {
        return Err(eyre!("expected a JSON array of row objects"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map
                .into_iter()
                .map(|(column, value)| (column, cell_text(value)))
                .collect()),
            other => Err(eyre!("row {i} is not an object: {other}")),
        })
        .collect()
}

fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}
