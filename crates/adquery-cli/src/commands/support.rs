use std::io::Write;
use std::path::Path;
use std::{fs, io};

use anyhow::{Context, Result, bail};
use serde_json::Value;

pub(super) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Reads inline JSON, or the file named after a leading `@`.
pub(super) fn read_json_input(raw: &str, what: &str) -> Result<Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {what} from {path}"))?,
        None => raw.to_string(),
    };
    if text.trim().is_empty() {
        bail!("{what} is empty");
    }
    serde_json::from_str(&text).with_context(|| format!("{what} is not valid JSON"))
}

pub(super) fn load_documents(path: &Path) -> Result<Vec<Value>> {
    let raw = fs::read(path)
        .with_context(|| format!("failed to read documents from {}", path.display()))?;
    let value = serde_json::from_slice::<Value>(&raw)
        .with_context(|| format!("documents in {} are not valid JSON", path.display()))?;
    match value {
        Value::Array(documents) => Ok(documents),
        _ => bail!("documents file {} must hold a JSON array", path.display()),
    }
}
