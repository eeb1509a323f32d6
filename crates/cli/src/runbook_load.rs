// SPDX-License-Identifier: MIT

//! Reads a runbook file from disk and infers its format from the file
//! extension (`.hcl`, `.toml`, or `.json`; TOML is the default).

use anyhow::{Context, Result};
use orc_runbook::Format;
use std::path::Path;

pub fn read(path: &Path) -> Result<(String, Format)> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read runbook: {}", path.display()))?;
    let format = match path.extension().and_then(|e| e.to_str()) {
        Some("hcl") => Format::Hcl,
        Some("json") => Format::Json,
        _ => Format::Toml,
    };
    Ok((content, format))
}
