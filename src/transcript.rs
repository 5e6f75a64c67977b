//! Persistence of captured command output.
//!
//! One text file per device, one section per command:
//!
//! ```text
//! === show version ===
//! Cisco IOS Software, ...
//!
//! === show running-config ===
//! ...
//! ```
//!
//! The section format (`=== <command> ===`, raw text, blank-line separator)
//! is fixed; existing tooling parses it.

use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

/// Render captured outputs into the section format.
pub fn render_captures(outputs: &IndexMap<String, String>) -> String {
    let mut out = String::new();
    for (command, text) in outputs {
        out.push_str("=== ");
        out.push_str(command);
        out.push_str(" ===\n");
        out.push_str(text);
        if !text.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Write captured outputs to `path`.
pub fn write_capture_file(
    path: impl AsRef<Path>,
    outputs: &IndexMap<String, String>,
) -> io::Result<()> {
    std::fs::write(path, render_captures(outputs))
}

/// Write one device's captures into `dir`, named after the target.
///
/// Path separators and colons in the target are flattened so an address
/// like `host:2222` stays a single file name.
pub fn save_device_captures(
    dir: impl AsRef<Path>,
    target: &str,
    outputs: &IndexMap<String, String>,
) -> io::Result<PathBuf> {
    let name: String = target
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    let path = dir.as_ref().join(format!("{}.txt", name));
    write_capture_file(&path, outputs)?;
    Ok(path)
}
