//! Device inventory input: one address per line.

use std::io;
use std::path::Path;

/// Parse inventory text: newline-separated addresses, blank lines ignored.
pub fn parse_inventory(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect()
}

/// Load an inventory file.
pub fn load_inventory(path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    Ok(parse_inventory(&std::fs::read_to_string(path)?))
}
