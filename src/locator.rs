use std::sync::LazyLock;

use regex::Regex;

use crate::models::ErrorLocation;

static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"near line (\d+) column (\d+)").expect("Invalid location regex")
});

/// Extracts the error position from interpreter diagnostic text.
///
/// The interpreter counts lines and columns from 1; the editor counts from 0.
/// A reported 0 is malformed and clamps to the first line/column.
/// Returns `None` when the text carries no usable location, which is normal.
pub fn locate(diagnostic: &str) -> Option<ErrorLocation> {
    let caps = LOCATION.captures(diagnostic)?;
    let line: usize = caps[1].parse().ok()?;
    let column: usize = caps[2].parse().ok()?;

    Some(ErrorLocation {
        line: line.saturating_sub(1),
        column: column.saturating_sub(1),
    })
}
