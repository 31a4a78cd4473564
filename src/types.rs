// src/types.rs

use std::str::FromStr;
use serde::Deserialize;

/// How strictly a file target decides that its artifact is present.
///
/// - `Exists`: the path exists (default, same as a plain existence check).
/// - `NonEmpty`: the path exists and holds at least one byte, which catches
///   zero-length leftovers from tools that create their output up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletenessCheck {
    #[default]
    Exists,
    NonEmpty,
}

impl FromStr for CompletenessCheck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exists" => Ok(CompletenessCheck::Exists),
            "non-empty" | "non_empty" => Ok(CompletenessCheck::NonEmpty),
            other => Err(format!(
                "invalid completeness check: {other} (expected \"exists\" or \"non-empty\")"
            )),
        }
    }
}
