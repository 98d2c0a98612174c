//! User decisions for filename conflicts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a same-name collision should be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictResolution {
    /// Overwrite the existing file's bytes, keeping its identity.
    Replace,
    /// Discard the incoming file.
    Cancel,
    /// Keep both files under distinct names.
    KeepBoth,
}

impl ConflictResolution {
    /// Return the resolution as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Cancel => "cancel",
            Self::KeepBoth => "keepBoth",
        }
    }
}

impl fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(Self::Replace),
            "cancel" => Ok(Self::Cancel),
            "keepBoth" | "keep-both" | "keep_both" => Ok(Self::KeepBoth),
            other => Err(format!("Unknown conflict resolution: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_spellings() {
        assert_eq!("keep-both".parse(), Ok(ConflictResolution::KeepBoth));
        assert_eq!("replace".parse(), Ok(ConflictResolution::Replace));
        assert!("merge".parse::<ConflictResolution>().is_err());
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let json = serde_json::to_string(&ConflictResolution::KeepBoth).expect("serialize");
        assert_eq!(json, "\"keepBoth\"");
    }
}
