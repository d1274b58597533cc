use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Output surface used for decoded audio and video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Writes the raw elementary streams to disk (or just counts them).
    Fake,
    /// Discards everything.
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPlatform(pub String);

impl fmt::Display for UnknownPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Platform {} not supported", self.0)
    }
}

impl std::error::Error for UnknownPlatform {}

impl Platform {
    pub fn name(self) -> &'static str {
        match self {
            Platform::Fake => "fake",
            Platform::Null => "null",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    /// `auto` picks the null surface; the fake surface must be asked for.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fake" => Ok(Platform::Fake),
            "null" | "auto" => Ok(Platform::Null),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}
