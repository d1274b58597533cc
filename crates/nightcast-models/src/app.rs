use serde::{Deserialize, Serialize};

/// A launchable title advertised by a paired host.
///
/// Hosts return these in catalog order; the order is significant because
/// name lookups take the first match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub id: i32,
    pub name: String,
}

impl AppInfo {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
