//! Schema-version marker.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

use super::{Entity, SINGLETON_KEY};

/// Layout version of the data directory; its presence marks a bootstrapped store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaVersion {
    pub version: u32,
}

impl SchemaVersion {
    pub const CURRENT: u32 = 1;
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self {
            version: Self::CURRENT,
        }
    }
}

impl Entity for SchemaVersion {
    const TABLE: &'static str = "versions";

    fn primary_key(&self) -> String {
        SINGLETON_KEY.to_string()
    }

    fn validate(&self) -> Result<()> {
        if self.version == 0 || self.version > Self::CURRENT {
            return Err(StoreError::Validation(format!(
                "unsupported schema version {}",
                self.version
            )));
        }
        Ok(())
    }
}
