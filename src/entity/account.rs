//! Account binding.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

use super::{is_visible_ascii, is_word, len_between, Entity};

/// A user account, keyed by its login id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub id: String,
    pub password: String,
    pub name: String,
    pub privilege: u32,
}

impl Account {
    pub const PRIVILEGE_ROOT: u32 = 7;
    pub const PRIVILEGE_WORKER: u32 = 3;
    pub const PRIVILEGE_CUSTOMER: u32 = 1;
    pub const PRIVILEGE_ANONYMOUS: u32 = 0;

    /// Privileges an account may be stored with
    pub const STORABLE_PRIVILEGES: [u32; 3] = [
        Self::PRIVILEGE_ROOT,
        Self::PRIVILEGE_WORKER,
        Self::PRIVILEGE_CUSTOMER,
    ];

    pub fn new(
        id: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
        privilege: u32,
    ) -> Self {
        Self {
            id: id.into(),
            password: password.into(),
            name: name.into(),
            privilege,
        }
    }

    // TODO: store an argon2 hash instead of the plain password
    pub fn verify_password(&self, password: &str) -> bool {
        self.password == password
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }
}

impl Entity for Account {
    const TABLE: &'static str = "accounts";

    fn primary_key(&self) -> String {
        self.id.clone()
    }

    fn validate(&self) -> Result<()> {
        for credential in [&self.id, &self.password] {
            if !len_between(credential, 1, 30) || !is_word(credential) {
                return Err(StoreError::validation("invalid user id or password"));
            }
        }
        if !len_between(&self.name, 0, 30) || !is_visible_ascii(&self.name) {
            return Err(StoreError::validation("invalid account name"));
        }
        if !Self::STORABLE_PRIVILEGES.contains(&self.privilege) {
            return Err(StoreError::Validation(format!(
                "invalid privilege {}",
                self.privilege
            )));
        }
        Ok(())
    }
}
