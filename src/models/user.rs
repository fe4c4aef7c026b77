use std::fmt;

use serde::{Deserialize, Serialize};

/// Minimum length the login screen asks of a phone number.
pub const MIN_PHONE_NUMBER_LEN: usize = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Partner,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Partner => "partner",
        }
    }

    /// Display name given to users created on first login.
    pub fn default_name(&self) -> &'static str {
        match self {
            UserRole::Customer => "Customer User",
            UserRole::Partner => "Partner User",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub phone_number: String,
    pub name: String,
    #[serde(rename = "type")]
    pub role: UserRole,
}

impl User {
    pub fn first_login(phone_number: &str, role: UserRole, epoch_millis: i64) -> Self {
        Self {
            id: format!("{role}_{epoch_millis}"),
            phone_number: phone_number.to_string(),
            name: role.default_name().to_string(),
            role,
        }
    }
}

pub fn is_plausible_phone_number(phone_number: &str) -> bool {
    phone_number.trim().chars().count() >= MIN_PHONE_NUMBER_LEN
}
