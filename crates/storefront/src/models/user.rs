//! Registered customers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use acsess_core::{Email, UserId, UserRole};

/// A storefront customer. The password hash never leaves the repository.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}
