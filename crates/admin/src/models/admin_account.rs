//! Back-office login accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use acsess_core::AdminAccountId;

/// An account allowed to start the two-factor login.
///
/// The password hash never leaves the repository; see
/// [`crate::db::AdminAccountRepository::password_hash_for`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccount {
    pub id: AdminAccountId,
    pub login: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
