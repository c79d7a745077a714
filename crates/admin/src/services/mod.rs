//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Password check, Telegram login codes and admin tokens
//! - `import` - Product spreadsheet import and CSV export
//! - `storage` - Product image upload (S3 with local fallback)

pub mod auth;
pub mod import;
pub mod storage;

pub use auth::{AdminAuthError, AdminAuthService, DeliveryContext, TokenService};
pub use import::{ImportReport, ProductImporter};
pub use storage::{ImageStore, S3Bucket, StorageError};
