//! Domain models for admin.
//!
//! These types are validated domain objects. Database row types live in
//! [`crate::db`] and convert into these via `TryFrom`.

pub mod admin_account;
pub mod catalog;
pub mod notification;
pub mod order;
pub mod settings;
pub mod two_factor;
pub mod user;

pub use admin_account::AdminAccount;
pub use catalog::{Category, Product, ProductInput, ProductInputError};
pub use notification::Notification;
pub use order::{DeliveryInfo, OrderDetail, OrderItemLine, OrderStatusCounts, OrderSummary};
pub use settings::{SettingEntry, SiteSettings, SocialLinks};
pub use two_factor::{
    CODE_TTL, CodeCheck, MAX_RESENDS, MAX_VERIFY_ATTEMPTS, RESEND_COOLDOWN, ResendDenied,
    TwoFactorSession, expiry_from, generate_code,
};
pub use user::User;
