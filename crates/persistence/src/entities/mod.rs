//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod notification;
pub mod user;
pub mod user_preferences;

pub use notification::{ComparatorDb, MetricDb, NotificationEntity, RuleStatusDb};
pub use user::UserEntity;
pub use user_preferences::{ThemeDb, UserPreferencesEntity};
