//! Repository modules for database operations.

pub mod notification;
pub mod user;
pub mod user_preferences;

pub use notification::{
    LiveRuleRow, MetricStatusCountRow, NotificationRepository, RuleTotalsRow,
};
pub use user::{CascadeDeleteResult, UserRepository};
pub use user_preferences::{
    PreferenceTotalsRow, ThemeCountRow, UserPreferencesRepository,
};
