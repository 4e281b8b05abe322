//! User preference database entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::preferences::Theme;

/// Database enum for the dashboard theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "preference_theme", rename_all = "snake_case")]
pub enum ThemeDb {
    Light,
    Dark,
    Auto,
}

impl From<Theme> for ThemeDb {
    fn from(t: Theme) -> Self {
        match t {
            Theme::Light => Self::Light,
            Theme::Dark => Self::Dark,
            Theme::Auto => Self::Auto,
        }
    }
}

impl From<ThemeDb> for Theme {
    fn from(t: ThemeDb) -> Self {
        match t {
            ThemeDb::Light => Self::Light,
            ThemeDb::Dark => Self::Dark,
            ThemeDb::Auto => Self::Auto,
        }
    }
}

/// Database entity for the user_preferences table.
#[derive(Debug, Clone, FromRow)]
pub struct UserPreferencesEntity {
    pub user_id: Uuid,
    pub preferred_sensor_id: Option<String>,
    pub all_rule_ids: Vec<Uuid>,
    pub active_rule_ids: Vec<Uuid>,
    pub rule_count: i32,
    pub theme: ThemeDb,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserPreferencesEntity> for domain::models::PreferenceRecord {
    fn from(entity: UserPreferencesEntity) -> Self {
        Self {
            user_id: entity.user_id,
            preferred_sensor_id: entity.preferred_sensor_id,
            all_rule_ids: entity.all_rule_ids,
            active_rule_ids: entity.active_rule_ids,
            rule_count: entity.rule_count,
            theme: entity.theme.into(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_conversion() {
        let rule_id = Uuid::new_v4();
        let entity = UserPreferencesEntity {
            user_id: Uuid::new_v4(),
            preferred_sensor_id: Some("sensor-7".to_string()),
            all_rule_ids: vec![rule_id],
            active_rule_ids: vec![rule_id],
            rule_count: 1,
            theme: ThemeDb::Dark,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let record: domain::models::PreferenceRecord = entity.into();
        assert_eq!(record.theme, Theme::Dark);
        assert_eq!(record.all_rule_ids, vec![rule_id]);
        assert_eq!(record.rule_count, 1);
    }

    #[test]
    fn test_theme_round_trip() {
        for theme in [Theme::Light, Theme::Dark, Theme::Auto] {
            assert_eq!(Theme::from(ThemeDb::from(theme)), theme);
        }
    }
}
