//! Common validation utilities.

use validator::ValidationError;

/// Lowest temperature reading the sensors report (°C).
pub const TEMPERATURE_MIN: f64 = -50.0;
/// Highest temperature reading the sensors report (°C).
pub const TEMPERATURE_MAX: f64 = 100.0;

/// Lowest relative humidity reading (%).
pub const HUMIDITY_MIN: f64 = 0.0;
/// Highest relative humidity reading (%).
pub const HUMIDITY_MAX: f64 = 100.0;

/// Validates that a temperature threshold is within sensor range (-50 to 100).
pub fn validate_temperature(value: f64) -> Result<(), ValidationError> {
    if (TEMPERATURE_MIN..=TEMPERATURE_MAX).contains(&value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("temperature_range");
        err.message = Some("Temperature must be between -50 and 100".into());
        Err(err)
    }
}

/// Validates that a humidity threshold is within sensor range (0 to 100).
pub fn validate_humidity(value: f64) -> Result<(), ValidationError> {
    if (HUMIDITY_MIN..=HUMIDITY_MAX).contains(&value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("humidity_range");
        err.message = Some("Humidity must be between 0 and 100".into());
        Err(err)
    }
}

/// Validates that a numeric threshold is a finite number.
pub fn validate_finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        let mut err = ValidationError::new("threshold_finite");
        err.message = Some("Threshold must be a finite number".into());
        Err(err)
    }
}

/// Validates a location name: non-blank after trimming, at most 100 characters.
pub fn validate_location_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("location_blank");
        err.message = Some("Location name must not be blank".into());
        return Err(err);
    }
    if trimmed.chars().count() > 100 {
        let mut err = ValidationError::new("location_length");
        err.message = Some("Location name must be at most 100 characters".into());
        return Err(err);
    }
    Ok(())
}
