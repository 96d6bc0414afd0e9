use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::errors::{CoreError, CoreResult};

static EMAIL_REGEX: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"));

/// Field-level validation and normalisation for request payloads
pub struct ValidationService;

impl ValidationService {
    /// Trimmed, non-empty text no longer than `max_len` characters
    pub fn required_text(field: &str, value: Option<&str>, max_len: usize) -> CoreResult<String> {
        let trimmed = value.map(str::trim).unwrap_or_default();
        if trimmed.is_empty() {
            return Err(CoreError::invalid_field(
                field,
                format!("{} is required", field),
            ));
        }
        Self::check_length(field, trimmed, max_len)?;
        Ok(trimmed.to_string())
    }

    /// Optional text; blank strings are stored as null
    pub fn optional_text(field: &str, value: Option<&str>, max_len: usize) -> CoreResult<Option<String>> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(trimmed) => {
                Self::check_length(field, trimmed, max_len)?;
                Ok(Some(trimmed.to_string()))
            }
        }
    }

    fn check_length(field: &str, value: &str, max_len: usize) -> CoreResult<()> {
        if value.chars().count() > max_len {
            return Err(CoreError::invalid_field(
                field,
                format!("{} is too long (max {} characters)", field, max_len),
            ));
        }
        Ok(())
    }

    pub fn email(value: Option<&str>) -> CoreResult<String> {
        let email = Self::required_text("email", value, 120)?;
        let regex = EMAIL_REGEX
            .as_ref()
            .map_err(|e| CoreError::internal(format!("Failed to compile email regex: {}", e)))?;
        if !regex.is_match(&email) {
            return Err(CoreError::invalid_field(
                "email",
                format!("'{}' is not a valid email address", email),
            ));
        }
        Ok(email)
    }

    /// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (date part kept)
    pub fn date(field: &str, value: &str) -> CoreResult<NaiveDate> {
        let trimmed = value.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(date);
        }
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(timestamp.date_naive());
        }
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(naive.date());
        }
        Err(CoreError::invalid_field(
            field,
            format!("{} must be a date (YYYY-MM-DD) or RFC 3339 timestamp, got '{}'", field, value),
        ))
    }

    pub fn required_date(field: &str, value: Option<&str>) -> CoreResult<NaiveDate> {
        match value.map(str::trim) {
            None | Some("") => Err(CoreError::invalid_field(
                field,
                format!("{} is required", field),
            )),
            Some(v) => Self::date(field, v),
        }
    }

    pub fn optional_date(field: &str, value: Option<&str>) -> CoreResult<Option<NaiveDate>> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(v) => Self::date(field, v).map(Some),
        }
    }

    pub fn date_order(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        end_field: &str,
    ) -> CoreResult<()> {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(CoreError::invalid_field(
                    end_field,
                    format!("{} ({}) is before the start date ({})", end_field, end, start),
                ));
            }
        }
        Ok(())
    }

    pub fn non_negative_amount(field: &str, value: Option<f64>) -> CoreResult<f64> {
        match value {
            None => Err(CoreError::invalid_field(field, format!("{} is required", field))),
            Some(v) if !v.is_finite() || v < 0.0 => Err(CoreError::invalid_field(
                field,
                format!("{} must be a non-negative number", field),
            )),
            Some(v) => Ok(v),
        }
    }

    pub fn optional_count(field: &str, value: Option<i32>) -> CoreResult<Option<i32>> {
        match value {
            Some(v) if v < 0 => Err(CoreError::invalid_field(
                field,
                format!("{} must not be negative", field),
            )),
            other => Ok(other),
        }
    }

    pub fn required_id(field: &str, value: Option<i32>) -> CoreResult<i32> {
        value.ok_or_else(|| CoreError::invalid_field(field, format!("{} is required", field)))
    }
}

/// Collapse repeated ids while keeping first-seen order
pub fn dedupe_ids(ids: &[i32]) -> Vec<i32> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
/// when used with `#[serde(default, deserialize_with = "deserialize_some")]`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CoreErrorKind;

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(
            ValidationService::required_text("name", Some("  Ada  "), 100).unwrap(),
            "Ada"
        );
        let err = ValidationService::required_text("name", Some("   "), 100).unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Validation);
        assert!(ValidationService::required_text("name", None, 100).is_err());
        assert!(ValidationService::required_text("name", Some("abcdef"), 5).is_err());
    }

    #[test]
    fn validates_email() {
        assert!(ValidationService::email(Some("ada@lab.edu")).is_ok());
        assert!(ValidationService::email(Some("not-an-email")).is_err());
        assert!(ValidationService::email(Some("a b@c.d")).is_err());
    }

    #[test]
    fn parses_dates_and_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(ValidationService::date("startDate", "2024-03-01").unwrap(), expected);
        assert_eq!(
            ValidationService::date("startDate", "2024-03-01T10:00:00Z").unwrap(),
            expected
        );
        assert_eq!(
            ValidationService::date("startDate", "2024-03-01T10:00:00").unwrap(),
            expected
        );
        assert!(ValidationService::date("startDate", "March 1st").is_err());
        assert_eq!(ValidationService::optional_date("endDate", Some("")).unwrap(), None);
    }

    #[test]
    fn rejects_end_before_start() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1);
        let end = NaiveDate::from_ymd_opt(2024, 2, 1);
        assert!(ValidationService::date_order(start, end, "endDate").is_err());
        assert!(ValidationService::date_order(end, start, "endDate").is_ok());
        assert!(ValidationService::date_order(start, None, "endDate").is_ok());
    }

    #[test]
    fn amount_must_be_non_negative() {
        assert!(ValidationService::non_negative_amount("amount", Some(-1.0)).is_err());
        assert!(ValidationService::non_negative_amount("amount", None).is_err());
        assert_eq!(
            ValidationService::non_negative_amount("amount", Some(1500.0)).unwrap(),
            1500.0
        );
    }

    #[test]
    fn dedupes_ids_in_order() {
        assert_eq!(dedupe_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[test]
    fn double_option_distinguishes_null_from_absent() {
        #[derive(Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "deserialize_some")]
            lab_id: Option<Option<i32>>,
        }
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"lab_id": null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"lab_id": 4}"#).unwrap();
        assert_eq!(absent.lab_id, None);
        assert_eq!(null.lab_id, Some(None));
        assert_eq!(set.lab_id, Some(Some(4)));
    }
}
