use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{date, photo};

/// A logged calorie record tied to one date.
///
/// Serialized field names match the app's persisted JSON format, so existing
/// stores load unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub calories: f64,
    pub date: String,
    /// Inline image payload as a base64 data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    /// Soft reference; may dangle after the category is deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// A reusable preset: an [`Entry`] without a date. Logging one copies its
/// fields into a brand-new entry dated today; the two records stay
/// independent afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedEntry {
    pub id: String,
    pub title: String,
    pub calories: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewEntry {
    pub title: String,
    pub calories: f64,
    pub date: String,
    pub photo: Option<String>,
    pub category_id: Option<String>,
    pub memo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSavedEntry {
    pub title: String,
    pub calories: f64,
    pub photo: Option<String>,
    pub category_id: Option<String>,
    pub memo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub color: Option<String>,
}

fn trimmed_or_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl NewEntry {
    /// Trims free-text fields and collapses empty optionals to absent,
    /// mirroring what the entry form does before saving.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.memo = trimmed_or_none(self.memo);
        self.category_id = self.category_id.filter(|c| !c.is_empty());
        self
    }
}

impl NewSavedEntry {
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.memo = trimmed_or_none(self.memo);
        self.category_id = self.category_id.filter(|c| !c.is_empty());
        self
    }
}

impl NewCategory {
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.color = self.color.filter(|c| !c.is_empty());
        self
    }
}

pub const MAX_TITLE_CHARS: usize = 100;

/// A single rejected input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("title must not be empty")]
    TitleEmpty,
    #[error("title must be at most 100 characters")]
    TitleTooLong,
    #[error("calories must not be negative")]
    CaloriesNegative,
    #[error("date must be a valid YYYY-MM-DD date")]
    DateInvalid,
    #[error("name must not be empty")]
    NameEmpty,
    #[error("photo exceeds the 5 MB limit")]
    PhotoTooLarge,
}

impl FieldError {
    /// The form field this error belongs to.
    #[must_use]
    pub fn field(self) -> &'static str {
        match self {
            Self::TitleEmpty | Self::TitleTooLong => "title",
            Self::CaloriesNegative => "calories",
            Self::DateInvalid => "date",
            Self::NameEmpty => "name",
            Self::PhotoTooLarge => "photo",
        }
    }
}

/// Everything wrong with one input, collected so the caller can surface
/// errors per field instead of stopping at the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    #[must_use]
    pub fn contains(&self, error: FieldError) -> bool {
        self.0.contains(&error)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

fn check_title(title: &str, errors: &mut Vec<FieldError>) {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        errors.push(FieldError::TitleEmpty);
    } else if trimmed.chars().count() > MAX_TITLE_CHARS {
        errors.push(FieldError::TitleTooLong);
    }
}

fn check_photo(photo: Option<&str>, errors: &mut Vec<FieldError>) {
    if let Some(data_url) = photo {
        if photo::estimated_decoded_len(data_url) > photo::MAX_PHOTO_BYTES {
            errors.push(FieldError::PhotoTooLarge);
        }
    }
}

fn finish(errors: Vec<FieldError>) -> Result<(), ValidationErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

pub fn validate_new_entry(fields: &NewEntry) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    check_title(&fields.title, &mut errors);
    if fields.calories < 0.0 {
        errors.push(FieldError::CaloriesNegative);
    }
    if !date::is_valid(&fields.date) {
        errors.push(FieldError::DateInvalid);
    }
    check_photo(fields.photo.as_deref(), &mut errors);
    finish(errors)
}

pub fn validate_new_saved_entry(fields: &NewSavedEntry) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    check_title(&fields.title, &mut errors);
    if fields.calories < 0.0 {
        errors.push(FieldError::CaloriesNegative);
    }
    check_photo(fields.photo.as_deref(), &mut errors);
    finish(errors)
}

pub fn validate_new_category(fields: &NewCategory) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    if fields.name.trim().is_empty() {
        errors.push(FieldError::NameEmpty);
    }
    finish(errors)
}

/// Calorie roll-up for one day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: String,
    pub total_calories: f64,
    pub entry_count: usize,
    pub entries: Vec<Entry>,
}

/// Calorie roll-up for one month, with per-day breakdown.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub total_calories: f64,
    /// Mean over days that have at least one entry, not calendar days.
    pub average_daily_calories: f64,
    pub entry_count: usize,
    pub daily_summaries: Vec<DailySummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry_fields() -> NewEntry {
        NewEntry {
            title: "Lunch".to_string(),
            calories: 650.0,
            date: "2024-05-10".to_string(),
            photo: None,
            category_id: None,
            memo: None,
        }
    }

    #[test]
    fn test_validate_new_entry_accepts_sample() {
        assert!(validate_new_entry(&sample_entry_fields()).is_ok());
    }

    #[test]
    fn test_validate_new_entry_rejects_empty_title() {
        let mut fields = sample_entry_fields();
        fields.title = "   ".to_string();
        let errors = validate_new_entry(&fields).unwrap_err();
        assert!(errors.contains(FieldError::TitleEmpty));
    }

    #[test]
    fn test_validate_new_entry_rejects_long_title() {
        let mut fields = sample_entry_fields();
        fields.title = "あ".repeat(MAX_TITLE_CHARS + 1);
        let errors = validate_new_entry(&fields).unwrap_err();
        assert!(errors.contains(FieldError::TitleTooLong));

        // Exactly at the limit is fine.
        fields.title = "a".repeat(MAX_TITLE_CHARS);
        assert!(validate_new_entry(&fields).is_ok());
    }

    #[test]
    fn test_validate_new_entry_rejects_negative_calories() {
        let mut fields = sample_entry_fields();
        fields.calories = -1.0;
        let errors = validate_new_entry(&fields).unwrap_err();
        assert!(errors.contains(FieldError::CaloriesNegative));

        fields.calories = 0.0;
        assert!(validate_new_entry(&fields).is_ok());
    }

    #[test]
    fn test_validate_new_entry_rejects_bad_date() {
        let mut fields = sample_entry_fields();
        fields.date = "2024-02-30".to_string();
        let errors = validate_new_entry(&fields).unwrap_err();
        assert!(errors.contains(FieldError::DateInvalid));
    }

    #[test]
    fn test_validate_collects_every_failing_field() {
        let fields = NewEntry {
            title: String::new(),
            calories: -5.0,
            date: "garbage".to_string(),
            photo: None,
            category_id: None,
            memo: None,
        };
        let errors = validate_new_entry(&fields).unwrap_err();
        assert_eq!(errors.0.len(), 3);
        assert!(errors.contains(FieldError::TitleEmpty));
        assert!(errors.contains(FieldError::CaloriesNegative));
        assert!(errors.contains(FieldError::DateInvalid));
    }

    #[test]
    fn test_validate_new_saved_entry_skips_date() {
        let fields = NewSavedEntry {
            title: "Protein bar".to_string(),
            calories: 200.0,
            photo: None,
            category_id: None,
            memo: None,
        };
        assert!(validate_new_saved_entry(&fields).is_ok());
    }

    #[test]
    fn test_validate_new_category() {
        assert!(
            validate_new_category(&NewCategory {
                name: "夜食".to_string(),
                color: Some("#112233".to_string()),
            })
            .is_ok()
        );
        let errors = validate_new_category(&NewCategory {
            name: " ".to_string(),
            color: None,
        })
        .unwrap_err();
        assert!(errors.contains(FieldError::NameEmpty));
    }

    #[test]
    fn test_normalized_trims_and_collapses() {
        let fields = NewEntry {
            title: "  Lunch  ".to_string(),
            calories: 650.0,
            date: "2024-05-10".to_string(),
            photo: None,
            category_id: Some(String::new()),
            memo: Some("   ".to_string()),
        }
        .normalized();
        assert_eq!(fields.title, "Lunch");
        assert_eq!(fields.category_id, None);
        assert_eq!(fields.memo, None);

        let fields = NewCategory {
            name: " 間食 ".to_string(),
            color: Some(String::new()),
        }
        .normalized();
        assert_eq!(fields.name, "間食");
        assert_eq!(fields.color, None);
    }

    #[test]
    fn test_field_error_maps_to_form_field() {
        assert_eq!(FieldError::TitleTooLong.field(), "title");
        assert_eq!(FieldError::DateInvalid.field(), "date");
        assert_eq!(FieldError::PhotoTooLarge.field(), "photo");
    }

    #[test]
    fn test_entry_serializes_with_original_field_names() {
        let entry = Entry {
            id: "abc".to_string(),
            title: "Lunch".to_string(),
            calories: 650.0,
            date: "2024-05-10".to_string(),
            photo: None,
            category_id: Some("cat-001".to_string()),
            memo: None,
            created_at: "2024-05-10T12:00:00.000+09:00".to_string(),
            updated_at: "2024-05-10T12:00:00.000+09:00".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["categoryId"], "cat-001");
        assert_eq!(json["createdAt"], "2024-05-10T12:00:00.000+09:00");
        // Absent optionals are omitted, not null.
        assert!(json.get("photo").is_none());
        assert!(json.get("memo").is_none());
    }

    #[test]
    fn test_entry_deserializes_without_optionals() {
        let json = r#"{
            "id": "1716958347-abc",
            "title": "Lunch",
            "calories": 650,
            "date": "2024-05-10",
            "createdAt": "2024-05-10T12:00:00.000Z",
            "updatedAt": "2024-05-10T12:00:00.000Z"
        }"#;
        let entry: Entry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.calories, 650.0);
        assert_eq!(entry.photo, None);
        assert_eq!(entry.category_id, None);
    }
}
