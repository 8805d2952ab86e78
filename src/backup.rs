//! Backup export and import.
//!
//! The export payload is the three collections plus a timestamp, in the
//! same JSON shape the app has always written, so old backups restore into
//! new builds. Import validates everything up front and only then replaces
//! the collections; a bad backup changes nothing.

use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::date;
use crate::models::{
    Category, Entry, NewEntry, NewSavedEntry, SavedEntry, validate_new_entry,
    validate_new_saved_entry,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    pub calorie_entries: Vec<Entry>,
    pub saved_calorie_entries: Vec<SavedEntry>,
    pub categories: Vec<Category>,
    pub exported_at: String,
}

/// What an import brought in, per collection.
#[derive(Debug, Clone, Copy)]
pub struct ImportSummary {
    pub entries_imported: usize,
    pub saved_entries_imported: usize,
    pub categories_imported: usize,
}

pub fn export_json(
    entries: &[Entry],
    saved_entries: &[SavedEntry],
    categories: &[Category],
) -> Result<String> {
    let data = BackupData {
        calorie_entries: entries.to_vec(),
        saved_calorie_entries: saved_entries.to_vec(),
        categories: categories.to_vec(),
        exported_at: date::now_timestamp(),
    };
    serde_json::to_string_pretty(&data).context("failed to serialize backup")
}

/// Parses and fully validates a backup. Returns the data only if every
/// record passes, so callers can replace collections without a partial
/// write.
pub fn parse_backup(json: &str) -> Result<BackupData> {
    let data: BackupData = serde_json::from_str(json).context("backup JSON did not parse")?;

    let mut seen = HashSet::new();
    for entry in &data.calorie_entries {
        if entry.id.is_empty() {
            bail!("backup entry \"{}\" has an empty id", entry.title);
        }
        if !seen.insert(entry.id.as_str()) {
            bail!("backup contains duplicate entry id {}", entry.id);
        }
        let fields = NewEntry {
            title: entry.title.clone(),
            calories: entry.calories,
            date: entry.date.clone(),
            photo: entry.photo.clone(),
            category_id: entry.category_id.clone(),
            memo: entry.memo.clone(),
        };
        validate_new_entry(&fields)
            .map_err(|errors| anyhow::anyhow!("backup entry \"{}\": {errors}", entry.title))?;
    }

    let mut seen = HashSet::new();
    for saved in &data.saved_calorie_entries {
        if saved.id.is_empty() {
            bail!("backup template \"{}\" has an empty id", saved.title);
        }
        if !seen.insert(saved.id.as_str()) {
            bail!("backup contains duplicate template id {}", saved.id);
        }
        let fields = NewSavedEntry {
            title: saved.title.clone(),
            calories: saved.calories,
            photo: saved.photo.clone(),
            category_id: saved.category_id.clone(),
            memo: saved.memo.clone(),
        };
        validate_new_saved_entry(&fields)
            .map_err(|errors| anyhow::anyhow!("backup template \"{}\": {errors}", saved.title))?;
    }

    let mut seen = HashSet::new();
    for category in &data.categories {
        if category.id.is_empty() {
            bail!("backup category \"{}\" has an empty id", category.name);
        }
        if !seen.insert(category.id.as_str()) {
            bail!("backup contains duplicate category id {}", category.id);
        }
        if category.name.trim().is_empty() {
            bail!("backup category {} has an empty name", category.id);
        }
    }

    Ok(data)
}
