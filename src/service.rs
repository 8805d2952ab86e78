use std::path::Path;

use anyhow::Result;

use crate::backup::{self, ImportSummary};
use crate::date;
use crate::events::{ChangeBus, ChangeTopic, Subscription};
use crate::models::{
    Category, DailySummary, Entry, MonthlySummary, NewCategory, NewEntry, NewSavedEntry,
    SavedEntry, ValidationErrors, validate_new_category, validate_new_entry,
    validate_new_saved_entry,
};
use crate::repo::{self, Categories, Entries, Save, SavedEntries};
use crate::store::KvStore;
use crate::summary;

/// The one object the UI layer talks to.
///
/// Owns the store (constructed once, handed to the repositories by
/// reference) and the change bus. Every mutating call validates before
/// touching storage and broadcasts the matching change topic afterwards,
/// so mounted views can reload.
pub struct CalogService {
    store: KvStore,
    bus: ChangeBus,
}

impl CalogService {
    /// Service over a store at `path`. A store that cannot be opened
    /// degrades to no persistence rather than failing construction.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        Self::with_store(KvStore::open(path))
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_store(KvStore::in_memory())
    }

    #[must_use]
    pub fn with_store(store: KvStore) -> Self {
        Self {
            store,
            bus: ChangeBus::new(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &KvStore {
        &self.store
    }

    fn entries(&self) -> Entries<'_> {
        Entries::new(&self.store)
    }

    fn saved_entries(&self) -> SavedEntries<'_> {
        SavedEntries::new(&self.store)
    }

    fn categories(&self) -> Categories<'_> {
        Categories::new(&self.store)
    }

    // --- Change notifications ---

    pub fn subscribe(&self, topic: ChangeTopic, callback: impl Fn() + 'static) -> Subscription {
        self.bus.subscribe(topic, callback)
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        self.bus.unsubscribe(subscription);
    }

    // --- Entries ---

    #[must_use]
    pub fn list_entries(&self) -> Vec<Entry> {
        self.entries().list()
    }

    #[must_use]
    pub fn entries_by_date(&self, date: &str) -> Vec<Entry> {
        self.entries().by_date(date)
    }

    pub fn save_entry(&self, save: Save<NewEntry>) -> Result<Entry, ValidationErrors> {
        let save = save.map_fields(NewEntry::normalized);
        validate_new_entry(save.fields())?;
        let entry = self.entries().upsert(save);
        self.bus.notify(ChangeTopic::Entries);
        Ok(entry)
    }

    pub fn delete_entry(&self, id: &str) {
        self.entries().remove(id);
        self.bus.notify(ChangeTopic::Entries);
    }

    // --- Saved entries (templates) ---

    #[must_use]
    pub fn list_saved_entries(&self) -> Vec<SavedEntry> {
        self.saved_entries().list()
    }

    pub fn save_saved_entry(
        &self,
        save: Save<NewSavedEntry>,
    ) -> Result<SavedEntry, ValidationErrors> {
        let save = save.map_fields(NewSavedEntry::normalized);
        validate_new_saved_entry(save.fields())?;
        let saved = self.saved_entries().upsert(save);
        self.bus.notify(ChangeTopic::SavedEntries);
        Ok(saved)
    }

    pub fn delete_saved_entry(&self, id: &str) {
        self.saved_entries().remove(id);
        self.bus.notify(ChangeTopic::SavedEntries);
    }

    /// Creates a new entry dated today from a saved template. The template
    /// is left untouched; the entry gets its own id and timestamps.
    pub fn log_saved_entry(&self, saved_id: &str) -> Option<Entry> {
        let saved = self.saved_entries().get_by_id(saved_id)?;
        let entry = self.entries().upsert(Save::Create(NewEntry {
            title: saved.title,
            calories: saved.calories,
            date: date::today(),
            photo: saved.photo,
            category_id: saved.category_id,
            memo: saved.memo,
        }));
        self.bus.notify(ChangeTopic::Entries);
        Some(entry)
    }

    // --- Categories ---

    #[must_use]
    pub fn list_categories(&self) -> Vec<Category> {
        self.categories().list()
    }

    #[must_use]
    pub fn category_by_id(&self, id: &str) -> Option<Category> {
        self.categories().get_by_id(id)
    }

    pub fn save_category(&self, save: Save<NewCategory>) -> Result<Category, ValidationErrors> {
        let save = save.map_fields(NewCategory::normalized);
        validate_new_category(save.fields())?;
        Ok(self.categories().upsert(save))
    }

    pub fn delete_category(&self, id: &str) {
        // Entries keep their category id; the reference just dangles.
        self.categories().remove(id);
    }

    // --- Summaries ---

    #[must_use]
    pub fn daily_summary(&self, date: &str) -> DailySummary {
        summary::daily_summary(&self.entries().list(), date)
    }

    #[must_use]
    pub fn monthly_summary(&self, year: i32, month: u32) -> MonthlySummary {
        summary::monthly_summary(&self.entries().list(), year, month)
    }

    // --- Backup ---

    pub fn export_data(&self) -> Result<String> {
        backup::export_json(
            &self.entries().list(),
            &self.saved_entries().list(),
            &self.categories().list(),
        )
    }

    /// Replaces all three collections with the backup's contents.
    /// All-or-nothing: a backup that fails validation changes nothing.
    pub fn import_data(&self, json: &str) -> Result<ImportSummary> {
        let data = backup::parse_backup(json)?;
        let summary = ImportSummary {
            entries_imported: data.calorie_entries.len(),
            saved_entries_imported: data.saved_calorie_entries.len(),
            categories_imported: data.categories.len(),
        };
        self.store.write(repo::ENTRIES_KEY, &data.calorie_entries);
        self.store
            .write(repo::SAVED_ENTRIES_KEY, &data.saved_calorie_entries);
        self.store.write(repo::CATEGORIES_KEY, &data.categories);
        self.bus.notify(ChangeTopic::Entries);
        self.bus.notify(ChangeTopic::SavedEntries);
        Ok(summary)
    }

    /// Drops all three collections. Categories reseed on the next read.
    pub fn clear_all(&self) {
        self.store.remove(repo::ENTRIES_KEY);
        self.store.remove(repo::SAVED_ENTRIES_KEY);
        self.store.remove(repo::CATEGORIES_KEY);
        self.bus.notify(ChangeTopic::Entries);
        self.bus.notify(ChangeTopic::SavedEntries);
    }
}
