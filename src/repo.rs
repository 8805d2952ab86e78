//! Collection repositories.
//!
//! Three flat collections live under fixed storage keys, each a JSON array
//! in insertion order. One generic [`Collection`] carries the shared
//! lifecycle: id generation, creation/update stamping, replace-merge
//! upserts, and silent removes. Categories add default seeding on first
//! read plus a one-time legacy migration.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::date;
use crate::models::{Category, Entry, NewCategory, NewEntry, NewSavedEntry, SavedEntry};
use crate::store::KvStore;

pub const ENTRIES_KEY: &str = "calorie_entries";
pub const SAVED_ENTRIES_KEY: &str = "saved_calorie_entries";
pub const CATEGORIES_KEY: &str = "categories";

/// A write request. Insert-vs-update is the caller's explicit choice, not
/// inferred from field presence at runtime.
#[derive(Debug, Clone)]
pub enum Save<F> {
    /// Insert with a freshly generated id.
    Create(F),
    /// Replace the fields of the record with this id. An id that matches
    /// nothing inserts a new record under the caller-assigned id.
    Update { id: String, fields: F },
}

impl<F> Save<F> {
    #[must_use]
    pub fn fields(&self) -> &F {
        match self {
            Self::Create(fields) | Self::Update { fields, .. } => fields,
        }
    }

    #[must_use]
    pub fn map_fields(self, f: impl FnOnce(F) -> F) -> Self {
        match self {
            Self::Create(fields) => Self::Create(f(fields)),
            Self::Update { id, fields } => Self::Update {
                id,
                fields: f(fields),
            },
        }
    }
}

/// UUID v7: millisecond timestamp plus random bits. Collisions are not
/// detected or retried; a single-user store never sees enough ids to care.
fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

/// A record that can live in a [`Collection`].
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Draft counterpart holding the caller-editable fields.
    type Fields;

    fn id(&self) -> &str;
    fn build(id: String, fields: Self::Fields, created_at: String, updated_at: String) -> Self;
    /// Replaces the editable fields wholesale, leaving id and `created_at`
    /// untouched.
    fn apply(&mut self, fields: Self::Fields, updated_at: String);
}

impl Record for Entry {
    type Fields = NewEntry;

    fn id(&self) -> &str {
        &self.id
    }

    fn build(id: String, fields: NewEntry, created_at: String, updated_at: String) -> Self {
        Self {
            id,
            title: fields.title,
            calories: fields.calories,
            date: fields.date,
            photo: fields.photo,
            category_id: fields.category_id,
            memo: fields.memo,
            created_at,
            updated_at,
        }
    }

    fn apply(&mut self, fields: NewEntry, updated_at: String) {
        self.title = fields.title;
        self.calories = fields.calories;
        self.date = fields.date;
        self.photo = fields.photo;
        self.category_id = fields.category_id;
        self.memo = fields.memo;
        self.updated_at = updated_at;
    }
}

impl Record for SavedEntry {
    type Fields = NewSavedEntry;

    fn id(&self) -> &str {
        &self.id
    }

    fn build(id: String, fields: NewSavedEntry, created_at: String, updated_at: String) -> Self {
        Self {
            id,
            title: fields.title,
            calories: fields.calories,
            photo: fields.photo,
            category_id: fields.category_id,
            memo: fields.memo,
            created_at,
            updated_at,
        }
    }

    fn apply(&mut self, fields: NewSavedEntry, updated_at: String) {
        self.title = fields.title;
        self.calories = fields.calories;
        self.photo = fields.photo;
        self.category_id = fields.category_id;
        self.memo = fields.memo;
        self.updated_at = updated_at;
    }
}

impl Record for Category {
    type Fields = NewCategory;

    fn id(&self) -> &str {
        &self.id
    }

    fn build(id: String, fields: NewCategory, created_at: String, updated_at: String) -> Self {
        Self {
            id,
            name: fields.name,
            color: fields.color,
            created_at,
            updated_at,
        }
    }

    fn apply(&mut self, fields: NewCategory, updated_at: String) {
        self.name = fields.name;
        self.color = fields.color;
        self.updated_at = updated_at;
    }
}

/// Applies a [`Save`] to an in-memory collection and returns the stored
/// record. Does not touch the store; callers persist afterwards.
fn upsert_into<T: Record>(items: &mut Vec<T>, save: Save<T::Fields>) -> T {
    let now = date::now_timestamp();
    match save {
        Save::Update { id, fields } => {
            if let Some(existing) = items.iter_mut().find(|item| item.id() == id) {
                existing.apply(fields, now);
                existing.clone()
            } else {
                let record = T::build(id, fields, now.clone(), now);
                items.push(record.clone());
                record
            }
        }
        Save::Create(fields) => {
            let record = T::build(generate_id(), fields, now.clone(), now);
            items.push(record.clone());
            record
        }
    }
}

/// Read-modify-write access to one collection, parameterized by storage key.
struct Collection<'s, T> {
    store: &'s KvStore,
    key: &'static str,
    _record: PhantomData<T>,
}

impl<'s, T: Record> Collection<'s, T> {
    fn new(store: &'s KvStore, key: &'static str) -> Self {
        Self {
            store,
            key,
            _record: PhantomData,
        }
    }

    fn load(&self) -> Vec<T> {
        self.store.read(self.key, Vec::new())
    }

    fn persist(&self, items: &[T]) {
        self.store.write(self.key, &items);
    }

    fn upsert(&self, save: Save<T::Fields>) -> T {
        let mut items = self.load();
        let saved = upsert_into(&mut items, save);
        self.persist(&items);
        saved
    }

    fn remove(&self, id: &str) {
        let mut items = self.load();
        items.retain(|item| item.id() != id);
        self.persist(&items);
    }

    fn get_by_id(&self, id: &str) -> Option<T> {
        self.load().into_iter().find(|item| item.id() == id)
    }
}

pub struct Entries<'s> {
    col: Collection<'s, Entry>,
}

impl<'s> Entries<'s> {
    #[must_use]
    pub fn new(store: &'s KvStore) -> Self {
        Self {
            col: Collection::new(store, ENTRIES_KEY),
        }
    }

    #[must_use]
    pub fn list(&self) -> Vec<Entry> {
        self.col.load()
    }

    /// Entries whose date key matches `date` exactly.
    #[must_use]
    pub fn by_date(&self, date: &str) -> Vec<Entry> {
        self.list()
            .into_iter()
            .filter(|entry| entry.date == date)
            .collect()
    }

    pub fn upsert(&self, save: Save<NewEntry>) -> Entry {
        self.col.upsert(save)
    }

    pub fn remove(&self, id: &str) {
        self.col.remove(id);
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<Entry> {
        self.col.get_by_id(id)
    }
}

pub struct SavedEntries<'s> {
    col: Collection<'s, SavedEntry>,
}

impl<'s> SavedEntries<'s> {
    #[must_use]
    pub fn new(store: &'s KvStore) -> Self {
        Self {
            col: Collection::new(store, SAVED_ENTRIES_KEY),
        }
    }

    #[must_use]
    pub fn list(&self) -> Vec<SavedEntry> {
        self.col.load()
    }

    pub fn upsert(&self, save: Save<NewSavedEntry>) -> SavedEntry {
        self.col.upsert(save)
    }

    pub fn remove(&self, id: &str) {
        self.col.remove(id);
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<SavedEntry> {
        self.col.get_by_id(id)
    }
}

const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("朝食", "#FFB84D"),
    ("昼食", "#4DA6FF"),
    ("夕食", "#FF6B6B"),
    ("間食", "#95E1D3"),
    ("飲み物", "#A8E6CF"),
];

/// Seed names shipped by the first release. Finding any of them in the
/// stored collection triggers the forced reseed in [`Categories::list`].
const LEGACY_CATEGORY_NAMES: &[&str] = &["朝ごはん", "昼ごはん", "夜ごはん", "おやつ"];

fn default_categories() -> Vec<Category> {
    let now = date::now_timestamp();
    DEFAULT_CATEGORIES
        .iter()
        .enumerate()
        .map(|(index, (name, color))| Category {
            id: format!("cat-{:03}", index + 1),
            name: (*name).to_string(),
            color: Some((*color).to_string()),
            created_at: now.clone(),
            updated_at: now.clone(),
        })
        .collect()
}

pub struct Categories<'s> {
    col: Collection<'s, Category>,
}

impl<'s> Categories<'s> {
    #[must_use]
    pub fn new(store: &'s KvStore) -> Self {
        Self {
            col: Collection::new(store, CATEGORIES_KEY),
        }
    }

    /// The category collection, seeding the default set on first-ever read.
    ///
    /// A stored name from the legacy seed set means the collection predates
    /// the current defaults; the whole collection is then replaced and
    /// persisted. That check matches on names alone, so a user category
    /// that happens to reuse a legacy name is lost with the rest. Known
    /// data-loss hazard, kept for compatibility with existing stores.
    #[must_use]
    pub fn list(&self) -> Vec<Category> {
        let stored = self.col.load();
        if stored.is_empty() {
            let seeded = default_categories();
            self.col.persist(&seeded);
            return seeded;
        }
        if stored
            .iter()
            .any(|category| LEGACY_CATEGORY_NAMES.contains(&category.name.as_str()))
        {
            let seeded = default_categories();
            self.col.persist(&seeded);
            return seeded;
        }
        stored
    }

    /// Upserts against the seeded view, so a first-ever write still leaves
    /// the defaults in place alongside the new record.
    pub fn upsert(&self, save: Save<NewCategory>) -> Category {
        let mut items = self.list();
        let saved = upsert_into(&mut items, save);
        self.col.persist(&items);
        saved
    }

    pub fn remove(&self, id: &str) {
        let mut items = self.list();
        items.retain(|category| category.id != id);
        self.col.persist(&items);
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<Category> {
        self.list().into_iter().find(|category| category.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> NewEntry {
        NewEntry {
            title: "Lunch".to_string(),
            calories: 650.0,
            date: "2024-05-10".to_string(),
            photo: None,
            category_id: None,
            memo: Some("ramen".to_string()),
        }
    }

    #[test]
    fn test_create_generates_id_and_stamps() {
        let store = KvStore::in_memory();
        let entries = Entries::new(&store);

        let entry = entries.upsert(Save::Create(sample_fields()));
        assert!(!entry.id.is_empty());
        assert_eq!(entry.created_at, entry.updated_at);

        let listed = entries.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, entry.id);
        assert_eq!(listed[0].title, "Lunch");
        assert_eq!(listed[0].calories, 650.0);
        assert_eq!(listed[0].memo.as_deref(), Some("ramen"));
    }

    #[test]
    fn test_create_twice_yields_distinct_ids() {
        let store = KvStore::in_memory();
        let entries = Entries::new(&store);
        let a = entries.upsert(Save::Create(sample_fields()));
        let b = entries.upsert(Save::Create(sample_fields()));
        assert_ne!(a.id, b.id);
        assert_eq!(entries.list().len(), 2);
    }

    #[test]
    fn test_update_preserves_created_at() {
        let store = KvStore::in_memory();
        let entries = Entries::new(&store);
        let original = entries.upsert(Save::Create(sample_fields()));

        let mut fields = sample_fields();
        fields.calories = 700.0;
        let updated = entries.upsert(Save::Update {
            id: original.id.clone(),
            fields,
        });

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at >= updated.created_at);
        assert_eq!(updated.calories, 700.0);
        // Replaced in place, not appended.
        assert_eq!(entries.list().len(), 1);
    }

    #[test]
    fn test_update_with_unknown_id_inserts_under_that_id() {
        let store = KvStore::in_memory();
        let entries = Entries::new(&store);

        let saved = entries.upsert(Save::Update {
            id: "imported-001".to_string(),
            fields: sample_fields(),
        });
        assert_eq!(saved.id, "imported-001");
        assert_eq!(saved.created_at, saved.updated_at);
        assert_eq!(entries.list().len(), 1);
    }

    #[test]
    fn test_remove_filters_and_is_idempotent() {
        let store = KvStore::in_memory();
        let entries = Entries::new(&store);
        let entry = entries.upsert(Save::Create(sample_fields()));

        entries.remove(&entry.id);
        assert!(entries.list().is_empty());
        // Removing again is a silent no-op.
        entries.remove(&entry.id);
        assert!(entries.list().is_empty());
    }

    #[test]
    fn test_by_date_filters_exactly() {
        let store = KvStore::in_memory();
        let entries = Entries::new(&store);
        entries.upsert(Save::Create(sample_fields()));
        let mut other = sample_fields();
        other.date = "2024-05-11".to_string();
        entries.upsert(Save::Create(other));

        let day = entries.by_date("2024-05-10");
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].date, "2024-05-10");
        assert!(entries.by_date("2024-05-12").is_empty());
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let store = KvStore::in_memory();
        let entries = Entries::new(&store);
        for title in ["first", "second", "third"] {
            let mut fields = sample_fields();
            fields.title = title.to_string();
            entries.upsert(Save::Create(fields));
        }
        let titles: Vec<String> = entries.list().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_saved_entries_are_independent_of_entries() {
        let store = KvStore::in_memory();
        let saved = SavedEntries::new(&store);
        saved.upsert(Save::Create(NewSavedEntry {
            title: "Protein bar".to_string(),
            calories: 200.0,
            photo: None,
            category_id: None,
            memo: None,
        }));
        assert_eq!(saved.list().len(), 1);
        assert!(Entries::new(&store).list().is_empty());
    }

    #[test]
    fn test_categories_seed_once_on_first_read() {
        let store = KvStore::in_memory();
        let categories = Categories::new(&store);

        let first = categories.list();
        assert_eq!(first.len(), 5);
        assert_eq!(first[0].id, "cat-001");
        assert_eq!(first[0].name, "朝食");
        assert_eq!(first[0].color.as_deref(), Some("#FFB84D"));

        // The seed is persisted, not recomputed per read.
        let raw: Vec<Category> = store.read(CATEGORIES_KEY, Vec::new());
        assert_eq!(raw.len(), 5);
        let second = categories.list();
        assert_eq!(second.len(), 5);
        assert_eq!(second[0].created_at, first[0].created_at);
    }

    #[test]
    fn test_categories_do_not_reseed_after_user_edits() {
        let store = KvStore::in_memory();
        let categories = Categories::new(&store);
        categories.list();
        for category in categories.list() {
            categories.remove(&category.id);
        }
        categories.upsert(Save::Create(NewCategory {
            name: "夜食".to_string(),
            color: None,
        }));

        let listed = categories.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "夜食");
    }

    #[test]
    fn test_legacy_names_force_a_reseed() {
        let store = KvStore::in_memory();
        let stale = vec![
            Category {
                id: "cat-001".to_string(),
                name: "朝ごはん".to_string(),
                color: None,
                created_at: "2023-01-01T00:00:00.000+09:00".to_string(),
                updated_at: "2023-01-01T00:00:00.000+09:00".to_string(),
            },
            Category {
                id: "custom".to_string(),
                name: "サプリ".to_string(),
                color: Some("#123456".to_string()),
                created_at: "2023-01-01T00:00:00.000+09:00".to_string(),
                updated_at: "2023-01-01T00:00:00.000+09:00".to_string(),
            },
        ];
        store.write(CATEGORIES_KEY, &stale);

        let categories = Categories::new(&store);
        let listed = categories.list();
        // Whole-collection replacement: the custom record is gone too.
        assert_eq!(listed.len(), 5);
        assert!(listed.iter().all(|c| c.name != "サプリ"));
        assert!(listed.iter().any(|c| c.name == "朝食"));
    }

    #[test]
    fn test_non_legacy_collections_are_left_alone() {
        let store = KvStore::in_memory();
        let custom = vec![Category {
            id: "custom".to_string(),
            name: "サプリ".to_string(),
            color: None,
            created_at: "2023-01-01T00:00:00.000+09:00".to_string(),
            updated_at: "2023-01-01T00:00:00.000+09:00".to_string(),
        }];
        store.write(CATEGORIES_KEY, &custom);

        let listed = Categories::new(&store).list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "サプリ");
    }

    #[test]
    fn test_category_get_by_id() {
        let store = KvStore::in_memory();
        let categories = Categories::new(&store);
        let found = categories.get_by_id("cat-003");
        assert_eq!(found.map(|c| c.name), Some("夕食".to_string()));
        assert!(categories.get_by_id("nope").is_none());
    }

    #[test]
    fn test_unavailable_store_degrades_to_no_persistence() {
        let store = KvStore::unavailable();
        let entries = Entries::new(&store);
        let entry = entries.upsert(Save::Create(sample_fields()));
        // The record is returned to the caller but nothing persists.
        assert!(!entry.id.is_empty());
        assert!(entries.list().is_empty());
    }
}
