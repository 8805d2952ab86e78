//! calog — core library for a local-first calorie diary.
//!
//! Everything the UI layer needs lives behind [`CalogService`]: three
//! persisted collections (entries, saved templates, categories), daily and
//! monthly summaries, date-key helpers pinned to UTC+9, and a change bus
//! for notify-and-reload rendering. Storage is a local key-value database;
//! there is no server, no account, and no sync.

pub mod backup;
pub mod date;
pub mod events;
pub mod models;
pub mod photo;
pub mod repo;
pub mod service;
pub mod store;
pub mod summary;

pub use backup::{BackupData, ImportSummary};
pub use events::{ChangeBus, ChangeTopic, Subscription};
pub use models::{
    Category, DailySummary, Entry, FieldError, MonthlySummary, NewCategory, NewEntry,
    NewSavedEntry, SavedEntry, ValidationErrors,
};
pub use repo::Save;
pub use service::CalogService;
pub use store::KvStore;
