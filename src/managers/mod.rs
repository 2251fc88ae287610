// PasteCrop state managers
// Managers own mutable application state backed by local storage.

pub mod history_store;
