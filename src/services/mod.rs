pub mod cache;
pub mod debounce;
pub mod files;
pub mod manager;
pub mod notify;
pub mod store;
