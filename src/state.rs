use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use crate::{
    config::AppConfig,
    db::DbPool,
    services::{
        cache::TripCache, debounce::Debouncer, files::FileStore, manager::TripManager,
        notify::Notifier, store::TripStore,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub files: FileStore,
    pub trips: TripManager,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Self {
        let digest = Sha512::digest(config.cookie_secret.as_bytes());
        let cookie_key = Key::from(&digest[..]);

        let store = TripStore::new(db.clone());
        let files = FileStore::new(config.files_root.clone(), config.public_base_url.clone());
        let trips = TripManager::new(
            store.clone(),
            TripCache::new(),
            files.clone(),
            Notifier::new(store),
            Debouncer::new(config.note_save_debounce),
            config.max_ticket_bytes,
        );

        Self {
            config,
            db,
            files,
            trips,
            cookie_key,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
