use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::fs;
use url::Url;

use crate::error::AppError;

const TICKETS_DIR: &str = "tickets";

/// Longest sanitized name, in bytes. The stored file also carries the ticket id.
const MAX_FILE_NAME_BYTES: usize = 100;
/// Longest suffix still treated as an extension when shortening a name.
const MAX_EXTENSION_BYTES: usize = 16;

/// Ticket blobs on local disk, laid out as `tickets/<trip_id>/<ticket_id>_<file_name>`.
#[derive(Clone)]
pub struct FileStore {
    root: Arc<PathBuf>,
    public_base: Arc<Url>,
}

impl FileStore {
    pub fn new(root: PathBuf, public_base: Url) -> Self {
        Self {
            root: Arc::new(root),
            public_base: Arc::new(public_base),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_structure(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.root().join(TICKETS_DIR)).await?;
        Ok(())
    }

    fn trip_dir(&self, trip_id: &str) -> PathBuf {
        self.root().join(TICKETS_DIR).join(trip_id)
    }

    /// Path relative to the files root, using `/` separators.
    pub fn ticket_key(trip_id: &str, ticket_id: &str, file_name: &str) -> String {
        format!("{TICKETS_DIR}/{trip_id}/{ticket_id}_{file_name}")
    }

    pub fn path_for_key(&self, key: &str) -> PathBuf {
        key.split('/')
            .fold(self.root().to_path_buf(), |path, part| path.join(part))
    }

    pub async fn write_ticket(
        &self,
        trip_id: &str,
        ticket_id: &str,
        file_name: &str,
        data: &[u8],
    ) -> Result<String, AppError> {
        fs::create_dir_all(self.trip_dir(trip_id)).await?;
        let key = Self::ticket_key(trip_id, ticket_id, file_name);
        fs::write(self.path_for_key(&key), data).await?;
        Ok(key)
    }

    pub async fn read(&self, key: &str) -> Result<Vec<u8>, AppError> {
        match fs::read(self.path_for_key(key)).await {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn remove(&self, key: &str) -> Result<(), AppError> {
        match fs::remove_file(self.path_for_key(key)).await {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }

    pub async fn remove_trip(&self, trip_id: &str) -> Result<(), AppError> {
        let dir = self.trip_dir(trip_id);
        if fs::try_exists(&dir).await? {
            fs::remove_dir_all(dir).await?;
        }
        Ok(())
    }

    /// Download URL for a ticket. The route behind it checks trip membership.
    pub fn download_url(&self, trip_id: &str, ticket_id: &str) -> Result<String, AppError> {
        let mut url = (*self.public_base).clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config("PUBLIC_BASE_URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["api", "trips", trip_id, "tickets", ticket_id, "file"]);
        Ok(url.to_string())
    }
}

/// Keeps ticket names safe to use as a single path segment.
pub fn sanitize_file_name(raw: &str) -> String {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').trim();
    if cleaned.is_empty() {
        return "ticket".into();
    }
    shorten(cleaned, MAX_FILE_NAME_BYTES)
}

/// Cuts `name` down to `max` bytes on a char boundary, keeping a short extension.
fn shorten(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() < MAX_EXTENSION_BYTES => {
            (stem, Some(ext))
        }
        _ => (name, None),
    };
    let budget = max - ext.map_or(0, |ext| ext.len() + 1);
    let mut cut = budget.min(stem.len());
    while !stem.is_char_boundary(cut) {
        cut -= 1;
    }
    let stem = stem[..cut].trim_end();
    match ext {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> FileStore {
        FileStore::new(
            PathBuf::from("/tmp/files"),
            Url::parse("http://localhost:3000/").unwrap(),
        )
    }

    #[test]
    fn sanitize_strips_directories_and_odd_characters() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\tmp\\boarding pass.pdf"), "boarding pass.pdf");
        assert_eq!(sanitize_file_name("ticket<1>.png"), "ticket_1_.png");
        assert_eq!(sanitize_file_name(".."), "ticket");
    }

    #[test]
    fn long_names_are_shortened_keeping_the_extension() {
        let name = sanitize_file_name(&format!("{}.pdf", "a".repeat(300)));
        assert_eq!(name.len(), MAX_FILE_NAME_BYTES);
        assert!(name.ends_with("aaa.pdf"));

        let wide = sanitize_file_name(&format!("{}.png", "é".repeat(200)));
        assert!(wide.len() <= MAX_FILE_NAME_BYTES);
        assert!(wide.ends_with("é.png"));

        let no_ext = sanitize_file_name(&"b".repeat(500));
        assert_eq!(no_ext, "b".repeat(MAX_FILE_NAME_BYTES));
    }

    #[test]
    fn download_url_points_at_the_ticket_route() {
        let files = store();
        assert_eq!(
            files.download_url("trip_1", "ticket_2").unwrap(),
            "http://localhost:3000/api/trips/trip_1/tickets/ticket_2/file"
        );
    }

    #[test]
    fn keys_map_below_the_root() {
        let files = store();
        let key = FileStore::ticket_key("trip_1", "ticket_2", "boarding pass.pdf");
        assert_eq!(key, "tickets/trip_1/ticket_2_boarding pass.pdf");
        assert_eq!(
            files.path_for_key(&key),
            PathBuf::from("/tmp/files/tickets/trip_1/ticket_2_boarding pass.pdf")
        );
    }
}
