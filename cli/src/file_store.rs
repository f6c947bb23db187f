use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use odd1out_core::{
    decode_record, encode_record, parse_catalog, CatalogError, CatalogSource, GameRules,
    LocalStore, Puzzle, SessionRecord, StoreError,
};

pub const SESSION_FILE: &str = "session.bin";

/// Anonymous session slot kept as an archived record under the state directory.
pub struct FileLocalStore {
    path: PathBuf,
}

impl FileLocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn unavailable(path: &Path, err: std::io::Error) -> StoreError {
    StoreError::Unavailable(format!("{}: {err}", path.display()))
}

impl LocalStore for FileLocalStore {
    async fn read(&self) -> Result<Option<SessionRecord>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(unavailable(&self.path, err)),
        };
        let record = decode_record(&bytes);
        if record.is_none() {
            log::warn!("ignoring unreadable session file {}", self.path.display());
        }
        Ok(record)
    }

    async fn write(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let bytes = encode_record(record).ok_or(StoreError::Encode)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| unavailable(parent, err))?;
        }
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|err| unavailable(&self.path, err))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(unavailable(&self.path, err)),
        }
    }
}

pub struct FileCatalog {
    path: PathBuf,
    rules: GameRules,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>, rules: GameRules) -> Self {
        Self {
            path: path.into(),
            rules,
        }
    }
}

impl CatalogSource for FileCatalog {
    async fn fetch_catalog(&self) -> Result<Vec<Puzzle>, CatalogError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|err| CatalogError::Fetch(format!("{}: {err}", self.path.display())))?;
        parse_catalog(&bytes, &self.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odd1out_core::{DayKey, Session};

    fn record() -> SessionRecord {
        let puzzle = Puzzle {
            tokens: ["red", "blue", "green", "loud", "yellow"].map(String::from).to_vec(),
            answer_index: 3,
            category: "Colours".to_string(),
            explanation: "Loud is not a colour.".to_string(),
            completed: false,
        };
        let date = DayKey::parse("2024-05-05").unwrap();
        Session::new(date, vec![puzzle], &GameRules::default()).to_record()
    }

    #[tokio::test]
    async fn session_file_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::new(dir.path().join("state"));
        assert_eq!(store.read().await.unwrap(), None);

        store.write(&record()).await.unwrap();
        assert!(store.path().exists());
        assert_eq!(store.read().await.unwrap(), Some(record()));

        store.clear().await.unwrap();
        assert_eq!(store.read().await.unwrap(), None);
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_session_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::new(dir.path());
        std::fs::write(store.path(), b"garbage").unwrap();
        assert_eq!(store.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_catalog_is_a_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FileCatalog::new(dir.path().join("nope.json"), GameRules::default());
        let err = catalog.fetch_catalog().await.unwrap_err();
        assert!(matches!(err, CatalogError::Fetch(_)));
    }
}
