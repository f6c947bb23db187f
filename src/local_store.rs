use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use odd1out_core::{decode_record, encode_record, LocalStore, SessionRecord, StoreError};

pub(crate) const LOCAL_SESSION_KEY: &str = "odd1out.session.v1";

/// Anonymous session slot in `localStorage`, stored as base64 of the archived record.
#[derive(Clone, Debug, Default)]
pub(crate) struct BrowserLocalStore;

fn storage() -> Result<web_sys::Storage, StoreError> {
    web_sys::window()
        .and_then(|window| window.local_storage().ok().flatten())
        .ok_or_else(|| StoreError::Unavailable("localStorage".to_string()))
}

pub(crate) fn encode_slot(record: &SessionRecord) -> Option<String> {
    encode_record(record).map(|bytes| STANDARD.encode(bytes))
}

pub(crate) fn decode_slot(raw: &str) -> Option<SessionRecord> {
    if raw.is_empty() {
        return None;
    }
    let bytes = STANDARD.decode(raw.as_bytes()).ok()?;
    decode_record(&bytes)
}

impl LocalStore for BrowserLocalStore {
    async fn read(&self) -> Result<Option<SessionRecord>, StoreError> {
        let storage = storage()?;
        let raw = storage
            .get_item(LOCAL_SESSION_KEY)
            .map_err(|_| StoreError::Unavailable("localStorage read".to_string()))?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let record = decode_slot(&raw);
        if record.is_none() {
            gloo::console::warn!("local session: unreadable slot, ignoring");
        }
        Ok(record)
    }

    async fn write(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let raw = encode_slot(record).ok_or(StoreError::Encode)?;
        storage()?
            .set_item(LOCAL_SESSION_KEY, &raw)
            .map_err(|_| StoreError::Unavailable("localStorage write".to_string()))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        storage()?
            .remove_item(LOCAL_SESSION_KEY)
            .map_err(|_| StoreError::Unavailable("localStorage remove".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odd1out_core::{DayKey, GameRules, Puzzle, Session};

    #[test]
    fn slot_survives_text_storage() {
        let puzzle = Puzzle {
            tokens: ["oak", "elm", "fir", "ash", "cod"].map(String::from).to_vec(),
            answer_index: 4,
            category: "Trees".to_string(),
            explanation: "A cod is a fish.".to_string(),
            completed: false,
        };
        let date = DayKey::parse("2024-02-29").unwrap();
        let record = Session::new(date, vec![puzzle], &GameRules::default()).to_record();

        let raw = encode_slot(&record).unwrap();
        assert!(raw.is_ascii());
        assert_eq!(decode_slot(&raw), Some(record));
    }

    #[test]
    fn garbage_slot_reads_as_empty() {
        assert_eq!(decode_slot(""), None);
        assert_eq!(decode_slot("not base64!"), None);
        assert_eq!(decode_slot(&STANDARD.encode(b"short")), None);
    }
}
