use std::collections::BTreeMap;

use rkyv::rancor::Error;
use rkyv::util::AlignedVec;
use serde::{Deserialize, Serialize};

use crate::day::DayKey;
use crate::puzzle::Puzzle;
use crate::stats::UserStats;

pub const SESSION_RECORD_VERSION: u32 = 1;

/// Stored form of a [`crate::Session`], written after every mutating action.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub version: u32,
    pub date: DayKey,
    pub puzzles: Vec<Puzzle>,
    pub current_puzzle_index: usize,
    pub lives: u32,
    pub selected_token_index: Option<usize>,
    pub is_game_beaten: bool,
    pub in_review_mode: bool,
    #[serde(default)]
    pub struck_tokens: Vec<usize>,
    #[serde(default)]
    pub token_order: Vec<usize>,
}

impl SessionRecord {
    pub fn is_won(&self) -> bool {
        self.is_game_beaten
    }

    pub fn is_lost(&self) -> bool {
        !self.is_game_beaten && self.lives == 0
    }

    pub fn is_in_progress(&self) -> bool {
        !self.is_game_beaten && self.lives > 0
    }

    /// A record the caller may resume for `date`.
    pub fn usable_for(&self, date: &DayKey) -> bool {
        self.version == SESSION_RECORD_VERSION && &self.date == date && !self.puzzles.is_empty()
    }
}

/// Remote document for one identity: one entry per played day plus aggregate stats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(default)]
    pub days: BTreeMap<DayKey, SessionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<UserStats>,
}

impl UserDocument {
    pub fn day(date: DayKey, record: SessionRecord) -> Self {
        let mut days = BTreeMap::new();
        days.insert(date, record);
        Self { days, stats: None }
    }

    pub fn with_stats(stats: UserStats) -> Self {
        Self {
            days: BTreeMap::new(),
            stats: Some(stats),
        }
    }

    /// Field-level merge: day keys in `patch` replace their counterparts, every other
    /// stored day survives.
    pub fn merge(&mut self, patch: UserDocument) {
        self.days.extend(patch.days);
        if let Some(stats) = patch.stats {
            self.stats = Some(stats);
        }
    }
}

pub fn encode_record(record: &SessionRecord) -> Option<Vec<u8>> {
    rkyv::to_bytes::<Error>(record)
        .ok()
        .map(|bytes| bytes.into_vec())
}

pub fn decode_record(bytes: &[u8]) -> Option<SessionRecord> {
    let mut aligned = AlignedVec::<16>::with_capacity(bytes.len());
    aligned.extend_from_slice(bytes);
    let record = rkyv::from_bytes::<SessionRecord, Error>(&aligned).ok()?;
    if record.version != SESSION_RECORD_VERSION {
        log::debug!(
            "session record version {} does not match {}",
            record.version,
            SESSION_RECORD_VERSION
        );
        return None;
    }
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::GameRules;
    use crate::session::Session;

    fn sample(date: DayKey) -> SessionRecord {
        let puzzle = Puzzle {
            tokens: ["THEATER", "LITER", "FIBER", "CENTER", "METER"]
                .iter()
                .map(|token| token.to_string())
                .collect(),
            answer_index: 1,
            category: "US Spellings with -ER".to_string(),
            explanation: "These words have UK counterparts ending in -re.".to_string(),
            completed: false,
        };
        Session::new(date, vec![puzzle], &GameRules::default()).to_record()
    }

    #[test]
    fn binary_record_survives_storage() {
        let record = sample(DayKey::from_ymd(2025, 3, 1).expect("day"));
        let bytes = encode_record(&record).expect("encode");
        assert_eq!(decode_record(&bytes), Some(record));
        assert_eq!(decode_record(&bytes[..bytes.len() / 2]), None);
    }

    #[test]
    fn stale_version_is_ignored() {
        let mut record = sample(DayKey::from_ymd(2025, 3, 1).expect("day"));
        record.version = SESSION_RECORD_VERSION + 1;
        let bytes = encode_record(&record).expect("encode");
        assert_eq!(decode_record(&bytes), None);
    }

    #[test]
    fn merge_keeps_sibling_days() {
        let monday = DayKey::from_ymd(2025, 3, 3).expect("day");
        let tuesday = DayKey::from_ymd(2025, 3, 4).expect("day");
        let mut doc = UserDocument::day(monday.clone(), sample(monday.clone()));
        doc.merge(UserDocument::with_stats(UserStats::default()));
        doc.merge(UserDocument::day(tuesday.clone(), sample(tuesday.clone())));
        assert_eq!(doc.days.len(), 2);
        assert!(doc.days.contains_key(&monday));
        assert!(doc.stats.is_some());
    }

    #[test]
    fn document_json_uses_date_keys() {
        let day = DayKey::from_ymd(2025, 3, 3).expect("day");
        let doc = UserDocument::day(day.clone(), sample(day));
        let json = serde_json::to_value(&doc).expect("json");
        assert!(json["days"]["2025-03-03"]["currentPuzzleIndex"].is_number());
        let back: UserDocument = serde_json::from_value(json).expect("doc");
        assert_eq!(back, doc);
    }
}
