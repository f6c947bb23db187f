use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::record::UserDocument;
use crate::store::{RemoteStore, StoreError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub games_played: u32,
    pub wins: u32,
    pub current_streak: u32,
    pub max_streak: u32,
}

impl UserStats {
    pub fn record(&mut self, did_win: bool) {
        self.games_played = self.games_played.saturating_add(1);
        if did_win {
            self.wins = self.wins.saturating_add(1);
            self.current_streak = self.current_streak.saturating_add(1);
            self.max_streak = self.max_streak.max(self.current_streak);
        } else {
            self.current_streak = 0;
        }
    }

    pub fn win_percentage(&self) -> u32 {
        if self.games_played == 0 {
            return 0;
        }
        ((u64::from(self.wins) * 100) / u64::from(self.games_played)) as u32
    }
}

/// Re-reads the stored stats, applies one finished game and writes them back.
/// Anonymous play returns `Ok(None)` without touching any store.
pub async fn record_result<R: RemoteStore>(
    remote: &R,
    identity: Option<&Identity>,
    did_win: bool,
) -> Result<Option<UserStats>, StoreError> {
    let Some(identity) = identity else {
        return Ok(None);
    };
    let mut stats = read_stats(remote, identity).await?;
    stats.record(did_win);
    remote
        .merge_document(identity, UserDocument::with_stats(stats))
        .await?;
    log::info!(
        "stats for {identity}: played {} won {} streak {}/{}",
        stats.games_played,
        stats.wins,
        stats.current_streak,
        stats.max_streak
    );
    Ok(Some(stats))
}

pub async fn read_stats<R: RemoteStore>(
    remote: &R,
    identity: &Identity,
) -> Result<UserStats, StoreError> {
    let document = remote.read_document(identity).await?;
    Ok(document
        .and_then(|document| document.stats)
        .unwrap_or_default())
}
