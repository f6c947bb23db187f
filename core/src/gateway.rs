use crate::auth::Identity;
use crate::day::DayKey;
use crate::record::{SessionRecord, UserDocument};
use crate::stats::{self, UserStats};
use crate::store::{LocalStore, RemoteStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Migration {
    NotNeeded,
    Adopted {
        record: SessionRecord,
        stats: Option<UserStats>,
    },
    /// The local session qualified but could not be written under the identity. It is
    /// still the session to play; the local copy is kept.
    AdoptedUnsaved {
        record: SessionRecord,
        error: StoreError,
    },
}

/// Routes session reads and writes to the remote document of a signed-in identity or
/// to the device-local slot for anonymous play.
pub struct PersistenceGateway<R, L> {
    remote: R,
    local: L,
}

impl<R: RemoteStore, L: LocalStore> PersistenceGateway<R, L> {
    pub fn new(remote: R, local: L) -> Self {
        Self { remote, local }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    /// `Ok(None)` means the caller has to start a fresh session from the catalog.
    pub async fn load(
        &self,
        identity: Option<&Identity>,
        date: &DayKey,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let record = match identity {
            Some(identity) => self
                .remote
                .read_document(identity)
                .await?
                .and_then(|mut document| document.days.remove(date)),
            None => self.local.read().await?,
        };
        Ok(record.filter(|record| record.usable_for(date)))
    }

    /// Returns `false` when nothing was written because the record has no puzzles.
    pub async fn save(
        &self,
        identity: Option<&Identity>,
        record: &SessionRecord,
    ) -> Result<bool, StoreError> {
        if record.puzzles.is_empty() {
            log::debug!("skipping save of an uninitialized session");
            return Ok(false);
        }
        match identity {
            Some(identity) => {
                let patch = UserDocument::day(record.date.clone(), record.clone());
                self.remote.merge_document(identity, patch).await?;
            }
            None => self.local.write(record).await?,
        }
        Ok(true)
    }

    /// Moves today's anonymous session under a freshly signed-in identity. A session
    /// that was lost is left where it is; a finished win is adopted and counted. A failed
    /// remote write still hands back the record so progress is not thrown away.
    pub async fn migrate(
        &self,
        identity: &Identity,
        date: &DayKey,
    ) -> Result<Migration, StoreError> {
        let Some(record) = self.local.read().await? else {
            return Ok(Migration::NotNeeded);
        };
        if !record.usable_for(date) || record.is_lost() {
            log::debug!("local session for {} not eligible for migration", record.date);
            return Ok(Migration::NotNeeded);
        }
        if let Err(error) = self.save(Some(identity), &record).await {
            log::warn!("could not migrate local session for {date} to {identity}: {error}");
            return Ok(Migration::AdoptedUnsaved { record, error });
        }
        let stats = if record.is_won() {
            stats::record_result(&self.remote, Some(identity), true).await?
        } else {
            None
        };
        if let Err(err) = self.local.clear().await {
            log::warn!("migrated session but could not clear local copy: {err}");
        }
        log::info!("migrated local session for {date} to {identity}");
        Ok(Migration::Adopted { record, stats })
    }

    pub async fn record_result(
        &self,
        identity: Option<&Identity>,
        did_win: bool,
    ) -> Result<Option<UserStats>, StoreError> {
        stats::record_result(&self.remote, identity, did_win).await
    }

    pub async fn read_stats(&self, identity: &Identity) -> Result<UserStats, StoreError> {
        stats::read_stats(&self.remote, identity).await
    }
}
