use std::cell::{Ref, RefCell};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::action::{ActionOutcome, GameAction};
use crate::auth::{AuthBridge, AuthError, Identity};
use crate::catalog::{CatalogError, CatalogSource};
use crate::context::{Effect, IdentityTransition, LoadOutcome, RequestTag, SessionContext, Step};
use crate::day::DayKey;
use crate::gateway::{Migration, PersistenceGateway};
use crate::rules::GameRules;
use crate::store::{LocalStore, RemoteStore};
use crate::view::GameView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Resumed,
    Fresh,
    Migrated,
    /// The identity changed while the start was in flight; nothing was applied.
    Stale,
    Unchanged,
}

#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("could not load today's puzzles: {0}")]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Runs a [`SessionContext`] against real collaborators, one request at a time.
///
/// Methods take `&self` so a host can keep the controller behind an `Rc` and call into
/// it from event handlers. No borrow of the context is held across an await.
pub struct GameController<A, R, L, C> {
    auth: A,
    gateway: PersistenceGateway<R, L>,
    catalog: C,
    context: RefCell<SessionContext>,
    rng: RefCell<StdRng>,
}

impl<A, R, L, C> GameController<A, R, L, C>
where
    A: AuthBridge,
    R: RemoteStore,
    L: LocalStore,
    C: CatalogSource,
{
    pub fn new(auth: A, remote: R, local: L, catalog: C, rules: GameRules, seed: u64) -> Self {
        Self {
            auth,
            gateway: PersistenceGateway::new(remote, local),
            catalog,
            context: RefCell::new(SessionContext::new(rules)),
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn context(&self) -> Ref<'_, SessionContext> {
        self.context.borrow()
    }

    pub fn view(&self) -> GameView {
        GameView::from_context(&self.context.borrow())
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    pub fn gateway(&self) -> &PersistenceGateway<R, L> {
        &self.gateway
    }

    /// Loads today's session for the current identity, or starts a fresh one from the
    /// catalog when nothing usable is stored.
    pub async fn start(&self, date: DayKey) -> Result<StartOutcome, StartError> {
        let tag = self.context.borrow_mut().begin_load(date.clone());
        let record = match self.gateway.load(tag.identity(), &date).await {
            Ok(record) => record,
            Err(err) => {
                self.context.borrow_mut().persistence_failed(&tag, &err);
                None
            }
        };
        let loaded = self.context.borrow_mut().finish_load(&tag, record);
        match loaded {
            LoadOutcome::Stale => return Ok(StartOutcome::Stale),
            LoadOutcome::Resumed => {
                self.refresh_stats(&tag).await;
                return Ok(StartOutcome::Resumed);
            }
            LoadOutcome::NeedsCatalog => {}
        }

        let puzzles = match self.catalog.fetch_catalog().await {
            Ok(puzzles) => puzzles,
            Err(err) => {
                log::error!("catalog fetch failed: {err}");
                return Err(err.into());
            }
        };
        let step = self.context.borrow_mut().start_fresh(&tag, puzzles);
        if !step.outcome {
            return Ok(StartOutcome::Stale);
        }
        self.flush(step.effects).await;
        self.refresh_stats(&tag).await;
        Ok(StartOutcome::Fresh)
    }

    /// Applies an identity report from the auth backend. A sign-in tries to adopt the
    /// anonymous session before anything is read for the new identity.
    pub async fn identity_changed(
        &self,
        identity: Option<Identity>,
        today: DayKey,
    ) -> Result<StartOutcome, StartError> {
        let transition = self.context.borrow_mut().identity_changed(identity);
        match transition {
            IdentityTransition::Unchanged => Ok(StartOutcome::Unchanged),
            IdentityTransition::SignedIn => match self.migrate(&today).await {
                Some(outcome) => Ok(outcome),
                None => self.start(today).await,
            },
            IdentityTransition::Initial
            | IdentityTransition::SignedOut
            | IdentityTransition::Switched => self.start(today).await,
        }
    }

    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        today: DayKey,
    ) -> Result<StartOutcome, StartError> {
        let identity = self.auth.sign_in(email, password).await?;
        self.identity_changed(Some(identity), today).await
    }

    pub async fn sign_out(&self, today: DayKey) -> Result<StartOutcome, StartError> {
        self.auth.sign_out().await?;
        self.identity_changed(None, today).await
    }

    /// Synchronous half of an action. The caller owns running the returned effects.
    pub fn dispatch(&self, action: GameAction) -> Step<ActionOutcome> {
        let mut rng = self.rng.borrow_mut();
        self.context.borrow_mut().apply(action, &mut *rng)
    }

    pub async fn act(&self, action: GameAction) -> ActionOutcome {
        let Step { outcome, effects } = self.dispatch(action);
        self.flush(effects).await;
        outcome
    }

    pub async fn flush(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Persist { tag, record } => {
                    if let Err(err) = self.gateway.save(tag.identity(), &record).await {
                        self.context.borrow_mut().persistence_failed(&tag, &err);
                    }
                }
                Effect::RecordResult { tag, did_win } => {
                    match self.gateway.record_result(tag.identity(), did_win).await {
                        Ok(Some(stats)) => {
                            self.context.borrow_mut().set_stats(&tag, stats);
                        }
                        Ok(None) => {}
                        Err(err) => {
                            self.context
                                .borrow_mut()
                                .result_not_recorded(&tag, did_win, &err);
                        }
                    }
                }
            }
        }
    }

    async fn migrate(&self, today: &DayKey) -> Option<StartOutcome> {
        let tag = self.context.borrow_mut().begin_load(today.clone());
        let identity = tag.identity()?.clone();
        match self.gateway.migrate(&identity, today).await {
            Ok(Migration::NotNeeded) => None,
            Ok(Migration::Adopted { record, stats }) => {
                let applied = self
                    .context
                    .borrow_mut()
                    .finish_migration(&tag, record, stats);
                if !applied {
                    return Some(StartOutcome::Stale);
                }
                if stats.is_none() {
                    self.refresh_stats(&tag).await;
                }
                Some(StartOutcome::Migrated)
            }
            Ok(Migration::AdoptedUnsaved { record, error }) => {
                let won = record.is_won();
                let applied = self
                    .context
                    .borrow_mut()
                    .finish_migration(&tag, record, None);
                if !applied {
                    return Some(StartOutcome::Stale);
                }
                self.refresh_stats(&tag).await;
                let mut context = self.context.borrow_mut();
                if won {
                    context.result_not_recorded(&tag, true, &error);
                } else {
                    context.persistence_failed(&tag, &error);
                }
                Some(StartOutcome::Migrated)
            }
            Err(err) => {
                self.context.borrow_mut().persistence_failed(&tag, &err);
                None
            }
        }
    }

    async fn refresh_stats(&self, tag: &RequestTag) {
        let Some(identity) = tag.identity() else {
            return;
        };
        match self.gateway.read_stats(identity).await {
            Ok(stats) => {
                self.context.borrow_mut().set_stats(tag, stats);
            }
            Err(err) => log::warn!("could not read stats for {identity}: {err}"),
        }
    }
}
