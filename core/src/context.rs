use rand::Rng;

use crate::action::{ActionOutcome, GameAction};
use crate::auth::Identity;
use crate::day::DayKey;
use crate::puzzle::Puzzle;
use crate::record::SessionRecord;
use crate::rules::GameRules;
use crate::session::Session;
use crate::stats::UserStats;
use crate::store::StoreError;

/// Identity and epoch captured when an asynchronous request starts. Its result is
/// applied only while the context still carries the same pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
    epoch: u64,
    identity: Option<Identity>,
}

impl RequestTag {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }
}

/// Work a host has to carry out after a state change, off the input path.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Persist {
        tag: RequestTag,
        record: SessionRecord,
    },
    RecordResult {
        tag: RequestTag,
        did_win: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step<T> {
    pub outcome: T,
    pub effects: Vec<Effect>,
}

impl<T> Step<T> {
    fn quiet(outcome: T) -> Self {
        Self {
            outcome,
            effects: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceMode {
    Remote,
    Local,
    MemoryOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityTransition {
    /// First report after startup with nobody signed in.
    Initial,
    Unchanged,
    /// Somebody is signed in now and nobody was before (including the first report).
    SignedIn,
    SignedOut,
    Switched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Resumed,
    NeedsCatalog,
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Loading,
    Active(Session),
}

/// Everything one tab knows about the player: who they are, today's session and their
/// stats. Owned by a single host and reset whenever the identity changes.
#[derive(Debug, Clone)]
pub struct SessionContext {
    rules: GameRules,
    identity: Option<Identity>,
    identity_known: bool,
    epoch: u64,
    today: Option<DayKey>,
    stage: Stage,
    stats: UserStats,
    memory_only: bool,
}

impl SessionContext {
    pub fn new(rules: GameRules) -> Self {
        Self {
            rules,
            identity: None,
            identity_known: false,
            epoch: 0,
            today: None,
            stage: Stage::Loading,
            stats: UserStats::default(),
            memory_only: false,
        }
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn today(&self) -> Option<&DayKey> {
        self.today.as_ref()
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.stage {
            Stage::Active(session) => Some(session),
            Stage::Loading => None,
        }
    }

    pub fn stats(&self) -> UserStats {
        self.stats
    }

    pub fn persistence_mode(&self) -> PersistenceMode {
        if self.memory_only {
            PersistenceMode::MemoryOnly
        } else if self.identity.is_some() {
            PersistenceMode::Remote
        } else {
            PersistenceMode::Local
        }
    }

    pub fn tag(&self) -> RequestTag {
        RequestTag {
            epoch: self.epoch,
            identity: self.identity.clone(),
        }
    }

    pub fn is_current(&self, tag: &RequestTag) -> bool {
        tag.epoch == self.epoch && tag.identity == self.identity
    }

    pub fn identity_changed(&mut self, identity: Option<Identity>) -> IdentityTransition {
        let first = !self.identity_known;
        self.identity_known = true;
        if !first && identity == self.identity {
            return IdentityTransition::Unchanged;
        }
        let transition = match (&self.identity, &identity) {
            (_, None) if first => IdentityTransition::Initial,
            (None, Some(_)) => IdentityTransition::SignedIn,
            (Some(_), None) => IdentityTransition::SignedOut,
            _ => IdentityTransition::Switched,
        };
        self.epoch += 1;
        self.identity = identity;
        self.stage = Stage::Loading;
        self.stats = UserStats::default();
        self.memory_only = false;
        log::info!(
            "identity {:?}: {}",
            transition,
            self.identity
                .as_ref()
                .map(Identity::as_str)
                .unwrap_or("anonymous")
        );
        transition
    }

    pub fn begin_load(&mut self, date: DayKey) -> RequestTag {
        self.today = Some(date);
        self.stage = Stage::Loading;
        self.tag()
    }

    pub fn finish_load(&mut self, tag: &RequestTag, record: Option<SessionRecord>) -> LoadOutcome {
        if !self.is_current(tag) {
            log::debug!("dropping stale load for epoch {}", tag.epoch);
            return LoadOutcome::Stale;
        }
        let session = record
            .filter(|record| Some(&record.date) == self.today.as_ref())
            .and_then(Session::from_record);
        match session {
            Some(session) => {
                log::info!(
                    "resumed session for {} at puzzle {}",
                    session.date(),
                    session.current_index()
                );
                self.stage = Stage::Active(session);
                LoadOutcome::Resumed
            }
            None => LoadOutcome::NeedsCatalog,
        }
    }

    pub fn start_fresh(&mut self, tag: &RequestTag, puzzles: Vec<Puzzle>) -> Step<bool> {
        if !self.is_current(tag) {
            log::debug!("dropping stale catalog for epoch {}", tag.epoch);
            return Step::quiet(false);
        }
        let Some(date) = self.today.clone() else {
            return Step::quiet(false);
        };
        log::info!("starting fresh session for {date} with {} puzzles", puzzles.len());
        let session = Session::new(date, puzzles, &self.rules);
        let effects = self.persist_effects(&session);
        self.stage = Stage::Active(session);
        Step {
            outcome: true,
            effects,
        }
    }

    pub fn finish_migration(
        &mut self,
        tag: &RequestTag,
        record: SessionRecord,
        stats: Option<UserStats>,
    ) -> bool {
        if !self.is_current(tag) {
            log::debug!("dropping stale migration for epoch {}", tag.epoch);
            return false;
        }
        let Some(session) = Session::from_record(record) else {
            return false;
        };
        self.today = Some(session.date().clone());
        self.stage = Stage::Active(session);
        if let Some(stats) = stats {
            self.stats = stats;
        }
        true
    }

    pub fn set_stats(&mut self, tag: &RequestTag, stats: UserStats) -> bool {
        if !self.is_current(tag) {
            log::debug!("dropping stale stats for epoch {}", tag.epoch);
            return false;
        }
        self.stats = stats;
        true
    }

    /// First failure switches the rest of this identity's play to memory only.
    pub fn persistence_failed(&mut self, tag: &RequestTag, err: &StoreError) {
        if !self.is_current(tag) {
            log::debug!("ignoring storage failure from epoch {}: {err}", tag.epoch);
            return;
        }
        if !self.memory_only {
            log::warn!("storage failed, continuing without persistence: {err}");
            self.memory_only = true;
        }
    }

    /// A stats write that never reached the backend is still counted for this tab.
    pub fn result_not_recorded(&mut self, tag: &RequestTag, did_win: bool, err: &StoreError) {
        self.persistence_failed(tag, err);
        if self.is_current(tag) {
            self.stats.record(did_win);
        }
    }

    pub fn apply<G: Rng + ?Sized>(&mut self, action: GameAction, rng: &mut G) -> Step<ActionOutcome> {
        let tag = self.tag();
        let Stage::Active(session) = &mut self.stage else {
            return Step::quiet(ActionOutcome::NoSession);
        };
        let outcome = match action {
            GameAction::Select { token } => ActionOutcome::Select(session.select(token)),
            GameAction::SelectSlot { slot } => ActionOutcome::Select(session.select_slot(slot)),
            GameAction::Submit => ActionOutcome::Submit(session.submit()),
            GameAction::Shuffle => ActionOutcome::Shuffle(session.shuffle(rng)),
            GameAction::Continue => ActionOutcome::Advance(session.advance()),
            GameAction::EnterReview => ActionOutcome::Review(session.enter_review()),
            GameAction::Navigate { direction } => {
                ActionOutcome::Navigate(session.navigate(direction))
            }
        };
        if !outcome.changed() {
            return Step::quiet(outcome);
        }

        let mut effects = Vec::new();
        if !self.memory_only {
            effects.push(Effect::Persist {
                tag: tag.clone(),
                record: session.to_record(),
            });
        }
        if let Some(did_win) = outcome.game_finished() {
            log::info!("game finished, won: {did_win}");
            if self.identity.is_some() && !self.memory_only {
                effects.push(Effect::RecordResult { tag, did_win });
            } else if self.identity.is_some() {
                self.stats.record(did_win);
            }
        }
        Step { outcome, effects }
    }

    fn persist_effects(&self, session: &Session) -> Vec<Effect> {
        if self.memory_only {
            return Vec::new();
        }
        vec![Effect::Persist {
            tag: self.tag(),
            record: session.to_record(),
        }]
    }
}
