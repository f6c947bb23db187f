use serde::Serialize;

use crate::context::{PersistenceMode, SessionContext, Stage};
use crate::day::DayKey;
use crate::session::{Phase, ProgressDot, ReviewView, TokenView};
use crate::stats::UserStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewStage {
    Loading,
    Playing,
    Result,
    Review,
}

/// Flat snapshot handed to whatever draws the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameView {
    pub stage: ViewStage,
    pub date: Option<DayKey>,
    pub signed_in: bool,
    pub persistence: PersistenceMode,
    pub lives: u32,
    pub puzzle_index: usize,
    pub puzzle_count: usize,
    pub tokens: Vec<TokenView>,
    pub progress: Vec<ProgressDot>,
    pub can_submit: bool,
    pub can_shuffle: bool,
    pub review: Option<ReviewView>,
    pub stats: UserStats,
}

impl GameView {
    pub fn from_context(context: &SessionContext) -> Self {
        let mut view = Self {
            stage: ViewStage::Loading,
            date: context.today().cloned(),
            signed_in: context.identity().is_some(),
            persistence: context.persistence_mode(),
            lives: context.rules().starting_lives,
            puzzle_index: 0,
            puzzle_count: 0,
            tokens: Vec::new(),
            progress: Vec::new(),
            can_submit: false,
            can_shuffle: false,
            review: None,
            stats: context.stats(),
        };
        let Stage::Active(session) = context.stage() else {
            return view;
        };
        view.stage = match session.phase() {
            Phase::Playing => ViewStage::Playing,
            Phase::ResultPending => ViewStage::Result,
            Phase::Reviewing => ViewStage::Review,
        };
        view.date = Some(session.date().clone());
        view.lives = session.lives();
        view.puzzle_index = session.current_index();
        view.puzzle_count = session.puzzles().len();
        view.tokens = session.visible_tokens();
        view.progress = session.progress();
        view.can_submit = session.phase() == Phase::Playing && session.selected().is_some();
        view.can_shuffle = session.phase() != Phase::Reviewing;
        view.review = session.review_view();
        view
    }
}
