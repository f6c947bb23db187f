use rand::Rng;
use serde::Serialize;

use crate::day::DayKey;
use crate::puzzle::Puzzle;
use crate::record::{SessionRecord, SESSION_RECORD_VERSION};
use crate::rules::GameRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// The current puzzle accepts selection and submission.
    Playing,
    /// The current puzzle was just solved and the game goes on; waiting for continue.
    ResultPending,
    /// Read-only walk through every puzzle with answers revealed. Terminal.
    Reviewing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected { token: usize },
    Cleared,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ignored,
    Correct {
        puzzle_index: usize,
        game_beaten: bool,
    },
    Wrong {
        token: usize,
        lives_left: u32,
        game_over: bool,
    },
}

impl SubmitOutcome {
    /// `Some(won)` when this submission ended the game.
    pub fn finished(&self) -> Option<bool> {
        match self {
            SubmitOutcome::Correct {
                game_beaten: true, ..
            } => Some(true),
            SubmitOutcome::Wrong {
                game_over: true, ..
            } => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    NextPuzzle { puzzle_index: usize },
    Reviewing,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenView {
    pub slot: usize,
    pub token: usize,
    pub text: String,
    pub enabled: bool,
    pub selected: bool,
    pub struck: bool,
    pub answer: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressDot {
    pub completed: bool,
    /// 1-based order in which the puzzle was counted as solved.
    pub ordinal: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub title: String,
    pub category: String,
    pub explanation: String,
    pub final_score: Option<String>,
    pub continue_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewView {
    pub puzzle_index: usize,
    pub puzzle_count: usize,
    pub category: String,
    pub explanation: String,
    pub can_prev: bool,
    pub can_next: bool,
}

/// One day's playthrough. Every mutation goes through the methods below, which keep
/// `phase` consistent with completion and lives.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    date: DayKey,
    puzzles: Vec<Puzzle>,
    current: usize,
    lives: u32,
    selected: Option<usize>,
    struck: Vec<usize>,
    order: Vec<usize>,
    phase: Phase,
}

impl Session {
    pub fn new(date: DayKey, mut puzzles: Vec<Puzzle>, rules: &GameRules) -> Self {
        for puzzle in &mut puzzles {
            puzzle.completed = false;
        }
        let order = canonical_order(puzzles.first());
        let phase = if rules.starting_lives == 0 {
            Phase::Reviewing
        } else {
            Phase::Playing
        };
        Self {
            date,
            puzzles,
            current: 0,
            lives: rules.starting_lives,
            selected: None,
            struck: Vec::new(),
            order,
            phase,
        }
    }

    /// Rebuilds a session from its stored form. Stored flags are re-derived rather than
    /// trusted, so a record saved mid-transition still resumes in a valid phase.
    pub fn from_record(record: SessionRecord) -> Option<Self> {
        if record.puzzles.is_empty() {
            return None;
        }
        let SessionRecord {
            date,
            puzzles,
            current_puzzle_index,
            lives,
            selected_token_index,
            struck_tokens,
            token_order,
            ..
        } = record;
        let last = puzzles.len() - 1;
        let mut session = Self {
            date,
            puzzles,
            current: current_puzzle_index.min(last),
            lives,
            selected: None,
            struck: Vec::new(),
            order: Vec::new(),
            phase: Phase::Playing,
        };
        if session.is_finished() {
            session.phase = Phase::Reviewing;
            session.order = canonical_order(session.current_puzzle());
            return Some(session);
        }
        if session.puzzles[session.current].completed {
            if let Some(next) = session.next_open_puzzle() {
                session.load_puzzle(next);
            }
            return Some(session);
        }

        let Some((len, answer)) = session
            .current_puzzle()
            .map(|puzzle| (puzzle.tokens.len(), puzzle.answer_index))
        else {
            return Some(session);
        };
        let mut struck = Vec::new();
        for token in struck_tokens {
            if token < len && token != answer && !struck.contains(&token) {
                struck.push(token);
            }
        }
        session.order = if is_permutation(&token_order, len) {
            token_order
        } else {
            (0..len).collect()
        };
        session.struck = struck;
        session.selected = selected_token_index.filter(|token| session.token_enabled(*token));
        Some(session)
    }

    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            version: SESSION_RECORD_VERSION,
            date: self.date.clone(),
            puzzles: self.puzzles.clone(),
            current_puzzle_index: self.current,
            lives: self.lives,
            selected_token_index: self.selected,
            is_game_beaten: self.is_game_beaten(),
            in_review_mode: self.in_review_mode(),
            struck_tokens: self.struck.clone(),
            token_order: self.order.clone(),
        }
    }

    pub fn date(&self) -> &DayKey {
        &self.date
    }

    pub fn puzzles(&self) -> &[Puzzle] {
        &self.puzzles
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_puzzle(&self) -> Option<&Puzzle> {
        self.puzzles.get(self.current)
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn struck(&self) -> &[usize] {
        &self.struck
    }

    /// Token indices in the order they are shown for the current puzzle.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_game_beaten(&self) -> bool {
        !self.puzzles.is_empty() && self.puzzles.iter().all(|puzzle| puzzle.completed)
    }

    pub fn is_lost(&self) -> bool {
        self.lives == 0 && !self.is_game_beaten()
    }

    pub fn is_finished(&self) -> bool {
        self.is_game_beaten() || self.lives == 0
    }

    pub fn in_review_mode(&self) -> bool {
        self.phase == Phase::Reviewing
    }

    pub fn score(&self) -> usize {
        self.puzzles.iter().filter(|puzzle| puzzle.completed).count()
    }

    pub fn select(&mut self, token: usize) -> SelectOutcome {
        if self.phase != Phase::Playing || !self.token_enabled(token) {
            return SelectOutcome::Ignored;
        }
        if self.selected == Some(token) {
            self.selected = None;
            return SelectOutcome::Cleared;
        }
        self.selected = Some(token);
        SelectOutcome::Selected { token }
    }

    pub fn select_slot(&mut self, slot: usize) -> SelectOutcome {
        match self.order.get(slot).copied() {
            Some(token) => self.select(token),
            None => SelectOutcome::Ignored,
        }
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        if self.phase != Phase::Playing {
            return SubmitOutcome::Ignored;
        }
        let Some(token) = self.selected.take() else {
            return SubmitOutcome::Ignored;
        };
        let puzzle_index = self.current;
        let Some(puzzle) = self.puzzles.get_mut(puzzle_index) else {
            return SubmitOutcome::Ignored;
        };
        if token == puzzle.answer_index {
            puzzle.completed = true;
            let game_beaten = self.is_game_beaten();
            self.phase = if game_beaten {
                Phase::Reviewing
            } else {
                Phase::ResultPending
            };
            return SubmitOutcome::Correct {
                puzzle_index,
                game_beaten,
            };
        }

        self.lives = self.lives.saturating_sub(1);
        if !self.struck.contains(&token) {
            self.struck.push(token);
        }
        let game_over = self.lives == 0;
        if game_over {
            self.phase = Phase::Reviewing;
        }
        SubmitOutcome::Wrong {
            token,
            lives_left: self.lives,
            game_over,
        }
    }

    /// Fisher-Yates over the visible order. Selection and struck tokens are keyed by
    /// token, so they follow their tokens to the new slots.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.phase == Phase::Reviewing || self.current_puzzle().is_none() {
            return false;
        }
        for i in (1..self.order.len()).rev() {
            let j = rng.random_range(0..=i);
            self.order.swap(i, j);
        }
        true
    }

    /// Moves on to the next unsolved puzzle, wrapping past the end. On a fresh day that
    /// is always `current + 1`; a resumed session can still have earlier puzzles open.
    pub fn advance(&mut self) -> AdvanceOutcome {
        match self.phase {
            Phase::Reviewing => AdvanceOutcome::Reviewing,
            Phase::Playing => AdvanceOutcome::Ignored,
            Phase::ResultPending => match self.next_open_puzzle() {
                Some(next) if !self.is_finished() => {
                    self.load_puzzle(next);
                    AdvanceOutcome::NextPuzzle { puzzle_index: next }
                }
                _ => {
                    self.phase = Phase::Reviewing;
                    AdvanceOutcome::Reviewing
                }
            },
        }
    }

    /// Only a finished game can be reviewed; calling it again is a no-op that still
    /// reports `true`.
    pub fn enter_review(&mut self) -> bool {
        if !self.is_finished() {
            return false;
        }
        self.phase = Phase::Reviewing;
        self.selected = None;
        true
    }

    pub fn navigate(&mut self, direction: i32) -> Option<usize> {
        if self.phase != Phase::Reviewing || direction == 0 {
            return None;
        }
        let target = self.current as i64 + i64::from(direction.signum());
        if target < 0 || target >= self.puzzles.len() as i64 {
            return None;
        }
        self.current = target as usize;
        Some(self.current)
    }

    pub fn visible_tokens(&self) -> Vec<TokenView> {
        let Some(puzzle) = self.current_puzzle() else {
            return Vec::new();
        };
        if self.phase == Phase::Reviewing {
            return puzzle
                .tokens
                .iter()
                .enumerate()
                .map(|(token, text)| TokenView {
                    slot: token,
                    token,
                    text: text.clone(),
                    enabled: false,
                    selected: false,
                    struck: false,
                    answer: token == puzzle.answer_index,
                })
                .collect();
        }
        self.order
            .iter()
            .enumerate()
            .filter_map(|(slot, &token)| {
                let text = puzzle.tokens.get(token)?;
                Some(TokenView {
                    slot,
                    token,
                    text: text.clone(),
                    enabled: self.phase == Phase::Playing && self.token_enabled(token),
                    selected: self.selected == Some(token),
                    struck: self.struck.contains(&token),
                    answer: puzzle.completed && token == puzzle.answer_index,
                })
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<ProgressDot> {
        let mut count = 0;
        self.puzzles
            .iter()
            .map(|puzzle| {
                if puzzle.completed {
                    count += 1;
                    ProgressDot {
                        completed: true,
                        ordinal: Some(count),
                    }
                } else {
                    ProgressDot {
                        completed: false,
                        ordinal: None,
                    }
                }
            })
            .collect()
    }

    /// What the result dialog shows after `outcome`. Wrong answers that leave lives
    /// get no dialog.
    pub fn result_summary(&self, outcome: &SubmitOutcome) -> Option<ResultSummary> {
        let (title, final_score) = match outcome {
            SubmitOutcome::Correct {
                game_beaten: true, ..
            } => ("You Win!", None),
            SubmitOutcome::Correct { .. } => ("Correct!", None),
            SubmitOutcome::Wrong {
                game_over: true, ..
            } => (
                "Game Over",
                Some(format!(
                    "You answered {}/{} correctly.",
                    self.score(),
                    self.puzzles.len()
                )),
            ),
            _ => return None,
        };
        let puzzle = self.current_puzzle()?;
        let continue_label = if final_score.is_some() {
            "View Puzzle"
        } else {
            "Continue →"
        };
        Some(ResultSummary {
            title: title.to_string(),
            category: puzzle.category.clone(),
            explanation: puzzle.explanation.clone(),
            final_score,
            continue_label: continue_label.to_string(),
        })
    }

    pub fn review_view(&self) -> Option<ReviewView> {
        if self.phase != Phase::Reviewing {
            return None;
        }
        let puzzle = self.current_puzzle()?;
        Some(ReviewView {
            puzzle_index: self.current,
            puzzle_count: self.puzzles.len(),
            category: puzzle.category.clone(),
            explanation: puzzle.explanation.clone(),
            can_prev: self.current > 0,
            can_next: self.current + 1 < self.puzzles.len(),
        })
    }

    fn token_enabled(&self, token: usize) -> bool {
        let Some(puzzle) = self.current_puzzle() else {
            return false;
        };
        token < puzzle.tokens.len() && !puzzle.completed && !self.struck.contains(&token)
    }

    fn next_open_puzzle(&self) -> Option<usize> {
        let len = self.puzzles.len();
        (self.current + 1..len)
            .chain(0..self.current)
            .find(|&index| !self.puzzles[index].completed)
    }

    fn load_puzzle(&mut self, index: usize) {
        self.current = index;
        self.selected = None;
        self.struck.clear();
        self.order = canonical_order(self.puzzles.get(index));
        self.phase = Phase::Playing;
    }
}

fn canonical_order(puzzle: Option<&Puzzle>) -> Vec<usize> {
    puzzle.map(|puzzle| (0..puzzle.tokens.len()).collect()).unwrap_or_default()
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &token in order {
        if token >= len || seen[token] {
            return false;
        }
        seen[token] = true;
    }
    true
}
