use crate::session::{AdvanceOutcome, SelectOutcome, SubmitOutcome};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameAction {
    Select { token: usize },
    SelectSlot { slot: usize },
    Submit,
    Shuffle,
    Continue,
    EnterReview,
    Navigate { direction: i32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    NoSession,
    Select(SelectOutcome),
    Submit(SubmitOutcome),
    Shuffle(bool),
    Advance(AdvanceOutcome),
    Review(bool),
    Navigate(Option<usize>),
}

impl ActionOutcome {
    /// Whether the session changed and has to be written back.
    pub fn changed(&self) -> bool {
        match self {
            ActionOutcome::NoSession => false,
            ActionOutcome::Select(outcome) => *outcome != SelectOutcome::Ignored,
            ActionOutcome::Submit(outcome) => *outcome != SubmitOutcome::Ignored,
            ActionOutcome::Shuffle(shuffled) => *shuffled,
            ActionOutcome::Advance(outcome) => *outcome != AdvanceOutcome::Ignored,
            ActionOutcome::Review(entered) => *entered,
            ActionOutcome::Navigate(index) => index.is_some(),
        }
    }

    pub fn game_finished(&self) -> Option<bool> {
        match self {
            ActionOutcome::Submit(outcome) => outcome.finished(),
            _ => None,
        }
    }
}
