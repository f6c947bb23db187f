pub const STARTING_LIVES: u32 = 3;
pub const TOKENS_PER_PUZZLE: usize = 5;
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRules {
    pub starting_lives: u32,
    pub tokens_per_puzzle: usize,
    pub min_password_len: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            starting_lives: STARTING_LIVES,
            tokens_per_puzzle: TOKENS_PER_PUZZLE,
            min_password_len: MIN_PASSWORD_LEN,
        }
    }
}
