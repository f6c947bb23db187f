use crate::puzzle::{Puzzle, PuzzleError};
use crate::rules::GameRules;

pub const DEFAULT_CATALOG_PATH: &str = "puzzles.json";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog fetch failed: {0}")]
    Fetch(String),
    #[error("catalog decode failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("catalog has no puzzles")]
    Empty,
    #[error("puzzle {index} is invalid: {source}")]
    InvalidPuzzle {
        index: usize,
        #[source]
        source: PuzzleError,
    },
}

/// Where the day's puzzle set comes from. Fetched once per fresh session.
#[allow(async_fn_in_trait)]
pub trait CatalogSource {
    async fn fetch_catalog(&self) -> Result<Vec<Puzzle>, CatalogError>;
}

pub fn parse_catalog(bytes: &[u8], rules: &GameRules) -> Result<Vec<Puzzle>, CatalogError> {
    let puzzles: Vec<Puzzle> = serde_json::from_slice(bytes)?;
    validate_catalog(puzzles, rules)
}

/// Validates every puzzle and clears `completed`: a fresh day always starts unsolved.
pub fn validate_catalog(
    mut puzzles: Vec<Puzzle>,
    rules: &GameRules,
) -> Result<Vec<Puzzle>, CatalogError> {
    if puzzles.is_empty() {
        return Err(CatalogError::Empty);
    }
    for (index, puzzle) in puzzles.iter_mut().enumerate() {
        puzzle
            .validate(rules)
            .map_err(|source| CatalogError::InvalidPuzzle { index, source })?;
        puzzle.completed = false;
    }
    Ok(puzzles)
}
