use odd1out_core::session::{AdvanceOutcome, Phase, SelectOutcome, Session, SubmitOutcome};
use odd1out_core::{DayKey, GameRules, Puzzle};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn puzzle(n: usize) -> Puzzle {
    Puzzle {
        tokens: (0..5).map(|i| format!("p{n}-t{i}")).collect(),
        answer_index: (n + 3) % 5,
        category: format!("category {n}"),
        explanation: format!("explanation {n}"),
        completed: false,
    }
}

fn fresh(count: usize) -> Session {
    Session::new(
        DayKey::parse("2024-06-01").unwrap(),
        (0..count).map(puzzle).collect(),
        &GameRules::default(),
    )
}

fn answer_of(session: &Session) -> usize {
    session.current_puzzle().unwrap().answer_index
}

#[test]
fn correct_answer_then_continue_moves_on() {
    let mut session = fresh(5);
    let answer = answer_of(&session);
    assert_eq!(session.select(answer), SelectOutcome::Selected { token: answer });
    assert_eq!(
        session.submit(),
        SubmitOutcome::Correct {
            puzzle_index: 0,
            game_beaten: false,
        }
    );
    assert!(session.puzzles()[0].completed);
    assert_eq!(session.phase(), Phase::ResultPending);
    assert_eq!(session.select(0), SelectOutcome::Ignored);

    assert_eq!(session.advance(), AdvanceOutcome::NextPuzzle { puzzle_index: 1 });
    assert_eq!(session.current_index(), 1);
    assert_eq!(session.selected(), None);
    assert_eq!(session.phase(), Phase::Playing);
}

#[test]
fn selecting_twice_clears_and_submit_needs_a_selection() {
    let mut session = fresh(2);
    assert_eq!(session.submit(), SubmitOutcome::Ignored);
    assert_eq!(session.select(1), SelectOutcome::Selected { token: 1 });
    assert_eq!(session.select(4), SelectOutcome::Selected { token: 4 });
    assert_eq!(session.select(4), SelectOutcome::Cleared);
    assert_eq!(session.submit(), SubmitOutcome::Ignored);
    assert_eq!(session.lives(), 3);
}

#[test]
fn wrong_answers_strike_tokens_until_game_over() {
    let mut session = fresh(3);
    let answer = answer_of(&session);
    let wrong: Vec<usize> = (0..5).filter(|&token| token != answer).take(3).collect();

    session.select(wrong[0]);
    assert_eq!(
        session.submit(),
        SubmitOutcome::Wrong {
            token: wrong[0],
            lives_left: 2,
            game_over: false,
        }
    );
    assert_eq!(session.select(wrong[0]), SelectOutcome::Ignored);

    session.select(wrong[1]);
    session.submit();
    session.select(wrong[2]);
    let last = session.submit();
    assert_eq!(last.finished(), Some(false));
    assert_eq!(session.lives(), 0);
    assert!(session.in_review_mode());
    assert!(!session.is_game_beaten());

    let summary = session.result_summary(&last).unwrap();
    assert_eq!(summary.title, "Game Over");
    assert_eq!(
        summary.final_score.as_deref(),
        Some("You answered 0/3 correctly.")
    );

    assert_eq!(session.select(answer), SelectOutcome::Ignored);
    assert_eq!(session.submit(), SubmitOutcome::Ignored);
    assert_eq!(session.lives(), 0);
}

#[test]
fn beating_every_puzzle_ends_in_review() {
    let mut session = fresh(3);
    for index in 0..3 {
        let answer = answer_of(&session);
        session.select(answer);
        let outcome = session.submit();
        assert_eq!(session.is_game_beaten(), index == 2);
        if index < 2 {
            session.advance();
        } else {
            assert_eq!(outcome.finished(), Some(true));
            let summary = session.result_summary(&outcome).unwrap();
            assert_eq!(summary.title, "You Win!");
        }
    }
    assert!(session.in_review_mode());
    assert_eq!(session.advance(), AdvanceOutcome::Reviewing);
    assert!(session.puzzles().iter().all(|puzzle| puzzle.completed));
    let progress = session.progress();
    assert_eq!(progress[2].ordinal, Some(3));
}

#[test]
fn shuffle_is_a_permutation_that_keeps_selection() {
    let mut session = fresh(1);
    let mut rng = StdRng::seed_from_u64(42);
    let answer = answer_of(&session);
    let wrong = (answer + 1) % 5;
    session.select(wrong);
    session.submit();
    let pick = (answer + 2) % 5;
    session.select(pick);

    let before: Vec<String> = session.visible_tokens().into_iter().map(|t| t.text).collect();
    for _ in 0..8 {
        assert!(session.shuffle(&mut rng));
        let tokens = session.visible_tokens();
        let mut after: Vec<String> = tokens.iter().map(|t| t.text.clone()).collect();
        let mut expected = before.clone();
        after.sort();
        expected.sort();
        assert_eq!(after, expected);

        let selected: Vec<_> = tokens.iter().filter(|t| t.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].token, pick);
        assert!(tokens.iter().any(|t| t.struck && t.token == wrong));
        assert_eq!(session.current_puzzle().unwrap().answer_index, answer);
    }

    let answer_slot = session.order().iter().position(|&token| token == answer).unwrap();
    session.select_slot(answer_slot);
    assert_eq!(
        session.submit(),
        SubmitOutcome::Correct {
            puzzle_index: 0,
            game_beaten: true,
        }
    );
    assert!(!session.shuffle(&mut rng));
}

#[test]
fn review_navigation_is_clamped() {
    let mut session = fresh(2);
    assert!(!session.enter_review());
    for token in 0..5 {
        session.select(token);
        session.submit();
    }
    assert!(session.enter_review());
    assert!(session.enter_review());

    let start = session.current_index();
    assert_eq!(start, 0);
    assert_eq!(session.navigate(-1), None);
    assert_eq!(session.navigate(1), Some(1));
    assert_eq!(session.navigate(1), None);
    let review = session.review_view().unwrap();
    assert!(review.can_prev);
    assert!(!review.can_next);
    assert!(session.visible_tokens().iter().all(|token| !token.enabled));
}
