use std::fmt::Write;

use odd1out_core::{GameView, PersistenceMode, ResultSummary, UserStats, ViewStage};

pub fn render_view(view: &GameView) -> String {
    let mut out = String::new();
    if view.stage == ViewStage::Loading {
        out.push_str("loading...\n");
        return out;
    }
    let date = view.date.as_ref().map(|date| date.as_str()).unwrap_or("?");
    let dots: String = view
        .progress
        .iter()
        .map(|dot| if dot.completed { '●' } else { '○' })
        .collect();
    let _ = writeln!(
        out,
        "{date}  puzzle {}/{}  {dots}  lives {}{}",
        view.puzzle_index + 1,
        view.puzzle_count,
        "♥".repeat(view.lives as usize),
        persistence_note(view.persistence)
    );
    if let Some(review) = &view.review {
        let _ = writeln!(out, "review: {}", review.category);
    }
    for token in &view.tokens {
        let marker = if token.answer {
            '*'
        } else if token.struck {
            'x'
        } else if token.selected {
            '>'
        } else {
            ' '
        };
        let _ = writeln!(out, " {marker} {}. {}", token.slot + 1, token.text);
    }
    if let Some(review) = &view.review {
        let _ = writeln!(out, "   {}", review.explanation);
        let mut moves = Vec::new();
        if review.can_prev {
            moves.push("p: previous");
        }
        if review.can_next {
            moves.push("n: next");
        }
        if !moves.is_empty() {
            let _ = writeln!(out, "   [{}]", moves.join(", "));
        }
    } else if view.stage == ViewStage::Result {
        out.push_str("   [c: continue]\n");
    } else if view.can_submit {
        out.push_str("   [s: submit, h: shuffle]\n");
    }
    out
}

fn persistence_note(mode: PersistenceMode) -> &'static str {
    match mode {
        PersistenceMode::Remote => "  (signed in)",
        PersistenceMode::Local => "",
        PersistenceMode::MemoryOnly => "  (not saving)",
    }
}

pub fn render_summary(summary: &ResultSummary) -> String {
    let mut out = format!("{}\n{}: {}\n", summary.title, summary.category, summary.explanation);
    if let Some(score) = &summary.final_score {
        out.push_str(score);
        out.push('\n');
    }
    out
}

pub fn render_stats(stats: &UserStats) -> String {
    format!(
        "played {}  won {}%  streak {}  best {}",
        stats.games_played,
        stats.win_percentage(),
        stats.current_streak,
        stats.max_streak
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use odd1out_core::{GameRules, SessionContext};

    #[test]
    fn loading_view_is_one_line() {
        let view = GameView::from_context(&SessionContext::new(GameRules::default()));
        assert_eq!(render_view(&view), "loading...\n");
    }

    #[test]
    fn stats_line_shows_percentage() {
        let stats = UserStats {
            games_played: 4,
            wins: 3,
            current_streak: 0,
            max_streak: 3,
        };
        assert_eq!(render_stats(&stats), "played 4  won 75%  streak 0  best 3");
    }

    #[test]
    fn summary_includes_final_score_on_loss() {
        let summary = ResultSummary {
            title: "Game Over".to_string(),
            category: "Planets".to_string(),
            explanation: "Pluto was reclassified.".to_string(),
            final_score: Some("You answered 2/5 correctly.".to_string()),
            continue_label: "View Puzzle".to_string(),
        };
        let text = render_summary(&summary);
        assert!(text.starts_with("Game Over\nPlanets: Pluto"));
        assert!(text.ends_with("You answered 2/5 correctly.\n"));
    }
}
