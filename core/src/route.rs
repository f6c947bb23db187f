/// Fragment that sends a visitor straight back into today's game.
pub const GAME_FRAGMENT: &str = "game";

/// Page a successful login or sign-up lands on.
pub const POST_LOGIN_TARGET: &str = "index.html#game";

pub fn should_resume(fragment: &str) -> bool {
    let fragment = fragment.trim();
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    fragment.trim().eq_ignore_ascii_case(GAME_FRAGMENT)
}
