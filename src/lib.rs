//! Browser binding for the daily odd-one-out game.
//!
//! The page script owns the DOM. It calls the exported functions below on user input
//! and re-renders from the JSON view passed to the listener given to `on_change`.

mod app_router;
mod backend;
mod catalog_fetch;
mod console_log;
mod local_store;
mod runtime;

use js_sys::{Function, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use odd1out_core::{
    sign_up_with_confirmation, ActionOutcome, AuthBridge, AuthError, GameAction, GameRules,
    POST_LOGIN_TARGET,
};

#[wasm_bindgen(start)]
pub fn boot() {
    console_log::init();
    log::info!("odd1out starting, catalog {}", app_router::catalog_url());
}

/// Starts the game runtime. Safe to call more than once.
#[wasm_bindgen]
pub fn start_game() {
    runtime::install();
}

#[wasm_bindgen]
pub fn resume_requested() -> bool {
    let resume = app_router::resume_requested();
    if resume {
        app_router::clear_location_hash();
    }
    resume
}

#[wasm_bindgen]
pub fn on_change(listener: Option<Function>) {
    runtime::set_listener(listener);
}

#[wasm_bindgen]
pub fn view_json() -> String {
    runtime::view_json()
}

#[wasm_bindgen]
pub fn select_slot(slot: usize) -> bool {
    runtime::dispatch(GameAction::SelectSlot { slot })
        .is_some_and(|outcome| outcome.changed())
}

/// Returns the result dialog contents as JSON, or `null` when there is none to show.
#[wasm_bindgen]
pub fn submit() -> String {
    let summary = match runtime::dispatch(GameAction::Submit) {
        Some(ActionOutcome::Submit(outcome)) => runtime::result_summary(&outcome),
        _ => None,
    };
    serde_json::to_string(&summary).unwrap_or_else(|_| "null".to_string())
}

#[wasm_bindgen]
pub fn shuffle() -> bool {
    runtime::dispatch(GameAction::Shuffle).is_some_and(|outcome| outcome.changed())
}

#[wasm_bindgen]
pub fn continue_game() -> bool {
    runtime::dispatch(GameAction::Continue).is_some_and(|outcome| outcome.changed())
}

#[wasm_bindgen]
pub fn enter_review() -> bool {
    runtime::dispatch(GameAction::EnterReview).is_some_and(|outcome| outcome.changed())
}

#[wasm_bindgen]
pub fn navigate(direction: i32) -> bool {
    runtime::dispatch(GameAction::Navigate { direction })
        .is_some_and(|outcome| outcome.changed())
}

fn reject(err: AuthError) -> JsValue {
    JsValue::from_str(&err.user_message())
}

/// First login step. Resolves to `true` when the email already has an account.
#[wasm_bindgen]
pub fn login_email(email: String) -> Promise {
    future_to_promise(async move {
        let mut flow = runtime::login_flow();
        let exists = flow.submit_email(&runtime::backend(), &email).await;
        runtime::store_login_flow(flow);
        exists.map(JsValue::from_bool).map_err(reject)
    })
}

#[wasm_bindgen]
pub fn login_action_label() -> String {
    runtime::login_flow().action_label().to_string()
}

#[wasm_bindgen]
pub fn login_password(password: String) -> Promise {
    future_to_promise(async move {
        let mut flow = runtime::login_flow();
        let result = flow.submit_password(&runtime::backend(), &password).await;
        runtime::store_login_flow(flow);
        result.map_err(reject)?;
        app_router::go_to(POST_LOGIN_TARGET);
        Ok(JsValue::UNDEFINED)
    })
}

#[wasm_bindgen]
pub fn login_reset() {
    let mut flow = runtime::login_flow();
    flow.reset();
    runtime::store_login_flow(flow);
}

#[wasm_bindgen]
pub fn sign_up(email: String, password: String, confirm: String) -> Promise {
    future_to_promise(async move {
        let rules = GameRules::default();
        sign_up_with_confirmation(&runtime::backend(), &rules, &email, &password, &confirm)
            .await
            .map_err(reject)?;
        app_router::go_to(POST_LOGIN_TARGET);
        Ok(JsValue::UNDEFINED)
    })
}

/// The identity subscription resets the session once the backend confirms.
#[wasm_bindgen]
pub fn sign_out() -> Promise {
    future_to_promise(async move {
        runtime::backend().sign_out().await.map_err(reject)?;
        Ok(JsValue::UNDEFINED)
    })
}
