use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Date, Function, Math};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;

use odd1out_core::{
    ActionOutcome, AuthBridge, DayKey, Effect, GameAction, GameController, GameRules, Identity,
    LoginFlow, ResultSummary, SubmitOutcome,
};

use crate::app_router;
use crate::backend::JsBackend;
use crate::catalog_fetch::FetchCatalog;
use crate::local_store::BrowserLocalStore;

pub(crate) type BrowserController = GameController<JsBackend, JsBackend, BrowserLocalStore, FetchCatalog>;

thread_local! {
    static CONTROLLER: RefCell<Option<Rc<BrowserController>>> = RefCell::new(None);
    static LISTENER: RefCell<Option<Function>> = RefCell::new(None);
    static LOGIN: RefCell<LoginFlow> = RefCell::new(LoginFlow::new(GameRules::default()));
}

pub(crate) fn controller() -> Option<Rc<BrowserController>> {
    CONTROLLER.with(|slot| slot.borrow().clone())
}

pub(crate) fn backend() -> JsBackend {
    JsBackend::new(app_router::backend_global())
}

pub(crate) fn today() -> Option<DayKey> {
    let now = Date::new_0();
    DayKey::from_ymd(
        now.get_full_year() as i32,
        now.get_month() + 1,
        now.get_date(),
    )
    .ok()
}

fn seed() -> u64 {
    let noise = (Math::random() * u32::MAX as f64) as u64;
    (Date::now().max(0.0) as u64).rotate_left(32) ^ noise
}

/// Builds the controller once and hands the identity subscription to it. The backend
/// reports the initial identity right away, which starts the first load.
pub(crate) fn install() {
    if controller().is_some() {
        return;
    }
    let rules = GameRules::default();
    let backend = backend();
    let controller = Rc::new(GameController::new(
        backend.clone(),
        backend,
        BrowserLocalStore,
        FetchCatalog::new(app_router::catalog_url(), rules),
        rules,
        seed(),
    ));
    CONTROLLER.with(|slot| *slot.borrow_mut() = Some(Rc::clone(&controller)));
    controller
        .auth()
        .on_identity_change(Rc::new(|identity| spawn_local(handle_identity(identity))));
}

async fn handle_identity(identity: Option<Identity>) {
    let Some(controller) = controller() else {
        return;
    };
    let Some(today) = today() else {
        log::error!("could not determine today's date");
        return;
    };
    match controller.identity_changed(identity, today).await {
        Ok(outcome) => log::debug!("session start: {outcome:?}"),
        Err(err) => log::error!("{err}"),
    }
    notify();
}

pub(crate) fn set_listener(listener: Option<Function>) {
    LISTENER.with(|slot| *slot.borrow_mut() = listener);
    notify();
}

pub(crate) fn view_json() -> String {
    let Some(controller) = controller() else {
        return "null".to_string();
    };
    serde_json::to_string(&controller.view()).unwrap_or_else(|_| "null".to_string())
}

pub(crate) fn notify() {
    let Some(listener) = LISTENER.with(|slot| slot.borrow().clone()) else {
        return;
    };
    let view = JsValue::from_str(&view_json());
    if listener.call1(&JsValue::NULL, &view).is_err() {
        gloo::console::warn!("view listener threw");
    }
}

/// Applies an action right away and writes it back in the background.
pub(crate) fn dispatch(action: GameAction) -> Option<ActionOutcome> {
    let controller = controller()?;
    let step = controller.dispatch(action);
    notify();
    if !step.effects.is_empty() {
        let refreshes_stats = step
            .effects
            .iter()
            .any(|effect| matches!(effect, Effect::RecordResult { .. }));
        let effects = step.effects;
        spawn_local(async move {
            controller.flush(effects).await;
            if refreshes_stats {
                notify();
            }
        });
    }
    Some(step.outcome)
}

pub(crate) fn result_summary(outcome: &SubmitOutcome) -> Option<ResultSummary> {
    let controller = controller()?;
    let context = controller.context();
    context.session()?.result_summary(outcome)
}

pub(crate) fn login_flow() -> LoginFlow {
    LOGIN.with(|flow| flow.borrow().clone())
}

pub(crate) fn store_login_flow(flow: LoginFlow) {
    LOGIN.with(|slot| *slot.borrow_mut() = flow);
}
