use wasm_bindgen::JsValue;

use odd1out_core::should_resume;

pub(crate) const DEFAULT_CATALOG_URL: &str = "puzzles.json";
pub(crate) const DEFAULT_BACKEND_GLOBAL: &str = "__ODD1OUT_BACKEND";

fn configured(raw: Option<&'static str>, fallback: &'static str) -> &'static str {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
}

pub(crate) fn catalog_url() -> &'static str {
    configured(
        option_env!("ODD1OUT_CATALOG_URL").or(option_env!("TRUNK_PUBLIC_ODD1OUT_CATALOG_URL")),
        DEFAULT_CATALOG_URL,
    )
}

pub(crate) fn backend_global() -> &'static str {
    configured(option_env!("ODD1OUT_BACKEND_GLOBAL"), DEFAULT_BACKEND_GLOBAL)
}

/// Whether the page was opened on the game fragment rather than the landing page.
pub(crate) fn resume_requested() -> bool {
    web_sys::window()
        .and_then(|window| window.location().hash().ok())
        .is_some_and(|hash| should_resume(&hash))
}

pub(crate) fn clear_location_hash() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let location = window.location();
    let path = location.pathname().unwrap_or_default();
    let search = location.search().unwrap_or_default();
    let new_url = format!("{path}{search}");
    if let Ok(history) = window.history() {
        let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(&new_url));
    } else {
        let _ = location.set_hash("");
    }
}

pub(crate) fn go_to(target: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if window.location().set_href(target).is_err() {
        gloo::console::warn!("navigation failed", target.to_string());
    }
}
