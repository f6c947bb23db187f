use std::rc::Rc;

use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use odd1out_core::{
    AuthBridge, AuthError, Identity, IdentityCallback, RemoteStore, StoreError, UserDocument,
};

/// Promise-returning shim object the page installs on `window` for auth and documents.
#[derive(Clone, Debug)]
pub(crate) struct JsBackend {
    global: String,
}

#[derive(Debug)]
struct ShimError {
    code: Option<String>,
    message: String,
}

impl ShimError {
    fn missing(what: &str) -> Self {
        Self {
            code: None,
            message: format!("backend {what} unavailable"),
        }
    }

    fn from_js(value: &JsValue) -> Self {
        let field = |name: &str| {
            Reflect::get(value, &JsValue::from_str(name))
                .ok()
                .and_then(|field| field.as_string())
        };
        Self {
            code: field("code"),
            message: field("message")
                .or_else(|| value.as_string())
                .unwrap_or_else(|| "backend call rejected".to_string()),
        }
    }
}

/// Maps backend error codes onto the errors the login forms know how to show.
pub(crate) fn auth_error_from_code(code: Option<&str>, message: &str) -> AuthError {
    match code {
        Some("auth/wrong-password") | Some("auth/invalid-credential") => {
            AuthError::WrongCredential
        }
        Some("auth/user-not-found") => AuthError::UnknownIdentity,
        Some("auth/email-already-in-use") => AuthError::EmailInUse,
        Some("auth/weak-password") => AuthError::WeakPassword {
            min: odd1out_core::rules::MIN_PASSWORD_LEN,
        },
        Some("auth/invalid-email") => AuthError::InvalidEmail,
        _ => AuthError::Unavailable(message.to_string()),
    }
}

impl From<ShimError> for AuthError {
    fn from(err: ShimError) -> Self {
        auth_error_from_code(err.code.as_deref(), &err.message)
    }
}

impl From<ShimError> for StoreError {
    fn from(err: ShimError) -> Self {
        match err.code {
            Some(code) => StoreError::Backend(format!("{code}: {}", err.message)),
            None => StoreError::Backend(err.message),
        }
    }
}

/// Accepts either a bare uid string or an object carrying `uid`.
fn identity_from(value: &JsValue) -> Option<Identity> {
    if value.is_null() || value.is_undefined() {
        return None;
    }
    let uid = value.as_string().or_else(|| {
        Reflect::get(value, &JsValue::from_str("uid"))
            .ok()
            .and_then(|uid| uid.as_string())
    })?;
    if uid.is_empty() {
        return None;
    }
    Some(Identity::new(uid))
}

pub(crate) fn parse_document(raw: &str) -> Result<UserDocument, StoreError> {
    serde_json::from_str(raw).map_err(|err| StoreError::Decode(err.to_string()))
}

impl JsBackend {
    pub(crate) fn new(global: impl Into<String>) -> Self {
        Self {
            global: global.into(),
        }
    }

    fn shim(&self) -> Result<js_sys::Object, ShimError> {
        let window = web_sys::window().ok_or_else(|| ShimError::missing("window"))?;
        let value = Reflect::get(&window, &JsValue::from_str(&self.global))
            .map_err(|_| ShimError::missing(&self.global))?;
        if value.is_null() || value.is_undefined() {
            return Err(ShimError::missing(&self.global));
        }
        value
            .dyn_into::<js_sys::Object>()
            .map_err(|_| ShimError::missing(&self.global))
    }

    fn method(&self, name: &str) -> Result<(js_sys::Object, Function), ShimError> {
        let shim = self.shim()?;
        let func = Reflect::get(&shim, &JsValue::from_str(name))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok())
            .ok_or_else(|| ShimError::missing(name))?;
        Ok((shim, func))
    }

    async fn call(&self, name: &str, args: &[JsValue]) -> Result<JsValue, ShimError> {
        let (shim, func) = self.method(name)?;
        let array = Array::new();
        for arg in args {
            array.push(arg);
        }
        let returned = func
            .apply(&shim, &array)
            .map_err(|err| ShimError::from_js(&err))?;
        JsFuture::from(Promise::resolve(&returned))
            .await
            .map_err(|err| ShimError::from_js(&err))
    }

    async fn call_for_identity(&self, name: &str, args: &[JsValue]) -> Result<Identity, AuthError> {
        let value = self.call(name, args).await?;
        identity_from(&value)
            .ok_or_else(|| AuthError::Unavailable(format!("{name} returned no user")))
    }
}

impl AuthBridge for JsBackend {
    async fn check_identity_exists(&self, email: &str) -> Result<bool, AuthError> {
        let value = self
            .call("checkIdentityExists", &[JsValue::from_str(email)])
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.call_for_identity(
            "signIn",
            &[JsValue::from_str(email), JsValue::from_str(password)],
        )
        .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.call_for_identity(
            "signUp",
            &[JsValue::from_str(email), JsValue::from_str(password)],
        )
        .await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.call("signOut", &[]).await?;
        Ok(())
    }

    fn on_identity_change(&self, callback: IdentityCallback) {
        let (shim, func) = match self.method("onIdentityChange") {
            Ok(found) => found,
            Err(err) => {
                gloo::console::error!("identity subscription failed:", err.message);
                // Without a backend the game still runs anonymously.
                callback(None);
                return;
            }
        };
        let listener = Rc::clone(&callback);
        let closure = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            listener(identity_from(&value));
        });
        if let Err(err) = func.call1(&shim, closure.as_ref().unchecked_ref()) {
            gloo::console::error!("identity subscription rejected:", ShimError::from_js(&err).message);
            callback(None);
        }
        closure.forget();
    }
}

impl RemoteStore for JsBackend {
    async fn read_document(&self, identity: &Identity) -> Result<Option<UserDocument>, StoreError> {
        let value = self
            .call("readDocument", &[JsValue::from_str(identity.as_str())])
            .await?;
        if value.is_null() || value.is_undefined() {
            return Ok(None);
        }
        let raw = match value.as_string() {
            Some(raw) => raw,
            None => js_sys::JSON::stringify(&value)
                .map(String::from)
                .map_err(|_| StoreError::Decode("document is not JSON".to_string()))?,
        };
        parse_document(&raw).map(Some)
    }

    async fn merge_document(
        &self,
        identity: &Identity,
        patch: UserDocument,
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&patch).map_err(|_| StoreError::Encode)?;
        self.call(
            "mergeDocument",
            &[JsValue::from_str(identity.as_str()), JsValue::from_str(&raw)],
        )
        .await?;
        Ok(())
    }
}
