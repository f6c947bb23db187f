use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::rules::GameRules;

/// Authenticated user reference issued by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("wrong email or password")]
    WrongCredential,
    #[error("no account for this email")]
    UnknownIdentity,
    #[error("email already registered")]
    EmailInUse,
    #[error("password shorter than {min} characters")]
    WeakPassword { min: usize },
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("auth backend unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// Message shown next to the form that produced the error.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::WrongCredential => "Incorrect email or password.".to_string(),
            AuthError::UnknownIdentity => "No account exists for this email.".to_string(),
            AuthError::EmailInUse => {
                "This email is already in use. Please log in instead.".to_string()
            }
            AuthError::WeakPassword { min } => {
                format!("Password must be at least {min} characters long.")
            }
            AuthError::PasswordMismatch => "Passwords do not match.".to_string(),
            AuthError::InvalidEmail => "Please enter a valid email address.".to_string(),
            AuthError::Unavailable(_) => {
                "An unexpected error occurred. Please try again.".to_string()
            }
        }
    }
}

pub type IdentityCallback = Rc<dyn Fn(Option<Identity>)>;

#[allow(async_fn_in_trait)]
pub trait AuthBridge {
    async fn check_identity_exists(&self, email: &str) -> Result<bool, AuthError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
    /// Delivers the current identity once right away, then again on every change.
    fn on_identity_change(&self, callback: IdentityCallback);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStep {
    EnterEmail,
    EnterPassword { email: String, exists: bool },
    Done(Identity),
}

/// Email-first login: the backend decides whether the password step signs in or
/// creates the account.
#[derive(Debug, Clone)]
pub struct LoginFlow {
    step: LoginStep,
    rules: GameRules,
}

impl LoginFlow {
    pub fn new(rules: GameRules) -> Self {
        Self {
            step: LoginStep::EnterEmail,
            rules,
        }
    }

    pub fn step(&self) -> &LoginStep {
        &self.step
    }

    pub fn action_label(&self) -> &'static str {
        match &self.step {
            LoginStep::EnterEmail => "Continue",
            LoginStep::EnterPassword { exists: true, .. } => "Log In",
            LoginStep::EnterPassword { exists: false, .. } => "Create Account",
            LoginStep::Done(_) => "Play",
        }
    }

    pub fn reset(&mut self) {
        self.step = LoginStep::EnterEmail;
    }

    pub async fn submit_email<A: AuthBridge>(
        &mut self,
        auth: &A,
        email: &str,
    ) -> Result<bool, AuthError> {
        let email = normalize_email(email)?;
        let exists = auth.check_identity_exists(&email).await.map_err(|err| {
            log::warn!("identity lookup failed: {err}");
            AuthError::Unavailable("could not verify email".to_string())
        })?;
        self.step = LoginStep::EnterPassword { email, exists };
        Ok(exists)
    }

    pub async fn submit_password<A: AuthBridge>(
        &mut self,
        auth: &A,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let LoginStep::EnterPassword { email, exists } = &self.step else {
            return Err(AuthError::InvalidEmail);
        };
        check_password(&self.rules, password)?;
        let identity = if *exists {
            auth.sign_in(email, password).await?
        } else {
            auth.sign_up(email, password).await?
        };
        self.step = LoginStep::Done(identity.clone());
        Ok(identity)
    }
}

/// Stand-alone sign-up form with a confirmation field.
pub async fn sign_up_with_confirmation<A: AuthBridge>(
    auth: &A,
    rules: &GameRules,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<Identity, AuthError> {
    let email = normalize_email(email)?;
    check_password(rules, password)?;
    if password != confirm {
        return Err(AuthError::PasswordMismatch);
    }
    auth.sign_up(&email, password).await
}

fn check_password(rules: &GameRules, password: &str) -> Result<(), AuthError> {
    if password.chars().count() < rules.min_password_len {
        return Err(AuthError::WeakPassword {
            min: rules.min_password_len,
        });
    }
    Ok(())
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(user, domain)| !user.is_empty() && !domain.is_empty());
    if !valid {
        return Err(AuthError::InvalidEmail);
    }
    Ok(email.to_string())
}
