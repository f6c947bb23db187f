pub mod action;
pub mod auth;
pub mod catalog;
pub mod context;
pub mod controller;
pub mod day;
pub mod gateway;
pub mod memory;
pub mod puzzle;
pub mod record;
pub mod route;
pub mod rules;
pub mod session;
pub mod stats;
pub mod store;
pub mod view;

pub use action::{ActionOutcome, GameAction};
pub use auth::{
    sign_up_with_confirmation, AuthBridge, AuthError, Identity, IdentityCallback, LoginFlow,
    LoginStep,
};
pub use catalog::{parse_catalog, validate_catalog, CatalogError, CatalogSource};
pub use context::{Effect, PersistenceMode, RequestTag, SessionContext, Stage, Step};
pub use controller::{GameController, StartError, StartOutcome};
pub use day::{DayKey, DayKeyError};
pub use gateway::{Migration, PersistenceGateway};
pub use puzzle::{Puzzle, PuzzleError};
pub use record::{decode_record, encode_record, SessionRecord, UserDocument};
pub use route::{should_resume, POST_LOGIN_TARGET};
pub use rules::GameRules;
pub use session::{Phase, ResultSummary, Session, SubmitOutcome};
pub use stats::UserStats;
pub use store::{LocalStore, RemoteStore, StoreError};
pub use view::{GameView, ViewStage};
