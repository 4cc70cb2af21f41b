//! Process-wide application state
//!
//! - `app_state`: the `AppState` value, its closed set of transitions and the pure reducer.
//! - `store`: the observable `StateStore` the coordinator and UI share.

pub mod app_state;
pub mod store;

pub use app_state::{AppAction, AppState, AppStatePatch, UpdateInfo};
pub use store::StateStore;
