//! Application state and its transitions.
//!
//! `AppState` is changed only through `AppAction` values applied by the pure
//! [`AppState::reduce`] function. The set of actions is closed; arbitrary partial
//! updates go through a validated [`AppStatePatch`].

use crate::error::CoordinatorError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pending application update announced to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateInfo {
    pub version: String,
    pub release_date: DateTime<Utc>,
    pub release_notes: String,
}

/// Process-wide state observed by the UI layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub loading_text: Option<String>,
    pub update_info: Option<UpdateInfo>,
    pub show_update_notification: bool,
    pub manager_has_initialized: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            loading_text: None,
            update_info: None,
            show_update_notification: true,
            manager_has_initialized: false,
        }
    }
}

/// Merge-patch over `AppState` that sets at least one field.
///
/// `Some(value)` overwrites the field; `None` leaves it untouched. Nullable fields
/// use a nested option so they can be cleared explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppStatePatch {
    loading_text: Option<Option<String>>,
    update_info: Option<Option<UpdateInfo>>,
    show_update_notification: Option<bool>,
    manager_has_initialized: Option<bool>,
}

impl AppStatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loading_text(mut self, text: Option<String>) -> Self {
        self.loading_text = Some(text);
        self
    }

    pub fn update_info(mut self, info: Option<UpdateInfo>) -> Self {
        self.update_info = Some(info);
        self
    }

    pub fn show_update_notification(mut self, show: bool) -> Self {
        self.show_update_notification = Some(show);
        self
    }

    pub fn manager_has_initialized(mut self, initialized: bool) -> Self {
        self.manager_has_initialized = Some(initialized);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.loading_text.is_none()
            && self.update_info.is_none()
            && self.show_update_notification.is_none()
            && self.manager_has_initialized.is_none()
    }
}

/// Recognised state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Show (`Some`) or hide (`None`) the global loading indicator.
    SetLoadingText(Option<String>),
    /// Announce or clear a pending application update.
    SetUpdateInfo(Option<UpdateInfo>),
    SetShowUpdateNotification(bool),
    /// The budget manager finished its first load. Never reverts except via `Patch`.
    MarkManagerInitialized,
    /// Merge-patch; must set at least one field.
    Patch(AppStatePatch),
    /// Restore defaults, carrying over a non-empty loading text and manager initialisation.
    Reset,
}

impl AppAction {
    /// Check the action's precondition.
    pub fn validate(&self) -> Result<(), CoordinatorError> {
        match self {
            AppAction::Patch(patch) if patch.is_empty() => Err(CoordinatorError::EmptyPatch),
            _ => Ok(()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AppAction::SetLoadingText(_) => "SetLoadingText",
            AppAction::SetUpdateInfo(_) => "SetUpdateInfo",
            AppAction::SetShowUpdateNotification(_) => "SetShowUpdateNotification",
            AppAction::MarkManagerInitialized => "MarkManagerInitialized",
            AppAction::Patch(_) => "Patch",
            AppAction::Reset => "Reset",
        }
    }
}

impl AppState {
    /// Apply a validated action, producing the next state.
    pub fn reduce(&self, action: &AppAction) -> AppState {
        match action {
            AppAction::SetLoadingText(text) => AppState {
                loading_text: text.clone(),
                ..self.clone()
            },
            AppAction::SetUpdateInfo(info) => AppState {
                update_info: info.clone(),
                ..self.clone()
            },
            AppAction::SetShowUpdateNotification(show) => AppState {
                show_update_notification: *show,
                ..self.clone()
            },
            AppAction::MarkManagerInitialized => AppState {
                manager_has_initialized: true,
                ..self.clone()
            },
            AppAction::Patch(patch) => {
                let mut next = self.clone();
                if let Some(text) = &patch.loading_text {
                    next.loading_text = text.clone();
                }
                if let Some(info) = &patch.update_info {
                    next.update_info = info.clone();
                }
                if let Some(show) = patch.show_update_notification {
                    next.show_update_notification = show;
                }
                if let Some(initialized) = patch.manager_has_initialized {
                    next.manager_has_initialized = initialized;
                }
                next
            }
            AppAction::Reset => AppState {
                loading_text: self.loading_text.clone().filter(|text| !text.is_empty()),
                manager_has_initialized: self.manager_has_initialized,
                ..AppState::default()
            },
        }
    }
}
