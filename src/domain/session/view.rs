//! View models for a prep session

use serde::Serialize;

use crate::domain::cache::Sections;
use crate::domain::generation::Provider;
use crate::domain::profile::Profile;
use crate::domain::search::SearchTarget;
use crate::domain::DomainError;

/// Top-level state of the session view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    #[default]
    Empty,
    Loading,
    Dashboard,
    Error,
}

impl ViewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Loading => "loading",
            Self::Dashboard => "dashboard",
            Self::Error => "error",
        }
    }
}

/// Broad category of a failed generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Authorization,
    RateLimit,
    Provider,
}

/// How the session's initial state was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RestoreSource {
    Url,
    Snapshot,
    Cold,
}

/// Failure details plus the recovery actions on offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorView {
    pub kind: FailureKind,
    pub message: String,
    pub can_retry: bool,
    /// Other providers with a credential the user could switch to
    pub switch_options: Vec<Provider>,
    /// Whether to send the user to credential configuration
    pub configure_credentials: bool,
}

impl ErrorView {
    /// Builds the view for `error` raised while calling `current`
    pub fn from_error(error: &DomainError, profile: &Profile, current: Provider) -> Self {
        let message = error.user_message().to_string();

        match error {
            DomainError::Authorization { .. } => Self {
                kind: FailureKind::Authorization,
                message,
                can_retry: false,
                switch_options: Vec::new(),
                configure_credentials: true,
            },
            DomainError::RateLimited { .. } => Self {
                kind: FailureKind::RateLimit,
                message,
                can_retry: true,
                switch_options: Vec::new(),
                configure_credentials: false,
            },
            _ => {
                let switch_options: Vec<Provider> = if error.is_quota_like() {
                    Provider::ALL
                        .into_iter()
                        .filter(|p| *p != current && profile.has_credential(*p))
                        .collect()
                } else {
                    Vec::new()
                };
                let configure_credentials = error.is_quota_like() && switch_options.is_empty();

                Self {
                    kind: FailureKind::Provider,
                    message,
                    can_retry: true,
                    switch_options,
                    configure_credentials,
                }
            }
        }
    }
}

/// Everything the consumer needs to render the session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub state: ViewState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<SearchTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    pub sections: Sections,
    /// Loading progress, 0 to 100
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loading_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorView>,
    /// A match-only patch is scheduled or running
    pub match_pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restored_from: Option<RestoreSource>,
}

impl DashboardView {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn loading(target: SearchTarget, search_query: String) -> Self {
        Self {
            state: ViewState::Loading,
            target: Some(target),
            search_query: Some(search_query),
            ..Self::default()
        }
    }

    pub fn dashboard(target: SearchTarget, search_query: String, sections: Sections) -> Self {
        Self {
            state: ViewState::Dashboard,
            target: Some(target),
            search_query: Some(search_query),
            sections,
            progress: 100,
            ..Self::default()
        }
    }

    /// Error view for a search; keeps the target so retry knows what to replay
    pub fn failed(target: SearchTarget, search_query: String, error: ErrorView) -> Self {
        Self {
            state: ViewState::Error,
            target: Some(target),
            search_query: Some(search_query),
            error: Some(error),
            ..Self::default()
        }
    }
}
