//! Session domain - What the consumer of a prep session gets to render

mod view;

pub use view::{DashboardView, ErrorView, FailureKind, RestoreSource, ViewState};
