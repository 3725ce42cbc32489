//! Startup session restoration
//!
//! Resolves which search a new session should show. URL parameters win,
//! then the persisted snapshot, and otherwise the session starts empty.

use tracing::{debug, info, warn};

use crate::domain::search::SearchParams;
use crate::domain::session::{DashboardView, RestoreSource};

use super::orchestrator::GenerationOrchestrator;

/// Which source a session was restored from, and the resulting view
#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    pub source: RestoreSource,
    pub view: DashboardView,
}

/// Restores a session from URL parameters or the saved snapshot
#[derive(Debug, Clone)]
pub struct SessionRestorer {
    orchestrator: GenerationOrchestrator,
}

impl SessionRestorer {
    pub fn new(orchestrator: GenerationOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Restores the session. Never fails; an unusable source falls through
    /// to the next one.
    pub async fn restore(&self, url: Option<SearchParams>) -> RestoreOutcome {
        if let Err(e) = self.orchestrator.load_profile().await {
            warn!(error = %e, "Failed to load profile, continuing without it");
        }

        if let Some(params) = url {
            match params.target() {
                Some(target) => {
                    info!(target = %target, "Restoring session from URL");
                    let query = target.query();
                    let view = self
                        .orchestrator
                        .restore_target(target, query, RestoreSource::Url)
                        .await;
                    return RestoreOutcome {
                        source: RestoreSource::Url,
                        view,
                    };
                }
                None => debug!("URL parameters carry no search"),
            }
        }

        if let Some(snapshot) = self.orchestrator.cache().load_snapshot().await {
            info!(company = %snapshot.company, "Restoring session from snapshot");

            self.orchestrator
                .set_job(snapshot.job_url.clone(), snapshot.job_context.clone())
                .await;

            let target = snapshot.target();
            let view = self
                .orchestrator
                .restore_target(target, snapshot.search_query, RestoreSource::Snapshot)
                .await;
            return RestoreOutcome {
                source: RestoreSource::Snapshot,
                view,
            };
        }

        debug!("Cold start");
        let mut view = self.orchestrator.view().await;
        view.restored_from = Some(RestoreSource::Cold);

        RestoreOutcome {
            source: RestoreSource::Cold,
            view,
        }
    }
}
