//! Debounced resume persistence

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::profile::ProfileStore;
use crate::infrastructure::timer::{schedule, ScheduledTask};

/// Default quiet period before an edited resume is saved
pub const DEFAULT_AUTOSAVE_DEBOUNCE: Duration = Duration::from_millis(2000);

#[derive(Default)]
struct AutosaveState {
    pending: Option<String>,
    task: Option<ScheduledTask>,
}

/// Saves the latest resume text once edits stop for the debounce period
pub struct ResumeAutosaver {
    profile: Arc<dyn ProfileStore>,
    debounce: Duration,
    state: Arc<Mutex<AutosaveState>>,
}

impl std::fmt::Debug for ResumeAutosaver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeAutosaver")
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl ResumeAutosaver {
    pub fn new(profile: Arc<dyn ProfileStore>, debounce: Duration) -> Self {
        Self {
            profile,
            debounce,
            state: Arc::new(Mutex::new(AutosaveState::default())),
        }
    }

    /// Queues `resume_text`, restarting the debounce window
    pub async fn schedule(&self, resume_text: String) {
        let mut state = self.state.lock().await;
        state.pending = Some(resume_text);

        if let Some(mut previous) = state.task.take() {
            previous.cancel();
        }

        let shared = self.state.clone();
        let profile = self.profile.clone();
        state.task = Some(schedule(self.debounce, async move {
            let pending = shared.lock().await.pending.take();
            if let Some(text) = pending {
                save(profile.as_ref(), text).await;
            }
        }));
    }

    /// Saves any pending text right away
    pub async fn flush(&self) {
        let pending = {
            let mut state = self.state.lock().await;
            if let Some(mut task) = state.task.take() {
                task.cancel();
            }
            state.pending.take()
        };

        if let Some(text) = pending {
            save(self.profile.as_ref(), text).await;
        }
    }

    /// Drops pending text without saving
    pub async fn cancel(&self) {
        let mut state = self.state.lock().await;
        state.pending = None;
        if let Some(mut task) = state.task.take() {
            task.cancel();
        }
    }

    pub async fn has_pending(&self) -> bool {
        self.state.lock().await.pending.is_some()
    }
}

async fn save(profile: &dyn ProfileStore, text: String) {
    let chars = text.chars().count();

    match profile.update_resume(text).await {
        Ok(()) => debug!(chars = chars, "Resume autosaved"),
        Err(e) => warn!(error = %e, "Resume autosave failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::MockProfileStore;
    use crate::domain::DomainError;
    use mockall::predicate::eq;

    #[tokio::test(start_paused = true)]
    async fn test_debounce_saves_only_latest_text() {
        let mut profile = MockProfileStore::new();
        profile
            .expect_update_resume()
            .with(eq("final draft".to_string()))
            .times(1)
            .returning(|_| Ok(()));

        let autosaver = ResumeAutosaver::new(Arc::new(profile), Duration::from_millis(2000));

        autosaver.schedule("first draft".to_string()).await;
        tokio::time::sleep(Duration::from_millis(1000)).await;
        autosaver.schedule("final draft".to_string()).await;
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert!(!autosaver.has_pending().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_saved_before_quiet_period() {
        let mut profile = MockProfileStore::new();
        profile.expect_update_resume().times(0);

        let autosaver = ResumeAutosaver::new(Arc::new(profile), Duration::from_millis(2000));

        autosaver.schedule("draft".to_string()).await;
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(autosaver.has_pending().await);
        autosaver.cancel().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_saves_immediately() {
        let mut profile = MockProfileStore::new();
        profile
            .expect_update_resume()
            .with(eq("pending text".to_string()))
            .times(1)
            .returning(|_| Ok(()));

        let autosaver = ResumeAutosaver::new(Arc::new(profile), Duration::from_millis(2000));

        autosaver.schedule("pending text".to_string()).await;
        autosaver.flush().await;
        tokio::time::sleep(Duration::from_millis(3000)).await;

        assert!(!autosaver.has_pending().await);
    }

    #[tokio::test]
    async fn test_save_failure_is_logged_not_raised() {
        let mut profile = MockProfileStore::new();
        profile
            .expect_update_resume()
            .times(1)
            .returning(|_| Err(DomainError::storage("disk full")));

        let autosaver = ResumeAutosaver::new(Arc::new(profile), Duration::from_millis(10));

        autosaver.schedule("text".to_string()).await;
        autosaver.flush().await;
    }
}
