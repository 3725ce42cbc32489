//! Cancellable background timers
//!
//! Every delayed or repeating piece of session work runs as a
//! `ScheduledTask`. Cancelling or dropping the handle aborts the task.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to a spawned timer task
#[derive(Debug)]
pub struct ScheduledTask {
    handle: Option<JoinHandle<()>>,
    done: watch::Receiver<bool>,
}

impl ScheduledTask {
    fn spawn<F>(work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (done_tx, done) = watch::channel(false);
        let handle = tokio::spawn(async move {
            work.await;
            let _ = done_tx.send(true);
        });

        Self {
            handle: Some(handle),
            done,
        }
    }

    /// Aborts the task if it has not finished yet
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        *self.done.borrow() || self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Resolves once the task completes or is aborted, leaving the handle in
    /// place so it can still be cancelled meanwhile
    pub fn finished(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut done = self.done.clone();
        async move {
            let _ = done.wait_for(|finished| *finished).await;
        }
    }

    /// Waits for the task to complete; a cancelled task resolves immediately
    pub async fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Runs `action` once after `delay`
pub fn schedule<F>(delay: Duration, action: F) -> ScheduledTask
where
    F: Future<Output = ()> + Send + 'static,
{
    ScheduledTask::spawn(async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        action.await;
    })
}

/// Calls `tick` every `period`, starting one period from now, until it breaks
pub fn repeat<F, Fut>(period: Duration, mut tick: F) -> ScheduledTask
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ControlFlow<()>> + Send + 'static,
{
    ScheduledTask::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await; // Skip the first immediate tick
        loop {
            interval.tick().await;
            if tick().await.is_break() {
                break;
            }
        }
    })
}
