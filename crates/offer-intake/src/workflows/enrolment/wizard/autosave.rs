use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use super::EnrolmentWizard;

pub type SharedWizard = Arc<Mutex<EnrolmentWizard>>;

/// Background autosave task. Dropping the handle stops it.
#[derive(Debug)]
pub struct AutosaveHandle {
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Persist the wizard's draft every `every`, starting one period from now.
pub fn spawn_autosave(wizard: SharedWizard, every: Duration) -> AutosaveHandle {
    let task = tokio::spawn(async move {
        let mut ticker = time::interval_at(time::Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let mut guard = wizard.lock().await;
            match guard.persist() {
                Ok(true) => debug!("autosaved draft"),
                Ok(false) => {}
                Err(err) => warn!(error = %err, "autosave failed"),
            }
        }
    });

    AutosaveHandle { task }
}
