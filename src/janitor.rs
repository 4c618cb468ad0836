use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::rate_limit::WeakLimiter;

// Background sweeper - deletes hits older than twice the interval, once per interval
pub struct Janitor {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Janitor {
    pub(crate) fn spawn(limiter: WeakLimiter) -> Self {
        let token = CancellationToken::new();
        let handle = tokio::spawn(run(limiter, token.clone()));
        Self { token, handle }
    }

    // Cancel and wait for the task to exit
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "janitor task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

async fn run(limiter: WeakLimiter, token: CancellationToken) {
    debug!("janitor started");

    loop {
        // interval is re-read every cycle, reconfiguration applies from the next sleep
        let period = match limiter.upgrade() {
            Some(live) => live.interval(),
            None => break,
        };

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(period) => {}
        }

        let Some(live) = limiter.upgrade() else {
            break;
        };
        // failures are not fatal, next tick tries again
        match live.sweep().await {
            Ok(removed) => debug!(removed, "janitor sweep complete"),
            Err(e) => warn!(error = %e, "janitor sweep failed"),
        }
    }

    debug!("janitor stopped");
}
