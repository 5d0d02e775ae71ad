use chrono::{Duration, Utc};
use tokio::time::{Duration as TokioDuration, sleep};
use tracing::info;

use crate::web::session::SessionStore;

const CLEANUP_INTERVAL_MINUTES: u64 = 15;
const IDLE_SESSION_MINUTES: i64 = 60;

/// Periodically drops unauthenticated sessions that have gone idle.
/// Authenticated sessions are kept for the life of the process.
pub fn spawn(sessions: SessionStore) {
    tokio::spawn(async move {
        let interval = TokioDuration::from_secs(CLEANUP_INTERVAL_MINUTES * 60);
        loop {
            sleep(interval).await;
            run_cleanup_cycle(&sessions).await;
        }
    });
}

async fn run_cleanup_cycle(sessions: &SessionStore) -> usize {
    let cutoff = Utc::now() - Duration::minutes(IDLE_SESSION_MINUTES);
    let removed = sessions.purge_idle(cutoff).await;

    if removed > 0 {
        let remaining = sessions.len().await;
        info!(removed, remaining, "idle session cleanup completed");
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_sessions_survive_a_cleanup_cycle() {
        let sessions = SessionStore::default();
        sessions.start().await;
        let signed_in = sessions.start().await;
        sessions.authenticate(signed_in.token, "uzair1").await;

        assert_eq!(run_cleanup_cycle(&sessions).await, 0);
        assert_eq!(sessions.len().await, 2);
    }
}
