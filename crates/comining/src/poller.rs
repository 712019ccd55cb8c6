//! Status Polling
//!
//! Submissions are observed by re-querying at a fixed interval until the
//! status is terminal. There is no timeout: a submission the node never
//! resolves keeps the caller waiting.

use core::time::Duration;

use donuette_common::{SubmissionId, TxStatus};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace};

use crate::ports::{ConnectorResult, StatusSource};

/// Poll `id` every `every` until it succeeds or fails.
///
/// The first query is issued immediately. A failed query is returned
/// without retrying.
pub async fn poll_until_terminal<S>(
    source: &S,
    id: &SubmissionId,
    every: Duration,
) -> ConnectorResult<TxStatus>
where
    S: StatusSource + ?Sized,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut attempts: u64 = 0;
    loop {
        ticker.tick().await;
        attempts += 1;

        let status = source.status(id).await?;
        if status.is_terminal() {
            debug!(%id, attempts, ?status, "submission resolved");
            return Ok(status);
        }
        trace!(%id, attempts, "submission pending");
    }
}
