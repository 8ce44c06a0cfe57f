//! Forward probing for the nearest downloadable snapshot position
//!
//! Build positions are sparse: not every integer has a published snapshot.
//! Upstream publishes roughly monotonically and gaps are small, so a bounded
//! linear walk forward from the main-branch position is sufficient. No
//! backward search, no binary search.

use std::future::Future;

use crate::error::InstallError;

pub const MAX_PROBE_ATTEMPTS: u32 = 25;

/// Walk forward from `start`, probing each position with the supplied
/// predicate, and return the first position with a published artifact.
/// Transport errors on a single probe count as a miss; the walk itself is
/// the retry budget. Returns `None` once the budget is spent.
pub async fn nearest_downloadable_position<F, Fut>(
    start: u64,
    mut probe: F,
) -> Result<Option<u64>, InstallError>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<bool, InstallError>>,
{
    let mut position = start;

    for attempt in 0..MAX_PROBE_ATTEMPTS {
        match probe(position).await {
            Ok(true) => {
                tracing::debug!(position, attempt, "found downloadable snapshot");
                return Ok(Some(position));
            }
            Ok(false) => {
                tracing::debug!(position, "no artifact published at this position");
            }
            Err(e) => {
                tracing::warn!(position, error = %e, "probe failed, treating as a miss");
            }
        }
        position += 1;
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

    #[tokio::test]
    async fn returns_the_start_when_immediately_available() {
        let found = nearest_downloadable_position(100, |p| async move {
            Ok::<_, InstallError>(p == 100)
        })
        .await
        .unwrap();
        assert_eq!(found, Some(100));
    }

    #[tokio::test]
    async fn walks_forward_over_gaps() {
        let found = nearest_downloadable_position(100, |p| async move {
            Ok::<_, InstallError>(p == 117)
        })
        .await
        .unwrap();
        assert_eq!(found, Some(117));
    }

    #[tokio::test]
    async fn never_probes_below_the_start_position() {
        let min_seen = AtomicU64::new(u64::MAX);
        let found = nearest_downloadable_position(1000, |p| {
            min_seen.fetch_min(p, Ordering::SeqCst);
            async move { Ok::<_, InstallError>(false) }
        })
        .await
        .unwrap();

        assert_eq!(found, None);
        assert_eq!(min_seen.load(Ordering::SeqCst), 1000);
    }

    #[tokio::test]
    async fn gives_up_after_the_probe_budget() {
        let calls = AtomicU32::new(0);
        let found = nearest_downloadable_position(100, |_p| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, InstallError>(false) }
        })
        .await
        .unwrap();

        assert_eq!(found, None);
        assert_eq!(calls.load(Ordering::SeqCst), MAX_PROBE_ATTEMPTS);
    }

    #[tokio::test]
    async fn a_position_just_past_the_budget_is_not_found() {
        let target = 100 + u64::from(MAX_PROBE_ATTEMPTS);
        let found = nearest_downloadable_position(100, |p| async move {
            Ok::<_, InstallError>(p == target)
        })
        .await
        .unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn transport_errors_count_as_misses() {
        let found = nearest_downloadable_position(200, |p| async move {
            match p {
                200 | 201 => Err(InstallError::Resolution("connection reset".into())),
                202 => Ok(true),
                _ => Ok(false),
            }
        })
        .await
        .unwrap();
        assert_eq!(found, Some(202));
    }
}
