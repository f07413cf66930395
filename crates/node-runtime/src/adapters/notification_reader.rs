//! # JSON-Lines Notification Reader
//!
//! Reads one `StorageNotification` per line and forwards it into the
//! notification feed. Blank lines are skipped; undecodable lines are
//! logged and counted, never fatal.

use ob_01_offer_book::FeedHandle;
use shared_types::StorageNotification;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Reader errors.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("Failed to read notifications: {0}")]
    Io(#[from] std::io::Error),
}

/// Why the reader stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    /// Input exhausted.
    #[default]
    EndOfInput,
    /// Shutdown was signalled.
    Shutdown,
    /// The feed consumer went away.
    FeedClosed,
}

/// Totals for one reader run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Lines read, blank ones included.
    pub lines: u64,
    /// Notifications handed to the feed.
    pub forwarded: u64,
    /// Lines that did not decode.
    pub malformed: u64,
    pub stopped_by: StopReason,
}

/// Decode one input line. `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<StorageNotification>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Forward every notification in `reader` to `feed` until end of input,
/// shutdown, or the feed closing.
pub async fn forward_lines<R>(
    reader: R,
    feed: &FeedHandle,
    mut shutdown: watch::Receiver<bool>,
) -> Result<ReaderStats, ReaderError>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = ReaderStats::default();
    let mut lines = reader.lines();

    loop {
        if *shutdown.borrow() {
            stats.stopped_by = StopReason::Shutdown;
            break;
        }

        let line = tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    stats.stopped_by = StopReason::Shutdown;
                    break;
                }
                continue;
            }
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            stats.stopped_by = StopReason::EndOfInput;
            break;
        };
        stats.lines += 1;

        let notification = match parse_line(&line) {
            Ok(Some(notification)) => notification,
            Ok(None) => continue,
            Err(e) => {
                stats.malformed += 1;
                warn!(line = stats.lines, error = %e, "Skipping undecodable notification");
                continue;
            }
        };

        debug!(
            offer_id = %notification.offer_id(),
            sequence = %notification.sequence(),
            "Forwarding notification"
        );
        if feed.send(notification).await.is_err() {
            warn!("Notification feed closed, stopping reader");
            stats.stopped_by = StopReason::FeedClosed;
            break;
        }
        stats.forwarded += 1;
    }

    info!(
        lines = stats.lines,
        forwarded = stats.forwarded,
        malformed = stats.malformed,
        stopped_by = ?stats.stopped_by,
        "Notification reader finished"
    );
    Ok(stats)
}
