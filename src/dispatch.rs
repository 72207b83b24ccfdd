//! Broadcast dispatcher
//!
//! Delivers an encoded envelope to a snapshot of connections. Runs in the
//! sending session's task, after the snapshot was taken, so the registry is
//! never held while a slow recipient applies backpressure.

use tracing::{debug, warn};

use crate::connection::ConnectionHandle;
use crate::error::AppError;
use crate::message::{self, ChatEnvelope};

/// Send one envelope to every connection in `recipients`
///
/// Encodes once. A recipient whose connection is gone is logged and
/// skipped; the rest still receive the frame. Returns how many
/// recipients the frame was queued for.
pub async fn dispatch_to_all(
    envelope: &ChatEnvelope,
    recipients: &[ConnectionHandle],
) -> Result<usize, AppError> {
    let text = message::encode(envelope)?;
    let mut delivered = 0;

    for conn in recipients {
        match conn.send(text.clone()).await {
            Ok(()) => delivered += 1,
            Err(e) => warn!("Send to {} failed: {}", conn.id, e),
        }
    }

    debug!("Dispatched to {}/{} recipients", delivered, recipients.len());
    Ok(delivered)
}

/// Send one envelope to a single connection
pub async fn dispatch_to_one(
    envelope: &ChatEnvelope,
    conn: &ConnectionHandle,
) -> Result<(), AppError> {
    let text = message::encode(envelope)?;
    if let Err(e) = conn.send(text).await {
        warn!("Send to {} failed: {}", conn.id, e);
    }
    Ok(())
}
