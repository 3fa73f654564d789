use crate::dom::{Document, DocumentEvent, Element, Selector};
use crate::error::{Result, RuntimeError};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;

/// Timeout the templates use when a caller gives none.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolve with the first element matching `selector`.
///
/// Checks once up front, then re-checks after every mutation batch until the
/// deadline. On timeout the subscription is dropped, a warning is logged and
/// [`RuntimeError::Timeout`] is returned; there is no retry.
pub async fn wait_for_element<D>(doc: &D, selector: &str, timeout: Duration) -> Result<Element>
where
    D: Document + ?Sized,
{
    let selector = Selector::parse(selector)?;

    // Subscribe before the first check so a mutation landing in between is
    // still delivered.
    let mut events = doc.subscribe();
    if let Some(el) = doc.query_selector(&selector) {
        return Ok(el);
    }

    // A timeout too large to add to `now` means no deadline at all.
    let deadline = Instant::now().checked_add(timeout);
    loop {
        let next = match deadline {
            Some(at) => tokio::time::timeout_at(at, events.recv()).await,
            None => Ok(events.recv().await),
        };
        match next {
            Ok(Ok(DocumentEvent::Mutation { .. })) | Ok(Err(RecvError::Lagged(_))) => {
                if let Some(el) = doc.query_selector(&selector) {
                    tracing::debug!(selector = selector.as_str(), "element found");
                    return Ok(el);
                }
            }
            Ok(Ok(DocumentEvent::PopState { .. })) => {}
            Ok(Err(RecvError::Closed)) => {
                return Err(RuntimeError::DocumentClosed(selector.as_str().to_string()));
            }
            Err(_) => {
                tracing::warn!(
                    selector = selector.as_str(),
                    timeout_ms = timeout.as_millis() as u64,
                    "timed out waiting for element"
                );
                return Err(RuntimeError::Timeout {
                    selector: selector.as_str().to_string(),
                    timeout,
                });
            }
        }
    }
}
