//! Change feed: tells every other context when a room's stored value
//! changes.
//!
//! Writes publish a [`RoomChange`] on a broadcast channel. Each
//! subscription runs a small Tokio task that filters the channel down to
//! one room code, drops changes made by its own context, and hands the
//! rest to the subscriber's callback.
//!
//! Every write carries a sequence number. A subscriber that falls behind
//! the channel reloads the room's last write instead, and anything not
//! newer than what it has already seen is dropped.
//!
//! A context never hears about its own writes. That mirrors how a
//! browser's storage event behaves, and it is why every mutating room
//! operation returns the updated room: the writer applies it locally.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use wineguessr_protocol::{Room, RoomCode};

use crate::{ContextId, StoreError};

/// One write to the shared medium.
#[derive(Debug, Clone)]
pub struct RoomChange {
    /// The context that performed the write.
    pub origin: ContextId,
    /// Position of this write in the medium's write order, starting at 1.
    pub seq: u64,
    pub code: RoomCode,
    /// The new stored value, or `None` if the room was deleted.
    pub room: Option<Room>,
}

/// The last write to one key, read straight from the medium.
///
/// `seq` is 0 and `origin` is `ContextId(0)` if the key was never written.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    pub(crate) origin: ContextId,
    pub(crate) seq: u64,
    pub(crate) room: Option<Room>,
}

/// Subscribing to a room's changes.
pub trait ChangeFeed {
    /// Registers `handler` to be called with the new state of room `code`
    /// whenever a different context writes it. `None` means the room was
    /// deleted.
    ///
    /// # Errors
    /// Returns [`StoreError::NoRuntime`] outside a Tokio runtime.
    fn subscribe<F>(&self, code: &RoomCode, handler: F) -> Result<Subscription, StoreError>
    where
        F: Fn(Option<Room>) + Send + 'static;
}

/// Handle to a live subscription.
///
/// Once [`unsubscribe`](Self::unsubscribe) returns (or the handle is
/// dropped) the callback is never invoked again. Don't unsubscribe from
/// inside the callback itself: that waits on the callback and deadlocks.
pub struct Subscription {
    code: RoomCode,
    /// Held while the callback runs; `false` once unsubscribed.
    active: Arc<Mutex<bool>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Stops delivery. Waits for an in-flight callback to finish.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = false;
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!(room = %self.code, "unsubscribed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("code", &self.code)
            .field("active", &self.task.is_some())
            .finish()
    }
}

/// Spawns the delivery task behind a [`Subscription`].
///
/// `since` is the medium's write position when `rx` was created; only
/// later writes are delivered. `reload` reads the room's last write; it
/// is used when the subscriber falls behind the channel and missed
/// changes, so it still ends up with the latest state. Whichever way a
/// write arrives, it is dropped if it is not newer than the last one
/// seen or if this context made it.
pub(crate) fn spawn_delivery<F, R>(
    mut rx: broadcast::Receiver<RoomChange>,
    since: u64,
    context: ContextId,
    code: RoomCode,
    handler: F,
    reload: R,
) -> Result<Subscription, StoreError>
where
    F: Fn(Option<Room>) + Send + 'static,
    R: Fn(&RoomCode) -> Snapshot + Send + 'static,
{
    let runtime = tokio::runtime::Handle::try_current().map_err(|_| StoreError::NoRuntime)?;
    let active = Arc::new(Mutex::new(true));

    let deliver = {
        let active = Arc::clone(&active);
        move |room: Option<Room>| -> bool {
            let guard = active.lock().unwrap_or_else(PoisonError::into_inner);
            if !*guard {
                return false;
            }
            handler(room);
            true
        }
    };

    let task_code = code.clone();
    let task = runtime.spawn(async move {
        let mut seen = since;
        loop {
            let snapshot = match rx.recv().await {
                Ok(change) => {
                    if change.code != task_code {
                        continue;
                    }
                    Snapshot {
                        origin: change.origin,
                        seq: change.seq,
                        room: change.room,
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(room = %task_code, missed, "change feed lagged, reloading");
                    reload(&task_code)
                }
                Err(RecvError::Closed) => break,
            };

            if snapshot.seq <= seen {
                continue;
            }
            seen = snapshot.seq;
            if snapshot.origin == context {
                continue;
            }

            tracing::debug!(
                room = %task_code,
                %context,
                seq = snapshot.seq,
                deleted = snapshot.room.is_none(),
                "delivering change"
            );
            if !deliver(snapshot.room) {
                break;
            }
        }
    });

    Ok(Subscription {
        code,
        active,
        task: Some(task),
    })
}
