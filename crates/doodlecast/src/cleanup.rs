//! Unsubscribing from `Drop`.

use std::sync::Arc;

use doodlecast_channel::{Channel, Subscription};

/// Drops `subscription` on a spawned task. Does nothing outside a
/// runtime; the channel cleans up once it notices the receiver is gone.
pub(crate) fn unsubscribe_in_background<H: Channel>(channel: Arc<H>, subscription: Subscription) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        tracing::debug!(topic = %subscription.topic, "no runtime, subscription left behind");
        return;
    };
    runtime.spawn(async move {
        if let Err(e) = channel.unsubscribe(&subscription).await {
            tracing::debug!(topic = %subscription.topic, error = %e, "unsubscribe on drop failed");
        }
    });
}
