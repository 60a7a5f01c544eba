//! Ownership of the single open progress channel.

use futures_util::StreamExt;
use tracing::debug;

use crate::api::{ChannelError, ProgressEvent, ProgressStream};

/// An open progress channel for one job.
///
/// Dropping it closes the underlying connection.
pub struct ProgressChannel {
    job_id: String,
    stream: ProgressStream,
}

impl ProgressChannel {
    #[must_use]
    pub fn new(job_id: impl Into<String>, stream: ProgressStream) -> Self {
        Self {
            job_id: job_id.into(),
            stream,
        }
    }

    #[must_use]
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Next decoded event; `None` when the server closed the stream.
    pub async fn next(&mut self) -> Option<Result<ProgressEvent, ChannelError>> {
        self.stream.next().await
    }
}

impl std::fmt::Debug for ProgressChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressChannel")
            .field("job_id", &self.job_id)
            .finish_non_exhaustive()
    }
}

/// Holds at most one [`ProgressChannel`].
#[derive(Debug, Default)]
pub struct ChannelSlot {
    current: Option<ProgressChannel>,
}

impl ChannelSlot {
    /// Installs `channel`, closing the previous one first.
    pub fn replace(&mut self, channel: ProgressChannel) {
        self.close();
        debug!(job_id = channel.job_id(), "progress channel installed");
        self.current = Some(channel);
    }

    /// Closes the current channel. Returns whether one was open.
    pub fn close(&mut self) -> bool {
        match self.current.take() {
            Some(channel) => {
                debug!(job_id = channel.job_id(), "progress channel closed");
                drop(channel);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    #[must_use]
    pub fn job_id(&self) -> Option<&str> {
        self.current.as_ref().map(ProgressChannel::job_id)
    }

    pub(crate) fn current_mut(&mut self) -> Option<&mut ProgressChannel> {
        self.current.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures_util::stream;

    use super::*;

    struct Liveness(Arc<AtomicUsize>);

    impl Drop for Liveness {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn counted_channel(job_id: &str, open: &Arc<AtomicUsize>) -> ProgressChannel {
        open.fetch_add(1, Ordering::SeqCst);
        let guard = Liveness(Arc::clone(open));
        let events = stream::pending::<Result<ProgressEvent, ChannelError>>().map(move |item| {
            let _keep = &guard;
            item
        });
        ProgressChannel::new(job_id, Box::pin(events))
    }

    #[test]
    fn test_replace_closes_previous_before_installing() {
        let open = Arc::new(AtomicUsize::new(0));
        let mut slot = ChannelSlot::default();
        slot.replace(counted_channel("c1", &open));
        assert_eq!(open.load(Ordering::SeqCst), 1);

        slot.replace(counted_channel("c2", &open));
        assert_eq!(open.load(Ordering::SeqCst), 1);
        assert_eq!(slot.job_id(), Some("c2"));
    }

    #[test]
    fn test_close_is_idempotent() {
        let open = Arc::new(AtomicUsize::new(0));
        let mut slot = ChannelSlot::default();
        assert!(!slot.close());
        slot.replace(counted_channel("c1", &open));
        assert!(slot.close());
        assert!(!slot.close());
        assert!(!slot.is_open());
        assert_eq!(open.load(Ordering::SeqCst), 0);
    }
}
