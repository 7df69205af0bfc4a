//! Outbound queue abstraction for [`crate::send_with_retry`].

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;
use winrun_proto::Message;

/// A rejected write, carrying the message back so a retry can reuse it
/// without cloning on the common (successful) path.
#[derive(Debug)]
pub enum SendError {
    /// The queue is at capacity; a later attempt may succeed.
    Full(Message),
    /// The queue's consumer has gone away; retrying cannot help.
    Closed(Message),
}

impl SendError {
    /// Human-readable description suitable for [`crate::ChannelMetrics`]'s
    /// last-error record.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Full(_) => "outbound queue full",
            Self::Closed(_) => "outbound queue closed",
        }
    }

    fn into_message(self) -> Message {
        match self {
            Self::Full(message) | Self::Closed(message) => message,
        }
    }
}

/// A destination [`send_with_retry`](crate::send_with_retry) writes onto.
///
/// Implemented for [`tokio::sync::mpsc::Sender`]`<Message>`, the queue type
/// the agent's three long-lived threads and the channel writer thread share.
pub trait QueueWriter: Send + Sync {
    /// Attempts one non-blocking write, returning the message on failure so
    /// the caller can retry it.
    fn try_write(&self, message: Message) -> Result<(), SendError>;
}

impl QueueWriter for Sender<Message> {
    fn try_write(&self, message: Message) -> Result<(), SendError> {
        self.try_send(message).map_err(|error| match error {
            TrySendError::Full(message) => SendError::Full(message),
            TrySendError::Closed(message) => SendError::Closed(message),
        })
    }
}

pub(crate) fn recover_message(error: SendError) -> (Message, bool) {
    let closed = matches!(error, SendError::Closed(_));
    (error.into_message(), closed)
}
