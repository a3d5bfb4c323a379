//! Outbound publish spooler.
//!
//! Control messages are queued and sent in batches. A message that cannot be
//! sent goes to the back of the queue and is retried on a later flush; the
//! queue is unbounded, so a long broker outage grows it without limit.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use mycohub_domain::error::MycoError;
use tokio::time::Instant;

use crate::batch::BatchLimits;
use crate::ports::MessagePublisher;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPublish {
    pub topic: String,
    pub payload: String,
}

pub struct PublishSpooler<P> {
    publisher: P,
    limits: BatchLimits,
    queue: RefCell<VecDeque<PendingPublish>>,
    last_flush: Cell<Instant>,
}

impl<P: MessagePublisher> PublishSpooler<P> {
    pub fn new(publisher: P, limits: BatchLimits) -> Self {
        Self {
            publisher,
            limits,
            queue: RefCell::new(VecDeque::new()),
            last_flush: Cell::new(Instant::now()),
        }
    }

    /// Queue a message and flush if the queue is due.
    pub async fn enqueue(&self, topic: impl Into<String>, payload: impl Into<String>) {
        self.queue.borrow_mut().push_back(PendingPublish {
            topic: topic.into(),
            payload: payload.into(),
        });
        self.flush_if_due().await;
    }

    /// Flush only if the size or age limit is reached.
    pub async fn flush_if_due(&self) {
        let len = self.pending();
        if len > 0 && self.limits.is_due(len, self.last_flush.get().elapsed()) {
            self.flush().await;
        }
    }

    /// Try every queued message once. Returns how many were sent.
    pub async fn flush(&self) -> usize {
        self.last_flush.set(Instant::now());
        let batch: Vec<PendingPublish> = self.queue.borrow_mut().drain(..).collect();
        let mut sent = 0;
        for message in batch {
            match self.publisher.publish(&message.topic, &message.payload).await {
                Ok(()) => sent += 1,
                Err(err) => {
                    self.requeue(message, &err);
                }
            }
        }
        if sent > 0 {
            tracing::debug!(sent, pending = self.pending(), "publish batch flushed");
        }
        sent
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    fn requeue(&self, message: PendingPublish, err: &MycoError) {
        tracing::warn!(topic = %message.topic, error = %err, "publish failed, requeued");
        self.queue.borrow_mut().push_back(message);
    }
}
