//! Telemetry write buffer.
//!
//! Readings from every client accumulate in one buffer and are written as a
//! single batch once it is due. Due-ness is checked on every append; there
//! is no timer, so a quiet system keeps its last readings until the next
//! append or [`TelemetryBuffer::flush`] at shutdown.
//!
//! A batch being written is owned by a guard that puts it back in front of
//! the buffer unless the write succeeds, so a flush that fails or whose task
//! is cancelled mid-retry leaves nothing behind.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mycohub_domain::error::MycoError;
use mycohub_domain::reading::Reading;
use tokio::time::Instant;

use crate::batch::BatchLimits;
use crate::gateway::PersistenceGateway;
use crate::ports::ReadingRepository;

pub struct TelemetryBuffer<S> {
    gateway: Rc<PersistenceGateway<S>>,
    limits: BatchLimits,
    pending: RefCell<Vec<Reading>>,
    last_flush: Cell<Instant>,
}

impl<S: ReadingRepository> TelemetryBuffer<S> {
    pub fn new(gateway: Rc<PersistenceGateway<S>>, limits: BatchLimits) -> Self {
        Self {
            gateway,
            limits,
            pending: RefCell::new(Vec::new()),
            last_flush: Cell::new(Instant::now()),
        }
    }

    /// Buffer `reading` and flush if the batch is now due.
    ///
    /// The reading is kept whether or not the flush succeeds.
    ///
    /// # Errors
    ///
    /// Returns the flush error; the batch stays buffered for the next try.
    pub async fn append(&self, reading: Reading) -> Result<(), MycoError> {
        let len = {
            let mut pending = self.pending.borrow_mut();
            pending.push(reading);
            pending.len()
        };
        if self.limits.is_due(len, self.last_flush.get().elapsed()) {
            self.flush().await?;
        }
        Ok(())
    }

    /// Write everything buffered as one batch.
    ///
    /// # Errors
    ///
    /// On failure the batch is put back in front of anything buffered since,
    /// and the store error is returned.
    pub async fn flush(&self) -> Result<usize, MycoError> {
        let mut in_flight = InFlight {
            pending: &self.pending,
            batch: std::mem::take(&mut *self.pending.borrow_mut()),
        };
        if in_flight.batch.is_empty() {
            self.last_flush.set(Instant::now());
            return Ok(0);
        }

        let size = in_flight.batch.len();
        let batch = &in_flight.batch;
        let result = self
            .gateway
            .write("insert_readings", async |store| {
                store.insert_batch(batch.clone()).await
            })
            .await;

        match result {
            Ok(written) => {
                in_flight.batch.clear();
                self.last_flush.set(Instant::now());
                tracing::debug!(readings = written, "telemetry batch written");
                Ok(written)
            }
            Err(err) => {
                tracing::warn!(readings = size, error = %err, "telemetry batch kept for retry");
                Err(err)
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}

/// A batch taken out of the buffer for writing.
struct InFlight<'a> {
    pending: &'a RefCell<Vec<Reading>>,
    batch: Vec<Reading>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        let mut pending = self.pending.borrow_mut();
        let newer = std::mem::replace(&mut *pending, std::mem::take(&mut self.batch));
        pending.extend(newer);
    }
}
