//! Dedicated single-threaded scheduler hosting the [`Engine`].
//!
//! The transport hands messages over through a [`Submitter`], which never
//! blocks: a full queue rejects the job. On the scheduler thread a
//! current-thread runtime runs one local task per message, so handlers
//! interleave cooperatively at their await points and share the engine
//! without locks. A periodic tick retries queued publishes.

use std::future::Future;
use std::rc::Rc;
use std::thread::JoinHandle;
use std::time::Duration;

use mycohub_domain::error::MycoError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinSet, LocalSet};

use crate::engine::Engine;
use crate::ports::{MessagePublisher, Storage};

/// Work handed to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// An inbound broker message.
    Message { topic: String, payload: Vec<u8> },
    /// The broker connection was lost.
    TransportLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub queue_capacity: usize,
    pub tick_interval: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            tick_interval: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("failed to spawn scheduler thread")]
    Spawn(#[source] std::io::Error),

    #[error("failed to build scheduler runtime")]
    Runtime(#[source] std::io::Error),

    #[error("engine construction failed")]
    Engine(#[source] MycoError),

    #[error("scheduler thread exited during startup")]
    Startup,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("scheduler queue is full")]
    Full,

    #[error("scheduler is stopped")]
    Closed,
}

/// Cloneable, thread-safe handle for submitting jobs.
#[derive(Debug, Clone)]
pub struct Submitter {
    tx: mpsc::Sender<Job>,
}

impl Submitter {
    /// Queue `job` without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Full`] when the queue is at capacity and
    /// [`SubmitError::Closed`] once the scheduler stopped.
    pub fn submit(&self, job: Job) -> Result<(), SubmitError> {
        self.tx.try_send(job).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => SubmitError::Full,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })
    }
}

/// Owner handle of the scheduler thread.
#[derive(Debug)]
pub struct SchedulerHandle {
    stop: oneshot::Sender<()>,
    done: oneshot::Receiver<()>,
    thread: JoinHandle<()>,
}

pub struct Scheduler;

impl Scheduler {
    /// Spawn the scheduler thread and build the engine on it with `factory`.
    ///
    /// # Errors
    ///
    /// Fails when the thread or its runtime cannot be created, or when
    /// `factory` fails.
    pub async fn start<S, P, F, Fut>(
        settings: SchedulerSettings,
        factory: F,
    ) -> Result<(SchedulerHandle, Submitter), SchedulerError>
    where
        S: Storage + 'static,
        P: MessagePublisher + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Engine<S, P>, MycoError>> + 'static,
    {
        let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();

        let thread = std::thread::Builder::new()
            .name("mycohub-scheduler".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        let _ = ready_tx.send(Err(SchedulerError::Runtime(err)));
                        return;
                    }
                };
                let local = LocalSet::new();
                local.block_on(&runtime, async move {
                    let engine = match factory().await {
                        Ok(engine) => Rc::new(engine),
                        Err(err) => {
                            let _ = ready_tx.send(Err(SchedulerError::Engine(err)));
                            return;
                        }
                    };
                    let _ = ready_tx.send(Ok(()));
                    run(engine, rx, stop_rx, settings.tick_interval).await;
                });
                drop(local);
                drop(runtime);
                let _ = done_tx.send(());
            })
            .map_err(SchedulerError::Spawn)?;

        match ready_rx.await {
            Ok(Ok(())) => {
                tracing::info!(
                    queue_capacity = settings.queue_capacity,
                    "scheduler started"
                );
                Ok((
                    SchedulerHandle {
                        stop: stop_tx,
                        done: done_rx,
                        thread,
                    },
                    Submitter { tx },
                ))
            }
            Ok(Err(err)) => {
                let _ = thread.join();
                Err(err)
            }
            Err(_) => Err(SchedulerError::Startup),
        }
    }
}

impl SchedulerHandle {
    /// Stop the scheduler and wait up to `timeout` for it to finish.
    ///
    /// Queued jobs are dropped and in-flight handlers are cancelled, then
    /// buffered telemetry and queued publishes are flushed. A timeout is
    /// logged and the thread is left to finish on its own.
    pub async fn shutdown(self, timeout: Duration) {
        let _ = self.stop.send(());
        match tokio::time::timeout(timeout, self.done).await {
            Ok(_) => {
                if self.thread.join().is_err() {
                    tracing::error!("scheduler thread panicked");
                }
                tracing::info!("scheduler stopped");
            }
            Err(_) => {
                tracing::warn!(?timeout, "scheduler did not stop in time, detaching");
            }
        }
    }
}

async fn run<S, P>(
    engine: Rc<Engine<S, P>>,
    mut rx: mpsc::Receiver<Job>,
    mut stop: oneshot::Receiver<()>,
    tick_interval: Duration,
) where
    S: Storage + 'static,
    P: MessagePublisher + 'static,
{
    let mut handlers = JoinSet::new();
    let mut tick = tokio::time::interval(tick_interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            job = rx.recv() => match job {
                Some(Job::Message { topic, payload }) => {
                    let engine = Rc::clone(&engine);
                    handlers.spawn_local(async move {
                        match engine.handle(&topic, &payload).await {
                            Ok(outcome) => tracing::trace!(topic, ?outcome, "message handled"),
                            Err(err) => {
                                tracing::warn!(topic, error = %err, "message handling failed");
                            }
                        }
                    });
                }
                Some(Job::TransportLost) => engine.transport_lost(),
                None => break,
            },
            Some(joined) = handlers.join_next() => {
                if let Err(err) = joined {
                    tracing::error!(error = %err, "message handler panicked");
                }
            }
            _ = tick.tick() => engine.tick().await,
        }
    }

    rx.close();
    let mut dropped = 0_usize;
    while rx.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        tracing::warn!(dropped, "dropping queued jobs at shutdown");
    }

    // Cancelled handlers hand their in-flight telemetry back to the buffer.
    handlers.abort_all();
    while handlers.join_next().await.is_some() {}
    engine.shutdown().await;
}
