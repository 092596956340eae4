//! Background experience replay.
//!
//! Connections count frames on a shared counter and hand a replay job to a
//! single training thread every `interval` frames. The queue in front of the
//! thread holds one job; a submission that finds it full is dropped, so at
//! most one replay runs and at most one waits behind it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use log::{debug, error, warn};

use crate::agent::SharedAgent;
use crate::error::Result;

pub struct Trainer {
    jobs: Option<SyncSender<usize>>,
    worker: Option<JoinHandle<()>>,
}

impl Trainer {
    pub fn spawn(agent: SharedAgent) -> Result<Self> {
        let (jobs, queue) = mpsc::sync_channel::<usize>(1);

        let worker = thread::Builder::new()
            .name("trainer".to_string())
            .spawn(move || {
                for batch_size in queue {
                    let mut agent = agent.write();
                    match agent.replay(batch_size) {
                        Ok(Some(loss)) => debug!("replay on {} transitions, loss {:.5}, epsilon {:.4}", batch_size, loss, agent.epsilon()),
                        Ok(None) => debug!("replay skipped, {} of {} transitions stored", agent.memory().len(), batch_size),
                        Err(err) => error!("replay failed: {}", err),
                    }
                }
            })?;

        Ok(Self { jobs: Some(jobs), worker: Some(worker) })
    }

    /// Queues a replay without waiting. Returns `false` when the job was coalesced away.
    pub fn submit(&self, batch_size: usize) -> bool {
        let Some(jobs) = &self.jobs else {
            return false;
        };
        match jobs.try_send(batch_size) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("replay already queued, dropping submission");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("training worker is gone");
                false
            }
        }
    }
}

impl Drop for Trainer {
    // lets the queued job finish, then joins the worker
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("training worker panicked");
            }
        }
    }
}

/// Counts frames across all connections and triggers a replay every `interval`.
pub struct TrainingScheduler {
    steps: AtomicU64,
    interval: u64,
    batch_size: usize,
    trainer: Trainer,
}

impl TrainingScheduler {
    pub fn new(agent: SharedAgent, interval: u64, batch_size: usize) -> Result<Self> {
        Ok(Self {
            steps: AtomicU64::new(0),
            interval,
            batch_size,
            trainer: Trainer::spawn(agent)?,
        })
    }

    /// Records one frame; returns the new step count.
    pub fn step(&self) -> u64 {
        let step = self.steps.fetch_add(1, Ordering::Relaxed) + 1;
        if self.interval > 0 && step % self.interval == 0 {
            self.trainer.submit(self.batch_size);
        }
        step
    }

    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::Relaxed)
    }
}
