//! Off-thread model fitting.
//!
//! The worker owns nothing between jobs: each job carries a model copy and a batch, and the
//! fitted copy comes back on the result channel. The job queue holds a single entry, so a
//! policy can have at most one fit queued while another runs.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use skirmish_core::ModelError;

use crate::{Estimator, Experience, FitParams, FitReport};

/// Where the periodic training step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingMode {
    /// Fit a bounded batch synchronously on the training cadence.
    #[default]
    Inline,
    /// Hand batches to a [`BackgroundTrainer`]; fitted models are swapped in on a later decision.
    Background,
}

struct TrainJob<E> {
    model: E,
    batch: Vec<Experience>,
    params: FitParams,
}

pub type TrainOutcome<E> = Result<(E, FitReport), ModelError>;

pub struct BackgroundTrainer<E: Estimator> {
    jobs: Option<SyncSender<TrainJob<E>>>,
    results: Receiver<TrainOutcome<E>>,
    worker: Option<JoinHandle<()>>,
    in_flight: usize,
}

impl<E: Estimator> BackgroundTrainer<E> {
    pub fn spawn(name: impl Into<String>) -> std::io::Result<Self> {
        let (job_tx, job_rx) = mpsc::sync_channel::<TrainJob<E>>(1);
        let (result_tx, result_rx) = mpsc::channel::<TrainOutcome<E>>();
        let worker = thread::Builder::new().name(name.into()).spawn(move || {
            while let Ok(job) = job_rx.recv() {
                let TrainJob {
                    mut model,
                    batch,
                    params,
                } = job;
                let outcome = model.fit(&batch, &params).map(|report| (model, report));
                if result_tx.send(outcome).is_err() {
                    break;
                }
            }
            tracing::debug!("training worker stopped");
        })?;
        Ok(Self {
            jobs: Some(job_tx),
            results: result_rx,
            worker: Some(worker),
            in_flight: 0,
        })
    }

    /// Jobs submitted but not yet collected.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Queue a fit without blocking. Returns `false` when the queue is full or the worker is gone.
    pub fn submit(&mut self, model: E, batch: Vec<Experience>, params: FitParams) -> bool {
        let Some(jobs) = &self.jobs else {
            return false;
        };
        match jobs.try_send(TrainJob {
            model,
            batch,
            params,
        }) {
            Ok(()) => {
                self.in_flight += 1;
                true
            }
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => {
                tracing::warn!("training worker disconnected");
                self.jobs = None;
                false
            }
        }
    }

    /// Take a finished fit if one is ready. Never blocks.
    pub fn try_collect(&mut self) -> Option<TrainOutcome<E>> {
        match self.results.try_recv() {
            Ok(outcome) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(outcome)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for a finished fit. Intended for shutdown and tests, not the frame loop.
    pub fn collect_timeout(&mut self, timeout: Duration) -> Option<TrainOutcome<E>> {
        match self.results.recv_timeout(timeout) {
            Ok(outcome) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(outcome)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl<E: Estimator> Drop for BackgroundTrainer<E> {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loop.
        self.jobs = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("training worker panicked");
            }
        }
    }
}

impl<E: Estimator> std::fmt::Debug for BackgroundTrainer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundTrainer")
            .field("in_flight", &self.in_flight)
            .field("connected", &self.jobs.is_some())
            .finish()
    }
}
