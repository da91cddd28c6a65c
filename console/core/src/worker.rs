//! Store Worker
//!
//! A single background task that runs store jobs one at a time, in the
//! order they were submitted. A call's insert therefore always lands before
//! its end-of-call duration update, and a history refresh submitted after a
//! write sees that write.
//!
//! Every job produces exactly one [`StoreOutcome`], delivered on the
//! results channel. Failures are reported, never retried.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::call::{CallDirection, CallRecord, NewCallRecord, RecordId};
use crate::error::{ConsoleError, StoreError};
use crate::history::RefreshTicket;
use crate::store::CallStore;

/// Directions searched when closing a call
const CLOSE_DIRECTIONS: [CallDirection; 2] = [CallDirection::Inbound, CallDirection::Outbound];

/// Work for the store worker
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreJob {
    /// Insert a new call record
    Record(NewCallRecord),
    /// Write the final duration onto the newest record for a number
    CloseCall {
        /// Remote party's number
        number: String,
        /// Talk time as `mm:ss`
        duration: String,
    },
    /// Fetch the newest records
    Refresh {
        /// Generation of this refresh
        ticket: RefreshTicket,
        /// Maximum records to fetch
        limit: usize,
    },
}

impl StoreJob {
    /// Short name for logs and notifications
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Record(_) => "record call",
            Self::CloseCall { .. } => "close call",
            Self::Refresh { .. } => "refresh history",
        }
    }
}

/// Result of one [`StoreJob`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreOutcome {
    /// The record was inserted
    Recorded(CallRecord),
    /// The duration was written, or no matching record existed (`id` is `None`)
    CallClosed {
        /// Remote party's number
        number: String,
        /// Record that was updated
        id: Option<RecordId>,
    },
    /// Records fetched for a refresh
    Refreshed {
        /// Generation of the refresh
        ticket: RefreshTicket,
        /// Records, as returned by the store
        records: Vec<CallRecord>,
    },
    /// The job failed
    Failed {
        /// What was attempted
        job: &'static str,
        /// Error description
        error: String,
    },
}

/// Handle to the background store task
#[derive(Debug)]
pub struct StoreWorker {
    jobs: mpsc::UnboundedSender<StoreJob>,
    handle: JoinHandle<()>,
}

impl StoreWorker {
    /// Spawn the worker
    ///
    /// Outcomes are converted with `From` and sent on `results`. The worker
    /// stops once every job sender is dropped or `results` closes.
    /// Must be called from within a tokio runtime.
    pub fn spawn<S, T>(store: Arc<S>, results: mpsc::UnboundedSender<T>) -> Self
    where
        S: CallStore + ?Sized + 'static,
        T: From<StoreOutcome> + Send + 'static,
    {
        let (jobs, jobs_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(store, jobs_rx, results));
        Self { jobs, handle }
    }

    /// Queue a job
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::WorkerStopped`] if the worker has exited.
    pub fn submit(&self, job: StoreJob) -> Result<(), ConsoleError> {
        self.jobs.send(job).map_err(|_| ConsoleError::WorkerStopped)
    }

    /// Whether the worker task is still running
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

async fn run<S, T>(
    store: Arc<S>,
    mut jobs: mpsc::UnboundedReceiver<StoreJob>,
    results: mpsc::UnboundedSender<T>,
) where
    S: CallStore + ?Sized,
    T: From<StoreOutcome>,
{
    while let Some(job) = jobs.recv().await {
        let kind = job.kind();
        let outcome = match execute(store.as_ref(), job).await {
            Ok(outcome) => outcome,
            Err(e) => StoreOutcome::Failed {
                job: kind,
                error: e.to_string(),
            },
        };
        if results.send(outcome.into()).is_err() {
            break;
        }
    }
    tracing::debug!(store = store.name(), "Store worker stopped");
}

async fn execute<S>(store: &S, job: StoreJob) -> Result<StoreOutcome, StoreError>
where
    S: CallStore + ?Sized,
{
    match job {
        StoreJob::Record(record) => {
            let stored = store.insert(record).await?;
            tracing::debug!(id = %stored.id, number = %stored.phone_number, "Call recorded");
            Ok(StoreOutcome::Recorded(stored))
        }
        StoreJob::CloseCall { number, duration } => {
            let latest = store.latest_for_number(&number, &CLOSE_DIRECTIONS).await?;
            let id = match latest {
                Some(record) => {
                    store.update_duration(&record.id, &duration).await?;
                    tracing::debug!(id = %record.id, duration = %duration, "Call duration saved");
                    Some(record.id)
                }
                None => None,
            };
            Ok(StoreOutcome::CallClosed { number, id })
        }
        StoreJob::Refresh { ticket, limit } => {
            let records = store.recent(limit).await?;
            Ok(StoreOutcome::Refreshed { ticket, records })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_jobs_run_in_order() {
        let store = Arc::new(MemoryStore::new());
        let (tx, mut rx) = mpsc::unbounded_channel::<StoreOutcome>();
        let worker = StoreWorker::spawn(store.clone(), tx);

        let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        worker
            .submit(StoreJob::Record(NewCallRecord::answered("555", start)))
            .unwrap();
        worker
            .submit(StoreJob::CloseCall {
                number: "555".to_string(),
                duration: "00:42".to_string(),
            })
            .unwrap();
        worker
            .submit(StoreJob::Refresh {
                ticket: RefreshTicket(1),
                limit: 15,
            })
            .unwrap();

        let recorded = rx.recv().await.unwrap();
        let StoreOutcome::Recorded(record) = recorded else {
            panic!("expected Recorded, got {recorded:?}");
        };

        let closed = rx.recv().await.unwrap();
        assert_eq!(
            closed,
            StoreOutcome::CallClosed {
                number: "555".to_string(),
                id: Some(record.id.clone()),
            }
        );

        match rx.recv().await.unwrap() {
            StoreOutcome::Refreshed { ticket, records } => {
                assert_eq!(ticket, RefreshTicket(1));
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].duration, "00:42");
            }
            other => panic!("expected Refreshed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_close_targets_newest_record() {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let older = NewCallRecord::answered("555", base).into_record(RecordId::new("old"));
        let newer = NewCallRecord::dialed("555", base + Duration::minutes(3))
            .into_record(RecordId::new("new"));
        let store = Arc::new(MemoryStore::with_records(vec![older, newer]));

        let (tx, mut rx) = mpsc::unbounded_channel::<StoreOutcome>();
        let worker = StoreWorker::spawn(store.clone(), tx);
        worker
            .submit(StoreJob::CloseCall {
                number: "555".to_string(),
                duration: "01:00".to_string(),
            })
            .unwrap();
        rx.recv().await.unwrap();

        let records = store.snapshot();
        assert_eq!(records[0].duration, "00:00");
        assert_eq!(records[1].duration, "01:00");
    }

    #[tokio::test]
    async fn test_close_without_record_reports_none() {
        let (tx, mut rx) = mpsc::unbounded_channel::<StoreOutcome>();
        let worker = StoreWorker::spawn(Arc::new(MemoryStore::new()), tx);
        worker
            .submit(StoreJob::CloseCall {
                number: "555".to_string(),
                duration: "00:05".to_string(),
            })
            .unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            StoreOutcome::CallClosed {
                number: "555".to_string(),
                id: None,
            }
        );
    }

    #[tokio::test]
    async fn test_submit_after_stop_fails() {
        let (tx, rx) = mpsc::unbounded_channel::<StoreOutcome>();
        drop(rx);
        let worker = StoreWorker::spawn(Arc::new(MemoryStore::new()), tx);

        // The first job's result has nowhere to go, so the worker exits
        worker
            .submit(StoreJob::Refresh {
                ticket: RefreshTicket(1),
                limit: 1,
            })
            .unwrap();
        while worker.is_running() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            worker.submit(StoreJob::Refresh {
                ticket: RefreshTicket(2),
                limit: 1,
            }),
            Err(ConsoleError::WorkerStopped)
        ));
    }
}
