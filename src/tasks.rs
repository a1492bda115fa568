//! Background execution of database work. A single worker thread owns the
//! `rusqlite::Connection` and drains a bounded FIFO queue, so every operation
//! completes in submission order and the UI thread never blocks on storage
//! I/O it does not need the answer to.
//!
//! Two submission styles:
//! - [`DbWorker::call`] blocks for a typed result, for reads the UI needs
//!   before it can render the next state.
//! - [`DbWorker::submit`] is fire-and-forget; the completion comes back
//!   through a channel the event loop drains each tick. Completions carry the
//!   generation they were submitted under, and the app discards any whose
//!   generation predates the current screen, so a screen torn down mid-flight
//!   never sees a late result.

use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use log::debug;
use rusqlite::Connection;

type Job = Box<dyn FnOnce(&mut Connection) + Send>;

enum Message {
    Run(Job),
    Shutdown,
}

/// Outcome of a fire-and-forget submission.
pub struct Completion {
    /// What the job was, for status messages ("reset workouts", ...).
    pub label: &'static str,
    /// Screen generation at submission time.
    pub generation: u64,
    pub result: Result<()>,
}

/// Handle to the worker thread. Dropping it shuts the thread down after the
/// queued jobs finish.
pub struct DbWorker {
    jobs: SyncSender<Message>,
    completion_tx: Sender<Completion>,
    completions: Receiver<Completion>,
    handle: Option<JoinHandle<()>>,
}

/// Queue bound; submission blocks once this many jobs are pending, which in
/// practice never happens at single-user call volume.
const QUEUE_CAPACITY: usize = 64;

impl DbWorker {
    /// Move the connection onto a freshly spawned worker thread.
    pub fn spawn(mut conn: Connection) -> Result<Self> {
        let (jobs, job_rx) = mpsc::sync_channel::<Message>(QUEUE_CAPACITY);
        let (completion_tx, completions) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("db-worker".to_string())
            .spawn(move || {
                while let Ok(message) = job_rx.recv() {
                    match message {
                        Message::Run(job) => job(&mut conn),
                        Message::Shutdown => break,
                    }
                }
                debug!("database worker stopped");
            })
            .context("failed to spawn database worker")?;

        Ok(Self {
            jobs,
            completion_tx,
            completions,
            handle: Some(handle),
        })
    }

    /// Run a closure on the worker and block until its result is back.
    /// Because the same queue serializes everything, a `call` issued after a
    /// `submit` observes that submission's effects.
    pub fn call<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        self.jobs
            .send(Message::Run(Box::new(move |conn| {
                let _ = tx.send(f(conn));
            })))
            .map_err(|_| anyhow!("database worker is no longer running"))?;
        rx.recv()
            .map_err(|_| anyhow!("database worker dropped the request"))?
    }

    /// Queue a mutation and return immediately. The completion surfaces later
    /// via [`DbWorker::poll_completion`].
    pub fn submit<F>(&self, label: &'static str, generation: u64, f: F) -> Result<()>
    where
        F: FnOnce(&mut Connection) -> Result<()> + Send + 'static,
    {
        let done = self.completion_tx.clone();
        self.jobs
            .send(Message::Run(Box::new(move |conn| {
                let result = f(conn);
                let _ = done.send(Completion {
                    label,
                    generation,
                    result,
                });
            })))
            .map_err(|_| anyhow!("database worker is no longer running"))
    }

    /// Non-blocking check for a finished submission.
    pub fn poll_completion(&self) -> Option<Completion> {
        self.completions.try_recv().ok()
    }
}

impl Drop for DbWorker {
    fn drop(&mut self) {
        let _ = self.jobs.send(Message::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::test_support::memory_db;
    use crate::db::{self, count_workouts};

    fn worker() -> DbWorker {
        DbWorker::spawn(memory_db()).unwrap()
    }

    #[test]
    fn call_round_trips_a_value() {
        let worker = worker();
        let user = worker
            .call(|conn| db::create_user(conn, "Ada", "ada@example.com", "hash"))
            .unwrap();
        assert_eq!(user.full_name, "Ada");
    }

    #[test]
    fn submissions_complete_in_fifo_order() {
        let worker = worker();
        let user = worker
            .call(|conn| db::create_user(conn, "Ada", "ada@example.com", "hash"))
            .unwrap();

        let user_id = user.id;
        worker
            .submit("create first", 1, move |conn| {
                db::create_workout(conn, user_id, "First", None, None).map(|_| ())
            })
            .unwrap();
        worker
            .submit("create second", 1, move |conn| {
                db::create_workout(conn, user_id, "Second", None, None).map(|_| ())
            })
            .unwrap();

        // A call after two submits runs third and must observe both writes.
        let count = worker
            .call(move |conn| count_workouts(conn, user_id))
            .unwrap();
        assert_eq!(count, 2);

        let first = loop {
            if let Some(completion) = worker.poll_completion() {
                break completion;
            }
        };
        let second = worker.poll_completion().expect("second completion queued");
        assert_eq!(first.label, "create first");
        assert_eq!(second.label, "create second");
        assert!(first.result.is_ok());
        assert!(second.result.is_ok());
    }

    #[test]
    fn completions_carry_their_generation() {
        let worker = worker();
        worker.submit("noop", 42, |_| Ok(())).unwrap();
        let completion = loop {
            if let Some(completion) = worker.poll_completion() {
                break completion;
            }
        };
        assert_eq!(completion.generation, 42);
    }

    #[test]
    fn failed_jobs_report_their_error() {
        let worker = worker();
        worker
            .submit("orphan workout", 1, |conn| {
                db::create_workout(conn, 999, "Orphan", None, None).map(|_| ())
            })
            .unwrap();
        let completion = loop {
            if let Some(completion) = worker.poll_completion() {
                break completion;
            }
        };
        assert!(completion.result.is_err());
    }
}
