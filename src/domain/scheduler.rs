//! Dual-interval background scheduler.
//!
//! Two independent timer lines on their own worker threads: refresh pulls
//! fresh data from the provider into the shared [`PairBook`], persist upserts
//! the current snapshot into the store. The lines share nothing but the book
//! lock, so a slow persist never delays the next refresh fire.
//!
//! Interval changes take effect on the next tick; the pending wait is neither
//! shortened nor lengthened. A fire that fails is reported and the line stays
//! Running for its next scheduled fire.

use crate::domain::book::PairBook;
use crate::domain::schedule::ScheduleConfig;
use crate::ports::data_provider::DataProvider;
use crate::ports::instrument_store::InstrumentStore;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

pub struct Scheduler {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

struct Shared {
    refresh_interval: Mutex<Duration>,
    persist_interval: Mutex<Duration>,
    stopped: Mutex<bool>,
    wake: Condvar,
    book: Arc<Mutex<PairBook>>,
    provider: Arc<dyn DataProvider + Send + Sync>,
    store: Arc<dyn InstrumentStore + Send + Sync>,
}

#[derive(Clone, Copy)]
enum Line {
    Refresh,
    Persist,
}

impl Scheduler {
    pub fn new(
        schedule: ScheduleConfig,
        book: Arc<Mutex<PairBook>>,
        provider: Arc<dyn DataProvider + Send + Sync>,
        store: Arc<dyn InstrumentStore + Send + Sync>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                refresh_interval: Mutex::new(schedule.refresh),
                persist_interval: Mutex::new(schedule.persist),
                stopped: Mutex::new(true),
                wake: Condvar::new(),
                book,
                provider,
                store,
            }),
            workers: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.workers.is_empty()
    }

    /// Starts both timer lines. A no-op when already running.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        *self.shared.stopped.lock().unwrap() = false;

        for (line, name) in [(Line::Refresh, "pairview-refresh"), (Line::Persist, "pairview-persist")]
        {
            let shared = Arc::clone(&self.shared);
            let handle = std::thread::Builder::new()
                .name(name.into())
                .spawn(move || run_line(&shared, line))
                .expect("failed to spawn scheduler thread");
            self.workers.push(handle);
        }
    }

    /// Stops both lines and waits for them to finish.
    ///
    /// An in-flight fire completes; no new fire starts. After this returns,
    /// the scheduler issues no further provider fetches or store writes.
    pub fn stop(&mut self) {
        {
            let mut stopped = self.shared.stopped.lock().unwrap();
            *stopped = true;
        }
        self.shared.wake.notify_all();

        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }

    /// New value is read at the start of the line's next wait.
    pub fn set_refresh_interval(&self, interval: Duration) {
        *self.shared.refresh_interval.lock().unwrap() = interval;
    }

    pub fn set_persist_interval(&self, interval: Duration) {
        *self.shared.persist_interval.lock().unwrap() = interval;
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_line(shared: &Shared, line: Line) {
    loop {
        let interval = match line {
            Line::Refresh => *shared.refresh_interval.lock().unwrap(),
            Line::Persist => *shared.persist_interval.lock().unwrap(),
        };

        let stopped = shared.stopped.lock().unwrap();
        let (stopped, timeout) = shared
            .wake
            .wait_timeout_while(stopped, interval, |stopped| !*stopped)
            .unwrap();
        if !timeout.timed_out() {
            // woken by stop()
            return;
        }
        drop(stopped);

        match line {
            Line::Refresh => fire_refresh(shared),
            Line::Persist => fire_persist(shared),
        }
    }
}

fn fire_refresh(shared: &Shared) {
    match shared.provider.fetch_all() {
        Ok(report) => {
            if report.skipped_rows > 0 {
                eprintln!("warning: refresh skipped {} malformed rows", report.skipped_rows);
            }
            let mut book = shared.book.lock().unwrap();
            book.replace_instruments(report.instruments);
        }
        Err(e) => eprintln!("warning: refresh failed ({e})"),
    }
}

fn fire_persist(shared: &Shared) {
    // snapshot under the lock, write outside it
    let snapshot: Vec<_> = shared.book.lock().unwrap().instruments().to_vec();

    for series in &snapshot {
        if let Err(e) = shared.store.upsert_history(&series.code, series.samples()) {
            eprintln!("warning: persist failed for {} ({e})", series.code);
            return;
        }
    }
}
