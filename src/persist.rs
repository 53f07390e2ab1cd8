//! Save-exactly-once persistence of the live session.
//!
//! The REPL loop, a drop guard, and the interrupt thread all funnel into
//! [`Persistence::save`]. The first caller performs the append; every other
//! caller, concurrent or later, waits for and observes that same outcome.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::thread::{self, JoinHandle};

use archive_store::{AppendReport, ArchiveStore, ArchiveStoreError};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use tracing::warn;

use crate::session::Session;

pub type SaveOutcome = Result<AppendReport, ArchiveStoreError>;

#[derive(Debug)]
pub struct Persistence {
    session: Mutex<Session>,
    store: ArchiveStore,
    outcome: OnceLock<SaveOutcome>,
}

impl Persistence {
    #[must_use]
    pub fn new(session: Session, store: ArchiveStore) -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(session),
            store,
            outcome: OnceLock::new(),
        })
    }

    /// Locks the live session. Callers must not hold the guard across a
    /// provider call.
    pub fn session(&self) -> MutexGuard<'_, Session> {
        lock_unpoisoned(&self.session)
    }

    #[must_use]
    pub fn store(&self) -> &ArchiveStore {
        &self.store
    }

    /// Appends the session to the archive on first call and returns that
    /// outcome on every call.
    pub fn save(&self) -> &SaveOutcome {
        self.outcome.get_or_init(|| {
            let conversation = self.session().conversation().clone();
            self.store.append_conversation(&conversation)
        })
    }

    #[must_use]
    pub fn saved(&self) -> Option<&SaveOutcome> {
        self.outcome.get()
    }
}

/// Saves on drop, covering early returns and panics unwinding through `main`.
pub struct SaveOnDrop {
    persistence: Arc<Persistence>,
}

impl SaveOnDrop {
    #[must_use]
    pub fn new(persistence: Arc<Persistence>) -> Self {
        Self { persistence }
    }
}

impl Drop for SaveOnDrop {
    fn drop(&mut self) {
        if self.persistence.saved().is_none() {
            warn!("session ended without an explicit save; saving now");
        }
        let _ = self.persistence.save();
    }
}

/// Keeps the SIGINT/SIGTERM listener alive; dropping it stops the listener.
pub struct InterruptGuard {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// On the first SIGINT or SIGTERM, saves the session and hands the outcome
/// to `on_saved`, which typically reports it and exits the process.
pub fn save_on_interrupt<F>(persistence: Arc<Persistence>, on_saved: F) -> io::Result<InterruptGuard>
where
    F: FnOnce(&SaveOutcome) + Send + 'static,
{
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let handle = signals.handle();

    let thread = thread::Builder::new()
        .name("shllm-interrupt".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                warn!(signal, "interrupted; saving conversation");
                on_saved(persistence.save());
            }
        })?;

    Ok(InterruptGuard {
        handle,
        thread: Some(thread),
    })
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
