use std::collections::BTreeMap;
use std::sync::Mutex;

use tokio::sync::watch;
use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::protocol::{BrokerSpec, EtcdHeader, JournalSpec, ProcessId};
use crate::{AppError, AppResult};

use super::{Assignment, KeySpaceOp, KeySpaceUpdate};

/// A journal's spec and current assignment, as of the snapshot revision.
#[derive(Clone, Debug)]
pub struct JournalEntry {
    pub spec: JournalSpec,
    pub assignment: Assignment,
}

/// The cluster snapshot at a single coordination-store revision.
#[derive(Debug, Default)]
pub struct KeySpaceState {
    pub header: EtcdHeader,
    pub brokers: BTreeMap<ProcessId, BrokerSpec>,
    pub journals: BTreeMap<String, JournalEntry>,
}

impl KeySpaceState {
    pub fn broker_endpoint(&self, id: &ProcessId) -> Option<&str> {
        self.brokers.get(id).map(|spec| spec.endpoint.as_str())
    }

    fn apply_op(&mut self, op: &KeySpaceOp) {
        match op {
            KeySpaceOp::PutBroker(spec) => {
                // validated: the id is present.
                if let Some(id) = &spec.id {
                    self.brokers.insert(id.clone(), spec.clone());
                }
            }
            KeySpaceOp::DeleteBroker(id) => {
                self.brokers.remove(id);
            }
            KeySpaceOp::PutJournal { spec, assignment } => {
                self.journals.insert(
                    spec.name.clone(),
                    JournalEntry {
                        spec: spec.clone(),
                        assignment: assignment.clone(),
                    },
                );
            }
            KeySpaceOp::DeleteJournal(name) => {
                self.journals.remove(name);
            }
        }
    }
}

/// Observers run inside the apply critical section, after the update has
/// landed and before the write lock is released. Mutations they make to
/// collaborating structures are therefore published atomically with the
/// snapshot itself.
pub type KeySpaceObserver = Box<dyn Fn(&KeySpaceState, &KeySpaceUpdate) + Send + Sync>;

/// KeySpace is the single-writer, multi-reader view of cluster state.
/// The watcher task is the writer, through [`KeySpace::apply`]; resolvers
/// read whole snapshots under [`KeySpace::read`].
pub struct KeySpace {
    state: RwLock<KeySpaceState>,
    revision_tx: watch::Sender<i64>,
    observers: Mutex<Vec<KeySpaceObserver>>,
}

impl KeySpace {
    pub fn new() -> Self {
        let (revision_tx, _) = watch::channel(0);
        KeySpace {
            state: RwLock::new(KeySpaceState::default()),
            revision_tx,
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Registers an observer of applied updates. Register before the watcher
    /// starts delivering updates; observers cannot be removed.
    pub fn register_observer(&self, observer: KeySpaceObserver) {
        self.observers
            .lock()
            .expect("keyspace observer lock poisoned")
            .push(observer);
    }

    /// Locks and returns the current snapshot. Holding the guard blocks the
    /// watcher from applying further updates, so hold it only to decide.
    pub async fn read(&self) -> RwLockReadGuard<'_, KeySpaceState> {
        self.state.read().await
    }

    pub async fn current_revision(&self) -> i64 {
        self.state.read().await.header.revision
    }

    /// Exclusive access to the snapshot, serializing the caller against
    /// watcher applies and all readers. Used by the resolver to make
    /// stop-serving observable atomically.
    pub(crate) async fn exclusive(&self) -> tokio::sync::RwLockWriteGuard<'_, KeySpaceState> {
        self.state.write().await
    }

    /// Atomically applies one watcher update: validates it, mutates the
    /// snapshot, runs observers under the write lock, then wakes revision
    /// waiters. Stale or invalid updates are rejected whole.
    pub async fn apply(&self, update: KeySpaceUpdate) -> AppResult<()> {
        for op in &update.ops {
            op.validate()?;
        }

        let mut state = self.state.write().await;
        if update.header.revision <= state.header.revision {
            return Err(AppError::InvalidValue(format!(
                "keyspace update revision {} is not beyond {}",
                update.header.revision, state.header.revision
            )));
        }
        for op in &update.ops {
            state.apply_op(op);
        }
        state.header = update.header;

        {
            let observers = self
                .observers
                .lock()
                .expect("keyspace observer lock poisoned");
            for observer in observers.iter() {
                observer(&state, &update);
            }
        }

        trace!(
            revision = state.header.revision,
            ops = update.ops.len(),
            "applied keyspace update"
        );
        self.revision_tx.send_replace(state.header.revision);
        Ok(())
    }

    /// Blocks until the view has observed `min_revision`, or `ctx` is
    /// cancelled. The caller's read guard is released while parked and a
    /// fresh guard is returned, so the watcher can land the update being
    /// waited for and the caller decides from a post-wait snapshot.
    pub async fn wait_for_revision<'a>(
        &'a self,
        guard: RwLockReadGuard<'a, KeySpaceState>,
        min_revision: i64,
        ctx: &CancellationToken,
    ) -> AppResult<RwLockReadGuard<'a, KeySpaceState>> {
        // Subscribe while still holding the guard: updates landing after
        // release are then guaranteed to be observed by changed().
        let mut revisions = self.revision_tx.subscribe();
        let mut guard = guard;

        loop {
            if guard.header.revision >= min_revision {
                return Ok(guard);
            }
            trace!(
                have = guard.header.revision,
                want = min_revision,
                "waiting for keyspace revision"
            );
            drop(guard);

            tokio::select! {
                _ = ctx.cancelled() => return Err(AppError::ResolveCancelled),
                changed = revisions.changed() => {
                    changed.map_err(|_| {
                        AppError::IllegalState("keyspace revision channel closed".to_string())
                    })?;
                }
            }
            guard = self.state.read().await;
        }
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        KeySpace::new()
    }
}
