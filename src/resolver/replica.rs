use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::keyspace::{Assignment, KeySpaceOp, KeySpaceState, KeySpaceUpdate};
use crate::protocol::{JournalSpec, ProcessId};

/// Replica is the handle to the serving state machine of one locally
/// assigned journal. The registry owns it; outstanding resolutions hold
/// non-owning references. Its cancellation scope ending is the one signal
/// consumers use to stop relying on the handle.
#[derive(Debug)]
pub struct Replica {
    journal: String,
    spec: JournalSpec,
    ctx: CancellationToken,
}

impl Replica {
    fn new(spec: &JournalSpec) -> Self {
        Replica {
            journal: spec.name.clone(),
            spec: spec.clone(),
            ctx: CancellationToken::new(),
        }
    }

    pub fn journal(&self) -> &str {
        &self.journal
    }

    pub fn spec(&self) -> &JournalSpec {
        &self.spec
    }

    /// The scope under which the replica's state machine runs. Cancelled on
    /// un-assignment, journal deletion, or local-serving shutdown; the
    /// serving task is expected to drain and exit once it fires.
    pub fn ctx(&self) -> &CancellationToken {
        &self.ctx
    }

    fn cancel(&self) {
        self.ctx.cancel();
    }
}

/// Spawns the serving state machine for a newly created replica. Invoked
/// exactly once per replica, inside the keyspace apply critical section.
pub type ReplicaSpawner = Box<dyn Fn(Arc<Replica>) + Send + Sync>;

struct ReplicaEntry {
    replica: Arc<Replica>,
    // Fired and replaced whenever the journal's assignment changes, waking
    // holders of resolutions whose route is now stale.
    invalidate: CancellationToken,
    assignment: Assignment,
}

/// ReplicaRegistry maps each locally-assigned journal to its live replica.
/// All mutation happens while the keyspace write lock is held (from the
/// apply observer, or from stop-serving which takes the lock itself), so
/// resolvers reading under the keyspace read lock always observe the
/// registry and the snapshot in lockstep.
pub(crate) struct ReplicaRegistry {
    local_id: ProcessId,
    replicas: DashMap<String, ReplicaEntry>,
    stopped: AtomicBool,
    spawner: ReplicaSpawner,
}

impl ReplicaRegistry {
    pub(crate) fn new(local_id: ProcessId, spawner: ReplicaSpawner) -> Self {
        ReplicaRegistry {
            local_id,
            replicas: DashMap::new(),
            stopped: AtomicBool::new(false),
            spawner,
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub(crate) fn replica_count(&self) -> usize {
        self.replicas.len()
    }

    /// Returns the journal's replica and current invalidation channel, if
    /// this broker has one.
    pub(crate) fn lookup(&self, journal: &str) -> Option<(Arc<Replica>, CancellationToken)> {
        self.replicas
            .get(journal)
            .map(|entry| (entry.replica.clone(), entry.invalidate.clone()))
    }

    /// Keyspace observer body: reconciles the registry against the journal
    /// ops of one applied update. Runs under the keyspace write lock.
    pub(crate) fn observe(&self, _state: &KeySpaceState, update: &KeySpaceUpdate) {
        for op in &update.ops {
            match op {
                KeySpaceOp::PutJournal { spec, assignment } => {
                    self.on_journal_update(spec, assignment)
                }
                KeySpaceOp::DeleteJournal(name) => self.remove(name),
                KeySpaceOp::PutBroker(_) | KeySpaceOp::DeleteBroker(_) => {}
            }
        }
    }

    fn on_journal_update(&self, spec: &JournalSpec, assignment: &Assignment) {
        if !assignment.is_member(&self.local_id) {
            self.remove(&spec.name);
            return;
        }
        match self.replicas.get_mut(&spec.name) {
            Some(mut entry) => {
                if entry.assignment != *assignment {
                    entry.assignment = assignment.clone();
                    let prior = mem::replace(&mut entry.invalidate, CancellationToken::new());
                    prior.cancel();
                    debug!(journal = %spec.name, "invalidated journal routing");
                }
            }
            None => self.ensure(spec, assignment),
        }
    }

    /// Creates, spawns, and indexes the journal's replica. Idempotent, and a
    /// no-op once the registry is stopped: journals assigned to this broker
    /// after shutdown began are never served.
    fn ensure(&self, spec: &JournalSpec, assignment: &Assignment) {
        if self.is_stopped() || self.replicas.contains_key(&spec.name) {
            return;
        }
        let replica = Arc::new(Replica::new(spec));
        (self.spawner)(replica.clone());

        self.replicas.insert(
            spec.name.clone(),
            ReplicaEntry {
                replica,
                invalidate: CancellationToken::new(),
                assignment: assignment.clone(),
            },
        );
        info!(journal = %spec.name, "started local replica");
    }

    /// Cancels and de-indexes the journal's replica. The replica may linger
    /// until its serving task drains; new resolutions no longer attach to it.
    fn remove(&self, journal: &str) {
        if let Some((_, entry)) = self.replicas.remove(journal) {
            entry.invalidate.cancel();
            entry.replica.cancel();
            info!(journal, "stopped local replica");
        }
    }

    /// Fires every invalidation channel and cancels every replica scope,
    /// synchronously. The registry never serves local journals again.
    pub(crate) fn stop_serving_local(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        for entry in self.replicas.iter() {
            entry.invalidate.cancel();
            entry.replica.cancel();
        }
        info!(
            replicas = self.replicas.len(),
            "stopped serving local replicas"
        );
    }
}
