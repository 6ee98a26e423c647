use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::keyspace::{KeySpace, KeySpaceState};
use crate::protocol::{Header, JournalSpec, ProcessId, Route, Status};
use crate::{AppError, AppResult};

use super::replica::ReplicaRegistry;
use super::route::build_route;
use super::{Replica, ReplicaSpawner};

/// Arguments of a single resolution.
#[derive(Default)]
pub struct ResolveArgs {
    /// Cancellation scope of the calling RPC. Only the freshness wait
    /// observes it; once a snapshot is locked, the decision runs to
    /// completion.
    pub ctx: CancellationToken,
    /// The journal being resolved.
    pub journal: String,
    /// The caller needs the journal's primary; other members are
    /// unacceptable.
    pub require_primary: bool,
    /// The caller accepts a resolution naming a peer broker to proxy to.
    pub may_proxy: bool,
    /// The resolution must observe at least this coordination-store
    /// revision before deciding.
    pub min_etcd_revision: i64,
    /// Set when this call is itself a request proxied from a peer broker,
    /// pinning this broker to the view the peer already committed to.
    pub proxy_header: Option<Header>,
}

/// The answer to "who should serve this journal request, and from what
/// snapshot".
#[derive(Debug)]
pub struct Resolution {
    pub status: Status,
    /// Routing header to attach to the response. Its process id names the
    /// broker accountable for the outcome.
    pub header: Header,
    /// The journal's spec at the resolved revision, when it exists.
    pub journal_spec: Option<JournalSpec>,
    /// The local replica, attached when this broker is an assigned member.
    pub replica: Option<Arc<Replica>>,
    /// Fires when the journal's assignment changes or local serving stops.
    /// Long-running RPCs watch it to abandon work routed on a stale view.
    pub invalidate_ch: Option<CancellationToken>,
    /// This broker's id at resolution time, or the missing-from-Etcd
    /// placeholder when its own announcement key is gone.
    pub local_id: ProcessId,
}

/// Resolver is the broker's routing decision point, layered over the
/// keyspace view and the local replica registry.
pub struct Resolver {
    ks: Arc<KeySpace>,
    id: ProcessId,
    registry: Arc<ReplicaRegistry>,
}

impl Resolver {
    /// Creates a Resolver for the broker `id`, registering its registry as
    /// an observer of `ks` so replica lifecycle tracks assignment changes
    /// atomically with each applied update. `spawner` is invoked once per
    /// created replica to start its serving state machine.
    pub fn new(ks: Arc<KeySpace>, id: ProcessId, spawner: ReplicaSpawner) -> Self {
        let registry = Arc::new(ReplicaRegistry::new(id.clone(), spawner));

        let observer = registry.clone();
        ks.register_observer(Box::new(move |state, update| {
            observer.observe(state, update);
        }));

        Resolver { ks, id, registry }
    }

    pub fn id(&self) -> &ProcessId {
        &self.id
    }

    pub(crate) fn local_replica_count(&self) -> usize {
        self.registry.replica_count()
    }

    /// Resolves a journal to the broker that should serve it.
    ///
    /// Cluster-state outcomes (journal missing, no primary, wrong role,
    /// insufficient brokers) are successful calls carrying the appropriate
    /// [`Status`] and a best-effort route for the client to retry against.
    /// Errors are reserved for cancellation during the freshness wait,
    /// proxy-header validation failures, and resolution after local serving
    /// has stopped.
    pub async fn resolve(&self, args: ResolveArgs) -> AppResult<Resolution> {
        let mut state = self.ks.read().await;
        let mut local_id = self.local_id_at(&state);
        let mut min_revision = args.min_etcd_revision;

        // A proxied request pins the proxying broker's view: it must name
        // this broker within our cluster, and we may not decide against a
        // revision older than the one it observed.
        if let Some(proxy) = &args.proxy_header {
            let proxy_id = proxy.process_id.clone().unwrap_or_default();
            if proxy_id != local_id {
                return Err(AppError::ProxyWrongProcessId(
                    proxy_id.to_string(),
                    local_id.to_string(),
                ));
            }
            let proxy_etcd = proxy.etcd.unwrap_or_default();
            if proxy_etcd.cluster_id != state.header.cluster_id {
                return Err(AppError::ProxyWrongClusterId(
                    proxy_etcd.cluster_id,
                    state.header.cluster_id,
                ));
            }
            min_revision = min_revision.max(proxy_etcd.revision);
        }

        if min_revision > state.header.revision {
            state = self
                .ks
                .wait_for_revision(state, min_revision, &args.ctx)
                .await?;
            // Decide from the post-wait snapshot.
            local_id = self.local_id_at(&state);
        }

        let entry = state.journals.get(&args.journal);
        let route = entry
            .map(|entry| build_route(&entry.assignment, &state))
            .unwrap_or_else(Route::empty);

        let local_member = route.member_index(&local_id).is_some();
        let primary_id = route.primary_member().cloned();
        let local_is_primary = primary_id.as_ref() == Some(&local_id);

        let status = if entry.is_none() {
            Status::JournalNotFound
        } else if route.members.is_empty() {
            Status::InsufficientJournalBrokers
        } else if args.require_primary && route.primary == -1 {
            Status::NoJournalPrimaryBroker
        } else if args.require_primary && !local_is_primary && !args.may_proxy {
            Status::NotJournalPrimaryBroker
        } else if !args.require_primary && !local_member && !args.may_proxy {
            Status::NotJournalBroker
        } else {
            Status::Ok
        };

        let process_id = if status != Status::Ok {
            // We authored the outcome.
            local_id.clone()
        } else if args.require_primary && !local_is_primary {
            // Resolve specifically to the primary peer.
            primary_id.clone().unwrap_or_default()
        } else if local_member {
            local_id.clone()
        } else {
            // Any of several peers could serve; name nobody.
            ProcessId::default()
        };

        // Once local serving has stopped, any outcome requiring a local
        // replica fails; resolutions proxied to peers remain valid.
        if self.registry.is_stopped()
            && (local_member || (status == Status::Ok && process_id == local_id))
        {
            return Err(AppError::ResolverStopped);
        }

        let (replica, invalidate_ch) = match self.registry.lookup(&args.journal) {
            Some((replica, invalidate)) => (Some(replica), Some(invalidate)),
            None => (None, None),
        };

        let mut header = Header {
            process_id: Some(process_id.clone()),
            route: Some(route),
            etcd: Some(state.header),
        };
        if status == Status::Ok {
            if let Some(proxy) = args.proxy_header {
                // The proxying broker already committed to this view of the
                // journal; echo it rather than our own.
                header = proxy;
            }
        }

        trace!(
            journal = %args.journal,
            status = ?status,
            process_id = %process_id,
            revision = state.header.revision,
            "resolved journal"
        );

        Ok(Resolution {
            status,
            header,
            journal_spec: entry.map(|entry| entry.spec.clone()),
            replica,
            invalidate_ch,
            local_id,
        })
    }

    /// Stops serving local replicas: under the keyspace write lock, cancels
    /// every replica scope and fires every invalidation channel, so callers
    /// observe both synchronously. Resolutions that proxy to peers continue
    /// to succeed afterwards.
    pub async fn stop_serving_local_replicas(&self) {
        let _state = self.ks.exclusive().await;
        self.registry.stop_serving_local();
    }

    fn local_id_at(&self, state: &KeySpaceState) -> ProcessId {
        if state.brokers.contains_key(&self.id) {
            self.id.clone()
        } else {
            ProcessId::missing_from_etcd()
        }
    }
}
