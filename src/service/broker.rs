use std::sync::Arc;

use tokio::runtime::Runtime;
use tokio::signal;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use crate::keyspace::{Assignment, KeySpace, KeySpaceUpdate};
use crate::protocol::{BrokerSpec, EtcdHeader, JournalSpec};
use crate::resolver::{Replica, Resolver};
use crate::{global_config, AppResult, BrokerConfig};

pub struct Broker;

impl Broker {
    /// Runs the broker until a shutdown signal arrives, then stops serving
    /// local replicas and waits for their serving loops to drain.
    pub fn start(rt: &Runtime) -> AppResult<()> {
        let config = global_config();
        let local_id = config.general.process_id();

        let ks = Arc::new(KeySpace::new());
        let tracker = TaskTracker::new();

        // Replica serving loops are tracked so shutdown can await their
        // drain.
        let replica_tracker = tracker.clone();
        let resolver = Arc::new(Resolver::new(
            ks.clone(),
            local_id.clone(),
            Box::new(move |replica| {
                replica_tracker.spawn(Self::serve_replica(replica));
            }),
        ));

        rt.block_on(Self::seed_keyspace(&ks, config))?;
        info!(
            id = %local_id,
            endpoint = %config.network.endpoint(),
            replicas = resolver.local_replica_count(),
            "broker started"
        );

        rt.block_on(async {
            match signal::ctrl_c().await {
                Ok(()) => info!("received shutdown signal"),
                Err(err) => error!("failed to listen for shutdown signal: {}", err),
            }
        });

        rt.block_on(async {
            resolver.stop_serving_local_replicas().await;
            tracker.close();
            tracker.wait().await;
        });

        info!("broker shutdown complete");
        Ok(())
    }

    /// Serving loop of one local replica. The journal's append pipeline and
    /// fragment index run behind this seam; the loop exits once the
    /// replica's scope is cancelled.
    async fn serve_replica(replica: Arc<Replica>) {
        debug!(journal = replica.journal(), "replica serving loop started");
        replica.ctx().cancelled().await;
        debug!(journal = replica.journal(), "replica serving loop drained");
    }

    /// Publishes the `[cluster]` config section as the first keyspace
    /// update. This stands in for the coordination-store watch: assignments
    /// are read from static configuration the way they would otherwise be
    /// observed from the store.
    async fn seed_keyspace(ks: &KeySpace, config: &BrokerConfig) -> AppResult<()> {
        let header = EtcdHeader {
            cluster_id: config.cluster.cluster_id,
            member_id: 1,
            revision: 1,
            raft_term: 1,
        };

        let mut update = KeySpaceUpdate::new(header);
        for broker in &config.cluster.brokers {
            update = update.put_broker(BrokerSpec::new(
                broker.process_id(),
                broker.endpoint.clone(),
            ));
        }
        for journal in &config.cluster.journals {
            let spec = JournalSpec {
                name: journal.name.clone(),
                replication: journal.replication,
                labels: vec![],
            };
            let assignment = Assignment {
                members: journal.member_ids()?,
                primary: journal.primary,
            };
            update = update.put_journal(spec, assignment);
        }
        ks.apply(update).await
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::ProcessId;
    use crate::service::{BrokerSeed, ClusterConfig, GeneralConfig, JournalSeed, NetworkConfig};

    use super::*;

    #[tokio::test]
    async fn test_seed_keyspace() {
        let config = BrokerConfig {
            general: GeneralConfig {
                zone: "zone-a".to_string(),
                suffix: "broker-0".to_string(),
            },
            network: NetworkConfig {
                ip: "127.0.0.1".to_string(),
                port: 8080,
            },
            cluster: ClusterConfig {
                cluster_id: 17,
                brokers: vec![BrokerSeed {
                    zone: "zone-a".to_string(),
                    suffix: "broker-0".to_string(),
                    endpoint: "http://127.0.0.1:8080".to_string(),
                }],
                journals: vec![JournalSeed {
                    name: "a/journal".to_string(),
                    replication: 1,
                    members: vec!["zone-a/broker-0".to_string()],
                    primary: 0,
                }],
            },
        };

        let ks = KeySpace::new();
        Broker::seed_keyspace(&ks, &config).await.unwrap();

        let state = ks.read().await;
        assert_eq!(state.header.revision, 1);
        assert_eq!(state.header.cluster_id, 17);
        assert_eq!(
            state.broker_endpoint(&ProcessId::new("zone-a", "broker-0")),
            Some("http://127.0.0.1:8080")
        );
        let entry = &state.journals["a/journal"];
        assert_eq!(entry.spec.replication, 1);
        assert_eq!(entry.assignment.members, vec![ProcessId::new("zone-a", "broker-0")]);
        assert_eq!(entry.assignment.primary, 0);
    }
}
