extern crate config as rs_config;

use std::path::Path;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::protocol::ProcessId;
use crate::{AppError, AppResult};

pub static GLOBAL_CONFIG: OnceCell<BrokerConfig> = OnceCell::new();

pub fn global_config() -> &'static BrokerConfig {
    GLOBAL_CONFIG
        .get()
        .expect("broker config is not initialized")
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct GeneralConfig {
    /// Zone of this broker's process id.
    pub zone: String,
    /// Suffix of this broker's process id.
    pub suffix: String,
}

impl GeneralConfig {
    pub fn process_id(&self) -> ProcessId {
        ProcessId::new(&self.zone, &self.suffix)
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct NetworkConfig {
    pub ip: String,
    pub port: u16,
}

impl NetworkConfig {
    /// The endpoint this broker advertises to the cluster.
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", self.ip, self.port)
    }
}

/// Seed view of the cluster, published as the first keyspace update in
/// place of a live coordination-store watch.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct ClusterConfig {
    pub cluster_id: u64,
    #[serde(default)]
    pub brokers: Vec<BrokerSeed>,
    #[serde(default)]
    pub journals: Vec<JournalSeed>,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct BrokerSeed {
    pub zone: String,
    pub suffix: String,
    pub endpoint: String,
}

impl BrokerSeed {
    pub fn process_id(&self) -> ProcessId {
        ProcessId::new(&self.zone, &self.suffix)
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct JournalSeed {
    pub name: String,
    pub replication: i32,
    /// Assigned members, each written as "zone/suffix".
    pub members: Vec<String>,
    /// Index of the primary within `members`, or -1 when none is elected.
    pub primary: i32,
}

impl JournalSeed {
    pub fn member_ids(&self) -> AppResult<Vec<ProcessId>> {
        self.members
            .iter()
            .map(|member| {
                member
                    .split_once('/')
                    .map(|(zone, suffix)| ProcessId::new(zone, suffix))
                    .ok_or_else(|| {
                        AppError::InvalidValue(format!(
                            "journal {} member {:?} is not of the form zone/suffix",
                            self.name, member
                        ))
                    })
            })
            .collect()
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct BrokerConfig {
    pub general: GeneralConfig,
    pub network: NetworkConfig,
    pub cluster: ClusterConfig,
}

impl BrokerConfig {
    pub fn set_up_config<P: AsRef<Path>>(path: P) -> AppResult<BrokerConfig> {
        let path_str = path.as_ref().to_str().ok_or_else(|| {
            AppError::InvalidValue("config file path is not valid utf-8".to_string())
        })?;

        let raw = rs_config::Config::builder()
            .add_source(rs_config::File::with_name(path_str))
            .build()?;
        let broker_config: BrokerConfig = raw.try_deserialize()?;

        broker_config.validate()?;
        Ok(broker_config)
    }

    fn validate(&self) -> AppResult<()> {
        self.general.process_id().validate()?;
        if self.network.ip.is_empty() || self.network.port == 0 {
            return Err(AppError::InvalidValue(format!(
                "network address {}:{} is not usable",
                self.network.ip, self.network.port
            )));
        }
        for journal in &self.cluster.journals {
            let members = journal.member_ids()?;
            if journal.primary < -1 || journal.primary as i64 >= members.len() as i64 {
                return Err(AppError::InvalidValue(format!(
                    "journal {} primary {} is outside [-1, {})",
                    journal.name,
                    journal.primary,
                    members.len()
                )));
            }
        }
        Ok(())
    }
}
