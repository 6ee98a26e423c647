use std::cmp::Ordering;
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::{AppError, AppResult};

/// ProcessId uniquely names a broker process as (zone, suffix).
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ProcessId {
    #[prost(string, tag = "1")]
    pub zone: String,
    #[prost(string, tag = "2")]
    pub suffix: String,
}

/// BrokerSpec describes a broker process and the endpoint it serves from.
/// Instances are authored by the broker itself, under its announcement key
/// in the coordination store.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BrokerSpec {
    #[prost(message, optional, tag = "1")]
    pub id: Option<ProcessId>,
    #[prost(string, tag = "2")]
    pub endpoint: String,
}

/// Label is a (name, value) pair attached to a JournalSpec.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct Label {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

/// JournalSpec describes a journal: its name, desired replication factor,
/// and opaque label metadata interpreted by clients.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct JournalSpec {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(int32, tag = "2")]
    pub replication: i32,
    #[prost(message, repeated, tag = "3")]
    pub labels: Vec<Label>,
}

/// Route is the externally-visible assignment of a journal: its ordered
/// member brokers, a parallel array of their endpoints, and the index of the
/// current primary (or -1 when no primary is elected).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Route {
    #[prost(message, repeated, tag = "1")]
    pub members: Vec<ProcessId>,
    #[prost(int32, tag = "2")]
    pub primary: i32,
    #[prost(string, repeated, tag = "3")]
    pub endpoints: Vec<String>,
}

/// EtcdHeader is the coordination-store response metadata at the revision
/// which authored a resolution.
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct EtcdHeader {
    #[prost(uint64, tag = "1")]
    pub cluster_id: u64,
    #[prost(uint64, tag = "2")]
    pub member_id: u64,
    #[prost(int64, tag = "3")]
    pub revision: i64,
    #[prost(uint64, tag = "4")]
    pub raft_term: u64,
}

/// Header is attached to every journal RPC request and response. Its
/// `process_id` names the broker accountable for the outcome: this broker
/// when it serves locally or authors an error, the selected peer when
/// proxying to the primary, or the zero ProcessId when any of several peers
/// would be acceptable.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Header {
    #[prost(message, optional, tag = "1")]
    pub process_id: Option<ProcessId>,
    #[prost(message, optional, tag = "2")]
    pub route: Option<Route>,
    #[prost(message, optional, tag = "3")]
    pub etcd: Option<EtcdHeader>,
}

/// Status is the routing outcome of a journal RPC. Values are fixed by the
/// cluster protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Status {
    Ok = 0,
    /// The named journal does not exist.
    JournalNotFound = 1,
    /// The journal has no elected primary, and the caller required one.
    NoJournalPrimaryBroker = 2,
    /// This broker is a member but not primary, and the caller required the
    /// primary without allowing a proxy.
    NotJournalPrimaryBroker = 3,
    /// This broker is not a member, and the caller disallowed proxying.
    NotJournalBroker = 4,
    /// The journal's assignment has fewer members than its replication.
    InsufficientJournalBrokers = 5,
}

impl ProcessId {
    /// Placeholder identity used when this broker's own announcement key is
    /// absent from the coordination store. Part of the wire contract.
    pub fn missing_from_etcd() -> Self {
        ProcessId {
            zone: "local-BrokerSpec".to_string(),
            suffix: "missing-from-Etcd".to_string(),
        }
    }

    pub fn new(zone: impl Into<String>, suffix: impl Into<String>) -> Self {
        ProcessId {
            zone: zone.into(),
            suffix: suffix.into(),
        }
    }

    /// A zero ProcessId names no process in particular.
    pub fn is_zero(&self) -> bool {
        self.zone.is_empty() && self.suffix.is_empty()
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.zone.is_empty() {
            return Err(AppError::InvalidValue(format!(
                "process id zone is empty (suffix: {})",
                self.suffix
            )));
        }
        if self.suffix.is_empty() {
            return Err(AppError::InvalidValue(format!(
                "process id suffix is empty (zone: {})",
                self.zone
            )));
        }
        Ok(())
    }
}

impl Ord for ProcessId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.zone
            .cmp(&other.zone)
            .then_with(|| self.suffix.cmp(&other.suffix))
    }
}

impl PartialOrd for ProcessId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for ProcessId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "zone:{:?} suffix:{:?}", self.zone, self.suffix)
    }
}

impl BrokerSpec {
    pub fn new(id: ProcessId, endpoint: impl Into<String>) -> Self {
        BrokerSpec {
            id: Some(id),
            endpoint: endpoint.into(),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        let id = self
            .id
            .as_ref()
            .ok_or_else(|| AppError::InvalidValue("broker spec has no id".to_string()))?;
        id.validate()?;
        if self.endpoint.is_empty() {
            return Err(AppError::InvalidValue(format!(
                "broker spec has no endpoint ({})",
                id
            )));
        }
        Ok(())
    }
}

impl JournalSpec {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.is_empty() {
            return Err(AppError::InvalidValue("journal name is empty".to_string()));
        }
        if self.replication < 1 {
            return Err(AppError::InvalidValue(format!(
                "journal {} replication {} < 1",
                self.name, self.replication
            )));
        }
        Ok(())
    }
}

impl Route {
    /// An empty route with no elected primary, attached to resolutions for
    /// journals which do not exist or have no assigned brokers.
    pub fn empty() -> Self {
        Route {
            members: Vec::new(),
            primary: -1,
            endpoints: Vec::new(),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.endpoints.len() != self.members.len() {
            return Err(AppError::InvalidValue(format!(
                "route has {} endpoints for {} members",
                self.endpoints.len(),
                self.members.len()
            )));
        }
        if self.primary < -1 || self.primary as i64 >= self.members.len() as i64 {
            return Err(AppError::InvalidValue(format!(
                "route primary {} is outside [-1, {})",
                self.primary,
                self.members.len()
            )));
        }
        Ok(())
    }

    /// Returns the member index of |id|, if present.
    pub fn member_index(&self, id: &ProcessId) -> Option<usize> {
        self.members.iter().position(|m| m == id)
    }

    /// Returns the primary member, if one is elected.
    pub fn primary_member(&self) -> Option<&ProcessId> {
        if self.primary < 0 {
            None
        } else {
            self.members.get(self.primary as usize)
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use prost::Message;

    use super::*;

    #[test]
    fn test_process_id_encoding_is_pinned() {
        let id = ProcessId::new("a", "b");
        let mut buf = BytesMut::new();
        id.encode(&mut buf).unwrap();
        // Field 1 (zone) and field 2 (suffix), length-delimited.
        assert_eq!(buf.as_ref(), [0x0a, 0x01, b'a', 0x12, 0x01, b'b']);

        let decoded = ProcessId::decode(buf.freeze()).unwrap();
        assert_eq!(decoded, id);
    }

    #[test]
    fn test_status_values_are_pinned() {
        assert_eq!(Status::Ok as i32, 0);
        assert_eq!(Status::JournalNotFound as i32, 1);
        assert_eq!(Status::NoJournalPrimaryBroker as i32, 2);
        assert_eq!(Status::NotJournalPrimaryBroker as i32, 3);
        assert_eq!(Status::NotJournalBroker as i32, 4);
        assert_eq!(Status::InsufficientJournalBrokers as i32, 5);
    }

    #[test]
    fn test_header_round_trip() {
        let hdr = Header {
            process_id: Some(ProcessId::new("us-east", "broker-0")),
            route: Some(Route {
                members: vec![
                    ProcessId::new("us-east", "broker-0"),
                    ProcessId::new("us-west", "broker-1"),
                ],
                primary: 1,
                endpoints: vec![
                    "http://10.0.0.1:8080".to_string(),
                    "http://10.0.0.2:8080".to_string(),
                ],
            }),
            etcd: Some(EtcdHeader {
                cluster_id: 12,
                member_id: 34,
                revision: 56,
                raft_term: 78,
            }),
        };
        let mut buf = BytesMut::new();
        hdr.encode(&mut buf).unwrap();
        let decoded = Header::decode(buf.freeze()).unwrap();
        assert_eq!(decoded, hdr);
    }

    #[test]
    fn test_process_id_display_and_sentinel() {
        let id = ProcessId::new("local", "broker");
        assert_eq!(id.to_string(), r#"zone:"local" suffix:"broker""#);

        let sentinel = ProcessId::missing_from_etcd();
        assert_eq!(sentinel.zone, "local-BrokerSpec");
        assert_eq!(sentinel.suffix, "missing-from-Etcd");
        assert!(!sentinel.is_zero());
        assert!(ProcessId::default().is_zero());
    }

    #[test]
    fn test_route_validation() {
        let mut route = Route {
            members: vec![ProcessId::new("a", "1"), ProcessId::new("b", "2")],
            primary: 1,
            endpoints: vec!["http://a:80".to_string(), "http://b:80".to_string()],
        };
        assert!(route.validate().is_ok());
        assert_eq!(route.primary_member(), Some(&ProcessId::new("b", "2")));

        route.primary = 2;
        assert!(route.validate().is_err());
        route.primary = -2;
        assert!(route.validate().is_err());
        route.primary = -1;
        assert!(route.validate().is_ok());
        assert_eq!(route.primary_member(), None);

        route.endpoints.pop();
        assert!(route.validate().is_err());

        assert!(Route::empty().validate().is_ok());
    }

    #[test]
    fn test_spec_validation() {
        assert!(BrokerSpec::new(ProcessId::new("a", "1"), "http://a:80")
            .validate()
            .is_ok());
        assert!(BrokerSpec::new(ProcessId::new("a", "1"), "")
            .validate()
            .is_err());
        assert!(BrokerSpec {
            id: None,
            endpoint: "http://a:80".to_string()
        }
        .validate()
        .is_err());

        let spec = JournalSpec {
            name: "a/journal".to_string(),
            replication: 2,
            labels: vec![],
        };
        assert!(spec.validate().is_ok());
        assert!(JournalSpec {
            replication: 0,
            ..spec.clone()
        }
        .validate()
        .is_err());
        assert!(JournalSpec {
            name: String::new(),
            ..spec
        }
        .validate()
        .is_err());
    }
}
