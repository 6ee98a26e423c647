use crate::keyspace::{Assignment, KeySpaceState};
use crate::protocol::Route;

/// Builds the externally-visible [`Route`] of an assignment, resolving each
/// member's endpoint at the snapshot revision. A member whose BrokerSpec is
/// absent from the keyspace keeps its slot with an empty endpoint, so
/// clients observe the misalignment instead of a silently shortened route.
pub fn build_route(assignment: &Assignment, state: &KeySpaceState) -> Route {
    let endpoints = assignment
        .members
        .iter()
        .map(|member| {
            state
                .broker_endpoint(member)
                .unwrap_or_default()
                .to_string()
        })
        .collect();

    Route {
        members: assignment.members.clone(),
        primary: assignment.primary,
        endpoints,
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::{BrokerSpec, ProcessId};

    use super::*;

    #[test]
    fn test_build_route_attaches_endpoints() {
        let mut state = KeySpaceState::default();
        let a = ProcessId::new("zone-a", "broker");
        let b = ProcessId::new("zone-b", "broker");
        state
            .brokers
            .insert(a.clone(), BrokerSpec::new(a.clone(), "http://a:8080"));

        // |b| has no BrokerSpec at this revision: its slot is kept, with an
        // empty endpoint.
        let route = build_route(
            &Assignment {
                members: vec![a.clone(), b.clone()],
                primary: 0,
            },
            &state,
        );
        assert_eq!(route.members, vec![a, b]);
        assert_eq!(route.endpoints, vec!["http://a:8080".to_string(), String::new()]);
        assert_eq!(route.primary, 0);
        assert!(route.validate().is_ok());
    }

    #[test]
    fn test_build_route_empty_assignment() {
        let route = build_route(&Assignment::default(), &KeySpaceState::default());
        assert!(route.members.is_empty());
        assert!(route.endpoints.is_empty());
        assert_eq!(route.primary, -1);
    }
}
