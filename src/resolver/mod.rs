// Copyright 2025 jonefeewang@gmail.com
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Journal resolution.
//!
//! Every journal RPC is resolved before it is served: given the journal
//! name and the caller's preferences, the [`Resolver`] decides against the
//! current keyspace snapshot whether this broker serves the request itself,
//! names a peer to proxy to, or fails with a status describing the cluster
//! state the client must react to. The replica registry it consults is kept
//! in lockstep with keyspace applies, so a resolution never observes an
//! assignment without its local replica or vice versa.

pub use replica::{Replica, ReplicaSpawner};
pub use resolve::{Resolution, ResolveArgs, Resolver};
pub use route::build_route;

mod replica;
mod resolve;
mod route;
