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

//! Cluster wire protocol.
//!
//! The types in this module are shared with every other process in the
//! cluster: routing headers attached to RPC requests and responses, broker
//! and journal specifications stored in the coordination store, and the
//! status codes clients dispatch on. Their protobuf encoding is fixed by the
//! cluster protocol definition, so field tags and enum values here must
//! never change.

pub use types::Header;
pub use types::Label;
pub use types::Route;
pub use types::Status;
pub use types::{BrokerSpec, EtcdHeader, JournalSpec, ProcessId};

mod types;
