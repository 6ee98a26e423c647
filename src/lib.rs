pub mod cloudstore;
pub mod keyspace;
pub mod protocol;
pub mod resolver;
pub mod service;

pub use service::{
    global_config,
    setup_local_tracing,
    setup_tracing,
    AppError,
    AppResult,
    Broker,
    BrokerConfig,
    LogMode,
    GLOBAL_CONFIG,
};

pub use keyspace::KeySpace;
pub use resolver::{ResolveArgs, Resolution, Resolver};
