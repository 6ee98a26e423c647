pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// general errors
    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("config file error: {0}")]
    ConfigFileError(#[from] config::ConfigError),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// resolution errors
    ///
    /// The local replica lifecycle has been terminated; callers must not
    /// attempt further local serving.
    #[error("resolver stopped")]
    ResolverStopped,

    /// The calling scope was cancelled during a keyspace freshness wait.
    #[error("resolve cancelled by caller")]
    ResolveCancelled,

    #[error("proxied request ProcessId doesn't match our own ({0} vs {1})")]
    ProxyWrongProcessId(String, String),

    #[error("proxied request Etcd ClusterId doesn't match our own ({0} vs {1})")]
    ProxyWrongClusterId(u64, u64),
}
