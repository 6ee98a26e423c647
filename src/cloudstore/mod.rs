//! Cloud-storage endpoint registry.
//!
//! Partner endpoints are stored as JSON documents describing either an S3
//! bucket or an SFTP drop; this module decodes and validates them and
//! derives the URI and transfer properties file-movement jobs consume.

pub use endpoint::Endpoint;
pub use endpoint::Properties;
pub use endpoint::{
    AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, S3_GLOBAL_CANNED_ACL, S3_REGION, SFTP_KEY_PATH,
    SFTP_PASSWORD, SFTP_PORT, SFTP_USERNAME,
};

mod endpoint;
