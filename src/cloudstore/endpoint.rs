use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

pub const AWS_ACCESS_KEY_ID: &str = "AWSAccessKeyID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWSSecretAccessKey";
pub const S3_GLOBAL_CANNED_ACL: &str = "S3GlobalCannedACL";
pub const S3_REGION: &str = "S3Region";
pub const SFTP_USERNAME: &str = "SFTPUsername";
pub const SFTP_PASSWORD: &str = "SFTPPassword";
pub const SFTP_KEY_PATH: &str = "SFTPKeyPath";
pub const SFTP_PORT: &str = "SFTPPort";

/// A partner cloud-storage endpoint: either an S3 bucket or an SFTP drop.
/// Exactly one family of fields is expected to be populated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoint {
    // AWS
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub s3_global_canned_acl: String,
    pub s3_region: String,
    pub s3_bucket: String,
    pub s3_subfolder: String,

    // SFTP
    pub sftp_hostname: String,
    pub sftp_port: String,
    pub sftp_username: String,
    pub sftp_password: String,
    pub sftp_directory: String,
}

impl Endpoint {
    /// Decodes an endpoint from its stored JSON document.
    pub fn from_json(value: &str) -> AppResult<Endpoint> {
        Ok(serde_json::from_str(value)?)
    }

    /// Whether the config describes an S3 endpoint.
    pub fn is_s3(&self) -> bool {
        !self.aws_access_key_id.is_empty()
    }

    /// Whether the config describes an SFTP endpoint.
    pub fn is_sftp(&self) -> bool {
        !self.sftp_hostname.is_empty()
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.is_sftp() {
            if self.sftp_port.is_empty() {
                return Err(AppError::InvalidValue("must specify sftp port".to_string()));
            } else if self.sftp_username.is_empty() {
                return Err(AppError::InvalidValue(
                    "must specify sftp username".to_string(),
                ));
            } else if self.sftp_password.is_empty() {
                return Err(AppError::InvalidValue(
                    "must specify sftp password".to_string(),
                ));
            } else if self.sftp_directory.is_empty() {
                return Err(AppError::InvalidValue(
                    "must specify sftp directory".to_string(),
                ));
            }
        } else if self.is_s3() {
            if self.aws_secret_access_key.is_empty() {
                return Err(AppError::InvalidValue(
                    "must specify aws secret access key".to_string(),
                ));
            } else if self.s3_bucket.is_empty() {
                return Err(AppError::InvalidValue("must specify s3 bucket".to_string()));
            }
        }
        Ok(())
    }

    /// The directory beyond the endpoint root files are delivered under.
    pub fn subfolder(&self) -> AppResult<&str> {
        if self.is_s3() {
            Ok(&self.s3_subfolder)
        } else if self.is_sftp() {
            Ok(&self.sftp_directory)
        } else {
            Err(AppError::InvalidValue(
                "unable to determine subfolder: endpoint is neither S3 nor SFTP".to_string(),
            ))
        }
    }

    /// A fully qualified URI for the endpoint.
    pub fn uri(&self) -> AppResult<String> {
        if self.is_s3() {
            Ok(format!("s3://{}/{}", self.s3_bucket, self.s3_subfolder))
        } else if self.is_sftp() {
            Ok(format!(
                "sftp://{}/{}",
                self.sftp_hostname, self.sftp_directory
            ))
        } else {
            Err(AppError::InvalidValue(
                "endpoint type not supported: neither S3 nor SFTP is configured".to_string(),
            ))
        }
    }

    /// Transfer properties for the endpoint. `key_path`, when non-empty, is
    /// attached to SFTP authentication.
    pub fn properties(&self, key_path: &str) -> AppResult<Properties> {
        if self.is_s3() {
            Ok(Properties::from([
                (AWS_ACCESS_KEY_ID, self.aws_access_key_id.as_str()),
                (AWS_SECRET_ACCESS_KEY, self.aws_secret_access_key.as_str()),
                (S3_GLOBAL_CANNED_ACL, self.s3_global_canned_acl.as_str()),
                (S3_REGION, self.s3_region.as_str()),
            ]))
        } else if self.is_sftp() {
            Ok(Properties::from([
                (SFTP_USERNAME, self.sftp_username.as_str()),
                (SFTP_PASSWORD, self.sftp_password.as_str()),
                (SFTP_KEY_PATH, key_path),
                (SFTP_PORT, self.sftp_port.as_str()),
            ]))
        } else {
            Err(AppError::InvalidValue(
                "endpoint type not supported: neither S3 nor SFTP is configured".to_string(),
            ))
        }
    }
}

/// String-keyed transfer properties of a cloud endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties(HashMap<String, String>);

impl Properties {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Reads a JSON properties document from a local file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Properties> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Properties {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Properties(
            pairs
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }
}
