//! s3provision - one-shot MinIO bucket provisioning
//!
//! Creates the configured buckets when missing and attaches a public-read
//! policy to each.

pub mod config;
pub mod provision;
pub mod s3;

pub use config::Config;
pub use provision::{BucketStore, ProvisionReport, Provisioner};
