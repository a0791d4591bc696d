//! S3 client module with AWS SigV4 signing
//!
//! This module provides:
//! - AWS Signature Version 4 signing for S3 requests
//! - Bucket administration calls (list, head, create, policy)
//! - ListBuckets and error document parsing

pub mod client;
pub mod signer;
pub mod types;

pub use client::{Result, S3Client, S3Error};
pub use signer::SigV4Signer;
pub use types::BucketInfo;
