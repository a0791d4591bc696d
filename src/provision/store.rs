use async_trait::async_trait;

use crate::s3::{BucketInfo, S3Client, S3Error};

/// The storage operations provisioning depends on
///
/// `S3Client` is the production implementation; tests substitute an
/// in-memory store.
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Endpoint shown to operators in connection errors
    fn endpoint(&self) -> &str;

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, S3Error>;

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, S3Error>;

    async fn create_bucket(&self, bucket: &str) -> Result<(), S3Error>;

    /// Replace the bucket's access policy with `policy` (JSON)
    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), S3Error>;
}

#[async_trait]
impl BucketStore for S3Client {
    fn endpoint(&self) -> &str {
        S3Client::endpoint(self)
    }

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, S3Error> {
        S3Client::list_buckets(self).await
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, S3Error> {
        S3Client::bucket_exists(self, bucket).await
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), S3Error> {
        S3Client::create_bucket(self, bucket).await
    }

    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), S3Error> {
        S3Client::set_bucket_policy(self, bucket, policy).await
    }
}
