//! Bucket provisioning
//!
//! Ensures each configured bucket exists and carries the public-read
//! policy. Work is strictly sequential: the connection check runs first and
//! is fatal, after which every bucket is processed in order and a failure on
//! one bucket never stops the rest.
//!
//! ```text
//! connect ──► for each bucket: ensure_bucket ──► apply_public_policy
//!                                    └── failure skips the policy step
//! ```

pub mod naming;
pub mod policy;
pub mod report;
pub mod store;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::s3::{S3Client, S3Error};

pub use naming::validate_bucket_name;
pub use policy::PolicyDocument;
pub use report::{BucketOutcome, ProvisionReport, EXIT_FAILURE, EXIT_SUCCESS};
pub use store::BucketStore;

/// Provisioning errors
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// The store could not be reached or rejected the credentials. Fatal.
    #[error("failed to connect to {endpoint}: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: S3Error,
    },

    #[error("invalid bucket name '{name}': {reason}")]
    InvalidBucketName { name: String, reason: &'static str },

    #[error("bucket '{name}': {source}")]
    Bucket {
        name: String,
        #[source]
        source: S3Error,
    },

    #[error("failed to encode policy for '{name}': {source}")]
    Policy {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProvisionError {
    /// The underlying cause without the bucket name prefix, for per-bucket report lines
    fn cause(&self) -> String {
        match self {
            ProvisionError::Bucket { source, .. } => source.to_string(),
            ProvisionError::InvalidBucketName { reason, .. } => format!("invalid name: {}", reason),
            other => other.to_string(),
        }
    }
}

/// How `ensure_bucket` found the bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketState {
    Existing,
    Created,
}

/// Sequential provisioner over a [`BucketStore`]
pub struct Provisioner<S> {
    store: S,
}

impl<S: BucketStore> Provisioner<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Liveness check: list buckets. Returns how many the credentials can see.
    pub async fn connect(&self) -> Result<usize, ProvisionError> {
        let buckets = self
            .store
            .list_buckets()
            .await
            .map_err(|source| ProvisionError::Connection {
                endpoint: self.store.endpoint().to_string(),
                source,
            })?;

        info!(endpoint = %self.store.endpoint(), visible_buckets = buckets.len(), "connected");
        Ok(buckets.len())
    }

    async fn try_ensure_bucket(&self, name: &str) -> Result<BucketState, ProvisionError> {
        validate_bucket_name(name).map_err(|reason| ProvisionError::InvalidBucketName {
            name: name.to_string(),
            reason,
        })?;

        let bucket_err = |source: S3Error| ProvisionError::Bucket {
            name: name.to_string(),
            source,
        };

        if self.store.bucket_exists(name).await.map_err(bucket_err)? {
            return Ok(BucketState::Existing);
        }

        self.store.create_bucket(name).await.map_err(bucket_err)?;
        Ok(BucketState::Created)
    }

    /// Make sure `name` exists, creating it when absent.
    ///
    /// An existing bucket counts as success. Failures are reported and
    /// turned into `false`.
    pub async fn ensure_bucket(&self, name: &str) -> bool {
        match self.try_ensure_bucket(name).await {
            Ok(BucketState::Existing) => {
                println!("  ✓ Bucket '{}' already exists", name);
                debug!(bucket = %name, "bucket exists");
                true
            }
            Ok(BucketState::Created) => {
                println!("  ✓ Bucket '{}' created", name);
                info!(bucket = %name, "bucket created");
                true
            }
            Err(e) => {
                println!("  ✗ Failed to create bucket '{}': {}", name, e.cause());
                warn!(bucket = %name, error = %e, "bucket not ready");
                false
            }
        }
    }

    async fn try_apply_public_policy(&self, name: &str) -> Result<(), ProvisionError> {
        let policy = PolicyDocument::public_read(name)
            .to_json()
            .map_err(|source| ProvisionError::Policy {
                name: name.to_string(),
                source,
            })?;

        // Any existing policy is replaced, including one edited by hand
        self.store
            .set_bucket_policy(name, &policy)
            .await
            .map_err(|source| ProvisionError::Bucket {
                name: name.to_string(),
                source,
            })
    }

    /// Attach the public-read policy to `name`. Failures are reported and
    /// turned into `false`.
    pub async fn apply_public_policy(&self, name: &str) -> bool {
        match self.try_apply_public_policy(name).await {
            Ok(()) => {
                println!("  ✓ Bucket '{}' set to public", name);
                info!(bucket = %name, "public policy applied");
                true
            }
            Err(e) => {
                println!("  ✗ Failed to set public policy for '{}': {}", name, e.cause());
                warn!(bucket = %name, error = %e, "public policy not applied");
                false
            }
        }
    }

    /// Ensure the bucket, then make it public. The policy step is skipped
    /// when the bucket is not ready.
    pub async fn provision_bucket(&self, name: &str) -> BucketOutcome {
        println!("[{}]", name);

        let ready = self.ensure_bucket(name).await;
        let public = ready && self.apply_public_policy(name).await;

        println!();

        BucketOutcome {
            name: name.to_string(),
            ready,
            public,
        }
    }

    /// Check connectivity, then provision every bucket in order.
    ///
    /// Only a failed connection check is returned as an error; per-bucket
    /// failures are recorded in the report.
    pub async fn run(&self, buckets: &[String]) -> Result<ProvisionReport, ProvisionError> {
        self.connect().await?;
        println!("✓ Connected to MinIO successfully!\n");

        println!("Creating buckets and setting public access...\n");

        let mut report = ProvisionReport::new();
        for name in buckets {
            report.push(self.provision_bucket(name).await);
        }

        info!(
            succeeded = report.succeeded(),
            total = report.total(),
            "provisioning finished"
        );

        Ok(report)
    }
}

/// Build the S3 client described by `config`. No request is sent.
pub fn build_client(config: &Config) -> Result<S3Client, ProvisionError> {
    let endpoint = config.endpoint();

    S3Client::new(
        &endpoint,
        config.access_key.clone(),
        config.secret_key.clone(),
        Some(config.region.clone()),
        config.insecure_tls,
    )
    .map_err(|source| ProvisionError::Connection { endpoint, source })
}

/// Build the client and verify it can reach the store
pub async fn connect(config: &Config) -> Result<Provisioner<S3Client>, ProvisionError> {
    let provisioner = Provisioner::new(build_client(config)?);
    provisioner.connect().await?;
    Ok(provisioner)
}

fn print_connection_failure(config: &Config, err: &ProvisionError) {
    match err {
        ProvisionError::Connection { source, .. } => {
            println!("✗ Failed to connect to MinIO: {}", source)
        }
        other => println!("✗ Failed to connect to MinIO: {}", other),
    }
    println!("\nPlease check:");
    println!("  - MinIO is running at {}", config.address());
    println!("  - Access key and secret key are correct");
}

/// Provision `config.buckets` through an already constructed provisioner,
/// printing the report. Returns the process exit code.
pub async fn execute<S: BucketStore>(provisioner: &Provisioner<S>, config: &Config) -> u8 {
    match provisioner.run(&config.buckets).await {
        Ok(report) => {
            report.print_summary(config);
            report.exit_code()
        }
        Err(e) => {
            warn!(error = %e, "connection check failed");
            print_connection_failure(config, &e);
            EXIT_FAILURE
        }
    }
}

/// Run a full provisioning pass against the store described by `config`.
/// Returns the process exit code.
pub async fn run(config: &Config) -> u8 {
    println!("{}", report::rule());
    println!("MinIO Setup");
    println!("{}", report::rule());
    println!();

    println!("Connecting to MinIO at {}...", config.address());
    println!("  Secure: {}", config.secure);

    let client = match build_client(config) {
        Ok(client) => client,
        Err(e) => {
            print_connection_failure(config, &e);
            return EXIT_FAILURE;
        }
    };

    execute(&Provisioner::new(client), config).await
}
