//! Provisioner behavior against an in-memory bucket store

use async_trait::async_trait;
use hyper::StatusCode;
use s3provision::provision::{self, PolicyDocument, EXIT_FAILURE, EXIT_SUCCESS};
use s3provision::s3::{BucketInfo, S3Error};
use s3provision::{BucketStore, Config, Provisioner};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

/// Bucket store backed by a map of bucket name -> policy
#[derive(Default)]
struct MemoryStore {
    buckets: Mutex<BTreeMap<String, Option<String>>>,
    unreachable: bool,
    fail_create: HashSet<String>,
    fail_policy: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MemoryStore {
    fn with_buckets(names: &[&str]) -> Self {
        let store = Self::default();
        {
            let mut buckets = store.buckets.lock().unwrap();
            for name in names {
                buckets.insert(name.to_string(), None);
            }
        }
        store
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn policy(&self, name: &str) -> Option<String> {
        self.buckets.lock().unwrap().get(name).cloned().flatten()
    }

    fn snapshot(&self) -> BTreeMap<String, Option<String>> {
        self.buckets.lock().unwrap().clone()
    }
}

fn rejected(message: &str) -> S3Error {
    S3Error::S3Response {
        status: StatusCode::CONFLICT,
        message: message.to_string(),
    }
}

#[async_trait]
impl BucketStore for MemoryStore {
    fn endpoint(&self) -> &str {
        "memory://test"
    }

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, S3Error> {
        self.record("list".to_string());
        if self.unreachable {
            return Err(S3Error::Transport("connection refused".to_string()));
        }
        Ok(self
            .buckets
            .lock()
            .unwrap()
            .keys()
            .map(|name| BucketInfo::new(name.clone()))
            .collect())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, S3Error> {
        self.record(format!("exists {}", bucket));
        Ok(self.buckets.lock().unwrap().contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), S3Error> {
        self.record(format!("create {}", bucket));
        if self.fail_create.contains(bucket) {
            return Err(rejected("BucketAlreadyExists"));
        }
        self.buckets.lock().unwrap().insert(bucket.to_string(), None);
        Ok(())
    }

    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), S3Error> {
        self.record(format!("policy {}", bucket));
        if self.fail_policy.contains(bucket) {
            return Err(rejected("AccessDenied"));
        }
        self.buckets
            .lock()
            .unwrap()
            .insert(bucket.to_string(), Some(policy.to_string()));
        Ok(())
    }
}

fn config_with(buckets: &[&str]) -> Config {
    Config {
        buckets: buckets.iter().map(|b| b.to_string()).collect(),
        ..Config::new()
    }
}

fn public_policy(bucket: &str) -> String {
    PolicyDocument::public_read(bucket).to_json().unwrap()
}

#[tokio::test]
async fn test_absent_buckets_are_created_and_made_public() {
    let config = config_with(&["documents", "templates"]);
    let provisioner = Provisioner::new(MemoryStore::default());

    let report = provisioner.run(&config.buckets).await.unwrap();

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.total(), 2);
    assert_eq!(report.tally_line(), "Setup complete: 2/2 buckets configured");
    assert_eq!(report.exit_code(), EXIT_SUCCESS);

    let store = provisioner.store();
    assert_eq!(store.policy("documents"), Some(public_policy("documents")));
    assert_eq!(store.policy("templates"), Some(public_policy("templates")));
    assert_eq!(
        store.calls(),
        vec![
            "list",
            "exists documents",
            "create documents",
            "policy documents",
            "exists templates",
            "create templates",
            "policy templates",
        ]
    );
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let config = config_with(&["documents", "templates"]);
    let provisioner = Provisioner::new(MemoryStore::default());

    assert_eq!(provision::execute(&provisioner, &config).await, EXIT_SUCCESS);
    let after_first = provisioner.store().snapshot();

    assert_eq!(provision::execute(&provisioner, &config).await, EXIT_SUCCESS);
    assert_eq!(provisioner.store().snapshot(), after_first);

    // Second pass only checks existence and rewrites policies
    let calls = provisioner.store().calls();
    assert_eq!(calls.iter().filter(|call| call.starts_with("create")).count(), 2);
    assert_eq!(calls.iter().filter(|call| call.starts_with("policy")).count(), 4);
}

#[tokio::test]
async fn test_existing_bucket_succeeds_and_failed_create_is_counted() {
    let mut store = MemoryStore::with_buckets(&["documents"]);
    store.fail_create.insert("templates".to_string());
    let config = config_with(&["documents", "templates"]);
    let provisioner = Provisioner::new(store);

    let report = provisioner.run(&config.buckets).await.unwrap();

    assert_eq!(report.tally_line(), "Setup complete: 1/2 buckets configured");
    assert_eq!(report.exit_code(), EXIT_FAILURE);
    assert!(report.outcomes()[0].is_success());
    assert!(!report.outcomes()[1].ready);
    assert!(!report.outcomes()[1].public);

    let calls = provisioner.store().calls();
    assert!(!calls.contains(&"create documents".to_string()));
    // No policy attempt on a bucket that could not be created
    assert!(!calls.contains(&"policy templates".to_string()));
    assert_eq!(provisioner.store().policy("documents"), Some(public_policy("documents")));
}

#[tokio::test]
async fn test_policy_failure_does_not_stop_remaining_buckets() {
    let mut store = MemoryStore::default();
    store.fail_policy.insert("templates".to_string());
    let config = config_with(&["documents", "templates", "attachments", "backups"]);
    let provisioner = Provisioner::new(store);

    let report = provisioner.run(&config.buckets).await.unwrap();

    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.total(), 4);
    assert_eq!(report.failed().collect::<Vec<_>>(), vec!["templates"]);
    assert!(report.outcomes()[1].ready);
    assert_eq!(report.exit_code(), EXIT_FAILURE);
    assert!(provisioner.store().policy("backups").is_some());
}

#[tokio::test]
async fn test_unreachable_store_attempts_no_bucket_operations() {
    let store = MemoryStore {
        unreachable: true,
        ..MemoryStore::default()
    };
    let config = config_with(&["documents", "templates"]);
    let provisioner = Provisioner::new(store);

    let err = provisioner.run(&config.buckets).await.unwrap_err();
    assert!(matches!(err, provision::ProvisionError::Connection { .. }));
    assert_eq!(provisioner.store().calls(), vec!["list"]);

    assert_eq!(provision::execute(&provisioner, &config).await, EXIT_FAILURE);
    assert_eq!(provisioner.store().calls(), vec!["list", "list"]);
}

#[tokio::test]
async fn test_invalid_bucket_name_fails_without_remote_call() {
    let config = config_with(&["Bad_Name", "documents"]);
    let provisioner = Provisioner::new(MemoryStore::default());

    let report = provisioner.run(&config.buckets).await.unwrap();

    assert_eq!(report.tally_line(), "Setup complete: 1/2 buckets configured");
    assert!(!provisioner
        .store()
        .calls()
        .iter()
        .any(|call| call.ends_with("Bad_Name")));
}

#[tokio::test]
async fn test_existing_custom_policy_is_overwritten() {
    let store = MemoryStore::with_buckets(&["documents"]);
    store
        .buckets
        .lock()
        .unwrap()
        .insert("documents".to_string(), Some(r#"{"Version":"2012-10-17","Statement":[]}"#.to_string()));
    let provisioner = Provisioner::new(store);

    assert!(provisioner.apply_public_policy("documents").await);
    assert_eq!(provisioner.store().policy("documents"), Some(public_policy("documents")));
}

#[tokio::test]
async fn test_ensure_bucket_reports_remote_failure_as_false() {
    let mut store = MemoryStore::default();
    store.fail_create.insert("templates".to_string());
    let provisioner = Provisioner::new(store);

    assert!(!provisioner.ensure_bucket("templates").await);
    assert!(provisioner.ensure_bucket("documents").await);
    // Second call finds the bucket and does not recreate it
    assert!(provisioner.ensure_bucket("documents").await);
    assert_eq!(
        provisioner
            .store()
            .calls()
            .iter()
            .filter(|call| *call == "create documents")
            .count(),
        1
    );
}
