//! S3 client for bucket-level administration
//!
//! Covers the calls needed to provision buckets on MinIO: ListBuckets,
//! HeadBucket, CreateBucket and Get/PutBucketPolicy. Requests are signed
//! with SigV4 and sent once; there is no retry layer.

use crate::s3::signer::SigV4Signer;
use crate::s3::types::{parse_error_document, parse_list_buckets, BucketInfo};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::TokioExecutor;
use native_tls::TlsConnector;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// S3 client errors
#[derive(Error, Debug)]
pub enum S3Error {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::http::Error),

    #[error("Hyper error: {0}")]
    Hyper(#[from] hyper::Error),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("TLS setup error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("XML parse error: {0}")]
    XmlParse(String),

    #[error("S3 error: {status} - {message}")]
    S3Response { status: StatusCode, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<quick_xml::Error> for S3Error {
    fn from(err: quick_xml::Error) -> Self {
        S3Error::XmlParse(err.to_string())
    }
}

impl From<hyper_util::client::legacy::Error> for S3Error {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        // The top-level message is generic ("client error (Connect)"); the
        // cause chain carries e.g. "Connection refused"
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        S3Error::Transport(message)
    }
}

impl S3Error {
    /// Build an error from a non-success response, preferring the
    /// `Code: Message` pair of an S3 error document over the raw body.
    fn from_response(status: StatusCode, body: &[u8]) -> Self {
        let message = match parse_error_document(body) {
            Some((code, message)) if message.is_empty() => code,
            Some((code, message)) => format!("{}: {}", code, message),
            None if body.is_empty() => status
                .canonical_reason()
                .unwrap_or("no response body")
                .to_string(),
            None => String::from_utf8_lossy(body).trim().to_string(),
        };
        S3Error::S3Response { status, message }
    }

    /// HTTP status of a server-side rejection, if this is one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            S3Error::S3Response { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, S3Error>;

/// S3 client bound to a single endpoint
///
/// Clone is cheap - the underlying HTTP client uses Arc internally.
#[derive(Clone)]
pub struct S3Client {
    client: HyperClient<HttpsConnector<HttpConnector>, Full<Bytes>>,
    signer: SigV4Signer,
    /// Base URL without trailing slash, e.g. `http://localhost:9000`
    endpoint: String,
}

impl std::fmt::Debug for S3Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Client")
            .field("endpoint", &self.endpoint)
            .field("signer", &self.signer)
            .finish()
    }
}

impl S3Client {
    /// Create a client for `endpoint` (`http://host:port` or `https://host:port`)
    pub fn new(
        endpoint: &str,
        access_key: String,
        secret_key: String,
        region: Option<String>,
        insecure_tls: bool,
    ) -> Result<Self> {
        let mut http = HttpConnector::new();
        http.set_nodelay(true);
        http.enforce_http(false);
        http.set_connect_timeout(Some(Duration::from_secs(10)));

        let tls = if insecure_tls {
            tracing::warn!("INSECURE TLS MODE ENABLED: Certificate verification is disabled!");
            TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()?
        } else {
            TlsConnector::new()?
        };

        let https = HttpsConnector::from((http, tls.into()));

        // One-shot tool: keep the pool small, connections die with the process
        let client = HyperClient::builder(TokioExecutor::new())
            .pool_max_idle_per_host(1)
            .set_host(true)
            .build(https);

        let region = region.unwrap_or_else(|| "us-east-1".to_string());

        Ok(Self {
            client,
            signer: SigV4Signer::new(access_key, secret_key, region),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn bucket_url(&self, bucket: &str) -> String {
        format!("{}/{}", self.endpoint, bucket)
    }

    /// Sign and send one request, returning status and the drained body
    async fn send(
        &self,
        method: Method,
        url: &str,
        headers: BTreeMap<String, String>,
        body: Bytes,
    ) -> Result<(StatusCode, Bytes)> {
        let signed_headers = self.signer.sign(method.as_str(), url, headers, &body);

        let mut req = Request::builder().method(method.clone()).uri(url);
        for (key, value) in signed_headers.iter() {
            req = req.header(key, value);
        }

        let request = req.body(Full::new(body))?;
        let response = self.client.request(request).await?;
        let status = response.status();

        // Always drain body to return connection to pool
        let body_bytes = response.collect().await?.to_bytes();

        tracing::debug!(method = %method, url = %url, status = status.as_u16(), "s3 request");

        Ok((status, body_bytes))
    }

    /// List all buckets visible to the credentials (GET service)
    ///
    /// Doubles as the liveness check: it fails on an unreachable endpoint
    /// as well as on rejected credentials.
    pub async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let url = format!("{}/", self.endpoint);
        let (status, body) = self
            .send(Method::GET, &url, BTreeMap::new(), Bytes::new())
            .await?;

        if !status.is_success() {
            return Err(S3Error::from_response(status, &body));
        }

        parse_list_buckets(&body)
    }

    /// Check whether a bucket exists (HEAD bucket)
    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let url = self.bucket_url(bucket);
        let (status, body) = self
            .send(Method::HEAD, &url, BTreeMap::new(), Bytes::new())
            .await?;

        match status {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(S3Error::from_response(s, &body)),
        }
    }

    /// Create a bucket (PUT bucket)
    ///
    /// Outside `us-east-1` the region is sent as a location constraint.
    pub async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let url = self.bucket_url(bucket);

        let body = if self.signer.region() == "us-east-1" {
            Bytes::new()
        } else {
            Bytes::from(format!(
                "<CreateBucketConfiguration xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
                 <LocationConstraint>{}</LocationConstraint></CreateBucketConfiguration>",
                self.signer.region()
            ))
        };

        let (status, body) = self.send(Method::PUT, &url, BTreeMap::new(), body).await?;

        if !status.is_success() {
            return Err(S3Error::from_response(status, &body));
        }

        Ok(())
    }

    /// Replace the bucket policy (PUT bucket?policy)
    pub async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<()> {
        let url = format!("{}?policy", self.bucket_url(bucket));

        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        let (status, body) = self
            .send(Method::PUT, &url, headers, Bytes::from(policy.to_string()))
            .await?;

        if !status.is_success() {
            return Err(S3Error::from_response(status, &body));
        }

        Ok(())
    }

    /// Fetch the bucket policy (GET bucket?policy); `None` when no policy is set
    pub async fn get_bucket_policy(&self, bucket: &str) -> Result<Option<String>> {
        let url = format!("{}?policy", self.bucket_url(bucket));
        let (status, body) = self
            .send(Method::GET, &url, BTreeMap::new(), Bytes::new())
            .await?;

        if status.is_success() {
            let policy = std::str::from_utf8(&body)
                .map_err(|e| S3Error::InvalidResponse(format!("policy is not UTF-8: {}", e)))?;
            return Ok(Some(policy.to_string()));
        }

        if status == StatusCode::NOT_FOUND {
            if let Some((code, _)) = parse_error_document(&body) {
                if code == "NoSuchBucketPolicy" {
                    return Ok(None);
                }
            }
        }

        Err(S3Error::from_response(status, &body))
    }
}
