//! AWS Signature Version 4 request signing
//!
//! MinIO authenticates every admin-level bucket call with SigV4, so each
//! request the client sends goes through [`SigV4Signer::sign`].

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";

/// SHA256 of an empty payload
pub const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

static HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

#[derive(Clone)]
pub struct SigV4Signer {
    access_key: String,
    secret_key: String,
    region: String,
}

impl std::fmt::Debug for SigV4Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigV4Signer")
            .field("access_key", &self.access_key)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl SigV4Signer {
    pub fn new(access_key: String, secret_key: String, region: String) -> Self {
        Self {
            access_key,
            secret_key,
            region,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Sign a request at the current time.
    ///
    /// Returns `headers` extended with `host`, `x-amz-date`,
    /// `x-amz-content-sha256` and `authorization`.
    pub fn sign(
        &self,
        method: &str,
        url: &str,
        headers: BTreeMap<String, String>,
        payload: &[u8],
    ) -> BTreeMap<String, String> {
        self.sign_at(method, url, headers, payload, Utc::now())
    }

    /// Sign a request with an explicit timestamp
    pub fn sign_at(
        &self,
        method: &str,
        url: &str,
        mut headers: BTreeMap<String, String>,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> BTreeMap<String, String> {
        let payload_hash = if payload.is_empty() {
            EMPTY_SHA256.to_string()
        } else {
            hex::encode(Sha256::digest(payload))
        };

        let (host, path, query) = split_url(url);

        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();

        headers.insert("host".to_string(), host.to_string());
        headers.insert("x-amz-date".to_string(), amz_date.clone());
        headers.insert("x-amz-content-sha256".to_string(), payload_hash.clone());

        let canonical_query = canonical_query_string(query);
        let canonical_headers = canonical_headers(&headers);
        let signed_headers = headers.keys().map(String::as_str).collect::<Vec<_>>().join(";");

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method, path, canonical_query, canonical_headers, signed_headers, payload_hash
        );
        tracing::trace!(%canonical_request, "sigv4 canonical request");

        let credential_scope = format!("{}/{}/{}/aws4_request", date_stamp, self.region, SERVICE);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            credential_scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signing_key = self.derive_signing_key(&date_stamp);
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.access_key, credential_scope, signed_headers, signature
        );
        headers.insert("authorization".to_string(), authorization);

        headers
    }

    fn derive_signing_key(&self, date_stamp: &str) -> [u8; 32] {
        let secret = format!("AWS4{}", self.secret_key);
        let k_date = hmac_sha256(secret.as_bytes(), date_stamp.as_bytes());
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, SERVICE.as_bytes());
        hmac_sha256(&k_service, b"aws4_request")
    }
}

/// Split a URL into (host header value, path, raw query).
///
/// Default ports are dropped from the host, matching what HTTP clients send.
fn split_url(url: &str) -> (&str, &str, &str) {
    let (https, rest) = if let Some(rest) = url.strip_prefix("https://") {
        (true, rest)
    } else if let Some(rest) = url.strip_prefix("http://") {
        (false, rest)
    } else {
        (false, url)
    };

    let (authority, path_and_query) = match rest.find('/') {
        Some(pos) => (&rest[..pos], &rest[pos..]),
        None => match rest.find('?') {
            Some(pos) => (&rest[..pos], &rest[pos..]),
            None => (rest, "/"),
        },
    };

    let (path, query) = match path_and_query.split_once('?') {
        Some((path, query)) => (path, query),
        None => (path_and_query, ""),
    };
    let path = if path.is_empty() { "/" } else { path };

    let host = if https {
        authority.strip_suffix(":443").unwrap_or(authority)
    } else {
        authority.strip_suffix(":80").unwrap_or(authority)
    };

    (host, path, query)
}

/// Sorted, fully encoded query string. Bare parameters such as `?policy`
/// become `policy=`.
fn canonical_query_string(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }

    let mut params: Vec<(String, String)> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = urlencoding::decode(key).unwrap_or_else(|_| key.into());
            let value = urlencoding::decode(value).unwrap_or_else(|_| value.into());
            (uri_encode(&key), uri_encode(&value))
        })
        .collect();

    params.sort();

    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Header keys are inserted lowercase; BTreeMap keeps them sorted
fn canonical_headers(headers: &BTreeMap<String, String>) -> String {
    let mut result = String::with_capacity(headers.len() * 64);
    for (k, v) in headers {
        result.push_str(k);
        result.push(':');
        result.push_str(v.trim());
        result.push('\n');
    }
    result
}

fn hmac_sha256(key: &[u8], msg: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(msg);
    let mut output = [0u8; 32];
    output.copy_from_slice(&mac.finalize().into_bytes());
    output
}

/// RFC 3986 encoding, slash included
fn uri_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 16);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push('%');
                result.push(HEX_UPPER[(byte >> 4) as usize] as char);
                result.push(HEX_UPPER[(byte & 0xf) as usize] as char);
            }
        }
    }
    result
}
