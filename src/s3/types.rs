//! S3 response structures

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use super::client::{Result, S3Error};

/// Bucket entry from a ListBuckets response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketInfo {
    pub name: String,
    /// ISO-8601 creation timestamp as reported by the server
    pub creation_date: Option<String>,
}

impl BucketInfo {
    pub fn new(name: String) -> Self {
        Self {
            name,
            creation_date: None,
        }
    }
}

/// Parse a `ListAllMyBucketsResult` document
pub fn parse_list_buckets(xml_data: &[u8]) -> Result<Vec<BucketInfo>> {
    let mut reader = Reader::from_reader(xml_data);
    reader.config_mut().trim_text_start = true;
    reader.config_mut().trim_text_end = true;

    let mut buckets = Vec::new();
    let mut current: Option<BucketInfo> = None;
    let mut current_text = String::new();
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"ListAllMyBucketsResult" => saw_root = true,
                b"Bucket" => current = Some(BucketInfo::new(String::new())),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                current_text.clear();
                current_text.push_str(&e.unescape()?);
            }
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"Name" => {
                        if let Some(ref mut bucket) = current {
                            bucket.name = std::mem::take(&mut current_text);
                        }
                    }
                    b"CreationDate" => {
                        if let Some(ref mut bucket) = current {
                            bucket.creation_date = Some(std::mem::take(&mut current_text));
                        }
                    }
                    b"Bucket" => {
                        if let Some(bucket) = current.take() {
                            buckets.push(bucket);
                        }
                    }
                    _ => {}
                }
                current_text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(S3Error::XmlParse(e.to_string())),
            _ => {}
        }
    }

    if !saw_root {
        return Err(S3Error::InvalidResponse(
            "expected ListAllMyBucketsResult document".to_string(),
        ));
    }

    Ok(buckets)
}

/// Extract `<Code>` and `<Message>` from an S3 error document, if present
pub fn parse_error_document(xml_data: &[u8]) -> Option<(String, String)> {
    let mut reader = Reader::from_reader(xml_data);
    reader.config_mut().trim_text_start = true;
    reader.config_mut().trim_text_end = true;

    let mut code = None;
    let mut message = String::new();
    let mut current_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                current_text = e.unescape().ok()?.into_owned();
            }
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"Code" => code = Some(std::mem::take(&mut current_text)),
                    b"Message" => message = std::mem::take(&mut current_text),
                    _ => {}
                }
                current_text.clear();
            }
            Ok(Event::Eof) => break,
            Err(_) => return None,
            _ => {}
        }
    }

    code.map(|code| (code, message))
}
