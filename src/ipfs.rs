//! Client side of the IPFS HTTP API `add` endpoint.

use crate::config::{ConnectionConfig, REQUEST_TIMEOUT};
use crate::deploy::FileEntry;
use crate::error::{DeployError, Result};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Deserialize;
use std::io;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::debug;

/// One node created by the store: a file, an intermediate directory or the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddResult {
    pub cid: String,
    pub path: String,
}

/// Characters a multipart filename keeps as-is. Everything else is escaped,
/// including `/`, `+` and space, so the node unescapes back to the exact path.
const FILE_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_file_name(path: &str) -> String {
    utf8_percent_encode(path, FILE_NAME).to_string()
}

pub type AddResults = BoxStream<'static, Result<AddResult>>;

/// A content-addressed store that accepts many files in one call and streams
/// back one result per stored node.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn add_all(&self, entries: Vec<FileEntry>) -> Result<AddResults>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AddLine {
    Added {
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "Hash")]
        hash: String,
    },
    Progress {
        #[serde(rename = "Bytes")]
        #[allow(dead_code)]
        bytes: u64,
    },
    Error {
        #[serde(rename = "Message")]
        message: String,
    },
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(rename = "Message")]
    message: String,
}

/// Decodes one NDJSON line of an `add` response. Progress lines yield `None`.
fn parse_line(line: &str) -> Result<Option<AddResult>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    match serde_json::from_str(line)? {
        AddLine::Added { name, hash } => Ok(Some(AddResult { cid: hash, path: name })),
        AddLine::Progress { .. } => Ok(None),
        AddLine::Error { message } => Err(DeployError::Api { status: 200, message }),
    }
}

pub struct IpfsClient {
    client: Client,
    base_url: String,
}

impl IpfsClient {
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let client = Client::builder()
            .default_headers(config.headers()?)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let base_url = config.base_url();
        debug!("IPFS client bound to {}", base_url);

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ContentStore for IpfsClient {
    async fn add_all(&self, entries: Vec<FileEntry>) -> Result<AddResults> {
        if entries.is_empty() {
            debug!("nothing to add");
            return Ok(stream::empty().boxed());
        }

        let count = entries.len();
        // Names are escaped here; the form must not escape them again.
        let mut form = Form::new().percent_encode_noop();
        for entry in entries {
            let body = Body::wrap_stream(ReaderStream::new(entry.content));
            let part = Part::stream(body)
                .file_name(encode_file_name(&entry.logical_path))
                .mime_str("application/octet-stream")?;
            form = form.part("file", part);
        }

        let url = format!("{}/add", self.base_url);
        debug!("POST {} with {} files", url, count);
        let response = self
            .client
            .post(&url)
            .query(&[("stream-channels", "true"), ("progress", "false")])
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            let message = serde_json::from_str::<ApiError>(&text)
                .map(|e| e.message)
                .unwrap_or(text);
            return Err(DeployError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reader = StreamReader::new(response.bytes_stream().map_err(io::Error::other));
        let results = FramedRead::new(reader, LinesCodec::new()).filter_map(|line| async move {
            match line {
                Ok(line) => parse_line(&line).transpose(),
                Err(e) => Some(Err(e.into())),
            }
        });

        Ok(results.boxed())
    }
}
