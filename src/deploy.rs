use crate::config::DeployConfig;
use crate::error::{DeployError, Result};
use crate::explorer;
use crate::ipfs::{ContentStore, IpfsClient};
use futures::StreamExt;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tracing::{debug, info, warn};

/// Logical directory every uploaded file is placed under. The store reports the
/// CID of this directory as the root of the upload.
pub const VIRTUAL_ROOT: &str = "www";

pub type LogSink = Arc<dyn Fn(&DeployEvent<'_>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployEvent<'a> {
    /// A file is about to be handed to the store.
    Queued { path: &'a str },
    /// The store created a node.
    Added { cid: &'a str, path: &'a str },
}

impl fmt::Display for DeployEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployEvent::Queued { path } => write!(f, "{path}"),
            DeployEvent::Added { cid, path } => write!(f, "{cid} {path}"),
        }
    }
}

/// A file ready for upload. The handle is open but nothing has been read yet;
/// the store streams it and drops it once the body has been sent.
#[derive(Debug)]
pub struct FileEntry {
    pub logical_path: String,
    pub content: File,
}

/// `www/<path relative to root>`, always joined with `/`.
pub fn logical_path(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let mut logical = String::from(VIRTUAL_ROOT);
    for component in relative.components() {
        if let Component::Normal(name) = component {
            logical.push('/');
            logical.push_str(&name.to_string_lossy());
        }
    }
    logical
}

async fn open_entry(root: &Path, path: PathBuf) -> Result<FileEntry> {
    let content = File::open(&path)
        .await
        .map_err(|source| DeployError::Open {
            path: path.clone(),
            source,
        })?;
    Ok(FileEntry {
        logical_path: logical_path(root, &path),
        content,
    })
}

/// Uploads `config.src_dir` to the node described by `config.connection` and
/// returns the root CID.
pub async fn deploy(config: &DeployConfig) -> Result<Option<String>> {
    let client = IpfsClient::new(&config.connection)?;
    deploy_to(&client, &config.src_dir, &config.log).await
}

/// Same as [`deploy`], against any [`ContentStore`].
///
/// Returns `None` when the store never reports the virtual root, which is what
/// happens for an empty source directory.
pub async fn deploy_to<S>(store: &S, src_dir: &Path, log: &LogSink) -> Result<Option<String>>
where
    S: ContentStore + ?Sized,
{
    let directory = std::path::absolute(src_dir).map_err(|source| DeployError::Open {
        path: src_dir.to_path_buf(),
        source,
    })?;

    let walk_root = directory.clone();
    let file_paths = tokio::task::spawn_blocking(move || explorer::walk_files(&walk_root)).await??;
    debug!("found {} files under {}", file_paths.len(), directory.display());

    let mut files = Vec::with_capacity(file_paths.len());
    for path in file_paths {
        files.push(open_entry(&directory, path).await?);
    }
    for file in &files {
        log(&DeployEvent::Queued {
            path: &file.logical_path,
        });
    }

    info!("uploading {} files from {}", files.len(), directory.display());
    let mut results = store.add_all(files).await?;

    let mut root_cid = None;
    let mut added = 0usize;
    while let Some(result) = results.next().await {
        let result = result?;
        added += 1;
        log(&DeployEvent::Added {
            cid: &result.cid,
            path: &result.path,
        });
        if result.path == VIRTUAL_ROOT {
            root_cid = Some(result.cid);
        }
    }

    match &root_cid {
        Some(cid) => info!("added {} nodes, root {}", added, cid),
        None => warn!("added {} nodes but none for '{}'", added, VIRTUAL_ROOT),
    }

    Ok(root_cid)
}
