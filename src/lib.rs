//! Upload a directory to an IPFS node over its HTTP API and get back the CID
//! of the uploaded tree.
//!
//! Files are placed under a `www/` virtual root; the CID the node reports for
//! `www` is the deploy result.

pub mod config;
pub mod deploy;
pub mod error;
pub mod explorer;
pub mod ipfs;

pub use config::{ConnectionConfig, DeployConfig, Protocol};
pub use deploy::{DeployEvent, FileEntry, LogSink, VIRTUAL_ROOT, deploy, deploy_to};
pub use error::{ConfigError, DeployError, Result};
pub use ipfs::{AddResult, AddResults, ContentStore, IpfsClient};
