//! Network transports for the job-board backend
//!
//! Only HTTP is served today. A transport owns its listener and runs until
//! shutdown, sharing the [`SharedState`] with every request it dispatches.

pub mod http;


use crate::state::SharedState;
use anyhow::Result;
use async_trait::async_trait;

/// Common interface for transport implementations
#[async_trait]
pub trait Transport {
    /// Bind, serve until shutdown, then return
    async fn start(self, state: SharedState) -> Result<()>;
}
