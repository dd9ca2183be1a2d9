//! # Jobboard Server
//!
//! HTTP backend of a job board where applicants, tenants and administrators
//! work with vacancies, resumes and responses.
//!
//! Three pieces sit between the HTTP surface and the repository:
//!
//! - **Admission**: selected endpoints are wrapped in a sliding-window rate
//!   limit, keyed by caller identity and route template, with its state in a
//!   shared key-value store so every replica counts the same requests.
//! - **Search cache**: search results are cached under keys that embed a
//!   per-class version counter. Any committed vacancy or resume mutation bumps
//!   the counter, so stale entries are never read again and simply expire.
//! - **Profile cache**: user profiles are cached under one direct key that is
//!   deleted on every profile-affecting mutation.
//!
//! ## Quick Start
//!
//! ```bash
//! # Redis on localhost, defaults for everything else
//! jobboard --jwt-secret "$(openssl rand -hex 32)"
//!
//! # Single process without Redis
//! jobboard --store memory --jwt-secret "$(openssl rand -hex 32)"
//!
//! # Seed an administrator on startup
//! jobboard --jwt-secret ... --admin-email root@example.com --admin-password ...
//!
//! # List all available environment variables
//! jobboard --list-env-vars
//! ```
//!
//! ## Architecture
//!
//! ```text
//!        ┌──────────────────────────────┐
//!        │        HTTP transport        │
//!        │  /api/...  /health  /metrics │
//!        └──────────────┬───────────────┘
//!                       │
//!              ┌────────▼────────┐
//!              │    admission    │  per-route, limited endpoints only
//!              └────────┬────────┘
//!                       │
//!              ┌────────▼────────┐
//!              │    handlers     │
//!              └──┬───────────┬──┘
//!                 │           │
//!         ┌───────▼──┐   ┌────▼─────────────┐
//!         │repository│   │ cache / limiter  │
//!         └──────────┘   └────┬─────────────┘
//!                             │
//!                      ┌──────▼──────┐
//!                      │  KV store   │  Redis or in-process
//!                      └─────────────┘
//! ```

pub mod admission;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod redis_store;
pub mod repository;
pub mod state;
pub mod store;
pub mod transport;
pub mod types;
