// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Marquez Client
//!
//! Blocking client for registering namespaces, jobs and job runs with a
//! Marquez lineage service, and for moving runs through their lifecycle.
//!
//! # Architecture
//!
//! The client is a thin proxy over a [`MarquezApi`] backend:
//! - Namespaces (upsert, then bind as the active namespace)
//! - Jobs (upsert with input/output dataset URNs)
//! - Runs (create, get, transition `CREATED -> RUNNING -> COMPLETED | FAILED | ABORTED`)
//! - Datasets (list, get)
//!
//! Run state legality is enforced by the service, never by the client.
//!
//! # Example
//!
//! ```no_run
//! use marquez_client::{MarquezClient, RunArgs, RunTransition};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = MarquezClient::from_path("./config.yml")?;
//! client.bind_namespace("analytics", Some("team-a"), None)?;
//!
//! client.register_job("etl_daily", "git://etl/daily.py", &["raw.events"], &["agg.daily"], None)?;
//!
//! let mut args = RunArgs::new();
//! args.insert("date".to_string(), "2024-01-01".into());
//! let run = client.start_run("etl_daily", args, None, None)?;
//!
//! client.transition_run(&run.run_id, RunTransition::Running)?;
//! client.transition_run(&run.run_id, RunTransition::Completed)?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod client;
mod config;
mod error;
mod types;

pub use backend::MarquezApi;
pub use backend::http::HttpBackend;
pub use backend::memory::MemoryBackend;
pub use client::{MarquezClient, NamespaceSession};
pub use config::{API_PATH, ClientConfig};
pub use error::{ClientError, Result};
pub use types::{
    CreateJob, CreateJobRun, CreateNamespace, DEFAULT_OWNER, Dataset, DatasetKind, DatasetList,
    Job, JobRun, Namespace, RunArgs, RunState, RunTransition,
};
