// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Transport backends for the lineage service.
//!
//! This module provides different backends behind one trait:
//! - `http`: blocking HTTP calls to a running Marquez service (default)
//! - `memory`: an in-process service used as a test double

pub mod http;
pub mod memory;

use crate::error::Result;
use crate::types::{
    CreateJob, CreateJobRun, CreateNamespace, Dataset, Job, JobRun, Namespace, RunTransition,
};

/// Backend trait for lineage service operations.
///
/// Every method is a single remote call. Implementations must surface
/// failures as-is: no retries and no caching.
pub trait MarquezApi: Send + Sync {
    /// Create or update a namespace.
    fn upsert_namespace(&self, name: &str, request: &CreateNamespace) -> Result<Namespace>;

    /// Create or update a job in a namespace.
    fn upsert_job(&self, namespace: &str, job: &str, request: &CreateJob) -> Result<Job>;

    /// Create a run of a job. The new run is in state `CREATED`.
    fn create_run(&self, namespace: &str, job: &str, request: &CreateJobRun) -> Result<JobRun>;

    /// Fetch a run by its server-assigned ID.
    fn get_run(&self, run_id: &str) -> Result<JobRun>;

    /// Move a run to another lifecycle state.
    fn transition_run(&self, run_id: &str, transition: RunTransition) -> Result<()>;

    /// List datasets registered in a namespace.
    fn list_datasets(&self, namespace: &str) -> Result<Vec<Dataset>>;

    /// Fetch one dataset.
    fn get_dataset(&self, namespace: &str, name: &str) -> Result<Dataset>;
}
