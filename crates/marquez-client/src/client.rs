// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! MarquezClient and namespace sessions.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::backend::MarquezApi;
use crate::backend::http::HttpBackend;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::types::{
    CreateJob, CreateJobRun, CreateNamespace, Dataset, Job, JobRun, Namespace, RunArgs,
    RunTransition,
};

/// Client for the Marquez lineage service.
///
/// Holds at most one active namespace. Job, run and dataset operations fail with
/// `ClientError::NotBound` until `bind_namespace` succeeds. Rebinding takes
/// `&mut self`, so a client shared between threads has to be wrapped in a lock
/// by the caller; use `bind` to get an immutable [`NamespaceSession`] instead.
pub struct MarquezClient {
    api: Arc<dyn MarquezApi>,
    base_url: String,
    namespace: Option<String>,
}

impl fmt::Debug for MarquezClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarquezClient")
            .field("base_url", &self.base_url)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl MarquezClient {
    /// Create a client talking HTTP to the service described by `config`.
    pub fn new(config: ClientConfig) -> Self {
        let base_url = config.base_url();
        let api = Arc::new(HttpBackend::new(&config));
        Self {
            api,
            base_url,
            namespace: None,
        }
    }

    /// Create a client from a YAML configuration file.
    ///
    /// No remote call is made; configuration problems surface here as
    /// `ClientError::Config`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let config = ClientConfig::from_path(path)?;
        Ok(Self::new(config))
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ClientConfig::from_env()?))
    }

    /// Create a client over an arbitrary backend.
    pub fn with_api(api: Arc<dyn MarquezApi>) -> Self {
        Self {
            api,
            base_url: String::new(),
            namespace: None,
        }
    }

    /// Base URL of the service (`{hostname}:{port}/api/v1`); empty for injected backends.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =========================================================================
    // Namespaces
    // =========================================================================

    /// Upsert `name` on the service and make it the active namespace.
    ///
    /// The owner defaults to `"default"`. On failure the previously bound
    /// namespace, if any, stays active.
    #[instrument(skip(self, description))]
    pub fn bind_namespace(
        &mut self,
        name: &str,
        owner: Option<&str>,
        description: Option<&str>,
    ) -> Result<Namespace> {
        let namespace = upsert_namespace(self.api.as_ref(), name, owner, description)?;
        self.namespace = Some(name.to_string());
        Ok(namespace)
    }

    /// Upsert `name` and return a session handle bound to it.
    ///
    /// Does not change this client's active namespace.
    #[instrument(skip(self, description))]
    pub fn bind(
        &self,
        name: &str,
        owner: Option<&str>,
        description: Option<&str>,
    ) -> Result<NamespaceSession> {
        upsert_namespace(self.api.as_ref(), name, owner, description)?;
        Ok(NamespaceSession {
            api: Arc::clone(&self.api),
            namespace: name.to_string(),
        })
    }

    /// Session for a namespace that already exists on the service.
    ///
    /// Makes no remote call, so the namespace's owner and description are
    /// left as they are. Operations on a namespace the service does not know
    /// fail with `ClientError::Remote`.
    pub fn attach(&self, name: &str) -> NamespaceSession {
        NamespaceSession {
            api: Arc::clone(&self.api),
            namespace: name.to_string(),
        }
    }

    /// Name of the active namespace.
    pub fn active_namespace(&self) -> Result<&str> {
        self.namespace.as_deref().ok_or(ClientError::NotBound)
    }

    /// Session for the active namespace.
    pub fn session(&self) -> Result<NamespaceSession> {
        let namespace = self.active_namespace()?.to_string();
        Ok(NamespaceSession {
            api: Arc::clone(&self.api),
            namespace,
        })
    }

    // =========================================================================
    // Jobs and runs in the active namespace
    // =========================================================================

    /// Register (or overwrite) a job in the active namespace.
    pub fn register_job(
        &self,
        name: &str,
        location: &str,
        inputs: &[&str],
        outputs: &[&str],
        description: Option<&str>,
    ) -> Result<Job> {
        self.session()?
            .register_job(name, location, inputs, outputs, description)
    }

    /// Create a run of `job_name` in the active namespace.
    pub fn start_run(
        &self,
        job_name: &str,
        run_args: RunArgs,
        nominal_start: Option<DateTime<Utc>>,
        nominal_end: Option<DateTime<Utc>>,
    ) -> Result<JobRun> {
        self.session()?
            .start_run(job_name, run_args, nominal_start, nominal_end)
    }

    /// Fetch a run by ID.
    ///
    /// Run IDs are global on the service, but like every run operation this
    /// still requires a bound namespace.
    pub fn get_run(&self, run_id: &str) -> Result<JobRun> {
        self.session()?.get_run(run_id)
    }

    /// Send a state transition for a run.
    ///
    /// Nothing is checked locally: sending `Completed` to a finished run is
    /// forwarded and the service's rejection comes back as `ClientError::Remote`.
    pub fn transition_run(&self, run_id: &str, target: RunTransition) -> Result<()> {
        self.session()?.transition_run(run_id, target)
    }

    pub fn mark_run_running(&self, run_id: &str) -> Result<()> {
        self.transition_run(run_id, RunTransition::Running)
    }

    pub fn mark_run_completed(&self, run_id: &str) -> Result<()> {
        self.transition_run(run_id, RunTransition::Completed)
    }

    pub fn mark_run_failed(&self, run_id: &str) -> Result<()> {
        self.transition_run(run_id, RunTransition::Failed)
    }

    pub fn mark_run_aborted(&self, run_id: &str) -> Result<()> {
        self.transition_run(run_id, RunTransition::Aborted)
    }

    // =========================================================================
    // Datasets in the active namespace
    // =========================================================================

    pub fn list_datasets(&self) -> Result<Vec<Dataset>> {
        self.session()?.list_datasets()
    }

    pub fn get_dataset(&self, name: &str) -> Result<Dataset> {
        self.session()?.get_dataset(name)
    }
}

fn upsert_namespace(
    api: &dyn MarquezApi,
    name: &str,
    owner: Option<&str>,
    description: Option<&str>,
) -> Result<Namespace> {
    let request = CreateNamespace::new(owner, description);
    info!(owner = %request.owner, "Upserting namespace");
    api.upsert_namespace(name, &request)
}

/// Immutable handle bound to one namespace.
///
/// Cheap to clone and safe to share between threads.
#[derive(Clone)]
pub struct NamespaceSession {
    api: Arc<dyn MarquezApi>,
    namespace: String,
}

impl fmt::Debug for NamespaceSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceSession")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl NamespaceSession {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Register (or overwrite) a job.
    #[instrument(skip(self, inputs, outputs, description), fields(namespace = %self.namespace))]
    pub fn register_job(
        &self,
        name: &str,
        location: &str,
        inputs: &[&str],
        outputs: &[&str],
        description: Option<&str>,
    ) -> Result<Job> {
        info!(
            inputs = inputs.len(),
            outputs = outputs.len(),
            "Registering job"
        );

        let mut request = CreateJob::new(location)
            .with_inputs(inputs.iter().copied())
            .with_outputs(outputs.iter().copied());
        if let Some(description) = description {
            request = request.with_description(description);
        }

        self.api.upsert_job(&self.namespace, name, &request)
    }

    /// Create a run in state `CREATED`. `run_args` are passed through untouched.
    #[instrument(skip(self, run_args), fields(namespace = %self.namespace))]
    pub fn start_run(
        &self,
        job_name: &str,
        run_args: RunArgs,
        nominal_start: Option<DateTime<Utc>>,
        nominal_end: Option<DateTime<Utc>>,
    ) -> Result<JobRun> {
        info!("Creating job run");

        let request = CreateJobRun::new(run_args).with_nominal_window(nominal_start, nominal_end);
        let run = self.api.create_run(&self.namespace, job_name, &request)?;

        debug!(run_id = %run.run_id, "Job run created");
        Ok(run)
    }

    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub fn get_run(&self, run_id: &str) -> Result<JobRun> {
        debug!("Getting job run");
        self.api.get_run(run_id)
    }

    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub fn transition_run(&self, run_id: &str, target: RunTransition) -> Result<()> {
        info!(action = target.action(), "Transitioning job run");
        self.api.transition_run(run_id, target)
    }

    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub fn list_datasets(&self) -> Result<Vec<Dataset>> {
        debug!("Listing datasets");
        self.api.list_datasets(&self.namespace)
    }

    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub fn get_dataset(&self, name: &str) -> Result<Dataset> {
        self.api.get_dataset(&self.namespace, name)
    }
}
