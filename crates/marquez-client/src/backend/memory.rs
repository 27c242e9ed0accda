// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-process backend that behaves like the lineage service.
//!
//! Used as a test double and for offline runs of the CLI. Unlike the client,
//! this backend enforces the run lifecycle, the way the real service does.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::debug;

use super::MarquezApi;
use crate::error::{ClientError, Result};
use crate::types::{
    CreateJob, CreateJobRun, CreateNamespace, Dataset, Job, JobRun, Namespace, RunState,
    RunTransition,
};

#[derive(Default)]
struct State {
    namespaces: HashMap<String, Namespace>,
    jobs: HashMap<(String, String), Job>,
    runs: HashMap<String, JobRun>,
    datasets: HashMap<(String, String), Dataset>,
}

/// In-memory backend for lineage service operations.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
    calls: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of API calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Seed a dataset into a namespace. Not counted as an API call.
    pub fn insert_dataset(&self, namespace: &str, dataset: Dataset) -> Result<()> {
        let mut state = self.lock()?;
        state
            .datasets
            .insert((namespace.to_string(), dataset.name.clone()), dataset);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| ClientError::Transport("in-memory backend lock poisoned".to_string()))
    }

    fn enter(&self) -> Result<MutexGuard<'_, State>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.lock()
    }
}

fn not_found(message: String) -> ClientError {
    ClientError::Remote {
        status: 404,
        message,
    }
}

impl MarquezApi for MemoryBackend {
    fn upsert_namespace(&self, name: &str, request: &CreateNamespace) -> Result<Namespace> {
        let mut state = self.enter()?;
        let created_at = state
            .namespaces
            .get(name)
            .and_then(|ns| ns.created_at)
            .unwrap_or_else(Utc::now);

        let namespace = Namespace {
            name: name.to_string(),
            owner: Some(request.owner.clone()),
            description: request.description.clone(),
            created_at: Some(created_at),
        };
        state.namespaces.insert(name.to_string(), namespace.clone());
        Ok(namespace)
    }

    fn upsert_job(&self, namespace: &str, job: &str, request: &CreateJob) -> Result<Job> {
        let mut state = self.enter()?;
        if !state.namespaces.contains_key(namespace) {
            return Err(not_found(format!("namespace '{}' not found", namespace)));
        }

        let key = (namespace.to_string(), job.to_string());
        let now = Utc::now();
        let created_at = state
            .jobs
            .get(&key)
            .and_then(|j| j.created_at)
            .unwrap_or(now);

        let record = Job {
            name: job.to_string(),
            namespace: Some(namespace.to_string()),
            location: request.location.clone(),
            input_dataset_urns: request.input_dataset_urns.clone(),
            output_dataset_urns: request.output_dataset_urns.clone(),
            description: request.description.clone(),
            created_at: Some(created_at),
            updated_at: Some(now),
        };
        state.jobs.insert(key, record.clone());
        Ok(record)
    }

    fn create_run(&self, namespace: &str, job: &str, request: &CreateJobRun) -> Result<JobRun> {
        let mut state = self.enter()?;
        if !state
            .jobs
            .contains_key(&(namespace.to_string(), job.to_string()))
        {
            return Err(not_found(format!(
                "job '{}' not found in namespace '{}'",
                job, namespace
            )));
        }

        let run = JobRun {
            run_id: uuid::Uuid::new_v4().to_string(),
            job_name: Some(job.to_string()),
            nominal_start_time: request.nominal_start_time,
            nominal_end_time: request.nominal_end_time,
            run_args: request.run_args.clone(),
            run_state: RunState::Created,
        };
        debug!(run_id = %run.run_id, job, "Created run");
        state.runs.insert(run.run_id.clone(), run.clone());
        Ok(run)
    }

    fn get_run(&self, run_id: &str) -> Result<JobRun> {
        let state = self.enter()?;
        state
            .runs
            .get(run_id)
            .cloned()
            .ok_or_else(|| ClientError::RunNotFound(run_id.to_string()))
    }

    fn transition_run(&self, run_id: &str, transition: RunTransition) -> Result<()> {
        let mut state = self.enter()?;
        let run = state
            .runs
            .get_mut(run_id)
            .ok_or_else(|| not_found(format!("run '{}' not found", run_id)))?;

        let target = transition.target_state();
        if !run.run_state.can_transition_to(target) {
            return Err(ClientError::Remote {
                status: 409,
                message: format!(
                    "invalid run state transition {} -> {}",
                    run.run_state, target
                ),
            });
        }
        run.run_state = target;
        Ok(())
    }

    fn list_datasets(&self, namespace: &str) -> Result<Vec<Dataset>> {
        let state = self.enter()?;
        let mut datasets: Vec<Dataset> = state
            .datasets
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, dataset)| dataset.clone())
            .collect();
        datasets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(datasets)
    }

    fn get_dataset(&self, namespace: &str, name: &str) -> Result<Dataset> {
        let state = self.enter()?;
        state
            .datasets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| ClientError::DatasetNotFound(format!("{}/{}", namespace, name)))
    }
}
