// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Blocking HTTP backend for a running Marquez service.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::MarquezApi;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::types::{
    CreateJob, CreateJobRun, CreateNamespace, Dataset, DatasetList, Job, JobRun, Namespace,
    RunTransition,
};

/// HTTP backend for lineage service operations.
///
/// Each call blocks the current thread until the service answers or the
/// configured request timeout elapses.
pub struct HttpBackend {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpBackend {
    /// Create a new HTTP backend with the given configuration.
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.request_timeout)
            .build();

        Self {
            agent,
            base_url: request_base(&config.base_url()),
        }
    }

    /// Base URL requests are issued against (always carries a scheme).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    /// Send a request, mapping a 404 to `not_found` when one is given.
    fn send(
        &self,
        method: &str,
        url: &str,
        body: Option<serde_json::Value>,
        not_found: Option<ClientError>,
    ) -> Result<ureq::Response> {
        debug!(method, url, "Sending request");

        let request = self.agent.request(method, url);
        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };

        match result {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(status, response)) => {
                if status == 404 {
                    if let Some(err) = not_found {
                        return Err(err);
                    }
                }
                let message = response.into_string().unwrap_or_default();
                warn!(status, message = %message, "Service returned an error");
                Err(ClientError::Remote { status, message })
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(ClientError::Transport(transport.to_string()))
            }
        }
    }

    fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        let response = self.send(method, url, Some(body), None)?;
        decode(response)
    }
}

fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T> {
    let body = response.into_string()?;
    serde_json::from_str(&body).map_err(|e| {
        ClientError::UnexpectedResponse(format!("cannot decode response body: {}", e))
    })
}

/// Prefix `http://` when the configured hostname carries no scheme.
fn request_base(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.contains("://") {
        base.to_string()
    } else {
        format!("http://{}", base)
    }
}

impl MarquezApi for HttpBackend {
    #[instrument(skip(self, request))]
    fn upsert_namespace(&self, name: &str, request: &CreateNamespace) -> Result<Namespace> {
        let url = self.url(&["namespaces", name]);
        self.send_json("PUT", &url, request)
    }

    #[instrument(skip(self, request))]
    fn upsert_job(&self, namespace: &str, job: &str, request: &CreateJob) -> Result<Job> {
        let url = self.url(&["namespaces", namespace, "jobs", job]);
        self.send_json("PUT", &url, request)
    }

    #[instrument(skip(self, request))]
    fn create_run(&self, namespace: &str, job: &str, request: &CreateJobRun) -> Result<JobRun> {
        let url = self.url(&["namespaces", namespace, "jobs", job, "runs"]);
        self.send_json("POST", &url, request)
    }

    #[instrument(skip(self))]
    fn get_run(&self, run_id: &str) -> Result<JobRun> {
        let url = self.url(&["jobs", "runs", run_id]);
        let response = self.send(
            "GET",
            &url,
            None,
            Some(ClientError::RunNotFound(run_id.to_string())),
        )?;
        decode(response)
    }

    #[instrument(skip(self))]
    fn transition_run(&self, run_id: &str, transition: RunTransition) -> Result<()> {
        let url = self.url(&["jobs", "runs", run_id, transition.action()]);
        self.send("PUT", &url, None, None)?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn list_datasets(&self, namespace: &str) -> Result<Vec<Dataset>> {
        let url = self.url(&["namespaces", namespace, "datasets"]);
        let response = self.send("GET", &url, None, None)?;
        let list: DatasetList = decode(response)?;
        Ok(list.datasets)
    }

    #[instrument(skip(self))]
    fn get_dataset(&self, namespace: &str, name: &str) -> Result<Dataset> {
        let url = self.url(&["namespaces", namespace, "datasets", name]);
        let response = self.send(
            "GET",
            &url,
            None,
            Some(ClientError::DatasetNotFound(format!("{}/{}", namespace, name))),
        )?;
        decode(response)
    }
}
