// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Request and response types for the lineage service.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Owner recorded when a namespace is bound without one.
pub const DEFAULT_OWNER: &str = "default";

/// Opaque key-value arguments attached to a job run.
///
/// Values are arbitrary JSON so whatever the service echoes back decodes.
pub type RunArgs = serde_json::Map<String, serde_json::Value>;

/// Job run lifecycle state.
///
/// `Created -> Running -> {Completed | Failed | Aborted}`; terminal states are
/// never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    /// Run recorded, not started.
    #[serde(alias = "NEW")]
    Created,
    /// Run is executing.
    Running,
    /// Run finished successfully.
    Completed,
    /// Run finished with error.
    Failed,
    /// Run was aborted.
    Aborted,
}

impl RunState {
    /// All states, in lifecycle order.
    pub const ALL: [RunState; 5] = [
        RunState::Created,
        RunState::Running,
        RunState::Completed,
        RunState::Failed,
        RunState::Aborted,
    ];

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Failed | RunState::Aborted
        )
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// The client never consults this before sending a transition; the service
    /// owns legality. It exists for backends that play the service's role.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        matches!(
            (self, next),
            (RunState::Created, RunState::Running)
                | (
                    RunState::Running,
                    RunState::Completed | RunState::Failed | RunState::Aborted
                )
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Created => "CREATED",
            RunState::Running => "RUNNING",
            RunState::Completed => "COMPLETED",
            RunState::Failed => "FAILED",
            RunState::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target of a run state transition.
///
/// `Created` is not a target: runs enter it only through creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunTransition {
    Running,
    Completed,
    Failed,
    Aborted,
}

impl RunTransition {
    pub const ALL: [RunTransition; 4] = [
        RunTransition::Running,
        RunTransition::Completed,
        RunTransition::Failed,
        RunTransition::Aborted,
    ];

    /// State the run ends up in after the transition.
    pub fn target_state(&self) -> RunState {
        match self {
            RunTransition::Running => RunState::Running,
            RunTransition::Completed => RunState::Completed,
            RunTransition::Failed => RunState::Failed,
            RunTransition::Aborted => RunState::Aborted,
        }
    }

    /// Path segment of the transition endpoint (`/jobs/runs/{id}/{action}`).
    pub fn action(&self) -> &'static str {
        match self {
            RunTransition::Running => "run",
            RunTransition::Completed => "complete",
            RunTransition::Failed => "fail",
            RunTransition::Aborted => "abort",
        }
    }
}

impl TryFrom<RunState> for RunTransition {
    type Error = RunState;

    fn try_from(state: RunState) -> Result<Self, Self::Error> {
        match state {
            RunState::Created => Err(state),
            RunState::Running => Ok(RunTransition::Running),
            RunState::Completed => Ok(RunTransition::Completed),
            RunState::Failed => Ok(RunTransition::Failed),
            RunState::Aborted => Ok(RunTransition::Aborted),
        }
    }
}

impl std::str::FromStr for RunTransition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "running" | "run" => Ok(RunTransition::Running),
            "completed" | "complete" => Ok(RunTransition::Completed),
            "failed" | "fail" => Ok(RunTransition::Failed),
            "aborted" | "abort" => Ok(RunTransition::Aborted),
            other => Err(format!("unknown run state: {}", other)),
        }
    }
}

// ============================================================================
// Namespaces
// ============================================================================

/// Body of a namespace upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNamespace {
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateNamespace {
    /// Build a request; a missing owner becomes `"default"`.
    pub fn new(owner: Option<&str>, description: Option<&str>) -> Self {
        Self {
            owner: owner.unwrap_or(DEFAULT_OWNER).to_string(),
            description: description.map(str::to_string),
        }
    }
}

/// Namespace as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Jobs
// ============================================================================

/// Body of a job upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJob {
    /// Source reference of the job (repository URL, file path).
    pub location: String,
    pub input_dataset_urns: Vec<String>,
    pub output_dataset_urns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateJob {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Self::default()
        }
    }

    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_dataset_urns = inputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_dataset_urns = outputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Job as confirmed by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    pub location: String,
    #[serde(default)]
    pub input_dataset_urns: Vec<String>,
    #[serde(default)]
    pub output_dataset_urns: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Job runs
// ============================================================================

/// Body of a run creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRun {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal_start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal_end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub run_args: RunArgs,
}

impl CreateJobRun {
    pub fn new(run_args: RunArgs) -> Self {
        Self {
            run_args,
            ..Self::default()
        }
    }

    /// Set the scheduled window of the run.
    pub fn with_nominal_window(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.nominal_start_time = start;
        self.nominal_end_time = end;
        self
    }
}

/// Job run as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRun {
    /// Server-assigned identifier.
    pub run_id: String,
    #[serde(default)]
    pub job_name: Option<String>,
    #[serde(default)]
    pub nominal_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub nominal_end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub run_args: RunArgs,
    pub run_state: RunState,
}

// ============================================================================
// Datasets
// ============================================================================

/// Kind of dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatasetKind {
    /// Table in a database.
    DbTable,
    /// Stream (topic) with a schema registry location.
    #[serde(rename_all = "camelCase")]
    Stream { schema_location: String },
}

/// Dataset registered in a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub name: String,
    #[serde(default)]
    pub physical_name: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: DatasetKind,
}

impl Dataset {
    pub fn is_stream(&self) -> bool {
        matches!(self.kind, DatasetKind::Stream { .. })
    }
}

/// Envelope returned when listing datasets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetList {
    #[serde(default)]
    pub datasets: Vec<Dataset>,
}
