// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status enums and dependency edge semantics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Termination reason recorded on a successfully completed job.
pub const SUCCESS_REASON: &str = "success";

/// Termination reason recorded on jobs skipped by failure propagation.
pub const DEPENDENCY_FAILED_REASON: &str = "dependency_failed";

/// Termination reason recorded on jobs skipped by deadlock finalization.
pub const DEADLOCKED_REASON: &str = "pipeline_deadlocked";

/// A status string that did not match any known variant.
#[derive(Debug, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct ParseStatusError(pub String);

/// Status of a job.
///
/// Transitions: `pending` → (`running` → `pending`)* → `running` →
/// (`completed` | `failed`), or `pending` → `skipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Skipped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "skipped" => Ok(JobStatus::Skipped),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Status of a pipeline instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl PipelineStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineStatus::Completed | PipelineStatus::Failed | PipelineStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::Pending => "pending",
            PipelineStatus::Running => "running",
            PipelineStatus::Completed => "completed",
            PipelineStatus::Failed => "failed",
            PipelineStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PipelineStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PipelineStatus::Pending),
            "running" => Ok(PipelineStatus::Running),
            "completed" => Ok(PipelineStatus::Completed),
            "failed" => Ok(PipelineStatus::Failed),
            "cancelled" => Ok(PipelineStatus::Cancelled),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Status of a stage. Display-level only: stages mirror their pipeline and
/// never gate scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Pending => "pending",
            StageStatus::Running => "running",
            StageStatus::Completed => "completed",
            StageStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StageStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(StageStatus::Pending),
            "running" => Ok(StageStatus::Running),
            "completed" => Ok(StageStatus::Completed),
            "failed" => Ok(StageStatus::Failed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Type of a dependency edge between two jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    /// Dependent runs only after the dependency completes.
    Success,
    /// Dependent runs only after the dependency fails.
    Failure,
    /// Dependent runs once the dependency is completed or failed.
    Always,
}

impl DependencyType {
    /// Whether the edge precondition holds for the given dependency status.
    pub fn satisfied_by(&self, status: JobStatus) -> bool {
        match self {
            DependencyType::Success => status == JobStatus::Completed,
            DependencyType::Failure => status == JobStatus::Failed,
            DependencyType::Always => {
                matches!(status, JobStatus::Completed | JobStatus::Failed)
            }
        }
    }

    /// Whether the edge could still be satisfied: either the dependency is
    /// still in motion, or its terminal state already meets the precondition.
    /// A `skipped` dependency satisfies no edge type.
    pub fn potentially_satisfiable(&self, status: JobStatus) -> bool {
        matches!(status, JobStatus::Pending | JobStatus::Running) || self.satisfied_by(status)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::Success => "success",
            DependencyType::Failure => "failure",
            DependencyType::Always => "always",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(DependencyType::Success),
            "failure" => Ok(DependencyType::Failure),
            "always" => Ok(DependencyType::Always),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
