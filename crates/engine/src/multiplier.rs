// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job multiplier: expand one completed job's output into child jobs.
//!
//! A template job may declare a multiplier referencing a source template
//! job. When a job materialized from that source completes, its output is
//! parsed into items and one child job per item is spawned into the
//! declaring job's stage, each depending on the completed parent. The
//! `(parent_job_id, template_job_id)` guard keeps re-checks after scheduler
//! restarts from double-spawning.

use crate::instantiate::DEFAULT_MAX_RETRIES;
use crate::EngineError;
use clowder_core::{
    substitute, DependencyType, IdGen, Job, JobDependency, JobId, MultiplierConfig,
    MultiplierSource, NewJob, ParseStrategy,
};
use clowder_store::Store;

/// Split item text per the declared parse strategy. `json_array` falls back
/// to wrapping the raw content as a single item when it is not valid JSON;
/// a non-array JSON value becomes one item. Empty items are dropped.
pub fn parse_items(content: &str, strategy: ParseStrategy) -> Vec<String> {
    if content.is_empty() {
        return Vec::new();
    }
    match strategy {
        ParseStrategy::JsonArray => match serde_json::from_str::<serde_json::Value>(content.trim())
        {
            Ok(serde_json::Value::Array(items)) => {
                items.into_iter().map(item_to_string).collect()
            }
            Ok(other) => vec![item_to_string(other)],
            Err(err) => {
                tracing::warn!(error = %err, "multiplier content is not JSON, treating as one item");
                vec![content.to_string()]
            }
        },
        ParseStrategy::LineDelimited => content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect(),
        ParseStrategy::CommaSeparated => content
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect(),
    }
}

fn item_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Spawn multiplier children for a just-completed job. Returns how many
/// jobs were created across all declaring template jobs.
pub fn spawn_children(
    store: &Store,
    ids: &impl IdGen,
    completed: &Job,
) -> Result<usize, EngineError> {
    let Some(completed_template_job) = &completed.template_job_id else {
        return Ok(0);
    };
    let pipeline = store.get_pipeline(&completed.pipeline_id)?;
    let Some(template_id) = &pipeline.template_id else {
        return Ok(0);
    };

    let mut total = 0;
    for (declaring, stage_order) in store.multiplier_template_jobs(template_id)? {
        let Some(config) = MultiplierConfig::resolve(declaring.job_multiplier.as_ref()) else {
            continue;
        };
        if config.source_template_job_id != completed_template_job.as_str() {
            continue;
        }
        if store.children_spawned(&completed.id, &declaring.id)? {
            continue;
        }

        let Some(content) = load_items_source(store, &completed.id, &config)? else {
            tracing::warn!(
                job_id = %completed.id.short(8),
                source = ?config.source_type,
                "multiplier found no item source, spawning nothing"
            );
            continue;
        };
        let items = parse_items(&content, config.parse_strategy);
        if items.is_empty() {
            tracing::warn!(
                job_id = %completed.id.short(8),
                "multiplier parsed no items, spawning nothing"
            );
            continue;
        }

        let Some(stage) = store.stage_at_order(&pipeline.id, stage_order)? else {
            // The declaring job's stage was excluded at instantiation.
            continue;
        };

        let mut jobs = Vec::with_capacity(items.len());
        let mut deps = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let job_id = JobId::new(ids.next());
            let prompt = substitute(
                &config.prompt_template,
                &[
                    ("item", item.as_str()),
                    ("original_prompt", &pipeline.original_prompt),
                    ("index", &index.to_string()),
                ],
            );
            let command = declaring.command_template.as_ref().map(|tpl| {
                substitute(
                    tpl,
                    &[
                        ("job_id", job_id.as_str()),
                        ("prompt", &prompt),
                        ("agent_type", &declaring.agent_type),
                    ],
                )
            });
            deps.push(JobDependency {
                job_id: job_id.clone(),
                depends_on_job_id: completed.id.clone(),
                dependency_type: DependencyType::Success,
            });
            jobs.push(NewJob {
                id: job_id,
                pipeline_id: pipeline.id.clone(),
                stage_id: stage.id.clone(),
                agent_type: declaring.agent_type.clone(),
                prompt,
                command,
                max_iterations: declaring.max_iterations,
                timeout_seconds: declaring.timeout_seconds,
                allowed_paths: vec![pipeline.workspace_path.clone()],
                max_retries: declaring.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
                artifact_strategy: declaring.artifact_strategy.clone(),
                retry_strategy: declaring.retry_strategy.clone(),
                template_job_id: Some(declaring.id.clone()),
                parent_job_id: Some(completed.id.clone()),
            });
        }
        store.insert_jobs_with_deps(&jobs, &deps)?;
        tracing::info!(
            parent_job_id = %completed.id.short(8),
            template_job_id = %declaring.id,
            count = jobs.len(),
            "multiplier spawned child jobs"
        );
        total += jobs.len();
    }
    Ok(total)
}

fn load_items_source(
    store: &Store,
    parent: &JobId,
    config: &MultiplierConfig,
) -> Result<Option<String>, EngineError> {
    match config.source_type {
        MultiplierSource::Artifact => Ok(store.artifact_content(parent, &config.artifact_name)?),
        MultiplierSource::Action => {
            let Some(record) = store.last_action(parent)? else {
                return Ok(None);
            };
            Ok(record
                .finish_args()
                .and_then(|args| args.get("tasks"))
                .map(|tasks| tasks.to_string()))
        }
    }
}

#[cfg(test)]
#[path = "multiplier_tests.rs"]
mod tests;
