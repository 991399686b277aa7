// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn retry_strategy_defaults_without_config() {
    let strategy = RetryStrategy::resolve(None);
    assert!(!strategy.include_context);
    assert!(strategy.context_instruction.is_none());
}

#[test]
fn retry_strategy_ignores_malformed_config() {
    let strategy = RetryStrategy::resolve(Some(&json!("not an object")));
    assert_eq!(strategy, RetryStrategy::default());
}

#[test]
fn augment_prompt_builds_context_block() {
    let strategy = RetryStrategy {
        include_context: true,
        context_instruction: Some("RESUME:\n".to_string()),
    };
    let prompt = strategy.augment_prompt("step1\n", "write the report").unwrap();
    assert_eq!(
        prompt,
        "RESUME:\n=== PREVIOUS ATTEMPT OUTPUT ===\nstep1\n\n\n=== ORIGINAL TASK ===\nwrite the report"
    );
}

#[test]
fn augment_prompt_uses_default_instruction() {
    let strategy = RetryStrategy {
        include_context: true,
        context_instruction: None,
    };
    let prompt = strategy.augment_prompt("out", "task").unwrap();
    assert!(prompt.starts_with(DEFAULT_CONTEXT_INSTRUCTION));
    assert!(prompt.ends_with("=== ORIGINAL TASK ===\ntask"));
}

#[test]
fn augment_prompt_skips_without_context_or_output() {
    let without_context = RetryStrategy::default();
    assert!(without_context.augment_prompt("out", "task").is_none());

    let with_context = RetryStrategy {
        include_context: true,
        context_instruction: None,
    };
    assert!(with_context.augment_prompt("", "task").is_none());
}

#[yare::parameterized(
    stdout_final = { json!({"type": "stdout_final"}), ArtifactStrategyConfig::StdoutFinal },
    workspace    = { json!({"type": "workspace_delta"}), ArtifactStrategyConfig::WorkspaceDelta },
    unknown      = { json!({"type": "carrier_pigeon"}), ArtifactStrategyConfig::StdoutFinal },
    untyped      = { json!({}), ArtifactStrategyConfig::StdoutFinal },
)]
fn artifact_config_resolution(value: serde_json::Value, expected: ArtifactStrategyConfig) {
    assert_eq!(ArtifactStrategyConfig::resolve(Some(&value)), expected);
}

#[test]
fn artifact_config_defaults_to_stdout_final() {
    assert_eq!(
        ArtifactStrategyConfig::resolve(None),
        ArtifactStrategyConfig::StdoutFinal
    );
}

#[test]
fn composite_resolves_members_independently() {
    let value = json!({
        "type": "composite",
        "strategies": [
            {"type": "stdout_final"},
            {"type": "workspace_delta"},
            {"type": "carrier_pigeon"},
        ],
    });
    let config = ArtifactStrategyConfig::resolve(Some(&value));
    assert_eq!(
        config,
        ArtifactStrategyConfig::Composite {
            strategies: vec![
                ArtifactStrategyConfig::StdoutFinal,
                ArtifactStrategyConfig::WorkspaceDelta,
                ArtifactStrategyConfig::StdoutFinal,
            ],
        }
    );
    assert!(config.uses_workspace_delta());
}

#[test]
fn stdout_final_needs_no_snapshot() {
    assert!(!ArtifactStrategyConfig::StdoutFinal.uses_workspace_delta());
}

#[test]
fn multiplier_config_applies_defaults() {
    let value = json!({"source_template_job_id": "tj-plan"});
    let config = MultiplierConfig::resolve(Some(&value)).unwrap();
    assert_eq!(config.source_template_job_id, "tj-plan");
    assert_eq!(config.source_type, MultiplierSource::Artifact);
    assert_eq!(config.artifact_name, "final_output.txt");
    assert_eq!(config.parse_strategy, ParseStrategy::JsonArray);
    assert_eq!(config.prompt_template, "{{item}}");
}

#[test]
fn multiplier_config_rejects_missing_source() {
    assert!(MultiplierConfig::resolve(Some(&json!({"parse_strategy": "json_array"}))).is_none());
    assert!(MultiplierConfig::resolve(None).is_none());
}
