// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn test_pipeline(prompt: &str) -> Pipeline {
    Pipeline {
        id: PipelineId::new("pipe-1"),
        template_id: Some(TemplateId::new("tmpl-1")),
        original_prompt: prompt.to_string(),
        workspace_path: "/workspace".to_string(),
        status: PipelineStatus::Pending,
        created_at: "2026-01-01T00:00:00Z".to_string(),
        updated_at: "2026-01-01T00:00:00Z".to_string(),
        completed_at: None,
    }
}

#[test]
fn display_name_truncates_long_prompts() {
    let pipeline = test_pipeline(&"x".repeat(80));
    assert_eq!(pipeline.display_name().len(), DISPLAY_NAME_LEN);
}

#[test]
fn display_name_keeps_short_prompts() {
    let pipeline = test_pipeline("fix the login bug");
    assert_eq!(pipeline.display_name(), "fix the login bug");
}

#[test]
fn display_name_is_char_safe() {
    let pipeline = test_pipeline(&"é".repeat(60));
    assert_eq!(pipeline.display_name().chars().count(), DISPLAY_NAME_LEN);
}

#[test]
fn terminality_follows_status() {
    let mut pipeline = test_pipeline("p");
    assert!(!pipeline.is_terminal());
    pipeline.status = PipelineStatus::Cancelled;
    assert!(pipeline.is_terminal());
}
