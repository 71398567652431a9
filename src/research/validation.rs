use serde_yaml::Value;

use crate::error::{FlowError, Result};

use super::model::{Task, TaskKind};

/// 任务校验
///
/// Checks a planner document before it is trusted: a `tasks` list that is
/// not empty, each entry with `type`, `description` and `parameters`, a known
/// type, and the parameter list that type requires. All problems are
/// reported together.
pub struct TaskValidator;

impl TaskValidator {
    pub fn validate_task(task: &Value) -> Vec<String> {
        let mut errors = Vec::new();
        for field in ["type", "description", "parameters"] {
            if task.get(field).is_none() {
                errors.push(format!("missing required field: {field}"));
            }
        }

        let Some(kind) = task.get("type") else {
            return errors;
        };
        let Some(kind) = kind.as_str().and_then(TaskKind::parse) else {
            errors.push(format!("invalid task type: {}", describe(kind)));
            return errors;
        };

        if let Some(parameters) = task.get("parameters") {
            let required = kind.required_parameter();
            match parameters.get(required) {
                Some(Value::Sequence(_)) => {}
                Some(_) => errors.push(format!("{kind} task: {required} must be a list")),
                None => errors.push(format!("{kind} task missing {required}")),
            }
        }
        errors
    }

    pub fn validate_document(document: &Value) -> Vec<String> {
        let Some(tasks) = document.get("tasks") else {
            return vec!["invalid structure: missing 'tasks' key".to_string()];
        };
        let Some(tasks) = tasks.as_sequence() else {
            return vec!["invalid structure: 'tasks' must be a list".to_string()];
        };
        if tasks.is_empty() {
            return vec!["task list is empty".to_string()];
        }
        tasks
            .iter()
            .enumerate()
            .flat_map(|(i, task)| {
                Self::validate_task(task)
                    .into_iter()
                    .map(move |error| format!("task {}: {error}", i + 1))
            })
            .collect()
    }

    /// Validates and converts in one go.
    pub fn parse_tasks(document: Value) -> Result<Vec<Task>> {
        let errors = Self::validate_document(&document);
        if !errors.is_empty() {
            return Err(FlowError::Validation(errors));
        }
        let tasks = document
            .get("tasks")
            .cloned()
            .unwrap_or(Value::Sequence(Vec::new()));
        Ok(serde_yaml::from_value(tasks)?)
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "?".to_string()),
    }
}
