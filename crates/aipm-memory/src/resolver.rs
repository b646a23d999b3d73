//! String-keyed identity: people are their full names, tasks their ids.

use aipm_core::{
    error::AipmError,
    model::{Task, FIRST_TASK_ID},
    traits::IdentityResolver,
};
use std::collections::HashSet;
use tracing::info;

/// Mechanical resolver. Names match exactly (case-sensitive); telling two
/// people apart by context is the extractor's job, not ours.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactNameResolver;

impl IdentityResolver for ExactNameResolver {
    fn merge_team(&self, team: &mut Vec<String>, add: &[String], remove: &[String]) {
        for name in add {
            if name.trim().is_empty() {
                continue;
            }
            if !team.contains(name) {
                team.push(name.clone());
            }
        }
        if !remove.is_empty() {
            team.retain(|member| !remove.contains(member));
        }
    }

    fn assign_ids(
        &self,
        existing: &[Task],
        incoming: Vec<Task>,
    ) -> Result<Vec<Task>, AipmError> {
        let highest = existing
            .iter()
            .chain(incoming.iter())
            .map(|t| t.id)
            .max()
            .unwrap_or(0)
            .max(FIRST_TASK_ID - 1);
        let mut next = highest.checked_add(1);
        let mut claimed: HashSet<u64> = HashSet::with_capacity(incoming.len());
        let mut out = Vec::with_capacity(incoming.len());

        for mut task in incoming {
            let keep = !claimed.contains(&task.id)
                && match existing.iter().find(|t| t.id == task.id) {
                    None => true,
                    Some(stored) => same_description(&stored.task, &task.task),
                };

            if !keep {
                let id = next.ok_or_else(|| {
                    AipmError::MalformedResponse(format!(
                        "task id {} collides and no id above {highest} is left",
                        task.id
                    ))
                })?;
                info!(
                    "resolver: task id {} already names another task, renumbered to {id}",
                    task.id
                );
                task.id = id;
                next = id.checked_add(1);
            }
            claimed.insert(task.id);
            out.push(task);
        }

        Ok(out)
    }
}

fn same_description(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
