#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use crate::task::model::{self, Task};
use crate::task::store::{TaskStore, WriteMode};

const NO_MATCH_MESSAGE: &str = "No tasks found with the specified indices.";

/// Options for the shared list renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub priority_sort: bool,
    pub verbose: bool,
    pub reverse: bool,
    pub reindex: bool,
}

/// Applies one mutation or query per invocation: load fresh from disk,
/// operate, persist, and return the user-facing output lines. Nothing is
/// cached across operations.
#[derive(Debug, Clone)]
pub struct TaskOperator {
    store: TaskStore,
}

impl TaskOperator {
    #[must_use]
    pub fn new(store: TaskStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn add(&self, text: &str, priority: u8) -> anyhow::Result<Vec<String>> {
        let mut out = Vec::new();
        if text.trim().is_empty() {
            out.push("Task text must not be empty.".to_owned());
            return Ok(out);
        }

        let mut tasks = self.store.load(&self.store.incomplete_path())?;
        let mut task = Task::new(text, priority);
        task.index = position_index(tasks.len());
        tasks.push(task);
        self.store
            .persist(&self.store.incomplete_path(), &tasks, WriteMode::Replace)?;

        self.emit(&mut out, format!("Added task \"{text}\"."))?;
        Ok(out)
    }

    pub fn delete(&self, raw_indices: &[i64]) -> anyhow::Result<Vec<String>> {
        let mut out = Vec::new();
        self.delete_inner(raw_indices, false, &mut out)?;
        Ok(out)
    }

    pub fn complete(&self, raw_indices: &[i64]) -> anyhow::Result<Vec<String>> {
        let mut out = Vec::new();
        let tasks = self.store.load(&self.store.incomplete_path())?;
        let resolved = resolved_set(raw_indices, tasks.len());

        let mut selected: Vec<Task> = tasks
            .into_iter()
            .filter(|t| resolved.contains(&i64::from(t.index)))
            .collect();
        if selected.is_empty() {
            out.push(NO_MATCH_MESSAGE.to_owned());
            return Ok(out);
        }

        for task in &mut selected {
            task.mark_complete();
        }
        // Completed records keep the index they held at completion; the
        // completed file is append-only and never renumbered.
        self.store
            .persist(&self.store.completed_path(), &selected, WriteMode::Append)?;

        self.delete_inner(raw_indices, true, &mut out)?;

        for task in &selected {
            self.emit(&mut out, format!("Completed \"{}\".", task.text))?;
        }
        Ok(out)
    }

    pub fn set_priority(&self, index: i64, new_priority: i64) -> anyhow::Result<Vec<String>> {
        let mut out = Vec::new();
        let priority = match u8::try_from(new_priority) {
            Ok(p) if p <= model::MAX_PRIORITY => p,
            _ => {
                out.push(format!(
                    "Priority must be between 0 and {}.",
                    model::MAX_PRIORITY
                ));
                return Ok(out);
            }
        };

        let mut tasks = self.store.load(&self.store.incomplete_path())?;
        let Some(task) = tasks.iter_mut().find(|t| i64::from(t.index) == index) else {
            out.push(format!("No task with index {index}."));
            return Ok(out);
        };
        if task.priority == priority {
            out.push(format!(
                "Priority of \"{}\" is already {priority}.",
                task.text
            ));
            return Ok(out);
        }

        task.priority = priority;
        let text = task.text.clone();
        self.store
            .persist(&self.store.incomplete_path(), &tasks, WriteMode::Replace)?;

        self.emit(&mut out, format!("Set priority of \"{text}\" to {priority}."))?;
        Ok(out)
    }

    pub fn list_incomplete(&self, priority_sort: bool, verbose: bool) -> anyhow::Result<Vec<String>> {
        let tasks = self.store.load(&self.store.incomplete_path())?;
        Ok(render_list(
            &tasks,
            &RenderOptions {
                priority_sort,
                verbose,
                reverse: false,
                reindex: false,
            },
        ))
    }

    /// `n >= 0` selects the most recent `n` completed tasks (shown
    /// most-recent-first when `n > 0`); `n < 0` selects the oldest `|n|`
    /// in chronological order. `show_all` keeps everything chronological.
    pub fn list_completed(
        &self,
        n: i64,
        show_all: bool,
        priority_sort: bool,
        verbose: bool,
    ) -> anyhow::Result<Vec<String>> {
        let tasks = self.store.load(&self.store.completed_path())?;

        let (window, reverse): (&[Task], bool) = if show_all {
            (&tasks, false)
        } else if n >= 0 {
            let count = usize::try_from(n).unwrap_or(usize::MAX);
            let start = tasks.len().saturating_sub(count);
            (&tasks[start..], n > 0)
        } else {
            let count = usize::try_from(n.unsigned_abs()).unwrap_or(usize::MAX);
            (&tasks[..tasks.len().min(count)], false)
        };

        Ok(render_list(
            window,
            &RenderOptions {
                priority_sort,
                verbose,
                reverse,
                reindex: true,
            },
        ))
    }

    pub fn view_log(&self, show_all: bool, recent: usize) -> anyhow::Result<Vec<String>> {
        let Some(lines) = self.store.read_log() else {
            return Ok(vec!["No log file found.".to_owned()]);
        };
        if show_all {
            return Ok(lines);
        }
        let start = lines.len().saturating_sub(recent);
        let mut window = lines[start..].to_vec();
        window.reverse();
        Ok(window)
    }

    fn delete_inner(
        &self,
        raw_indices: &[i64],
        completing: bool,
        out: &mut Vec<String>,
    ) -> anyhow::Result<()> {
        let tasks = self.store.load(&self.store.incomplete_path())?;
        let resolved = resolved_set(raw_indices, tasks.len());

        let (deleted, mut remaining): (Vec<Task>, Vec<Task>) = tasks
            .into_iter()
            .partition(|t| resolved.contains(&i64::from(t.index)));
        if deleted.is_empty() {
            out.push(NO_MATCH_MESSAGE.to_owned());
            return Ok(());
        }

        reindex(&mut remaining);
        self.store
            .persist(&self.store.incomplete_path(), &remaining, WriteMode::Replace)?;

        if !completing {
            for task in &deleted {
                self.emit(out, format!("Deleted task \"{}\".", task.text))?;
            }
        }
        Ok(())
    }

    // Logged messages and printed output are the same lines; validation
    // messages bypass this and are never logged.
    fn emit(&self, out: &mut Vec<String>, message: String) -> anyhow::Result<()> {
        self.store.append_log(&message)?;
        out.push(message);
        Ok(())
    }
}

/// Negative indices resolve Python-style against the collection length:
/// -1 is the last task. Non-negative values pass through unchanged.
#[must_use]
pub fn resolve_indices(raw_indices: &[i64], collection_len: usize) -> Vec<i64> {
    let len = i64::try_from(collection_len).unwrap_or(i64::MAX);
    raw_indices
        .iter()
        .map(|&i| if i < 0 { len + i + 1 } else { i })
        .collect()
}

fn resolved_set(raw_indices: &[i64], collection_len: usize) -> BTreeSet<i64> {
    resolve_indices(raw_indices, collection_len).into_iter().collect()
}

fn reindex(tasks: &mut [Task]) {
    for (pos, task) in tasks.iter_mut().enumerate() {
        task.index = position_index(pos);
    }
}

fn position_index(pos: usize) -> u32 {
    u32::try_from(pos + 1).unwrap_or(u32::MAX)
}

/// Shared rendering for both listings. Sorts, optionally reverses, then
/// renders each task, substituting a 1-based display position for the
/// stored index when `reindex` is set.
#[must_use]
pub fn render_list(tasks: &[Task], opts: &RenderOptions) -> Vec<String> {
    if tasks.is_empty() {
        return vec!["No tasks to show.".to_owned()];
    }

    let mut ordered: Vec<&Task> = tasks.iter().collect();
    if opts.priority_sort {
        // Highest priority first; equal priorities keep creation order.
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.index.cmp(&b.index)));
    } else {
        ordered.sort_by_key(|t| t.index);
    }
    if opts.reverse {
        ordered.reverse();
    }

    ordered
        .iter()
        .enumerate()
        .map(|(pos, task)| {
            if opts.reindex {
                let mut display = (*task).clone();
                display.index = position_index(pos);
                render_one(&display, opts.verbose)
            } else {
                render_one(task, opts.verbose)
            }
        })
        .collect()
}

fn render_one(task: &Task, verbose: bool) -> String {
    if verbose {
        task.render_verbose(true)
    } else {
        task.render_compact(true)
    }
}
