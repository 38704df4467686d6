#![forbid(unsafe_code)]

use std::fs;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::error::TtdError;
use crate::task::model::{self, Task};

pub const INCOMPLETE_FILE: &str = "tasks.json";
pub const COMPLETED_FILE: &str = "completed_tasks.json";
pub const LOG_FILE: &str = "history.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Missing or malformed files read as an empty collection. This is
    /// the compatible default: corruption is indistinguishable from "no
    /// tasks yet".
    Lenient,
    /// Missing files still read as empty; a malformed line is an error.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Truncate and rewrite the whole collection (incomplete store).
    Replace,
    /// Add records to the end (completed store and log).
    Append,
}

#[derive(Debug, Clone)]
pub struct TaskStore {
    dir: PathBuf,
    load_mode: LoadMode,
}

impl TaskStore {
    #[must_use]
    pub fn new(dir: PathBuf, load_mode: LoadMode) -> Self {
        Self { dir, load_mode }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn incomplete_path(&self) -> PathBuf {
        self.dir.join(INCOMPLETE_FILE)
    }

    #[must_use]
    pub fn completed_path(&self) -> PathBuf {
        self.dir.join(COMPLETED_FILE)
    }

    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    pub fn ensure_dir(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create storage dir {}", self.dir.display()))
    }

    /// Reads one JSON record per line, in file order.
    pub fn load(&self, path: &Path) -> anyhow::Result<Vec<Task>> {
        let Ok(raw) = fs::read_to_string(path) else {
            return Ok(Vec::new());
        };
        let mut tasks: Vec<Task> = Vec::new();
        for (lineno, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Task>(line) {
                Ok(task) => tasks.push(task),
                Err(source) => {
                    if self.load_mode == LoadMode::Strict {
                        return Err(TtdError::MalformedStore {
                            path: path.to_path_buf(),
                            line: lineno + 1,
                            source,
                        }
                        .into());
                    }
                    return Ok(Vec::new());
                }
            }
        }
        Ok(tasks)
    }

    pub fn persist(&self, path: &Path, tasks: &[Task], mode: WriteMode) -> anyhow::Result<()> {
        self.ensure_dir()?;
        let mut buf = String::new();
        for task in tasks {
            buf.push_str(&serde_json::to_string(task)?);
            buf.push('\n');
        }
        match mode {
            WriteMode::Replace => fs::write(path, buf.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?,
            WriteMode::Append => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("failed to open {}", path.display()))?;
                file.write_all(buf.as_bytes())
                    .with_context(|| format!("failed to append to {}", path.display()))?;
            }
        }
        Ok(())
    }

    pub fn append_log(&self, message: &str) -> anyhow::Result<()> {
        self.ensure_dir()?;
        let path = self.log_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        writeln!(file, "{} | {}", model::log_timestamp(), message)
            .with_context(|| format!("failed to append to {}", path.display()))?;
        Ok(())
    }

    /// None when the log file does not exist yet.
    #[must_use]
    pub fn read_log(&self) -> Option<Vec<String>> {
        let raw = fs::read_to_string(self.log_path()).ok()?;
        Some(raw.lines().map(str::to_owned).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path, mode: LoadMode) -> TaskStore {
        TaskStore::new(dir.to_path_buf(), mode)
    }

    fn sample(text: &str, index: u32) -> Task {
        let mut t = Task::new(text, 0);
        t.index = index;
        t
    }

    #[test]
    fn replace_round_trips_in_file_order() {
        let td = tempfile::tempdir().expect("tempdir");
        let store = store(td.path(), LoadMode::Lenient);
        let tasks = vec![sample("one", 1), sample("two", 2)];

        let path = store.incomplete_path();
        store.persist(&path, &tasks, WriteMode::Replace).unwrap();
        assert_eq!(store.load(&path).unwrap(), tasks);

        // Replace truncates the previous contents.
        let shorter = vec![sample("three", 1)];
        store.persist(&path, &shorter, WriteMode::Replace).unwrap();
        assert_eq!(store.load(&path).unwrap(), shorter);
    }

    #[test]
    fn append_extends_without_rewriting() {
        let td = tempfile::tempdir().expect("tempdir");
        let store = store(td.path(), LoadMode::Lenient);
        let path = store.completed_path();

        store
            .persist(&path, &[sample("one", 1)], WriteMode::Append)
            .unwrap();
        store
            .persist(&path, &[sample("two", 1)], WriteMode::Append)
            .unwrap();

        let loaded = store.load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].text, "one");
        assert_eq!(loaded[1].text, "two");
    }

    #[test]
    fn missing_file_loads_empty_in_both_modes() {
        let td = tempfile::tempdir().expect("tempdir");
        for mode in [LoadMode::Lenient, LoadMode::Strict] {
            let store = store(td.path(), mode);
            assert!(store.load(&store.incomplete_path()).unwrap().is_empty());
        }
    }

    #[test]
    fn lenient_malformed_file_loads_empty() {
        let td = tempfile::tempdir().expect("tempdir");
        let store = store(td.path(), LoadMode::Lenient);
        let path = store.incomplete_path();
        std::fs::write(&path, "{\"text\":\"ok\",\"index\":1}\nnot json\n").unwrap();
        assert!(store.load(&path).unwrap().is_empty());
    }

    #[test]
    fn strict_malformed_file_is_an_error() {
        let td = tempfile::tempdir().expect("tempdir");
        let store = store(td.path(), LoadMode::Strict);
        let path = store.incomplete_path();
        std::fs::write(&path, "{\"text\":\"ok\",\"index\":1}\nnot json\n").unwrap();

        let err = store.load(&path).unwrap_err().to_string();
        assert!(err.contains("line") || err.contains(":2"), "{err}");
    }

    #[test]
    fn log_lines_carry_a_timestamp_prefix() {
        let td = tempfile::tempdir().expect("tempdir");
        let store = store(td.path(), LoadMode::Lenient);
        assert!(store.read_log().is_none());

        store.append_log("Added task \"x\".").unwrap();
        let lines = store.read_log().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("| Added task \"x\"."));
        // HH:MM DD-MM-YY prefix
        assert_eq!(lines[0].split(" | ").next().unwrap().len(), 14);
    }
}
