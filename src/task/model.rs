#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

pub const MAX_PRIORITY: u8 = 4;

// Minute precision. Task records carry `HH:MM YY-MM-DD`; log lines are
// prefixed with `HH:MM DD-MM-YY` for historical compatibility.
const TASK_TIMESTAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute] [year repr:last_two]-[month]-[day]");
const LOG_TIMESTAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute] [day]-[month]-[year repr:last_two]");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub text: String,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub priority: u8,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
}

impl Task {
    /// Index stays 0 until the store assigns a position. Text validation
    /// is the caller's job.
    #[must_use]
    pub fn new(text: impl Into<String>, priority: u8) -> Self {
        Self {
            text: text.into(),
            index: 0,
            priority,
            start_time: timestamp(),
            end_time: String::new(),
        }
    }

    /// Stamps `end_time`. Only called during the completion transition;
    /// calling it again would overwrite the stamp.
    pub fn mark_complete(&mut self) {
        self.end_time = timestamp();
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.end_time.is_empty()
    }

    /// `"{index}. *P{priority}* {text}"`, omitting the index segment when
    /// hidden or unassigned and the priority segment when 0.
    #[must_use]
    pub fn render_compact(&self, show_index: bool) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(3);
        if show_index && self.index != 0 {
            parts.push(format!("{}.", self.index));
        }
        if self.priority != 0 {
            parts.push(format!("*P{}*", self.priority));
        }
        parts.push(self.text.clone());
        parts.join(" ")
    }

    /// Present-only labeled fields joined by `" - "`; the task text is
    /// always present.
    #[must_use]
    pub fn render_verbose(&self, show_index: bool) -> String {
        let mut parts: Vec<String> = Vec::new();
        if show_index && self.index != 0 {
            parts.push(format!("Index: {}", self.index));
        }
        if self.priority != 0 {
            parts.push(format!("Priority: {}", self.priority));
        }
        parts.push(format!("Task: {}", self.text));
        if !self.start_time.is_empty() {
            parts.push(format!("Start Time: {}", self.start_time));
        }
        if !self.end_time.is_empty() {
            parts.push(format!("End Time: {}", self.end_time));
        }
        parts.join(" - ")
    }
}

#[must_use]
pub fn timestamp() -> String {
    now_local().format(TASK_TIMESTAMP).unwrap_or_default()
}

#[must_use]
pub fn log_timestamp() -> String {
    now_local().format(LOG_TIMESTAMP).unwrap_or_default()
}

fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(index: u32, priority: u8) -> Task {
        Task {
            text: "water the plants".to_owned(),
            index,
            priority,
            start_time: "09:30 26-08-24".to_owned(),
            end_time: String::new(),
        }
    }

    #[test]
    fn compact_rendering_omits_empty_segments() {
        assert_eq!(task(3, 2).render_compact(true), "3. *P2* water the plants");
        assert_eq!(task(3, 0).render_compact(true), "3. water the plants");
        assert_eq!(task(3, 2).render_compact(false), "*P2* water the plants");
        assert_eq!(task(0, 0).render_compact(true), "water the plants");
    }

    #[test]
    fn verbose_rendering_orders_fields() {
        let mut t = task(1, 4);
        t.end_time = "11:45 26-08-24".to_owned();
        assert_eq!(
            t.render_verbose(true),
            "Index: 1 - Priority: 4 - Task: water the plants - \
             Start Time: 09:30 26-08-24 - End Time: 11:45 26-08-24"
        );

        let mut bare = task(0, 0);
        bare.start_time.clear();
        assert_eq!(bare.render_verbose(true), "Task: water the plants");
    }

    #[test]
    fn serde_round_trip_preserves_all_fields() {
        let mut t = task(7, 1);
        t.mark_complete();
        let line = serde_json::to_string(&t).unwrap();
        let back: Task = serde_json::from_str(&line).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn deserialize_accepts_exactly_the_serialized_shape() {
        let t: Task = serde_json::from_str(
            r#"{"text":"a","index":2,"priority":3,"start_time":"09:00 26-08-24","end_time":""}"#,
        )
        .unwrap();
        assert_eq!(t.index, 2);
        assert_eq!(t.priority, 3);
        assert!(!t.is_complete());
    }

    #[test]
    fn timestamp_is_minute_precision() {
        let ts = timestamp();
        // HH:MM YY-MM-DD
        assert_eq!(ts.len(), 14);
        assert_eq!(&ts[2..3], ":");
        assert_eq!(&ts[5..6], " ");
        assert_eq!(&ts[8..9], "-");
        assert_eq!(&ts[11..12], "-");
    }

    #[test]
    fn mark_complete_stamps_end_time() {
        let mut t = task(1, 0);
        assert!(!t.is_complete());
        t.mark_complete();
        assert!(t.is_complete());
        assert_eq!(t.end_time.len(), 14);
    }
}
