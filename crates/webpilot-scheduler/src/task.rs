//! Scheduled tasks.

use std::str::FromStr;

use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use webpilot_protocols::{Action, ScheduleSpec};

use crate::error::SchedulerError;

/// When a task fires.
///
/// Serialized flat into the task as `schedule_type` plus its field:
/// `{"schedule_type": "interval", "interval": 60}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "schedule_type", rename_all = "snake_case")]
pub enum Schedule {
    Interval {
        #[serde(rename = "interval")]
        seconds: u64,
    },
    Cron {
        #[serde(rename = "cron")]
        expression: String,
    },
    Once,
}

impl Schedule {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Interval { .. } => "interval",
            Self::Cron { .. } => "cron",
            Self::Once => "once",
        }
    }
}

/// Parse a standard five-field cron expression.
///
/// The `cron` crate wants seconds first, so a `0` seconds field is
/// prepended.
pub fn parse_cron(expression: &str) -> Result<cron::Schedule, SchedulerError> {
    let fields = expression.split_whitespace().count();
    if fields != 5 {
        return Err(SchedulerError::InvalidCron {
            expression: expression.to_string(),
            reason: format!("expected 5 fields, got {}", fields),
        });
    }
    cron::Schedule::from_str(&format!("0 {}", expression.trim())).map_err(|e| {
        SchedulerError::InvalidCron {
            expression: expression.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Parse an ISO-8601 timestamp. Times without an offset are local.
pub fn parse_time(value: &str) -> Result<DateTime<Utc>, SchedulerError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| SchedulerError::InvalidTime(value.to_string()))
}

fn parse_optional_time(value: Option<&String>) -> Result<Option<DateTime<Utc>>, SchedulerError> {
    value
        .map(|s| s.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(parse_time)
        .transpose()
}

/// A named batch of actions and when to run it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub name: String,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(flatten)]
    pub schedule: Schedule,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_runs: Option<u32>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub run_count: u32,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_error: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl Task {
    pub fn new(
        task_id: impl Into<String>,
        name: impl Into<String>,
        schedule: Schedule,
        actions: Vec<Action>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            name: name.into(),
            actions,
            schedule,
            start_time: None,
            end_time: None,
            max_runs: None,
            enabled: true,
            run_count: 0,
            last_run: None,
            next_run: None,
            last_error: None,
        }
    }

    /// Build a task from the parameters of a `schedule` action. Missing ids
    /// get a fresh one.
    pub fn from_spec(spec: &ScheduleSpec) -> Result<Self, SchedulerError> {
        let schedule = match spec.schedule_type.trim().to_lowercase().as_str() {
            "interval" => {
                if spec.interval == 0 {
                    return Err(SchedulerError::InvalidSchedule(
                        "interval must be at least 1 second".to_string(),
                    ));
                }
                Schedule::Interval {
                    seconds: spec.interval,
                }
            }
            "cron" => {
                let expression = spec
                    .cron
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .ok_or_else(|| SchedulerError::InvalidCron {
                        expression: String::new(),
                        reason: "cron schedule needs an expression".to_string(),
                    })?;
                parse_cron(expression)?;
                Schedule::Cron {
                    expression: expression.to_string(),
                }
            }
            "once" => Schedule::Once,
            other => {
                return Err(SchedulerError::InvalidSchedule(format!(
                    "unknown schedule type: {}",
                    other
                )));
            }
        };

        let task_id = spec
            .task_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
        let name = spec
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Task {}", task_id));

        let mut task = Self::new(task_id, name, schedule, spec.actions.clone());
        task.start_time = parse_optional_time(spec.start_time.as_ref())?;
        task.end_time = parse_optional_time(spec.end_time.as_ref())?;
        task.max_runs = spec.max_runs;
        Ok(task)
    }

    pub fn with_start_time(mut self, start: DateTime<Utc>) -> Self {
        self.start_time = Some(start);
        self
    }

    pub fn with_end_time(mut self, end: DateTime<Utc>) -> Self {
        self.end_time = Some(end);
        self
    }

    pub fn with_max_runs(mut self, max_runs: u32) -> Self {
        self.max_runs = Some(max_runs);
        self
    }

    /// Enabled and `next_run` has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.next_run.is_some_and(|next| next <= now)
    }

    /// Compute the first `next_run`.
    pub fn schedule_next(&mut self, now: DateTime<Utc>) -> Result<(), SchedulerError> {
        self.next_run = match &self.schedule {
            Schedule::Interval { seconds } => {
                let next = after_interval(now, *seconds);
                match (self.start_time, next) {
                    (Some(start), Some(next)) => Some(start.max(next)),
                    (_, next) => next,
                }
            }
            Schedule::Cron { expression } => {
                let from = self.start_time.map_or(now, |start| start.max(now));
                parse_cron(expression)?.after(&from).next()
            }
            Schedule::Once => Some(self.start_time.filter(|start| *start > now).unwrap_or(now)),
        };
        debug!("Task {} next run: {:?}", self.task_id, self.next_run);
        Ok(())
    }

    fn max_runs_reached(&self) -> bool {
        self.max_runs.is_some_and(|max| self.run_count >= max)
    }

    fn past_end(&self, now: DateTime<Utc>) -> bool {
        self.end_time.is_some_and(|end| now > end)
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.next_run = None;
    }

    /// Whether the task may run at `now`. A task past its run limit or
    /// end time is disabled instead.
    pub fn check_limits(&mut self, now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return false;
        }
        if self.max_runs_reached() {
            info!("Task {} ({}) has reached its maximum number of runs", self.task_id, self.name);
            self.disable();
            return false;
        }
        if self.past_end(now) {
            info!("Task {} ({}) has reached its end time", self.task_id, self.name);
            self.disable();
            return false;
        }
        true
    }

    /// Book-keeping after a run that finished at `now`. `error` is the
    /// first failure, if any.
    pub fn record_run(&mut self, now: DateTime<Utc>, error: Option<String>) {
        self.run_count += 1;
        self.last_run = Some(now);
        self.last_error = error;

        match &self.schedule {
            Schedule::Interval { seconds } => {
                self.next_run = after_interval(now, *seconds);
            }
            Schedule::Cron { expression } => match parse_cron(expression) {
                Ok(schedule) => self.next_run = schedule.after(&now).next(),
                Err(e) => {
                    self.last_error = Some(e.to_string());
                    self.disable();
                }
            },
            Schedule::Once => self.disable(),
        }

        if self.max_runs_reached() || self.past_end(now) {
            self.disable();
        }
    }
}

fn after_interval(now: DateTime<Utc>, seconds: u64) -> Option<DateTime<Utc>> {
    let seconds = i64::try_from(seconds).ok()?;
    now.checked_add_signed(Duration::try_seconds(seconds)?)
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
