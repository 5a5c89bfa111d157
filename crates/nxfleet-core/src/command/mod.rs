//! Typed `show` commands.
//!
//! Each command builds its CLI string from its inputs, runs it through an
//! [`NxapiSession`], and projects fields out of the returned body. After a
//! failed [`refresh`](ShowCommand::refresh) every accessor returns a
//! sentinel ([`NA_STR`], [`NA_INT`], [`NA_BOOL`]) so formatters never
//! branch on missing data.

pub mod arp;
pub mod dir;
pub mod interface;
pub mod version;

use std::fmt;

use nxfleet_api::{CliMethod, NxapiSession, ResponseView, ResultCode};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ErrorKind;

pub use arp::{ArpEntry, IpArp};
pub use dir::{Dir, FileEntry};
pub use interface::{ErrorCount, InterfaceErrors, ShowInterface};
pub use version::ShowVersion;

pub const NA_STR: &str = "na";
pub const NA_INT: i64 = -1;
pub const NA_BOOL: bool = false;

// ── Refresh bookkeeping ─────────────────────────────────────────────

/// Why the last refresh failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: ErrorKind,
    /// Transport result code, if the failure came from the switch.
    pub code: Option<ResultCode>,
    pub message: String,
}

impl Failure {
    fn from_view(view: &ResponseView) -> Self {
        Self {
            kind: ErrorKind::from_result_code(view.result_code),
            code: Some(view.result_code),
            message: format!("'{}' failed ({}): {}", view.command, view.result_code, view.message()),
        }
    }

    fn semantic(cli: &str, reason: &str) -> Self {
        Self {
            kind: ErrorKind::Semantic,
            code: None,
            message: format!("'{cli}' returned unusable data: {reason}"),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of the most recent refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RefreshState {
    #[default]
    Pending,
    Ready,
    Failed(Failure),
}

impl RefreshState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

// ── Command trait ───────────────────────────────────────────────────

pub trait ShowCommand: Send {
    /// The CLI line sent to the switch.
    fn cli(&self) -> String;

    /// Parse a successful body. `Err` means the data is unusable.
    fn load(&mut self, body: Option<&Value>) -> Result<(), String>;

    /// Forget data from a previous refresh.
    fn clear(&mut self);

    fn refresh_state(&self) -> &RefreshState;

    fn set_refresh_state(&mut self, state: RefreshState);

    /// Run the command. `true` iff every response was a success and the
    /// body could be loaded.
    fn refresh(&mut self, session: &mut NxapiSession) -> impl Future<Output = bool> + Send
    where
        Self: Sized,
    {
        async move {
            self.clear();
            let cli = self.cli();
            let state = match session.exec(CliMethod::Cli, &[cli.as_str()]).await {
                Err(e) => RefreshState::Failed(Failure {
                    kind: ErrorKind::Semantic,
                    code: None,
                    message: e.to_string(),
                }),
                Ok(views) => match views.iter().find(|v| !v.is_success()) {
                    Some(view) => RefreshState::Failed(Failure::from_view(view)),
                    None => match self.load(views.first().and_then(|v| v.body.as_ref())) {
                        Ok(()) => RefreshState::Ready,
                        Err(reason) => {
                            self.clear();
                            RefreshState::Failed(Failure::semantic(&cli, &reason))
                        }
                    },
                },
            };
            debug!(command = %cli, ok = state.is_ready(), "refresh");
            let ok = state.is_ready();
            self.set_refresh_state(state);
            ok
        }
    }

    /// Failure of the last refresh, if any.
    fn failure(&self) -> Option<&Failure> {
        self.refresh_state().failure()
    }
}

// ── Body helpers ────────────────────────────────────────────────────

/// Rows of an NX-API `TABLE_x`/`ROW_x` pair as a list.
///
/// The body may be absent, the row may be a single object or an array,
/// and some releases wrap the table itself in an array.
pub fn normalize_rows<'a>(body: Option<&'a Value>, table: &str, row: &str) -> Vec<&'a Map<String, Value>> {
    table_rows(body.and_then(|b| b.get(table)), row)
}

/// Rows under an already-selected `TABLE_x` value.
pub fn table_rows<'a>(table: Option<&'a Value>, row: &str) -> Vec<&'a Map<String, Value>> {
    let Some(table) = table else {
        return Vec::new();
    };
    let tables: Vec<&Value> = match table {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    tables
        .into_iter()
        .filter_map(|t| t.get(row))
        .flat_map(|rows| match rows {
            Value::Array(items) => items.iter().filter_map(Value::as_object).collect::<Vec<_>>(),
            Value::Object(map) => vec![map],
            _ => Vec::new(),
        })
        .collect()
}

/// String field; numbers are rendered.
pub fn str_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Integer field; numeric strings are accepted.
pub fn int_field(record: &Map<String, Value>, key: &str) -> Option<i64> {
    match record.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn rows_absent_single_or_list() {
        assert!(normalize_rows(None, "TABLE_x", "ROW_x").is_empty());

        let empty = json!({});
        assert!(normalize_rows(Some(&empty), "TABLE_x", "ROW_x").is_empty());

        let single = json!({ "TABLE_x": { "ROW_x": { "a": 1 } } });
        assert_eq!(normalize_rows(Some(&single), "TABLE_x", "ROW_x").len(), 1);

        let list = json!({ "TABLE_x": { "ROW_x": [{ "a": 1 }, { "a": 2 }] } });
        let rows = normalize_rows(Some(&list), "TABLE_x", "ROW_x");
        assert_eq!(rows.len(), 2);
        assert_eq!(int_field(rows[1], "a"), Some(2));
    }

    #[test]
    fn rows_inside_wrapped_tables() {
        let body = json!({ "TABLE_x": [{ "ROW_x": { "a": 1 } }, { "ROW_x": [{ "a": 2 }] }] });
        assert_eq!(normalize_rows(Some(&body), "TABLE_x", "ROW_x").len(), 2);
    }

    #[test]
    fn field_coercion() {
        let record = json!({ "n": "42", "s": 7, "x": null }).as_object().cloned().unwrap();
        assert_eq!(int_field(&record, "n"), Some(42));
        assert_eq!(str_field(&record, "s").as_deref(), Some("7"));
        assert_eq!(str_field(&record, "x"), None);
        assert_eq!(int_field(&record, "missing"), None);
    }
}
