// `dir <path>`

use std::collections::BTreeMap;

use serde_json::Value;

use super::{NA_BOOL, NA_INT, NA_STR, RefreshState, ShowCommand, int_field, normalize_rows, str_field};

pub const DEFAULT_PATH: &str = "bootflash:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub size: i64,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct Dir {
    path: String,
    files: BTreeMap<String, FileEntry>,
    bytes_used: Option<i64>,
    bytes_free: Option<i64>,
    bytes_total: Option<i64>,
    state: RefreshState,
}

impl Default for Dir {
    fn default() -> Self {
        Self {
            path: DEFAULT_PATH.into(),
            files: BTreeMap::new(),
            bytes_used: None,
            bytes_free: None,
            bytes_total: None,
            state: RefreshState::default(),
        }
    }
}

impl Dir {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filesystem path to list, e.g. `bootflash:` or `bootflash:scripts`.
    pub fn set_input(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Files keyed by name; `None` unless the last refresh succeeded.
    pub fn files(&self) -> Option<&BTreeMap<String, FileEntry>> {
        self.state.is_ready().then_some(&self.files)
    }

    /// Whether `name` was listed. Always false after a failed refresh.
    pub fn contains(&self, name: &str) -> bool {
        self.files().map_or(NA_BOOL, |files| files.contains_key(name))
    }

    fn usage(&self, value: Option<i64>) -> i64 {
        value.filter(|_| self.state.is_ready()).unwrap_or(NA_INT)
    }

    pub fn bytes_used(&self) -> i64 {
        self.usage(self.bytes_used)
    }

    pub fn bytes_free(&self) -> i64 {
        self.usage(self.bytes_free)
    }

    pub fn bytes_total(&self) -> i64 {
        self.usage(self.bytes_total)
    }
}

impl ShowCommand for Dir {
    fn cli(&self) -> String {
        format!("dir {}", self.path)
    }

    fn load(&mut self, body: Option<&Value>) -> Result<(), String> {
        for row in normalize_rows(body, "TABLE_dir", "ROW_dir") {
            let Some(name) = str_field(row, "fname").filter(|n| !n.is_empty()) else {
                continue;
            };
            let entry = FileEntry {
                size: int_field(row, "fsize").unwrap_or(NA_INT),
                timestamp: str_field(row, "timestamp").unwrap_or_else(|| NA_STR.to_owned()),
            };
            self.files.insert(name, entry);
        }
        if let Some(body) = body.and_then(Value::as_object) {
            self.bytes_used = int_field(body, "bytesused");
            self.bytes_free = int_field(body, "bytesfree");
            self.bytes_total = int_field(body, "bytestotal");
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.files.clear();
        self.bytes_used = None;
        self.bytes_free = None;
        self.bytes_total = None;
    }

    fn refresh_state(&self) -> &RefreshState {
        &self.state
    }

    fn set_refresh_state(&mut self, state: RefreshState) {
        self.state = state;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn files_keyed_by_name() {
        let body = json!({
            "TABLE_dir": {
                "ROW_dir": [
                    { "fsize": 1_234_567, "timestamp": "Mar 03 10:00:00 2024", "fname": "nxos.9.3.10.bin" },
                    { "fsize": "4096", "timestamp": "Jan 01 00:00:00 2024", "fname": "scripts/" }
                ]
            },
            "bytesused": 100,
            "bytesfree": 900,
            "bytestotal": 1000
        });
        let mut cmd = Dir::new();
        cmd.set_input("bootflash:");
        assert_eq!(cmd.cli(), "dir bootflash:");
        cmd.load(Some(&body)).unwrap();
        cmd.set_refresh_state(RefreshState::Ready);

        let files = cmd.files().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files["nxos.9.3.10.bin"].size, 1_234_567);
        assert_eq!(files["scripts/"].size, 4096);
        assert_eq!(cmd.bytes_free(), 900);
        assert!(cmd.contains("scripts/"));
        assert!(!cmd.contains("missing.bin"));
    }

    #[test]
    fn sentinels_after_failure() {
        let cmd = Dir::new();
        assert!(cmd.files().is_none());
        assert_eq!(cmd.bytes_total(), NA_INT);
        assert_eq!(cmd.contains("nxos.bin"), NA_BOOL);
    }
}
