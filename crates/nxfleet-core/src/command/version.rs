// `show version`

use serde_json::{Map, Value};

use super::{NA_STR, RefreshState, ShowCommand, str_field};

#[derive(Debug, Clone, Default)]
pub struct ShowVersion {
    record: Option<Map<String, Value>>,
    state: RefreshState,
}

impl ShowVersion {
    pub fn new() -> Self {
        Self::default()
    }

    fn field(&self, keys: &[&str]) -> String {
        self.record
            .as_ref()
            .filter(|_| self.state.is_ready())
            .and_then(|r| keys.iter().find_map(|k| str_field(r, k)).filter(|v| !v.is_empty()))
            .unwrap_or_else(|| NA_STR.to_owned())
    }

    pub fn bios_ver_str(&self) -> String {
        self.field(&["bios_ver_str"])
    }

    /// Older images only report `kickstart_ver_str`.
    pub fn nxos_ver_str(&self) -> String {
        self.field(&["nxos_ver_str", "kickstart_ver_str"])
    }

    pub fn hostname(&self) -> String {
        self.field(&["host_name", "hostname"])
    }
}

impl ShowCommand for ShowVersion {
    fn cli(&self) -> String {
        "show version".into()
    }

    fn load(&mut self, body: Option<&Value>) -> Result<(), String> {
        let record = body
            .and_then(Value::as_object)
            .ok_or_else(|| "missing version body".to_owned())?;
        self.record = Some(record.clone());
        Ok(())
    }

    fn clear(&mut self) {
        self.record = None;
    }

    fn refresh_state(&self) -> &RefreshState {
        &self.state
    }

    fn set_refresh_state(&mut self, state: RefreshState) {
        self.state = state;
    }
}
