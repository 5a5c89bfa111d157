// `show interface`
//
// Error counters per interface. Counters the interface type does not
// carry (mgmt, loopback, vlan) are reported as `na`.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use super::{NA_STR, RefreshState, ShowCommand, int_field, normalize_rows, str_field};

/// Counter name -> NX-API field.
pub const COUNTERS: [(&str, &str); 5] = [
    ("crc", "eth_crc"),
    ("inerr", "eth_inerr"),
    ("outerr", "eth_outerr"),
    ("runts", "eth_runts"),
    ("giants", "eth_giants"),
];

/// A counter value, or `Na` when the interface does not support it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCount {
    Count(i64),
    Na,
}

impl fmt::Display for ErrorCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Na => f.write_str(NA_STR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceErrors {
    pub name: String,
    pub errors: BTreeMap<&'static str, ErrorCount>,
}

impl InterfaceErrors {
    /// Counter by short name (`crc`, `inerr`, ...); `Na` if unknown.
    pub fn counter(&self, name: &str) -> ErrorCount {
        self.errors.get(name).copied().unwrap_or(ErrorCount::Na)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShowInterface {
    interfaces: Vec<InterfaceErrors>,
    state: RefreshState,
}

impl ShowInterface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interfaces in switch order. Empty after a failed refresh.
    pub fn interface_list(&self) -> &[InterfaceErrors] {
        if self.state.is_ready() { self.interfaces.as_slice() } else { &[] }
    }
}

impl ShowCommand for ShowInterface {
    fn cli(&self) -> String {
        "show interface".into()
    }

    fn load(&mut self, body: Option<&Value>) -> Result<(), String> {
        self.interfaces = normalize_rows(body, "TABLE_interface", "ROW_interface")
            .into_iter()
            .filter_map(|row| {
                let name = str_field(row, "interface")?;
                let errors = COUNTERS
                    .iter()
                    .map(|(short, field)| {
                        let count = int_field(row, field).map_or(ErrorCount::Na, ErrorCount::Count);
                        (*short, count)
                    })
                    .collect();
                Some(InterfaceErrors { name, errors })
            })
            .collect();
        Ok(())
    }

    fn clear(&mut self) {
        self.interfaces.clear();
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
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn counters_and_na() {
        let body = json!({
            "TABLE_interface": {
                "ROW_interface": [
                    {
                        "interface": "Ethernet1/1",
                        "eth_crc": 3,
                        "eth_inerr": "7",
                        "eth_outerr": 0,
                        "eth_runts": 0,
                        "eth_giants": 1
                    },
                    { "interface": "mgmt0", "eth_crc": 0 },
                    { "state": "up" }
                ]
            }
        });
        let mut cmd = ShowInterface::new();
        cmd.load(Some(&body)).unwrap();
        cmd.set_refresh_state(RefreshState::Ready);

        let list = cmd.interface_list();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "Ethernet1/1");
        assert_eq!(list[0].counter("crc"), ErrorCount::Count(3));
        assert_eq!(list[0].counter("inerr"), ErrorCount::Count(7));
        assert_eq!(list[1].counter("crc"), ErrorCount::Count(0));
        assert_eq!(list[1].counter("giants"), ErrorCount::Na);
        assert_eq!(list[1].counter("giants").to_string(), "na");
    }

    #[test]
    fn single_row_object() {
        let body = json!({ "TABLE_interface": { "ROW_interface": { "interface": "Ethernet1/1" } } });
        let mut cmd = ShowInterface::new();
        cmd.load(Some(&body)).unwrap();
        cmd.set_refresh_state(RefreshState::Ready);
        assert_eq!(cmd.interface_list().len(), 1);
    }

    #[test]
    fn empty_before_refresh() {
        let cmd = ShowInterface::new();
        assert!(cmd.interface_list().is_empty());
    }
}
