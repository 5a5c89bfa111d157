// `show ip arp vrf <vrf>`
//
// The body nests twice: TABLE_vrf/ROW_vrf, then TABLE_adj/ROW_adj per VRF.

use serde_json::{Map, Value};

use super::{NA_STR, RefreshState, ShowCommand, normalize_rows, str_field, table_rows};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpEntry {
    pub vrf: String,
    pub address: String,
    pub mac: String,
    pub interface: String,
    pub age: String,
}

#[derive(Debug, Clone)]
pub struct IpArp {
    vrf: String,
    entries: Vec<ArpEntry>,
    state: RefreshState,
}

impl Default for IpArp {
    fn default() -> Self {
        Self {
            vrf: "default".into(),
            entries: Vec::new(),
            state: RefreshState::default(),
        }
    }
}

impl IpArp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_input(&mut self, vrf: impl Into<String>) {
        self.vrf = vrf.into();
    }

    pub fn vrf(&self) -> &str {
        &self.vrf
    }

    pub fn entries(&self) -> &[ArpEntry] {
        if self.state.is_ready() { self.entries.as_slice() } else { &[] }
    }
}

fn text(row: &Map<String, Value>, key: &str) -> String {
    str_field(row, key).unwrap_or_else(|| NA_STR.to_owned())
}

impl ShowCommand for IpArp {
    fn cli(&self) -> String {
        format!("show ip arp vrf {}", self.vrf)
    }

    fn load(&mut self, body: Option<&Value>) -> Result<(), String> {
        for vrf_row in normalize_rows(body, "TABLE_vrf", "ROW_vrf") {
            let vrf = str_field(vrf_row, "vrf-name-out").unwrap_or_else(|| self.vrf.clone());
            for adj in table_rows(vrf_row.get("TABLE_adj"), "ROW_adj") {
                self.entries.push(ArpEntry {
                    vrf: vrf.clone(),
                    address: text(adj, "ip-addr-out"),
                    mac: text(adj, "mac"),
                    interface: text(adj, "intf-out"),
                    age: text(adj, "time-stamp"),
                });
            }
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.entries.clear();
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
    fn flattens_vrf_and_adjacency_tables() {
        let body = json!({
            "TABLE_vrf": {
                "ROW_vrf": {
                    "vrf-name-out": "default",
                    "TABLE_adj": {
                        "ROW_adj": [
                            {
                                "intf-out": "Vlan10",
                                "ip-addr-out": "10.10.0.5",
                                "time-stamp": "00:04:12",
                                "mac": "0050.56a1.0001"
                            },
                            {
                                "intf-out": "Ethernet1/1",
                                "ip-addr-out": "10.0.0.2",
                                "time-stamp": "00:00:30"
                            }
                        ]
                    }
                }
            }
        });
        let mut cmd = IpArp::new();
        cmd.load(Some(&body)).unwrap();
        cmd.set_refresh_state(RefreshState::Ready);

        let entries = cmd.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].address, "10.10.0.5");
        assert_eq!(entries[0].mac, "0050.56a1.0001");
        assert_eq!(entries[0].interface, "Vlan10");
        assert_eq!(entries[1].mac, NA_STR);
    }

    #[test]
    fn vrf_input_shapes_command() {
        let mut cmd = IpArp::new();
        assert_eq!(cmd.cli(), "show ip arp vrf default");
        cmd.set_input("management");
        assert_eq!(cmd.cli(), "show ip arp vrf management");
    }

    #[test]
    fn no_adjacencies() {
        let mut cmd = IpArp::new();
        cmd.load(Some(&json!({}))).unwrap();
        cmd.set_refresh_state(RefreshState::Ready);
        assert!(cmd.entries().is_empty());
    }
}
