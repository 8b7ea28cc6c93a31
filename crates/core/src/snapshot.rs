use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BoardSnapshot {
    pub controller: ControllerSnapshot,
    pub devices: BTreeMap<String, serde_json::Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ControllerSnapshot {
    pub phase: String,
    /// Switch value last answered by the main loop, if it has answered one.
    pub last_switches: Option<u32>,
}
