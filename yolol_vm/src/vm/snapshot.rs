use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::VmState;
use crate::value::Value;

/// Point-in-time view of a VM, for tooling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmSnapshot {
    pub state: VmState,
    pub current_line: usize,
    pub executed_lines: u64,
    /// Variables held by the VM itself, sorted by name
    pub variables: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let mut variables = BTreeMap::new();
        variables.insert("a".to_string(), Value::from(2_i64));
        variables.insert(":s".to_string(), Value::from("hi"));
        let snapshot = VmSnapshot {
            state: VmState::Paused,
            current_line: 3,
            executed_lines: 2,
            variables,
            last_error: None,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(
            json,
            r#"{"state":"Paused","current_line":3,"executed_lines":2,"variables":{":s":"hi","a":2.0}}"#
        );
        let back: VmSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
