use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Persisted preset from `presets/<name>.yaml`
///
/// Holds the variable definitions and the search queue, in the shape
/// `{ variables: { <name>: [<expression>, ...] }, queue: [<name>, ...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(default)]
    pub variables: IndexMap<String, Vec<String>>,

    #[serde(default)]
    pub queue: Vec<String>,
}

impl Preset {
    /// Names in the queue that have no variable definition
    pub fn undefined_queue_entries(&self) -> Vec<&str> {
        self.queue
            .iter()
            .filter(|name| !self.variables.contains_key(name.as_str()))
            .map(String::as_str)
            .collect()
    }
}
