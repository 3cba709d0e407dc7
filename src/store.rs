//! Key/value state shared between installer steps.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;

/// Desktop id picked by the package chooser.
pub const KEY_SELECTION: &str = "packagechooser_packagechooser";
/// List of `{ "install": [...] }` records consumed by the packages stage.
pub const KEY_PACKAGE_OPERATIONS: &str = "packageOperations";
/// Display manager of the validated desktop choice.
pub const KEY_DISPLAY_MANAGER: &str = "displayManager";
/// Login name set by the users step.
pub const KEY_USERNAME: &str = "username";

pub type SharedStorage = Rc<RefCell<GlobalStorage>>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlobalStorage {
    values: BTreeMap<String, Value>,
}

impl GlobalStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedStorage {
        Rc::new(RefCell::new(self))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// String value for `key`; missing, null and non-string values read as empty.
    pub fn string(&self, key: &str) -> String {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.values.clone().into_iter().collect())
    }
}
