use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;

use crate::number::Number;

type Scope = HashMap<String, Number>;

/// Env holds the variables assigned during one evaluation.
#[derive(Debug, Default)]
pub struct Env {
    bindings: Scope,
}

impl Env {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn bind(&mut self, key: &str, value: Number) {
        self.bindings.insert(key.to_string(), value);
    }

    pub fn lookup(&self, key: &str) -> Option<&Number> {
        self.bindings.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Env {{")?;
        write!(
            f,
            "{}",
            self.bindings
                .iter()
                .sorted_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(k, v)| format!("{} = {}", k, v))
                .format(", ")
        )?;
        write!(f, "}}")
    }
}
