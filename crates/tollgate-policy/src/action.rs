use serde::{Deserialize, Serialize};

/// Operations the gateway asks the PDP about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    RegisterTemplate,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::RegisterTemplate => "register_template",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
