use std::fmt;

use serde::Serialize;

/// What kind of argument an operator expects. These tags are metadata for
/// rule-authoring tools; the engine never branches on them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputShape {
    Text,
    Numeric,
    NoInput,
    Select,
    SelectMultiple,
    Dataframe,
}

impl InputShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Numeric => "numeric",
            Self::NoInput => "no_input",
            Self::Select => "select",
            Self::SelectMultiple => "select_multiple",
            Self::Dataframe => "dataframe",
        }
    }
}

impl fmt::Display for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog record, as exported to rule-authoring tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorMeta {
    pub name: &'static str,
    pub label: String,
    pub input_shape: InputShape,
}
