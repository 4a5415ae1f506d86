//! Externally supplied methodology overrides

use serde::{Deserialize, Serialize};

/// An ordered list of steps that replaces a task type's default sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Methodology {
    pub name: String,
    pub steps: Vec<MethodologyStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodologyStep {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "data-needed")]
    pub data_needed: Vec<String>,
}
