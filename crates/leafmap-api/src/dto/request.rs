use leafmap_core::state::Action;
use serde::Deserialize;

/// A dashboard location plus the actions to apply on top of it
#[derive(Debug, Deserialize)]
pub struct ViewRequest {
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

fn default_path() -> String {
    "/".to_string()
}
