use framerelay_protocol::constants::ANY_ORIGIN;
use framerelay_protocol::{Level, LevelMask};
use serde::{Deserialize, Serialize};

/// Frame-side relay options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRelayOptions {
    /// Origin the parent must have for a message to be delivered; `"*"`
    /// delivers to any parent.
    #[serde(default = "default_target_origin")]
    pub target_origin: String,

    /// Tag echoed on every envelope, letting a host tell frames apart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Also relay uncaught errors and unhandled rejections.
    #[serde(default = "default_true")]
    pub capture_global_errors: bool,

    /// Console methods to wrap.
    #[serde(default = "default_levels")]
    pub levels: Vec<Level>,
}

fn default_target_origin() -> String {
    ANY_ORIGIN.into()
}

fn default_true() -> bool {
    true
}

fn default_levels() -> Vec<Level> {
    Level::ALL.to_vec()
}

impl Default for FrameRelayOptions {
    fn default() -> Self {
        Self {
            target_origin: default_target_origin(),
            session_id: None,
            capture_global_errors: default_true(),
            levels: default_levels(),
        }
    }
}

impl FrameRelayOptions {
    pub fn with_target_origin(mut self, origin: impl Into<String>) -> Self {
        self.target_origin = origin.into();
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_levels(mut self, levels: impl IntoIterator<Item = Level>) -> Self {
        self.levels = levels.into_iter().collect();
        self
    }

    pub fn with_global_errors(mut self, capture: bool) -> Self {
        self.capture_global_errors = capture;
        self
    }

    /// Selected levels with duplicates removed.
    pub fn level_mask(&self) -> LevelMask {
        self.levels.iter().collect()
    }
}
