use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClipFrame {
    pub clip_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transition {
    /// Seconds
    pub duration: f64,
    pub ease: String,
}

/// Entrance animation for the inventory table: the clip opens from the
/// centre outwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RevealAnimation {
    pub initial: ClipFrame,
    pub animate: ClipFrame,
    pub transition: Transition,
}

impl Default for RevealAnimation {
    fn default() -> Self {
        Self {
            initial: ClipFrame {
                clip_path: "inset(0 50% 0 50%)".to_string(),
            },
            animate: ClipFrame {
                clip_path: "inset(0 0% 0 0%)".to_string(),
            },
            transition: Transition {
                duration: 1.0,
                ease: "easeInOut".to_string(),
            },
        }
    }
}
