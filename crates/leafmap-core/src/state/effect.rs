use serde::{Deserialize, Serialize};

use crate::models::{Distribution, Level};
use crate::ports::FeasibilityRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailKind {
    Block,
    Gp,
}

/// A live mini-map instance in a detail panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniMapHandle {
    pub id: u64,
    pub kind: DetailKind,
    /// Block or GP name shown in the mini-map
    pub name: String,
}

/// A live distribution chart instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartHandle {
    pub id: u64,
}

/// Rendering-library lifecycle, in the order the adapter must apply it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RenderCommand {
    CreateMiniMap { handle: MiniMapHandle },
    DisposeMiniMap { handle: MiniMapHandle },
    RenderChart { handle: ChartHandle, distribution: Distribution },
    DisposeChart { handle: ChartHandle },
}

/// Work the session runtime performs after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadLayer { level: Level },
    LoadInterventionDefaults { name: String },
    /// `GET /gp/block/{name}` for the GP picker of the selected block
    LoadGpPicker { block: String },
    Classify { generation: u64, level: Level, request: FeasibilityRequest },
    Render(RenderCommand),
}
