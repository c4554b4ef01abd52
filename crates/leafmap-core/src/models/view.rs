use serde::{Deserialize, Serialize};

/// Administrative level of the features on the main map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Block,
    Gp,
}

/// The single visible side panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Overview,
    BlockDetail,
    GpDetail,
}

/// Current location selection of the dashboard
///
/// Empty strings mean "nothing selected" at that depth.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub level: Level,
    pub district: String,
    pub block: String,
    pub gp: String,
    pub active_variable: Option<String>,
    pub in_initial_hydration: bool,
}

impl ViewState {
    pub fn panel(&self) -> Panel {
        if self.level == Level::Gp && !self.gp.is_empty() {
            Panel::GpDetail
        } else if !self.block.is_empty() {
            Panel::BlockDetail
        } else {
            Panel::Overview
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(level: Level, block: &str, gp: &str) -> ViewState {
        ViewState {
            level,
            district: "Tinsukia".into(),
            block: block.into(),
            gp: gp.into(),
            ..ViewState::default()
        }
    }

    #[test]
    fn test_panel_resolution() {
        assert_eq!(view(Level::Block, "", "").panel(), Panel::Overview);
        assert_eq!(view(Level::Block, "Margherita", "").panel(), Panel::BlockDetail);
        assert_eq!(view(Level::Gp, "Margherita", "").panel(), Panel::BlockDetail);
        assert_eq!(view(Level::Gp, "Margherita", "Bahbari").panel(), Panel::GpDetail);
        // A stray GP name at block level does not open the GP panel
        assert_eq!(view(Level::Block, "Margherita", "Bahbari").panel(), Panel::BlockDetail);
    }
}
