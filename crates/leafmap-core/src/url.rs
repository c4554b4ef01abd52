//! Shareable dashboard paths
//!
//! A view is addressed as `/`, `/{district}`, `/{district}/{block}` or
//! `/{district}/{block}/{gp}`. Segments are percent-encoded; a third segment
//! implies gram-panchayat level.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};

use crate::error::{LeafError, Result};
use crate::models::{Level, ViewState};
use crate::state::Action;

/// First segments owned by other routes
pub const RESERVED_SEGMENTS: [&str; 3] = ["api", "static", "health"];

const MAX_SEGMENTS: usize = 3;

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Location addressed by a dashboard path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewPath {
    pub district: String,
    pub block: String,
    pub gp: String,
}

impl ViewPath {
    pub fn from_view(view: &ViewState) -> Self {
        if view.district.is_empty() {
            return Self::default();
        }
        let block = view.block.clone();
        let gp = if view.level == Level::Gp && !block.is_empty() { view.gp.clone() } else { String::new() };
        Self { district: view.district.clone(), block, gp }
    }

    pub fn level(&self) -> Level {
        if self.gp.is_empty() {
            Level::Block
        } else {
            Level::Gp
        }
    }

    pub fn is_root(&self) -> bool {
        self.district.is_empty()
    }

    pub fn to_path(&self) -> String {
        let mut path = String::from("/");
        if self.district.is_empty() {
            return path;
        }
        path.push_str(&encode(&self.district));
        if !self.block.is_empty() {
            path.push('/');
            path.push_str(&encode(&self.block));
            if !self.gp.is_empty() {
                path.push('/');
                path.push_str(&encode(&self.gp));
            }
        }
        path
    }

    /// Parse a request path; query string and fragment are ignored
    pub fn parse(path: &str) -> Result<Self> {
        let invalid = |reason: &str| LeafError::InvalidUrl { path: path.to_string(), reason: reason.to_string() };

        let without_query = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = without_query.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        let raw: Vec<&str> = trimmed.split('/').collect();
        if raw.len() > MAX_SEGMENTS {
            return Err(invalid("too many segments"));
        }
        if raw.iter().any(|s| s.is_empty()) {
            return Err(invalid("empty segment"));
        }
        if RESERVED_SEGMENTS.contains(&raw[0]) {
            return Err(invalid("reserved prefix"));
        }

        let mut segments = Vec::with_capacity(raw.len());
        for segment in raw {
            let decoded = percent_decode_str(segment)
                .decode_utf8()
                .map_err(|_| invalid("segment is not valid UTF-8"))?;
            if decoded.trim().is_empty() {
                return Err(invalid("blank segment"));
            }
            segments.push(decoded.into_owned());
        }

        let mut segments = segments.into_iter();
        Ok(Self {
            district: segments.next().unwrap_or_default(),
            block: segments.next().unwrap_or_default(),
            gp: segments.next().unwrap_or_default(),
        })
    }

    /// Actions that rebuild this location from a fresh dashboard
    pub fn replay_actions(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.district.is_empty() {
            return actions;
        }
        actions.push(Action::SelectDistrict { name: self.district.clone() });
        if !self.block.is_empty() {
            actions.push(Action::SelectBlock { name: self.block.clone() });
            if !self.gp.is_empty() {
                actions.push(Action::SelectGp { name: self.gp.clone() });
            }
        }
        actions
    }
}

/// Path for the location of a view
pub fn to_path(view: &ViewState) -> String {
    ViewPath::from_view(view).to_path()
}

fn encode(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Entries written to the browser history during a page session
///
/// While `suppressed` is set nothing is recorded; hydration uses this so that
/// restoring a deep link produces a single entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlHistory {
    entries: Vec<String>,
    suppressed: bool,
}

impl UrlHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `path` unless suppressed or equal to the current entry
    pub fn push(&mut self, path: String) -> bool {
        if self.suppressed || self.current() == Some(path.as_str()) {
            return false;
        }
        tracing::debug!(path = %path, "Pushing history entry");
        self.entries.push(path);
        true
    }

    /// Overwrite the current entry, or create it
    pub fn replace(&mut self, path: String) {
        match self.entries.last_mut() {
            Some(last) => *last = path,
            None => self.entries.push(path),
        }
    }

    pub fn suppress(&mut self) {
        self.suppressed = true;
    }

    pub fn resume(&mut self) {
        self.suppressed = false;
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gp_view() -> ViewState {
        ViewState {
            level: Level::Gp,
            district: "Tinsukia".into(),
            block: "Margherita".into(),
            gp: "Bogapani".into(),
            ..ViewState::default()
        }
    }

    #[test]
    fn test_to_path_by_depth() {
        let mut view = gp_view();
        assert_eq!(to_path(&view), "/Tinsukia/Margherita/Bogapani");

        view.level = Level::Block;
        assert_eq!(to_path(&view), "/Tinsukia/Margherita");

        view.block.clear();
        assert_eq!(to_path(&view), "/Tinsukia");

        view.district.clear();
        assert_eq!(to_path(&view), "/");
    }

    #[test]
    fn test_segments_are_percent_encoded() {
        let view = ViewState {
            district: "Dima Hasao".into(),
            block: "Diyungbra/North".into(),
            ..ViewState::default()
        };
        let path = to_path(&view);
        assert_eq!(path, "/Dima%20Hasao/Diyungbra%2FNorth");

        let parsed = ViewPath::parse(&path).unwrap();
        assert_eq!(parsed.district, "Dima Hasao");
        assert_eq!(parsed.block, "Diyungbra/North");
    }

    #[test]
    fn test_parse_levels() {
        assert!(ViewPath::parse("/").unwrap().is_root());
        assert!(ViewPath::parse("").unwrap().is_root());

        let parsed = ViewPath::parse("/Tinsukia/Margherita/Bogapani?x=1").unwrap();
        assert_eq!(parsed.level(), Level::Gp);
        assert_eq!(parsed.gp, "Bogapani");

        let parsed = ViewPath::parse("/Tinsukia/").unwrap();
        assert_eq!(parsed.level(), Level::Block);
        assert_eq!(parsed.district, "Tinsukia");
        assert!(parsed.block.is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_paths() {
        assert!(matches!(ViewPath::parse("/a/b/c/d"), Err(LeafError::InvalidUrl { .. })));
        assert!(matches!(ViewPath::parse("/api/locations"), Err(LeafError::InvalidUrl { .. })));
        assert!(matches!(ViewPath::parse("/health"), Err(LeafError::InvalidUrl { .. })));
        assert!(matches!(ViewPath::parse("/a//b"), Err(LeafError::InvalidUrl { .. })));
        assert!(matches!(ViewPath::parse("/%FF"), Err(LeafError::InvalidUrl { .. })));
    }

    #[test]
    fn test_replay_actions() {
        let actions = ViewPath::parse("/Tinsukia/Margherita/Bogapani").unwrap().replay_actions();
        assert_eq!(
            actions,
            vec![
                Action::SelectDistrict { name: "Tinsukia".into() },
                Action::SelectBlock { name: "Margherita".into() },
                Action::SelectGp { name: "Bogapani".into() },
            ]
        );
        assert!(ViewPath::default().replay_actions().is_empty());
    }

    #[test]
    fn test_history_suppression() {
        let mut history = UrlHistory::new();
        assert!(history.push("/".into()));
        assert!(!history.push("/".into()));

        history.suppress();
        assert!(!history.push("/Tinsukia".into()));
        assert_eq!(history.len(), 1);

        history.resume();
        history.replace("/Tinsukia/Margherita".into());
        assert_eq!(history.entries(), ["/Tinsukia/Margherita".to_string()]);
    }
}
