use serde::{Deserialize, Serialize};

use crate::geom::Rect;

pub const RESIZE_HANDLE_SIZE: f64 = 8.0;
pub const CONNECT_HANDLE_RADIUS: f64 = 8.0;
pub const OPEN_ICON_SIZE: f64 = 14.0;
pub const EDGE_HIT_TOLERANCE: f64 = 10.0;
pub const MIN_NODE_WIDTH: f64 = 80.0;
pub const MIN_NODE_HEIGHT: f64 = 40.0;

/// The four card kinds the canvas visualizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Code,
    Theme,
    Insight,
    Annotation,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Code => "code",
            NodeKind::Theme => "theme",
            NodeKind::Insight => "insight",
            NodeKind::Annotation => "annotation",
        }
    }

    /// Codes and themes expose a connect handle; the relationship a drag
    /// from one of them proposes lands on the next tier up.
    pub fn connect_target(&self) -> Option<NodeKind> {
        match self {
            NodeKind::Code => Some(NodeKind::Theme),
            NodeKind::Theme => Some(NodeKind::Insight),
            NodeKind::Insight | NodeKind::Annotation => None,
        }
    }

    pub fn has_detail_view(&self) -> bool {
        !matches!(self, NodeKind::Annotation)
    }
}

/// Composite node identity: one node per (kind, entity id).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub kind: NodeKind,
    pub id: String,
}

impl NodeKey {
    pub fn new(kind: NodeKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// A highlight over a span of source text; the finest annotation unit.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Code {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// A named grouping of codes. `code_ids` is the relationship array the
/// canvas renders as theme→code edges.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// A named grouping of themes.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub theme_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Free-floating sticky note, outside the code/theme/insight hierarchy.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Everything the host's entity endpoints return for one project.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectData {
    #[serde(default)]
    pub codes: Vec<Code>,
    #[serde(default)]
    pub themes: Vec<Theme>,
    #[serde(default)]
    pub insights: Vec<Insight>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl ProjectData {
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
            && self.themes.is_empty()
            && self.insights.is_empty()
            && self.annotations.is_empty()
    }
}

/// Corner grabbed during a resize gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResizeCorner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Canvas-side representation of one entity: identity plus world geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub key: NodeKey,
    pub rect: Rect,
    pub label: String,
}

impl Node {
    pub fn new(kind: NodeKind, id: impl Into<String>, rect: Rect, label: impl Into<String>) -> Self {
        Self {
            key: NodeKey::new(kind, id),
            rect,
            label: label.into(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.key.kind
    }

    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        self.rect.contains(px, py)
    }

    /// Attachment point for edges leaving this node (as a parent).
    pub fn bottom_center(&self) -> (f64, f64) {
        (self.rect.x + self.rect.w / 2.0, self.rect.y + self.rect.h)
    }

    /// Attachment point for edges entering this node (as a child).
    pub fn top_center(&self) -> (f64, f64) {
        (self.rect.x + self.rect.w / 2.0, self.rect.y)
    }

    /// Connect handle sits on the trailing edge, vertically centered.
    pub fn connect_handle_center(&self) -> (f64, f64) {
        (self.rect.x + self.rect.w, self.rect.y + self.rect.h / 2.0)
    }

    /// Handle hit zone in world units; `tolerance` is the world-space radius
    /// (screen radius divided by zoom, so it stays constant on screen).
    pub fn connect_handle_at(&self, px: f64, py: f64, tolerance: f64) -> bool {
        if self.kind().connect_target().is_none() {
            return false;
        }
        let (hx, hy) = self.connect_handle_center();
        crate::geom::distance(px, py, hx, hy) <= tolerance
    }

    /// Open-icon hot zone: a square in the top-right corner, `size` per side
    /// in world units.
    pub fn open_icon_at(&self, px: f64, py: f64, size: f64) -> bool {
        if !self.kind().has_detail_view() {
            return false;
        }
        let zone = Rect::new(self.rect.x + self.rect.w - size, self.rect.y, size, size);
        zone.contains(px, py)
    }

    pub fn resize_corner_at(&self, px: f64, py: f64, handle_size: f64) -> Option<ResizeCorner> {
        let half = handle_size / 2.0;
        let corners = [
            (self.rect.x, self.rect.y, ResizeCorner::TopLeft),
            (self.rect.x + self.rect.w, self.rect.y, ResizeCorner::TopRight),
            (self.rect.x, self.rect.y + self.rect.h, ResizeCorner::BottomLeft),
            (
                self.rect.x + self.rect.w,
                self.rect.y + self.rect.h,
                ResizeCorner::BottomRight,
            ),
        ];
        for (cx, cy, corner) in corners {
            if px >= cx - half && px <= cx + half && py >= cy - half && py <= cy + half {
                return Some(corner);
            }
        }
        None
    }
}
