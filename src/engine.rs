//! The interaction engine: one owned object consuming pointer/keyboard
//! input and producing node geometry, selection state and collaborator
//! requests. All mutation of canvas state funnels through here; rendering
//! and IO live elsewhere.

use std::collections::HashMap;

use crate::geom::{self, Rect};
use crate::selection::{Selection, SelectionBounds};
use crate::state::{
    Annotation, Insight, Node, NodeKey, NodeKind, ProjectData, ResizeCorner, Theme,
    CONNECT_HANDLE_RADIUS, EDGE_HIT_TOLERANCE, MIN_NODE_HEIGHT, MIN_NODE_WIDTH, OPEN_ICON_SIZE,
    RESIZE_HANDLE_SIZE,
};
use crate::sync;
use crate::viewport::Viewport;

/// Active tool mode. Select is the default; Pan is also reachable by
/// holding space; Note drops annotations.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Tool {
    #[default]
    Select,
    Pan,
    Note,
}

/// Pointer event translated to canvas-local screen coordinates.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerInput {
    pub x: f64,
    pub y: f64,
    /// The additive/multi-select modifier.
    pub shift: bool,
}

/// Cursor affordance for the current hover target.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum CursorHint {
    #[default]
    Default,
    Grab,
    Grabbing,
    Move,
    Crosshair,
    Pointer,
    ResizeNwse,
    ResizeNesw,
    RemoveEdge,
    Text,
}

impl CursorHint {
    pub fn css(&self) -> &'static str {
        match self {
            CursorHint::Default => "default",
            CursorHint::Grab => "grab",
            CursorHint::Grabbing => "grabbing",
            CursorHint::Move => "move",
            CursorHint::Crosshair => "crosshair",
            CursorHint::Pointer => "pointer",
            CursorHint::ResizeNwse => "nwse-resize",
            CursorHint::ResizeNesw => "nesw-resize",
            CursorHint::RemoveEdge => "not-allowed",
            CursorHint::Text => "text",
        }
    }
}

/// Exactly one gesture is in flight at a time; the variant carries
/// everything the gesture needs, so stale cross-mode state cannot exist.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    Panning {
        start_x: f64,
        start_y: f64,
        origin_x: f64,
        origin_y: f64,
    },
    DraggingNodes {
        start_wx: f64,
        start_wy: f64,
        origins: Vec<(NodeKey, f64, f64)>,
        moved: bool,
    },
    MarqueeSelecting {
        start_x: f64,
        start_y: f64,
        current_x: f64,
        current_y: f64,
        additive: bool,
    },
    Resizing {
        key: NodeKey,
        corner: ResizeCorner,
        start_wx: f64,
        start_wy: f64,
        origin: Rect,
        moved: bool,
    },
    Connecting {
        source: NodeKey,
        anchor_wx: f64,
        anchor_wy: f64,
        current_wx: f64,
        current_wy: f64,
        target: Option<NodeKey>,
    },
}

/// Collaborator operations the engine asks the host to perform. The engine
/// already reflects each of these in memory by the time it is queued;
/// failures are the host's to surface and are never rolled back here.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineRequest {
    PersistPosition {
        kind: NodeKind,
        id: String,
        x: f64,
        y: f64,
    },
    PersistSize {
        kind: NodeKind,
        id: String,
        width: f64,
        height: f64,
    },
    AddRelationship {
        parent_kind: NodeKind,
        parent_id: String,
        child_id: String,
    },
    RemoveRelationship {
        parent_kind: NodeKind,
        parent_id: String,
        child_id: String,
    },
    CreateAnnotation {
        annotation: Annotation,
    },
    CreateTheme {
        theme: Theme,
    },
    CreateInsight {
        insight: Insight,
    },
    UpdateAnnotationText {
        id: String,
        text: String,
    },
    DeleteEntity {
        kind: NodeKind,
        id: String,
    },
    OpenDetail {
        kind: NodeKind,
        id: String,
    },
}

/// Transient visuals for the renderer: marquee rect (screen space), the
/// connect rubber band (world space) and the hovered deletable edge.
#[derive(Clone, Debug, Default)]
pub struct GestureOverlay {
    pub marquee_screen: Option<Rect>,
    pub connect: Option<ConnectOverlay>,
    pub hovered_edge: Option<EdgeRef>,
}

#[derive(Clone, Debug)]
pub struct ConnectOverlay {
    pub anchor_wx: f64,
    pub anchor_wy: f64,
    pub current_wx: f64,
    pub current_wy: f64,
    pub target: Option<NodeKey>,
}

/// One rendered relationship edge, parent side first.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeRef {
    pub parent: NodeKey,
    pub child: NodeKey,
}

pub struct CanvasEngine {
    data: ProjectData,
    nodes: Vec<Node>,
    index: HashMap<NodeKey, usize>,
    viewport: Viewport,
    selection: Selection,
    gesture: Gesture,
    tool: Tool,
    cursor: CursorHint,
    surface_w: f64,
    surface_h: f64,
    project_id: Option<String>,
    auto_fitted: bool,
    space_pan: bool,
    hovered_edge: Option<EdgeRef>,
    editing_annotation: Option<String>,
    requests: Vec<EngineRequest>,
}

impl Default for CanvasEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasEngine {
    pub fn new() -> Self {
        Self {
            data: ProjectData::default(),
            nodes: Vec::new(),
            index: HashMap::new(),
            viewport: Viewport::default(),
            selection: Selection::default(),
            gesture: Gesture::Idle,
            tool: Tool::Select,
            cursor: CursorHint::Default,
            surface_w: 0.0,
            surface_h: 0.0,
            project_id: None,
            auto_fitted: false,
            space_pan: false,
            hovered_edge: None,
            editing_annotation: None,
            requests: Vec::new(),
        }
    }

    // ----- wiring -------------------------------------------------------

    /// Switch the active project. Resets all canvas state and re-arms the
    /// one-shot auto-fit.
    pub fn set_project(&mut self, project_id: &str) {
        if self.project_id.as_deref() == Some(project_id) {
            return;
        }
        self.project_id = Some(project_id.to_string());
        self.data = ProjectData::default();
        self.nodes.clear();
        self.index.clear();
        self.selection.clear();
        self.gesture = Gesture::Idle;
        self.hovered_edge = None;
        self.editing_annotation = None;
        self.auto_fitted = false;
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn set_surface_size(&mut self, w: f64, h: f64) {
        self.surface_w = w;
        self.surface_h = h;
        self.maybe_auto_fit();
    }

    /// Replace entity data from the host feed and re-derive the node list.
    /// Live canvas geometry survives (see `sync::sync_nodes`); selection
    /// entries whose entity vanished are pruned.
    pub fn apply_data(&mut self, data: ProjectData) {
        self.data = data;
        self.nodes = sync::sync_nodes(&self.nodes, &self.data);
        self.index = sync::index_nodes(&self.nodes);

        let index = &self.index;
        self.selection
            .code_ids
            .retain(|id| index.contains_key(&NodeKey::new(NodeKind::Code, id.clone())));
        self.selection
            .theme_ids
            .retain(|id| index.contains_key(&NodeKey::new(NodeKind::Theme, id.clone())));
        if let Some(id) = &self.editing_annotation {
            if !index.contains_key(&NodeKey::new(NodeKind::Annotation, id.clone())) {
                self.editing_annotation = None;
            }
        }

        self.maybe_auto_fit();
    }

    fn rebuild_nodes(&mut self) {
        self.nodes = sync::sync_nodes(&self.nodes, &self.data);
        self.index = sync::index_nodes(&self.nodes);
    }

    fn maybe_auto_fit(&mut self) {
        if self.auto_fitted
            || self.nodes.is_empty()
            || self.surface_w <= 0.0
            || self.surface_h <= 0.0
        {
            return;
        }
        self.fit_to_content();
        self.auto_fitted = true;
    }

    pub fn take_requests(&mut self) -> Vec<EngineRequest> {
        std::mem::take(&mut self.requests)
    }

    // ----- accessors ----------------------------------------------------

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn data(&self) -> &ProjectData {
        &self.data
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn cursor(&self) -> CursorHint {
        self.cursor
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn editing_annotation(&self) -> Option<&str> {
        self.editing_annotation.as_deref()
    }

    pub fn node_by_key(&self, key: &NodeKey) -> Option<&Node> {
        self.index.get(key).map(|&i| &self.nodes[i])
    }

    /// All renderable relationship edges, parents first. Dangling child ids
    /// (entity deleted elsewhere) are skipped, not errors.
    pub fn edges(&self) -> Vec<EdgeRef> {
        let mut out = Vec::new();
        for theme in &self.data.themes {
            let parent = NodeKey::new(NodeKind::Theme, theme.id.clone());
            for code_id in &theme.code_ids {
                let child = NodeKey::new(NodeKind::Code, code_id.clone());
                if self.index.contains_key(&parent) && self.index.contains_key(&child) {
                    out.push(EdgeRef {
                        parent: parent.clone(),
                        child,
                    });
                }
            }
        }
        for insight in &self.data.insights {
            let parent = NodeKey::new(NodeKind::Insight, insight.id.clone());
            for theme_id in &insight.theme_ids {
                let child = NodeKey::new(NodeKind::Theme, theme_id.clone());
                if self.index.contains_key(&parent) && self.index.contains_key(&child) {
                    out.push(EdgeRef {
                        parent: parent.clone(),
                        child,
                    });
                }
            }
        }
        out
    }

    pub fn overlay(&self) -> GestureOverlay {
        let marquee_screen = match &self.gesture {
            Gesture::MarqueeSelecting {
                start_x,
                start_y,
                current_x,
                current_y,
                ..
            } => Some(Rect::from_corners(*start_x, *start_y, *current_x, *current_y)),
            _ => None,
        };
        let connect = match &self.gesture {
            Gesture::Connecting {
                anchor_wx,
                anchor_wy,
                current_wx,
                current_wy,
                target,
                ..
            } => Some(ConnectOverlay {
                anchor_wx: *anchor_wx,
                anchor_wy: *anchor_wy,
                current_wx: *current_wx,
                current_wy: *current_wy,
                target: target.clone(),
            }),
            _ => None,
        };
        GestureOverlay {
            marquee_screen,
            connect,
            hovered_edge: self.hovered_edge.clone(),
        }
    }

    // ----- viewport controls -------------------------------------------

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn fit_to_content(&mut self) {
        let rects: Vec<Rect> = self.nodes.iter().map(|n| n.rect).collect();
        self.viewport
            .fit_to_content(geom::Bounds::of(&rects), self.surface_w, self.surface_h);
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.update_hover_cursor(None);
    }

    pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) {
        let factor = if delta_y < 0.0 { 1.1 } else { 0.9 };
        self.viewport.zoom_about(x, y, factor);
    }

    // ----- hit testing --------------------------------------------------

    /// Topmost node under a world point (last drawn wins).
    fn node_at(&self, wx: f64, wy: f64) -> Option<&Node> {
        self.nodes.iter().rev().find(|n| n.contains_point(wx, wy))
    }

    /// Edge whose elbow midpoint is within the click tolerance. The
    /// connector runs from the parent's bottom-center to the child's
    /// top-center, so its midpoint is the mean of those two points.
    fn edge_at(&self, wx: f64, wy: f64) -> Option<EdgeRef> {
        let tolerance = EDGE_HIT_TOLERANCE / self.viewport.zoom;
        self.edges().into_iter().find(|edge| {
            let (Some(parent), Some(child)) =
                (self.node_by_key(&edge.parent), self.node_by_key(&edge.child))
            else {
                return false;
            };
            let (sx, sy) = parent.bottom_center();
            let (tx, ty) = child.top_center();
            let (mx, my) = geom::midpoint(sx, sy, tx, ty);
            geom::distance(wx, wy, mx, my) <= tolerance
        })
    }

    // ----- pointer state machine ---------------------------------------

    pub fn pointer_down(&mut self, input: PointerInput) {
        // A new press always supersedes whatever was in flight.
        self.gesture = Gesture::Idle;

        let (wx, wy) = self.viewport.screen_to_world(input.x, input.y);

        if self.tool == Tool::Pan || self.space_pan {
            self.gesture = Gesture::Panning {
                start_x: input.x,
                start_y: input.y,
                origin_x: self.viewport.offset_x,
                origin_y: self.viewport.offset_y,
            };
            self.cursor = CursorHint::Grabbing;
            return;
        }

        if self.tool == Tool::Note {
            self.create_annotation_at(wx, wy);
            return;
        }

        let zoom = self.viewport.zoom;
        if let Some(node) = self.node_at(wx, wy) {
            let key = node.key.clone();
            let rect = node.rect;

            if node.open_icon_at(wx, wy, OPEN_ICON_SIZE / zoom) {
                self.requests.push(EngineRequest::OpenDetail {
                    kind: key.kind,
                    id: key.id,
                });
                return;
            }

            if node.connect_handle_at(wx, wy, CONNECT_HANDLE_RADIUS / zoom) {
                let (hx, hy) = node.connect_handle_center();
                self.gesture = Gesture::Connecting {
                    source: key,
                    anchor_wx: hx,
                    anchor_wy: hy,
                    current_wx: wx,
                    current_wy: wy,
                    target: None,
                };
                return;
            }

            if self.node_is_resizable(&key) {
                if let Some(corner) = node.resize_corner_at(wx, wy, RESIZE_HANDLE_SIZE / zoom) {
                    self.gesture = Gesture::Resizing {
                        key,
                        corner,
                        start_wx: wx,
                        start_wy: wy,
                        origin: rect,
                        moved: false,
                    };
                    return;
                }
            }

            self.selection.toggle(key.kind, &key.id, input.shift);

            let mut origins: Vec<(NodeKey, f64, f64)> = self
                .nodes
                .iter()
                .filter(|n| self.selection.contains(n.kind(), &n.key.id))
                .map(|n| (n.key.clone(), n.rect.x, n.rect.y))
                .collect();
            if !origins.iter().any(|(k, _, _)| *k == key) {
                origins.push((key, rect.x, rect.y));
            }

            self.gesture = Gesture::DraggingNodes {
                start_wx: wx,
                start_wy: wy,
                origins,
                moved: false,
            };
            return;
        }

        if let Some(edge) = self.edge_at(wx, wy) {
            self.remove_relationship(&edge);
            self.hovered_edge = None;
            return;
        }

        if !input.shift {
            self.selection.clear();
        }
        self.gesture = Gesture::MarqueeSelecting {
            start_x: input.x,
            start_y: input.y,
            current_x: input.x,
            current_y: input.y,
            additive: input.shift,
        };
    }

    pub fn pointer_move(&mut self, input: PointerInput) {
        let (wx, wy) = self.viewport.screen_to_world(input.x, input.y);

        if matches!(self.gesture, Gesture::Idle) {
            // No gesture in flight: keep the hover affordance current.
            self.update_hover_cursor(Some((wx, wy)));
            return;
        }

        match &mut self.gesture {
            Gesture::Panning {
                start_x,
                start_y,
                origin_x,
                origin_y,
            } => {
                self.viewport.offset_x = *origin_x + (input.x - *start_x);
                self.viewport.offset_y = *origin_y + (input.y - *start_y);
            }
            Gesture::DraggingNodes {
                start_wx,
                start_wy,
                origins,
                moved,
            } => {
                let dx = wx - *start_wx;
                let dy = wy - *start_wy;
                if dx != 0.0 || dy != 0.0 {
                    *moved = true;
                }
                for (key, ox, oy) in origins.iter() {
                    if let Some(&i) = self.index.get(key) {
                        self.nodes[i].rect.x = ox + dx;
                        self.nodes[i].rect.y = oy + dy;
                    }
                }
            }
            Gesture::MarqueeSelecting {
                current_x,
                current_y,
                ..
            } => {
                *current_x = input.x;
                *current_y = input.y;
            }
            Gesture::Resizing {
                key,
                corner,
                start_wx,
                start_wy,
                origin,
                moved,
            } => {
                let dx = wx - *start_wx;
                let dy = wy - *start_wy;
                if dx != 0.0 || dy != 0.0 {
                    *moved = true;
                }
                let resized = resize_rect(*origin, *corner, dx, dy);
                if let Some(&i) = self.index.get(key) {
                    self.nodes[i].rect = resized;
                }
            }
            Gesture::Connecting {
                source,
                current_wx,
                current_wy,
                target,
                ..
            } => {
                *current_wx = wx;
                *current_wy = wy;
                let wanted = source.kind.connect_target();
                *target = self
                    .nodes
                    .iter()
                    .rev()
                    .find(|n| Some(n.kind()) == wanted && n.contains_point(wx, wy))
                    .map(|n| n.key.clone());
            }
            Gesture::Idle => {}
        }
    }

    pub fn pointer_up(&mut self, input: PointerInput) {
        let gesture = std::mem::take(&mut self.gesture);
        let (wx, wy) = self.viewport.screen_to_world(input.x, input.y);

        match gesture {
            Gesture::Idle | Gesture::Panning { .. } => {}
            Gesture::DraggingNodes { origins, moved, .. } => {
                if moved {
                    for (key, _, _) in origins {
                        if let Some(node) = self.node_by_key(&key) {
                            let (x, y) = (node.rect.x, node.rect.y);
                            self.requests.push(EngineRequest::PersistPosition {
                                kind: key.kind,
                                id: key.id,
                                x,
                                y,
                            });
                        }
                    }
                }
            }
            Gesture::MarqueeSelecting {
                start_x,
                start_y,
                additive,
                ..
            } => {
                let (ax, ay) = self.viewport.screen_to_world(start_x, start_y);
                let marquee = Rect::from_corners(ax, ay, wx, wy);
                self.apply_marquee(&marquee, additive);
            }
            Gesture::Resizing {
                key, origin, moved, ..
            } => {
                if moved {
                    if let Some(node) = self.node_by_key(&key) {
                        let rect = node.rect;
                        self.requests.push(EngineRequest::PersistSize {
                            kind: key.kind,
                            id: key.id.clone(),
                            width: rect.w,
                            height: rect.h,
                        });
                        if rect.x != origin.x || rect.y != origin.y {
                            self.requests.push(EngineRequest::PersistPosition {
                                kind: key.kind,
                                id: key.id,
                                x: rect.x,
                                y: rect.y,
                            });
                        }
                    }
                }
            }
            Gesture::Connecting { source, .. } => {
                let wanted = source.kind.connect_target();
                let target = self
                    .nodes
                    .iter()
                    .rev()
                    .find(|n| Some(n.kind()) == wanted && n.contains_point(wx, wy))
                    .map(|n| n.key.clone());
                if let Some(target) = target {
                    self.add_relationship(&source, &target);
                }
            }
        }

        self.update_hover_cursor(Some((wx, wy)));
    }

    /// Double-click: open the detail view for hierarchy cards, start text
    /// editing on annotations, create an annotation on empty canvas.
    pub fn double_click(&mut self, input: PointerInput) {
        self.gesture = Gesture::Idle;
        let (wx, wy) = self.viewport.screen_to_world(input.x, input.y);
        match self.node_at(wx, wy).map(|n| n.key.clone()) {
            Some(key) if key.kind == NodeKind::Annotation => {
                self.editing_annotation = Some(key.id);
            }
            Some(key) => {
                self.requests.push(EngineRequest::OpenDetail {
                    kind: key.kind,
                    id: key.id,
                });
            }
            None => self.create_annotation_at(wx, wy),
        }
    }

    // ----- keyboard -----------------------------------------------------

    pub fn key_down(&mut self, key: &str, in_text_input: bool) {
        if in_text_input {
            return;
        }
        match key {
            " " => self.space_pan = true,
            "Delete" | "Backspace" => self.delete_selected(),
            _ => {}
        }
    }

    pub fn key_up(&mut self, key: &str) {
        if key == " " {
            self.space_pan = false;
        }
    }

    // ----- selection-derived actions -----------------------------------

    pub fn show_context_popup(&self) -> bool {
        self.selection.show_context_popup()
    }

    pub fn selection_bounds(&self, kinds: &[NodeKind]) -> Option<SelectionBounds> {
        self.selection.bounding_box(kinds, &self.nodes)
    }

    /// Derive a theme card from the selected codes (requires at least two).
    pub fn create_theme_from_selection(&mut self) {
        if self.selection.code_ids.len() < 2 {
            return;
        }
        let Some(bounds) = self.selection_bounds(&[NodeKind::Code]) else {
            return;
        };
        let (w, h) = sync::default_size(NodeKind::Theme);
        let theme = Theme {
            id: uuid::Uuid::new_v4().to_string(),
            name: "New theme".to_string(),
            code_ids: self.selection.code_ids.clone(),
            x: Some(bounds.center_x - w / 2.0),
            y: Some(bounds.max_y + 40.0),
            width: Some(w),
            height: Some(h),
        };
        log::debug!("deriving theme {} from {} codes", theme.id, theme.code_ids.len());
        self.data.themes.push(theme.clone());
        self.rebuild_nodes();
        self.selection.clear();
        self.selection.theme_ids.push(theme.id.clone());
        self.requests.push(EngineRequest::CreateTheme { theme });
    }

    /// Derive an insight card from the selected themes (at least one).
    pub fn create_insight_from_selection(&mut self) {
        if self.selection.theme_ids.is_empty() {
            return;
        }
        let Some(bounds) = self.selection_bounds(&[NodeKind::Theme]) else {
            return;
        };
        let (w, h) = sync::default_size(NodeKind::Insight);
        let insight = Insight {
            id: uuid::Uuid::new_v4().to_string(),
            name: "New insight".to_string(),
            theme_ids: self.selection.theme_ids.clone(),
            x: Some(bounds.center_x - w / 2.0),
            y: Some(bounds.max_y + 40.0),
            width: Some(w),
            height: Some(h),
        };
        log::debug!(
            "deriving insight {} from {} themes",
            insight.id,
            insight.theme_ids.len()
        );
        self.data.insights.push(insight.clone());
        self.rebuild_nodes();
        self.selection.clear();
        self.requests.push(EngineRequest::CreateInsight { insight });
    }

    // ----- annotations --------------------------------------------------

    fn create_annotation_at(&mut self, wx: f64, wy: f64) {
        let (w, h) = sync::default_size(NodeKind::Annotation);
        let annotation = Annotation {
            id: uuid::Uuid::new_v4().to_string(),
            text: String::new(),
            x: Some(wx - w / 2.0),
            y: Some(wy - h / 2.0),
            width: Some(w),
            height: Some(h),
        };
        self.data.annotations.push(annotation.clone());
        self.rebuild_nodes();
        self.editing_annotation = Some(annotation.id.clone());
        self.requests
            .push(EngineRequest::CreateAnnotation { annotation });
    }

    pub fn commit_annotation_text(&mut self, id: &str, text: String) {
        if let Some(annotation) = self.data.annotations.iter_mut().find(|a| a.id == id) {
            annotation.text = text.clone();
        }
        if let Some(&i) = self.index.get(&NodeKey::new(NodeKind::Annotation, id)) {
            self.nodes[i].label = text.clone();
        }
        self.editing_annotation = None;
        self.requests.push(EngineRequest::UpdateAnnotationText {
            id: id.to_string(),
            text,
        });
    }

    pub fn close_annotation_editor(&mut self) {
        self.editing_annotation = None;
    }

    // ----- internals ----------------------------------------------------

    fn node_is_resizable(&self, key: &NodeKey) -> bool {
        match key.kind {
            NodeKind::Code | NodeKind::Theme => self.selection.contains(key.kind, &key.id),
            NodeKind::Insight | NodeKind::Annotation => true,
        }
    }

    fn apply_marquee(&mut self, marquee: &Rect, additive: bool) {
        let mut codes = Vec::new();
        let mut themes = Vec::new();
        for node in &self.nodes {
            if !node.rect.intersects(marquee) {
                continue;
            }
            match node.kind() {
                NodeKind::Code => codes.push(node.key.id.clone()),
                NodeKind::Theme => themes.push(node.key.id.clone()),
                NodeKind::Insight | NodeKind::Annotation => {}
            }
        }
        if additive {
            geom::extend_ids(&mut self.selection.code_ids, codes);
            geom::extend_ids(&mut self.selection.theme_ids, themes);
        } else {
            self.selection.replace_kind(NodeKind::Code, codes);
            self.selection.replace_kind(NodeKind::Theme, themes);
        }
    }

    /// Propose `source` as a child of `target`. Already-present ids are a
    /// silent no-op, so a connection can never duplicate.
    fn add_relationship(&mut self, source: &NodeKey, target: &NodeKey) {
        let added = match (source.kind, target.kind) {
            (NodeKind::Code, NodeKind::Theme) => self
                .data
                .themes
                .iter_mut()
                .find(|t| t.id == target.id)
                .map(|theme| {
                    if theme.code_ids.contains(&source.id) {
                        false
                    } else {
                        theme.code_ids.push(source.id.clone());
                        true
                    }
                })
                .unwrap_or(false),
            (NodeKind::Theme, NodeKind::Insight) => self
                .data
                .insights
                .iter_mut()
                .find(|i| i.id == target.id)
                .map(|insight| {
                    if insight.theme_ids.contains(&source.id) {
                        false
                    } else {
                        insight.theme_ids.push(source.id.clone());
                        true
                    }
                })
                .unwrap_or(false),
            _ => false,
        };
        if added {
            log::debug!(
                "connect {}:{} -> {}:{}",
                source.kind.as_str(),
                source.id,
                target.kind.as_str(),
                target.id
            );
            self.requests.push(EngineRequest::AddRelationship {
                parent_kind: target.kind,
                parent_id: target.id.clone(),
                child_id: source.id.clone(),
            });
        }
    }

    fn remove_relationship(&mut self, edge: &EdgeRef) {
        match edge.parent.kind {
            NodeKind::Theme => {
                if let Some(theme) = self.data.themes.iter_mut().find(|t| t.id == edge.parent.id) {
                    theme.code_ids.retain(|id| *id != edge.child.id);
                }
            }
            NodeKind::Insight => {
                if let Some(insight) =
                    self.data.insights.iter_mut().find(|i| i.id == edge.parent.id)
                {
                    insight.theme_ids.retain(|id| *id != edge.child.id);
                }
            }
            NodeKind::Code | NodeKind::Annotation => return,
        }
        self.requests.push(EngineRequest::RemoveRelationship {
            parent_kind: edge.parent.kind,
            parent_id: edge.parent.id.clone(),
            child_id: edge.child.id.clone(),
        });
    }

    fn delete_selected(&mut self) {
        if !self.selection.has_selection() {
            return;
        }
        let codes = std::mem::take(&mut self.selection.code_ids);
        let themes = std::mem::take(&mut self.selection.theme_ids);

        self.data.codes.retain(|c| !codes.contains(&c.id));
        self.data.themes.retain(|t| !themes.contains(&t.id));
        // Drop dangling references so edges disappear with their endpoint.
        for theme in &mut self.data.themes {
            theme.code_ids.retain(|id| !codes.contains(id));
        }
        for insight in &mut self.data.insights {
            insight.theme_ids.retain(|id| !themes.contains(id));
        }
        self.rebuild_nodes();

        for id in codes {
            self.requests.push(EngineRequest::DeleteEntity {
                kind: NodeKind::Code,
                id,
            });
        }
        for id in themes {
            self.requests.push(EngineRequest::DeleteEntity {
                kind: NodeKind::Theme,
                id,
            });
        }
    }

    /// Recompute the hover affordance; `world` is the pointer position when
    /// known. Mirrors the pointer-down dispatch order so the cursor always
    /// previews what a press would do.
    fn update_hover_cursor(&mut self, world: Option<(f64, f64)>) {
        self.hovered_edge = None;

        if self.tool == Tool::Pan || self.space_pan {
            self.cursor = CursorHint::Grab;
            return;
        }
        if self.tool == Tool::Note {
            self.cursor = CursorHint::Text;
            return;
        }
        let Some((wx, wy)) = world else {
            self.cursor = CursorHint::Default;
            return;
        };

        let zoom = self.viewport.zoom;
        if let Some(node) = self.node_at(wx, wy) {
            if node.open_icon_at(wx, wy, OPEN_ICON_SIZE / zoom) {
                self.cursor = CursorHint::Pointer;
            } else if node.connect_handle_at(wx, wy, CONNECT_HANDLE_RADIUS / zoom) {
                self.cursor = CursorHint::Crosshair;
            } else if self.node_is_resizable(&node.key) {
                match node.resize_corner_at(wx, wy, RESIZE_HANDLE_SIZE / zoom) {
                    Some(ResizeCorner::TopLeft) | Some(ResizeCorner::BottomRight) => {
                        self.cursor = CursorHint::ResizeNwse;
                    }
                    Some(ResizeCorner::TopRight) | Some(ResizeCorner::BottomLeft) => {
                        self.cursor = CursorHint::ResizeNesw;
                    }
                    None => self.cursor = CursorHint::Move,
                }
            } else {
                self.cursor = CursorHint::Move;
            }
            return;
        }

        if let Some(edge) = self.edge_at(wx, wy) {
            self.hovered_edge = Some(edge);
            self.cursor = CursorHint::RemoveEdge;
            return;
        }

        self.cursor = CursorHint::Default;
    }
}

/// Corner-anchored resize with the minimum-size floor. The opposite corner
/// stays fixed; when the floor bites, the moving edge stops instead of
/// pushing the anchor.
fn resize_rect(origin: Rect, corner: ResizeCorner, dx: f64, dy: f64) -> Rect {
    let mut rect = origin;
    match corner {
        ResizeCorner::TopLeft => {
            let w = (origin.w - dx).max(MIN_NODE_WIDTH);
            let h = (origin.h - dy).max(MIN_NODE_HEIGHT);
            rect.x = origin.x + (origin.w - w);
            rect.y = origin.y + (origin.h - h);
            rect.w = w;
            rect.h = h;
        }
        ResizeCorner::TopRight => {
            let w = (origin.w + dx).max(MIN_NODE_WIDTH);
            let h = (origin.h - dy).max(MIN_NODE_HEIGHT);
            rect.y = origin.y + (origin.h - h);
            rect.w = w;
            rect.h = h;
        }
        ResizeCorner::BottomLeft => {
            let w = (origin.w - dx).max(MIN_NODE_WIDTH);
            let h = (origin.h + dy).max(MIN_NODE_HEIGHT);
            rect.x = origin.x + (origin.w - w);
            rect.w = w;
            rect.h = h;
        }
        ResizeCorner::BottomRight => {
            rect.w = (origin.w + dx).max(MIN_NODE_WIDTH);
            rect.h = (origin.h + dy).max(MIN_NODE_HEIGHT);
        }
    }
    rect
}
