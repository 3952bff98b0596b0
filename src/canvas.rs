use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::engine::CanvasEngine;
use crate::geom;
use crate::state::{Node, NodeKind};
use crate::viewport::Viewport;

const BG_COLOR: &str = "#faf9f6";
const GRID_COLOR: &str = "#eceae4";
const CARD_BG: &str = "#ffffff";
const CARD_BORDER: &str = "#d8d4cb";
const CARD_BORDER_SELECTED: &str = "#3d6fe0";
const CARD_SHADOW: &str = "rgba(61, 111, 224, 0.35)";
const TEXT_COLOR: &str = "#2f2b26";
const ICON_COLOR: &str = "#8b857b";
const EDGE_COLOR: &str = "#b9b2a6";
const EDGE_HOVERED: &str = "#d9534f";
const EDGE_PREVIEW: &str = "#3d6fe0";
const TARGET_OUTLINE: &str = "#3d6fe0";
const MARQUEE_FILL: &str = "rgba(61, 111, 224, 0.12)";
const MARQUEE_STROKE: &str = "#3d6fe0";
const HANDLE_FILL: &str = "#3d6fe0";
const FONT: &str = "Inter, 'Segoe UI', system-ui, sans-serif";

/// World-space period of the background grid.
const GRID_WORLD_STEP: f64 = 50.0;

fn accent_color(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Code => "#4f9cf9",
        NodeKind::Theme => "#8a63d2",
        NodeKind::Insight => "#e8833a",
        NodeKind::Annotation => "#e6c84a",
    }
}

/// Draw one complete frame from the engine's current state. Annotation
/// cards are intentionally absent here: they are DOM overlays positioned by
/// the same transform (see `components::annotation_overlays`).
pub fn render_scene(ctx: &CanvasRenderingContext2d, canvas: &HtmlCanvasElement, engine: &CanvasEngine) {
    let width = canvas.width() as f64;
    let height = canvas.height() as f64;
    let vp = engine.viewport();

    ctx.set_fill_style_str(BG_COLOR);
    ctx.fill_rect(0.0, 0.0, width, height);

    draw_grid(ctx, &vp, width, height);

    let overlay = engine.overlay();

    for edge in engine.edges() {
        // Either endpoint may be missing while feeds settle; skip, not crash.
        let (Some(parent), Some(child)) = (
            engine.node_by_key(&edge.parent),
            engine.node_by_key(&edge.child),
        ) else {
            continue;
        };
        let hovered = overlay
            .hovered_edge
            .as_ref()
            .map_or(false, |h| *h == edge);
        draw_edge(ctx, &vp, parent, child, hovered);
    }

    if let Some(connect) = &overlay.connect {
        draw_rubber_band(ctx, &vp, connect.anchor_wx, connect.anchor_wy, connect.current_wx, connect.current_wy);
    }

    for node in engine.nodes() {
        if node.kind() == NodeKind::Annotation {
            continue;
        }
        let selected = engine.selection().contains(node.kind(), &node.key.id);
        draw_node(ctx, &vp, node, selected);
    }

    if let Some(connect) = &overlay.connect {
        if let Some(target) = connect.target.as_ref().and_then(|k| engine.node_by_key(k)) {
            draw_target_outline(ctx, &vp, target);
        }
    }

    if let Some(marquee) = &overlay.marquee_screen {
        ctx.set_fill_style_str(MARQUEE_FILL);
        ctx.fill_rect(marquee.x, marquee.y, marquee.w, marquee.h);
        ctx.set_stroke_style_str(MARQUEE_STROKE);
        ctx.set_line_width(1.0);
        ctx.stroke_rect(marquee.x, marquee.y, marquee.w, marquee.h);
    }
}

fn draw_grid(ctx: &CanvasRenderingContext2d, vp: &Viewport, width: f64, height: f64) {
    let step = GRID_WORLD_STEP * vp.zoom;
    if step < 10.0 {
        return;
    }

    ctx.set_stroke_style_str(GRID_COLOR);
    ctx.set_line_width(1.0);

    let mut x = vp.offset_x.rem_euclid(step) - step;
    while x < width {
        ctx.begin_path();
        ctx.move_to(x, 0.0);
        ctx.line_to(x, height);
        ctx.stroke();
        x += step;
    }

    let mut y = vp.offset_y.rem_euclid(step) - step;
    while y < height {
        ctx.begin_path();
        ctx.move_to(0.0, y);
        ctx.line_to(width, y);
        ctx.stroke();
        y += step;
    }
}

/// Orthogonal elbow connector: down from the parent's bottom-center, across
/// at mid-height, down into the child's top-center.
fn elbow_path(ctx: &CanvasRenderingContext2d, sx: f64, sy: f64, tx: f64, ty: f64) {
    let mid_y = (sy + ty) / 2.0;
    ctx.begin_path();
    ctx.move_to(sx, sy);
    ctx.line_to(sx, mid_y);
    ctx.line_to(tx, mid_y);
    ctx.line_to(tx, ty);
    ctx.stroke();
}

fn draw_edge(
    ctx: &CanvasRenderingContext2d,
    vp: &Viewport,
    parent: &Node,
    child: &Node,
    hovered: bool,
) {
    let (wx1, wy1) = parent.bottom_center();
    let (wx2, wy2) = child.top_center();
    let (sx, sy) = vp.world_to_screen(wx1, wy1);
    let (tx, ty) = vp.world_to_screen(wx2, wy2);

    if hovered {
        ctx.set_stroke_style_str(EDGE_HOVERED);
        ctx.set_line_width(2.0);
    } else {
        ctx.set_stroke_style_str(EDGE_COLOR);
        ctx.set_line_width(1.5);
    }
    elbow_path(ctx, sx, sy, tx, ty);

    if hovered {
        // Small x at the midpoint, where a click deletes the edge.
        let (mx, my) = geom::midpoint(sx, sy, tx, ty);
        ctx.set_line_width(2.0);
        ctx.begin_path();
        ctx.move_to(mx - 4.0, my - 4.0);
        ctx.line_to(mx + 4.0, my + 4.0);
        ctx.move_to(mx + 4.0, my - 4.0);
        ctx.line_to(mx - 4.0, my + 4.0);
        ctx.stroke();
    }
}

fn draw_rubber_band(
    ctx: &CanvasRenderingContext2d,
    vp: &Viewport,
    anchor_wx: f64,
    anchor_wy: f64,
    current_wx: f64,
    current_wy: f64,
) {
    let (sx, sy) = vp.world_to_screen(anchor_wx, anchor_wy);
    let (tx, ty) = vp.world_to_screen(current_wx, current_wy);

    ctx.set_stroke_style_str(EDGE_PREVIEW);
    ctx.set_line_width(1.5);
    let _ = ctx.set_line_dash(&dash_pattern());
    elbow_path(ctx, sx, sy, tx, ty);
    let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn dash_pattern() -> JsValue {
    js_sys::Array::of2(&JsValue::from_f64(5.0), &JsValue::from_f64(4.0)).into()
}

fn draw_node(ctx: &CanvasRenderingContext2d, vp: &Viewport, node: &Node, selected: bool) {
    let (sx, sy) = vp.world_to_screen(node.rect.x, node.rect.y);
    let sw = node.rect.w * vp.zoom;
    let sh = node.rect.h * vp.zoom;

    ctx.set_fill_style_str(CARD_BG);
    if selected {
        ctx.set_shadow_color(CARD_SHADOW);
        ctx.set_shadow_blur(12.0);
    }
    ctx.fill_rect(sx, sy, sw, sh);
    ctx.set_shadow_blur(0.0);

    // Kind-colored accent bar along the leading edge.
    let bar = (4.0 * vp.zoom).max(2.0);
    ctx.set_fill_style_str(accent_color(node.kind()));
    ctx.fill_rect(sx, sy, bar, sh);

    if selected {
        ctx.set_stroke_style_str(CARD_BORDER_SELECTED);
        ctx.set_line_width(2.0);
    } else {
        ctx.set_stroke_style_str(CARD_BORDER);
        ctx.set_line_width(1.0);
    }
    ctx.stroke_rect(sx, sy, sw, sh);

    draw_title(ctx, vp, node, sx, sy, sw, sh, bar);

    if node.kind().has_detail_view() {
        draw_open_icon(ctx, sx, sy, sw);
    }

    if node.kind().connect_target().is_some() {
        // Connect handle dot on the trailing edge.
        ctx.set_fill_style_str(HANDLE_FILL);
        ctx.begin_path();
        let _ = ctx.arc(sx + sw, sy + sh / 2.0, 4.0, 0.0, std::f64::consts::TAU);
        ctx.fill();
        ctx.set_stroke_style_str(CARD_BG);
        ctx.set_line_width(1.0);
        ctx.stroke();
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_title(
    ctx: &CanvasRenderingContext2d,
    vp: &Viewport,
    node: &Node,
    sx: f64,
    sy: f64,
    sw: f64,
    sh: f64,
    bar: f64,
) {
    let font_size = (13.0 * vp.zoom).max(8.0);
    let line_height = font_size * 1.3;
    ctx.set_font(&format!("{:.1}px {}", font_size, FONT));
    ctx.set_text_align("left");
    ctx.set_text_baseline("top");
    ctx.set_fill_style_str(TEXT_COLOR);

    let pad = 8.0 * vp.zoom;
    let max_width = sw - bar - 2.0 * pad - OPEN_ICON_INSET * vp.zoom;
    let max_lines = (((sh - 2.0 * pad) / line_height).floor() as usize).max(1);
    if max_width <= 0.0 {
        return;
    }

    let lines = geom::wrap_text(&node.label, max_width, max_lines, |s| {
        ctx.measure_text(s).map(|m| m.width()).unwrap_or(f64::MAX)
    });
    let tx = sx + bar + pad;
    let mut ty = sy + pad;
    for line in lines {
        let _ = ctx.fill_text(&line, tx, ty);
        ty += line_height;
    }
}

/// Horizontal room reserved for the open icon so titles never run under it.
const OPEN_ICON_INSET: f64 = 14.0;

fn draw_open_icon(ctx: &CanvasRenderingContext2d, sx: f64, sy: f64, sw: f64) {
    let size = OPEN_ICON_SIZE_SCREEN;
    let pad = 4.0;
    let x = sx + sw - size + pad / 2.0;
    let y = sy + pad;

    ctx.set_stroke_style_str(ICON_COLOR);
    ctx.set_line_width(1.5);
    // Outward arrow: diagonal stroke plus its head.
    ctx.begin_path();
    ctx.move_to(x, y + size - 8.0);
    ctx.line_to(x + size - 8.0, y);
    ctx.move_to(x + 2.0, y);
    ctx.line_to(x + size - 8.0, y);
    ctx.line_to(x + size - 8.0, y + size - 10.0);
    ctx.stroke();
}

/// The icon is drawn at constant screen size, matching its hit zone.
const OPEN_ICON_SIZE_SCREEN: f64 = 14.0;

fn draw_target_outline(ctx: &CanvasRenderingContext2d, vp: &Viewport, node: &Node) {
    let (sx, sy) = vp.world_to_screen(node.rect.x, node.rect.y);
    let sw = node.rect.w * vp.zoom;
    let sh = node.rect.h * vp.zoom;

    ctx.set_stroke_style_str(TARGET_OUTLINE);
    ctx.set_line_width(2.0);
    let _ = ctx.set_line_dash(&dash_pattern());
    ctx.stroke_rect(sx - 3.0, sy - 3.0, sw + 6.0, sh + 6.0);
    let _ = ctx.set_line_dash(&js_sys::Array::new());
}

pub fn get_canvas_context(
    canvas: &HtmlCanvasElement,
) -> Result<CanvasRenderingContext2d, JsValue> {
    Ok(canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Failed to get 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()?)
}
