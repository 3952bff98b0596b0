use leptos::prelude::*;

use crate::app::{parse_markdown, CanvasCtx};
use crate::state::NodeKind;

/// Sticky notes are DOM surfaces, not canvas drawings: they need native
/// text behavior the 2d context cannot give. Idle notes render as
/// markdown divs positioned and scaled by the viewport transform; the one
/// being edited is handled by `AnnotationEditor` instead.
#[component]
pub fn AnnotationOverlays() -> impl IntoView {
    let ctx = use_context::<CanvasCtx>().unwrap();

    move || {
        let _ = ctx.frame.get();

        ctx.engine.with_value(|engine| {
            let vp = engine.viewport();
            let editing = engine.editing_annotation().map(str::to_string);

            engine
                .nodes()
                .iter()
                .filter(|n| {
                    n.kind() == NodeKind::Annotation
                        && editing.as_deref() != Some(n.key.id.as_str())
                })
                .map(|node| {
                    let (screen_x, screen_y) = vp.world_to_screen(node.rect.x, node.rect.y);
                    let html_content = parse_markdown(&node.label);

                    // Size at 1x and scale with a transform so the text
                    // reflows identically at every zoom level.
                    view! {
                        <div
                            style=format!(
                                "position: absolute; left: {}px; top: {}px; \
                                 width: {}px; height: {}px; overflow: hidden; \
                                 transform: scale({}); transform-origin: top left; \
                                 padding: 8px 10px; box-sizing: border-box; \
                                 background: #fdf6d8; border: 1px solid #e6c84a; \
                                 border-radius: 2px; color: #5b5340; \
                                 box-shadow: 0 1px 3px rgba(0, 0, 0, 0.12); \
                                 font-size: 12px; line-height: 1.45; \
                                 font-family: Inter, 'Segoe UI', system-ui, sans-serif; \
                                 pointer-events: none;",
                                screen_x, screen_y, node.rect.w, node.rect.h, vp.zoom
                            )
                            inner_html=html_content
                        />
                    }
                })
                .collect::<Vec<_>>()
        })
    }
}
