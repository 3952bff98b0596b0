use leptos::prelude::*;
use wasm_bindgen::JsCast;

use crate::app::{commit_frame, CanvasCtx};
use crate::state::{NodeKey, NodeKind};

/// Absolutely-positioned textarea over the annotation being edited. Blur
/// and Escape both commit the text through the engine; the engine then
/// queues the host update.
#[component]
pub fn AnnotationEditor() -> impl IntoView {
    let ctx = use_context::<CanvasCtx>().unwrap();

    move || {
        let _ = ctx.frame.get();

        let target = ctx.engine.with_value(|engine| {
            let id = engine.editing_annotation()?.to_string();
            let node = engine.node_by_key(&NodeKey::new(NodeKind::Annotation, id.clone()))?;
            let vp = engine.viewport();
            let (sx, sy) = vp.world_to_screen(node.rect.x, node.rect.y);
            Some((
                id,
                sx,
                sy,
                node.rect.w * vp.zoom,
                node.rect.h * vp.zoom,
                (12.0 * vp.zoom).max(9.0),
                node.label.clone(),
            ))
        });

        let (id, screen_x, screen_y, screen_w, screen_h, font_size, initial_text) = target?;

        let id_for_blur = id.clone();
        let on_blur = move |ev: web_sys::FocusEvent| {
            if let Some(target) = ev.target() {
                if let Ok(textarea) = target.dyn_into::<web_sys::HtmlTextAreaElement>() {
                    let new_text = textarea.value();
                    ctx.engine
                        .update_value(|e| e.commit_annotation_text(&id_for_blur, new_text));
                    commit_frame(ctx);
                }
            }
        };

        let id_for_keydown = id.clone();
        let on_keydown = move |ev: web_sys::KeyboardEvent| {
            if ev.key().as_str() == "Escape" {
                if let Some(target) = ev.target() {
                    if let Ok(textarea) = target.dyn_into::<web_sys::HtmlTextAreaElement>() {
                        let new_text = textarea.value();
                        ctx.engine
                            .update_value(|e| e.commit_annotation_text(&id_for_keydown, new_text));
                        commit_frame(ctx);
                    }
                }
            }
        };

        Some(view! {
            <textarea
                autofocus=true
                style=format!(
                    "position: absolute; left: {}px; top: {}px; width: {}px; height: {}px; \
                     font-size: {}px; background: #fdf6d8; resize: none; \
                     color: #5b5340; border: 1px solid #d9b92e; outline: none; \
                     border-radius: 2px; box-sizing: border-box; padding: 8px 10px; \
                     line-height: 1.45; \
                     font-family: Inter, 'Segoe UI', system-ui, sans-serif;",
                    screen_x, screen_y, screen_w, screen_h, font_size
                )
                on:blur=on_blur
                on:keydown=on_keydown
            >{initial_text}</textarea>
        })
    }
}
