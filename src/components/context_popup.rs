use leptos::prelude::*;

use crate::app::{commit_frame, CanvasCtx};
use crate::state::NodeKind;

/// "Create theme" / "Create insight" affordances, shown above the current
/// selection once it can derive something (two codes, or any theme).
#[component]
pub fn ContextPopup() -> impl IntoView {
    let ctx = use_context::<CanvasCtx>().unwrap();

    move || {
        let _ = ctx.frame.get();

        let info = ctx.engine.with_value(|engine| {
            if !engine.show_context_popup() {
                return None;
            }
            let bounds = engine.selection_bounds(&[NodeKind::Code, NodeKind::Theme])?;
            let vp = engine.viewport();
            let (sx, sy) = vp.world_to_screen(bounds.center_x, bounds.min_y);
            let can_theme = engine.selection().code_ids.len() >= 2;
            let can_insight = !engine.selection().theme_ids.is_empty();
            Some((sx, sy, can_theme, can_insight))
        });

        info.map(|(sx, sy, can_theme, can_insight)| {
            view! {
                <div style=format!(
                    "position: absolute; left: {}px; top: {}px; \
                     transform: translate(-50%, -120%); display: flex; gap: 6px; \
                     background: #ffffff; padding: 6px; border-radius: 4px; \
                     box-shadow: 0 2px 8px rgba(0, 0, 0, 0.18);",
                    sx, sy
                )>
                    {can_theme.then(|| view! {
                        <button
                            style="background: #8a63d2; color: #ffffff; border: none; \
                                   padding: 6px 12px; cursor: pointer; font-size: 12px; \
                                   font-family: Inter, 'Segoe UI', system-ui, sans-serif; \
                                   border-radius: 3px;"
                            on:click=move |_| {
                                ctx.engine.update_value(|e| e.create_theme_from_selection());
                                commit_frame(ctx);
                            }
                        >
                            "Create theme"
                        </button>
                    })}
                    {can_insight.then(|| view! {
                        <button
                            style="background: #e8833a; color: #ffffff; border: none; \
                                   padding: 6px 12px; cursor: pointer; font-size: 12px; \
                                   font-family: Inter, 'Segoe UI', system-ui, sans-serif; \
                                   border-radius: 3px;"
                            on:click=move |_| {
                                ctx.engine.update_value(|e| e.create_insight_from_selection());
                                commit_frame(ctx);
                            }
                        >
                            "Create insight"
                        </button>
                    })}
                </div>
            }
        })
    }
}
