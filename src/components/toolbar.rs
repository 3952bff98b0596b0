use leptos::prelude::*;

use crate::app::{commit_frame, CanvasCtx};
use crate::engine::Tool;

const BUTTON_STYLE: &str = "background: #ffffff; color: #5b554b; border: 1px solid #d8d4cb; \
     padding: 6px 12px; cursor: pointer; font-size: 12px; \
     font-family: Inter, 'Segoe UI', system-ui, sans-serif; border-radius: 3px;";
const BUTTON_ACTIVE_STYLE: &str = "background: #3d6fe0; color: #ffffff; border: 1px solid #3d6fe0; \
     padding: 6px 12px; cursor: pointer; font-size: 12px; \
     font-family: Inter, 'Segoe UI', system-ui, sans-serif; border-radius: 3px;";

/// Tool switcher and zoom controls. Purely a remote control for engine
/// operations; it owns no canvas state of its own.
#[component]
pub fn Toolbar() -> impl IntoView {
    let ctx = use_context::<CanvasCtx>().unwrap();

    let active_tool = move || {
        let _ = ctx.frame.get();
        ctx.engine.with_value(|e| e.tool())
    };

    let pick_tool = move |tool: Tool| {
        ctx.engine.update_value(|e| e.set_tool(tool));
        commit_frame(ctx);
    };

    view! {
        <div style="position: fixed; top: 12px; left: 12px; display: flex; gap: 6px; \
                    background: rgba(255, 255, 255, 0.9); padding: 6px; border-radius: 4px; \
                    box-shadow: 0 1px 4px rgba(0, 0, 0, 0.12);">
            <button
                style=move || if active_tool() == Tool::Select { BUTTON_ACTIVE_STYLE } else { BUTTON_STYLE }
                on:click=move |_| pick_tool(Tool::Select)
            >
                "Select"
            </button>
            <button
                style=move || if active_tool() == Tool::Pan { BUTTON_ACTIVE_STYLE } else { BUTTON_STYLE }
                on:click=move |_| pick_tool(Tool::Pan)
            >
                "Pan"
            </button>
            <button
                style=move || if active_tool() == Tool::Note { BUTTON_ACTIVE_STYLE } else { BUTTON_STYLE }
                on:click=move |_| pick_tool(Tool::Note)
            >
                "Note"
            </button>
            <span style="width: 1px; background: #d8d4cb; margin: 2px 4px;"></span>
            <button
                style=BUTTON_STYLE
                on:click=move |_| {
                    ctx.engine.update_value(|e| e.zoom_in());
                    commit_frame(ctx);
                }
            >
                "+"
            </button>
            <button
                style=BUTTON_STYLE
                on:click=move |_| {
                    ctx.engine.update_value(|e| e.zoom_out());
                    commit_frame(ctx);
                }
            >
                "\u{2212}"
            </button>
            <button
                style=BUTTON_STYLE
                on:click=move |_| {
                    ctx.engine.update_value(|e| e.fit_to_content());
                    commit_frame(ctx);
                }
            >
                "Fit"
            </button>
        </div>
    }
}
