use leptos::prelude::*;
use leptos::task::spawn_local;
use pulldown_cmark::{html, Parser};
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use crate::api;
use crate::canvas::{get_canvas_context, render_scene};
use crate::components::{AnnotationEditor, AnnotationOverlays, ContextPopup, Toolbar};
use crate::engine::{CanvasEngine, PointerInput};
use crate::sync;

/// Shared handle set for the canvas page: the engine itself plus the frame
/// counter every overlay component subscribes to. The engine is the single
/// owner of canvas state; components only read through it and route
/// mutations back via its operations.
#[derive(Clone, Copy)]
pub struct CanvasCtx {
    pub engine: StoredValue<CanvasEngine, LocalStorage>,
    pub frame: ReadSignal<u32>,
    pub set_frame: WriteSignal<u32>,
}

pub fn parse_markdown(md: &str) -> String {
    let parser = Parser::new(md);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

/// Drain the engine's queued collaborator requests, ship them, snapshot to
/// localStorage in browser mode, and schedule a redraw. Call after every
/// engine interaction.
pub fn commit_frame(ctx: CanvasCtx) {
    let mut requests = Vec::new();
    ctx.engine.update_value(|e| requests = e.take_requests());
    if !requests.is_empty() {
        for request in requests {
            spawn_local(api::dispatch(request));
        }
        if !api::is_hosted() {
            let snapshot = ctx.engine.with_value(|e| {
                e.project_id().map(|project| {
                    let mut data = e.data().clone();
                    sync::apply_layout(&mut data, e.nodes());
                    (project.to_string(), data)
                })
            });
            if let Some((project, data)) = snapshot {
                api::save_project_local(&project, &data);
            }
        }
    }
    ctx.set_frame.update(|n| *n = n.wrapping_add(1));
}

fn text_input_focused() -> bool {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.active_element())
        .map(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA"))
        .unwrap_or(false)
}

fn pointer_input(ev: &web_sys::MouseEvent, canvas: &HtmlCanvasElement) -> PointerInput {
    let rect = canvas.get_bounding_client_rect();
    PointerInput {
        x: ev.client_x() as f64 - rect.left(),
        y: ev.client_y() as f64 - rect.top(),
        shift: ev.shift_key(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    let engine = StoredValue::new_local(CanvasEngine::new());
    let (frame, set_frame) = signal(0u32);
    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    let ctx = CanvasCtx {
        engine,
        frame,
        set_frame,
    };
    provide_context(ctx);

    // Resolve the active project and pull its entity lists. The short delay
    // gives the host bridge time to be injected before the first call.
    Effect::new(move || {
        spawn_local(async move {
            gloo_timers::future::TimeoutFuture::new(50).await;
            let project = api::active_project().await;
            log::info!("loading project {}", project);
            engine.update_value(|e| e.set_project(&project));
            let data = api::load_project(&project).await;
            engine.update_value(|e| e.apply_data(data));
            set_frame.update(|n| *n = n.wrapping_add(1));
        });
    });

    // Host-pushed refreshes: reload entity lists, re-sync nodes. The merge
    // policy keeps the live arrangement, so reloading is always safe.
    Effect::new(move || {
        if !api::is_hosted() {
            return;
        }
        let handler = Closure::new(move |_event: JsValue| {
            spawn_local(async move {
                let Some(project) = engine.with_value(|e| e.project_id().map(str::to_string))
                else {
                    return;
                };
                let data = api::load_project(&project).await;
                engine.update_value(|e| e.apply_data(data));
                set_frame.update(|n| *n = n.wrapping_add(1));
            });
        });
        spawn_local(api::listen_for_refresh(handler));
    });

    // Redraw pass: every state change bumps `frame`, which lands here.
    Effect::new(move || {
        let _ = frame.get();

        if let Some(canvas) = canvas_ref.get() {
            let canvas_el: &HtmlCanvasElement = &canvas;

            let rect = canvas_el.get_bounding_client_rect();
            let display_width = rect.width() as u32;
            let display_height = rect.height() as u32;

            if canvas_el.width() != display_width {
                canvas_el.set_width(display_width);
            }
            if canvas_el.height() != display_height {
                canvas_el.set_height(display_height);
            }
            engine.update_value(|e| e.set_surface_size(rect.width(), rect.height()));

            if let Ok(ctx2d) = get_canvas_context(canvas_el) {
                engine.with_value(|e| render_scene(&ctx2d, canvas_el, e));
            }
        }
    });

    let on_mouse_down = move |ev: web_sys::MouseEvent| {
        let canvas = canvas_ref.get().unwrap();
        let _ = canvas.focus();
        let input = pointer_input(&ev, &canvas);
        engine.update_value(|e| e.pointer_down(input));
        commit_frame(ctx);
    };

    let on_mouse_move = move |ev: web_sys::MouseEvent| {
        let canvas = canvas_ref.get().unwrap();
        let input = pointer_input(&ev, &canvas);
        engine.update_value(|e| e.pointer_move(input));
        commit_frame(ctx);
    };

    let on_mouse_up = move |ev: web_sys::MouseEvent| {
        let canvas = canvas_ref.get().unwrap();
        let input = pointer_input(&ev, &canvas);
        engine.update_value(|e| e.pointer_up(input));
        commit_frame(ctx);
    };

    let on_double_click = move |ev: web_sys::MouseEvent| {
        let canvas = canvas_ref.get().unwrap();
        let input = pointer_input(&ev, &canvas);
        engine.update_value(|e| e.double_click(input));
        commit_frame(ctx);
    };

    let on_wheel = move |ev: web_sys::WheelEvent| {
        ev.prevent_default();
        let canvas = canvas_ref.get().unwrap();
        let rect = canvas.get_bounding_client_rect();
        let x = ev.client_x() as f64 - rect.left();
        let y = ev.client_y() as f64 - rect.top();
        engine.update_value(|e| e.wheel(x, y, ev.delta_y()));
        commit_frame(ctx);
    };

    let on_keydown = move |ev: web_sys::KeyboardEvent| {
        let key = ev.key();
        if key == " " {
            ev.prevent_default();
        }
        engine.update_value(|e| e.key_down(&key, text_input_focused()));
        commit_frame(ctx);
    };

    let on_keyup = move |ev: web_sys::KeyboardEvent| {
        engine.update_value(|e| e.key_up(&ev.key()));
        commit_frame(ctx);
    };

    let cursor_style = move || {
        let _ = frame.get();
        format!(
            "width: 100%; height: 100%; display: block; outline: none; cursor: {};",
            engine.with_value(|e| e.cursor().css())
        )
    };

    view! {
        <div style="width: 100vw; height: 100vh; overflow: hidden; background: #faf9f6; position: relative;">
            <canvas
                node_ref=canvas_ref
                tabindex="0"
                style=cursor_style
                on:mousedown=on_mouse_down
                on:mousemove=on_mouse_move
                on:mouseup=on_mouse_up
                on:mouseleave=on_mouse_up
                on:wheel=on_wheel
                on:dblclick=on_double_click
                on:keydown=on_keydown
                on:keyup=on_keyup
            />
            <AnnotationOverlays />
            <AnnotationEditor />
            <ContextPopup />
            <Toolbar />
            <div style="position: fixed; bottom: 12px; left: 12px; color: #8b857b; \
                        font-family: Inter, 'Segoe UI', system-ui, sans-serif; \
                        font-size: 11px; letter-spacing: 0.4px;">
                "[DRAG] move  [SHIFT] multi-select  [DRAG \u{25CF}] connect  [SPACE+DRAG] pan  [DBLCLK] note  [DEL] delete"
            </div>
        </div>
    }
}
