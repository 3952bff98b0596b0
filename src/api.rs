//! Collaborator boundary. Every mutation the engine proposes is shipped to
//! the host through the `invoke` bridge as a fire-and-forget call; the
//! canvas state is already final in memory, so failures here are logged and
//! surfaced by the host, never fed back into the engine.
//!
//! Without a host bridge (plain browser dev build) the whole project is
//! kept in localStorage instead, keyed by project id.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::engine::EngineRequest;
use crate::state::{Annotation, Code, Insight, NodeKind, ProjectData, Theme};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "core"])]
    async fn invoke(cmd: &str, args: JsValue) -> JsValue;

    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "event"])]
    async fn listen(event: &str, handler: &Closure<dyn Fn(JsValue)>) -> JsValue;
}

const LOCALSTORAGE_PREFIX: &str = "qualboard-project-";
const DEFAULT_PROJECT: &str = "local";

pub fn is_hosted() -> bool {
    web_sys::window()
        .and_then(|w| js_sys::Reflect::get(&w, &JsValue::from_str("__TAURI__")).ok())
        .map(|v| !v.is_undefined())
        .unwrap_or(false)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListEntitiesArgs<'a> {
    kind: NodeKind,
    project_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PositionArgs<'a> {
    kind: NodeKind,
    id: &'a str,
    x: f64,
    y: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SizeArgs<'a> {
    kind: NodeKind,
    id: &'a str,
    width: f64,
    height: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RelationshipArgs<'a> {
    parent_kind: NodeKind,
    parent_id: &'a str,
    child_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateEntityArgs<T: Serialize> {
    kind: NodeKind,
    payload: T,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotationTextArgs<'a> {
    id: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EntityRefArgs<'a> {
    kind: NodeKind,
    id: &'a str,
}

async fn call(cmd: &str, args: &impl Serialize) {
    let args = serde_wasm_bindgen::to_value(args).unwrap_or(JsValue::NULL);
    let _ = invoke(cmd, args).await;
}

async fn list_entities<T>(kind: NodeKind, project_id: &str) -> Vec<T>
where
    T: for<'de> Deserialize<'de>,
{
    let args = serde_wasm_bindgen::to_value(&ListEntitiesArgs { kind, project_id })
        .unwrap_or(JsValue::NULL);
    let result = invoke("list_entities", args).await;
    serde_wasm_bindgen::from_value(result).unwrap_or_else(|err| {
        log::warn!("list_entities({}) returned malformed data: {}", kind.as_str(), err);
        Vec::new()
    })
}

/// Initial/refresh load of every entity list for one project.
pub async fn load_project(project_id: &str) -> ProjectData {
    if is_hosted() {
        ProjectData {
            codes: list_entities::<Code>(NodeKind::Code, project_id).await,
            themes: list_entities::<Theme>(NodeKind::Theme, project_id).await,
            insights: list_entities::<Insight>(NodeKind::Insight, project_id).await,
            annotations: list_entities::<Annotation>(NodeKind::Annotation, project_id).await,
        }
    } else {
        load_project_local(project_id)
    }
}

/// Ship one engine request to the host. No-ops (beyond a breadcrumb) in
/// browser mode, where `save_project_local` snapshots state wholesale.
pub async fn dispatch(request: EngineRequest) {
    if !is_hosted() {
        if let EngineRequest::OpenDetail { kind, id } = &request {
            log::info!("open detail requested for {} {}", kind.as_str(), id);
        }
        return;
    }

    match request {
        EngineRequest::PersistPosition { kind, id, x, y } => {
            call("update_entity_position", &PositionArgs { kind, id: &id, x, y }).await;
        }
        EngineRequest::PersistSize {
            kind,
            id,
            width,
            height,
        } => {
            call(
                "update_entity_size",
                &SizeArgs {
                    kind,
                    id: &id,
                    width,
                    height,
                },
            )
            .await;
        }
        EngineRequest::AddRelationship {
            parent_kind,
            parent_id,
            child_id,
        } => {
            call(
                "add_relationship",
                &RelationshipArgs {
                    parent_kind,
                    parent_id: &parent_id,
                    child_id: &child_id,
                },
            )
            .await;
        }
        EngineRequest::RemoveRelationship {
            parent_kind,
            parent_id,
            child_id,
        } => {
            call(
                "remove_relationship",
                &RelationshipArgs {
                    parent_kind,
                    parent_id: &parent_id,
                    child_id: &child_id,
                },
            )
            .await;
        }
        EngineRequest::CreateAnnotation { annotation } => {
            call(
                "create_entity",
                &CreateEntityArgs {
                    kind: NodeKind::Annotation,
                    payload: annotation,
                },
            )
            .await;
        }
        EngineRequest::CreateTheme { theme } => {
            call(
                "create_entity",
                &CreateEntityArgs {
                    kind: NodeKind::Theme,
                    payload: theme,
                },
            )
            .await;
        }
        EngineRequest::CreateInsight { insight } => {
            call(
                "create_entity",
                &CreateEntityArgs {
                    kind: NodeKind::Insight,
                    payload: insight,
                },
            )
            .await;
        }
        EngineRequest::UpdateAnnotationText { id, text } => {
            call(
                "update_annotation_text",
                &AnnotationTextArgs {
                    id: &id,
                    text: &text,
                },
            )
            .await;
        }
        EngineRequest::DeleteEntity { kind, id } => {
            call("delete_entity", &EntityRefArgs { kind, id: &id }).await;
        }
        EngineRequest::OpenDetail { kind, id } => {
            call("open_entity_detail", &EntityRefArgs { kind, id: &id }).await;
        }
    }
}

/// Subscribe to host-pushed refreshes. The handler is forgotten so it lives
/// for the rest of the page; this is called once per app instance.
pub async fn listen_for_refresh(handler: Closure<dyn Fn(JsValue)>) {
    let _ = listen("project-data-changed", &handler).await;
    handler.forget();
}

/// Which project the host wants on screen. Browser builds read
/// `?project=<id>` from the URL and fall back to a fixed local id.
pub async fn active_project() -> String {
    if is_hosted() {
        let result = invoke("get_active_project", JsValue::NULL).await;
        if let Ok(id) = serde_wasm_bindgen::from_value::<String>(result) {
            if !id.is_empty() {
                return id;
            }
        }
        return DEFAULT_PROJECT.to_string();
    }

    web_sys::window()
        .and_then(|w| w.location().search().ok())
        .and_then(|search| {
            search
                .trim_start_matches('?')
                .split('&')
                .find_map(|pair| pair.strip_prefix("project=").map(|v| v.to_string()))
        })
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| DEFAULT_PROJECT.to_string())
}

pub fn load_project_local(project_id: &str) -> ProjectData {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .and_then(|storage| {
            storage
                .get_item(&format!("{}{}", LOCALSTORAGE_PREFIX, project_id))
                .ok()
                .flatten()
        })
        .and_then(|json| serde_json::from_str::<ProjectData>(&json).ok())
        .unwrap_or_default()
}

pub fn save_project_local(project_id: &str, data: &ProjectData) {
    let Ok(json) = serde_json::to_string(data) else {
        return;
    };
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        let _ = storage.set_item(&format!("{}{}", LOCALSTORAGE_PREFIX, project_id), &json);
    }
}
