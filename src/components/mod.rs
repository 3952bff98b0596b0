mod annotation_editor;
mod annotation_overlays;
mod context_popup;
mod toolbar;

pub use annotation_editor::AnnotationEditor;
pub use annotation_overlays::AnnotationOverlays;
pub use context_popup::ContextPopup;
pub use toolbar::Toolbar;
