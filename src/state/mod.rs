/// Client-side state
///
/// - Frame caches keyed by rotation angle (frames.rs)
/// - Viewer navigation: longitude, zoom, pan (viewer.rs)
/// - Tabs of open worlds and their views (workspace.rs)
/// - Dialog form models (forms.rs)

pub mod forms;
pub mod frames;
pub mod viewer;
pub mod workspace;
