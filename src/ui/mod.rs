/// Custom widgets and dialog views
///
/// - `canvas.rs` - input layer and readout over the map image
/// - `forms.rs` - dialog forms shown in place of the viewer

pub mod canvas;
pub mod forms;
