/// Navigation state of the map viewer: which view is shown, at which
/// longitude, how far zoomed in and where the zoom window is centred.
use crate::backend::frames::normalize_longitude;

/// Degrees per arrow-key step
const ROTATION_STEP: f64 = 5.0;
/// Pixels per pan key press
const PAN_STEP: f64 = 20.0;
/// Pan speed multiplier for mouse drags
const DRAG_PAN_SPEED: f64 = 3.0;
/// Zoom change per wheel unit (120 units per notch)
const ZOOM_STEP: f64 = 0.002;
/// Smallest image width shown when fully zoomed in
const MIN_VISIBLE_WIDTH: f64 = 400.0;

/// Mouse button driving a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragButton {
    /// Spin the globe (horizontal) and pan vertically
    Left,
    /// Pan in both directions
    Right,
}

/// Keys the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKey {
    RotateEast,
    RotateWest,
    PanUp,
    PanDown,
    PanLeft,
    PanRight,
}

/// Input event, positions in widget coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerInput {
    Press { button: DragButton, x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Release(DragButton),
    /// Wheel movement in wheel-angle units (120 per notch, positive = up)
    Wheel(f64),
    Key(ViewerKey),
    /// Widget size changed
    Resize { width: f64, height: f64 },
}

/// Crop rectangle in image pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    button: DragButton,
    start_x: f64,
    start_longitude: f64,
    last_x: f64,
    last_y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    pub current_view: String,
    /// Requested view still waiting for its first frame
    pub pending_view: Option<String>,
    pub longitude: f64,
    pub zoom: f64,
    pub center_x: f64,
    pub center_y: f64,
    viewport: (f64, f64),
    drag: Option<Drag>,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            current_view: String::new(),
            pending_view: None,
            longitude: 0.0,
            zoom: 1.0,
            center_x: 0.0,
            center_y: 0.0,
            viewport: (800.0, 600.0),
            drag: None,
        }
    }
}

impl ViewerState {
    /// Switch to `view` if it has frames to show. Otherwise remember the
    /// request; `frame_arrived` completes it later.
    pub fn select_view(&mut self, view: &str, has_frames: bool, image_size: (u32, u32)) {
        if has_frames {
            self.current_view = view.to_string();
            self.pending_view = None;
            self.center_on(image_size);
        } else {
            self.pending_view = Some(view.to_string());
        }
    }

    /// A frame of `view` landed; finish a pending selection if it matches.
    /// Returns true when the shown view changed.
    pub fn frame_arrived(&mut self, view: &str, image_size: (u32, u32)) -> bool {
        if self.pending_view.as_deref() == Some(view) {
            self.select_view(view, true, image_size);
            true
        } else {
            false
        }
    }

    /// The shown view went away; fall back to the default view.
    pub fn view_closed(&mut self, view: &str) {
        if self.current_view == view {
            self.current_view = String::new();
        }
        if self.pending_view.as_deref() == Some(view) {
            self.pending_view = None;
        }
    }

    fn center_on(&mut self, (width, height): (u32, u32)) {
        self.center_x = width as f64 / 2.0;
        self.center_y = height as f64 / 2.0;
    }

    pub fn rotate_east(&mut self) {
        self.longitude = normalize_longitude(self.longitude + ROTATION_STEP);
    }

    pub fn rotate_west(&mut self) {
        self.longitude = normalize_longitude(self.longitude - ROTATION_STEP);
    }

    /// Apply an input event. `image_size` is the size of the frame
    /// currently displayed, used for clamping pans and zoom.
    pub fn handle(&mut self, input: ViewerInput, image_size: (u32, u32)) {
        let (image_w, image_h) = (image_size.0 as f64, image_size.1 as f64);
        match input {
            ViewerInput::Key(key) => match key {
                ViewerKey::RotateEast => self.rotate_east(),
                ViewerKey::RotateWest => self.rotate_west(),
                ViewerKey::PanUp => self.center_y -= PAN_STEP,
                ViewerKey::PanDown => self.center_y += PAN_STEP,
                ViewerKey::PanLeft => self.center_x -= PAN_STEP,
                ViewerKey::PanRight => self.center_x += PAN_STEP,
            },
            ViewerInput::Press { button, x, y } => {
                if self.drag.is_none() {
                    self.drag = Some(Drag {
                        button,
                        start_x: x,
                        start_longitude: self.longitude,
                        last_x: x,
                        last_y: y,
                    });
                }
            }
            ViewerInput::Release(button) => {
                if self.drag.map(|d| d.button) == Some(button) {
                    self.drag = None;
                }
            }
            ViewerInput::Move { x, y } => {
                let Some(mut drag) = self.drag else {
                    return;
                };
                match drag.button {
                    DragButton::Left => {
                        let moved = drag.start_x - x;
                        let width = self.viewport.0.max(1.0);
                        self.longitude = normalize_longitude(
                            drag.start_longitude + moved * 360.0 / (width * self.zoom),
                        );
                    }
                    DragButton::Right => {
                        self.center_x += (drag.last_x - x) * DRAG_PAN_SPEED / self.zoom;
                        self.center_x = self.center_x.max(0.0).min(image_w);
                    }
                }
                self.center_y += (drag.last_y - y) * DRAG_PAN_SPEED / self.zoom;
                self.center_y = self.center_y.max(0.0).min(image_h);

                drag.last_x = x;
                drag.last_y = y;
                self.drag = Some(drag);
            }
            ViewerInput::Wheel(delta) => {
                let max_zoom = (image_w / MIN_VISIBLE_WIDTH).max(1.0);
                self.zoom *= 1.0 - ZOOM_STEP * delta;
                self.zoom = self.zoom.clamp(1.0, max_zoom);
            }
            ViewerInput::Resize { width, height } => {
                self.viewport = (width, height);
            }
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Part of the image to show at the current zoom, or None for the
    /// whole image. Moves the centre back inside the image if needed.
    pub fn visible_region(&mut self, image_size: (u32, u32)) -> Option<Region> {
        if self.zoom <= 1.0 || image_size.0 == 0 || image_size.1 == 0 {
            return None;
        }
        let (width, height) = (image_size.0 as f64, image_size.1 as f64);
        let (view_w, view_h) = (self.viewport.0.max(1.0), self.viewport.1.max(1.0));

        let mut crop_w = width / self.zoom;
        let mut crop_h = height / self.zoom;
        // match the widget's aspect ratio
        if crop_w / crop_h > view_w / view_h {
            crop_h = view_h * crop_w / view_w;
        } else if crop_w / crop_h < view_w / view_h {
            crop_w = view_w * crop_h / view_h;
        }

        let x = (self.center_x - crop_w / 2.0).max(0.0).min(width - crop_w);
        let y = (self.center_y - crop_h / 2.0).max(0.0).min(height - crop_h);
        self.center_x = x + crop_w / 2.0;
        self.center_y = y + crop_h / 2.0;

        // the stretched rectangle can exceed the image on one axis
        let x = x.max(0.0);
        let y = y.max(0.0);
        Some(Region {
            x: x as u32,
            y: y as u32,
            width: (crop_w.min(width - x)).max(1.0) as u32,
            height: (crop_h.min(height - y)).max(1.0) as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE: (u32, u32) = (2000, 1000);

    #[test]
    fn test_rotation_wraps() {
        let mut viewer = ViewerState::default();
        viewer.longitude = 178.0;
        viewer.rotate_east();
        assert_eq!(viewer.longitude, -177.0);
        viewer.rotate_west();
        assert_eq!(viewer.longitude, 178.0);

        viewer.longitude = -178.0;
        viewer.handle(ViewerInput::Key(ViewerKey::RotateWest), IMAGE);
        assert_eq!(viewer.longitude, 177.0);
    }

    #[test]
    fn test_left_drag_spins() {
        let mut viewer = ViewerState::default();
        viewer.handle(ViewerInput::Resize { width: 720.0, height: 360.0 }, IMAGE);
        viewer.handle(ViewerInput::Press { button: DragButton::Left, x: 400.0, y: 100.0 }, IMAGE);
        // dragging left by 90px over a 720px wide widget = 45°
        viewer.handle(ViewerInput::Move { x: 310.0, y: 100.0 }, IMAGE);
        assert_eq!(viewer.longitude, 45.0);
        viewer.handle(ViewerInput::Move { x: 490.0, y: 100.0 }, IMAGE);
        assert_eq!(viewer.longitude, -45.0);
        viewer.handle(ViewerInput::Release(DragButton::Left), IMAGE);
        assert!(!viewer.is_dragging());

        viewer.handle(ViewerInput::Move { x: 0.0, y: 0.0 }, IMAGE);
        assert_eq!(viewer.longitude, -45.0);
    }

    #[test]
    fn test_right_drag_pans_within_image() {
        let mut viewer = ViewerState::default();
        viewer.select_view("v", true, IMAGE);
        viewer.handle(ViewerInput::Press { button: DragButton::Right, x: 0.0, y: 0.0 }, IMAGE);
        viewer.handle(ViewerInput::Move { x: -10.0, y: 5.0 }, IMAGE);
        assert_eq!((viewer.center_x, viewer.center_y), (1030.0, 485.0));

        viewer.handle(ViewerInput::Move { x: -10_000.0, y: 5.0 }, IMAGE);
        assert_eq!(viewer.center_x, 2000.0);

        // a left press during a right drag is ignored
        viewer.handle(ViewerInput::Press { button: DragButton::Left, x: 0.0, y: 0.0 }, IMAGE);
        viewer.handle(ViewerInput::Release(DragButton::Left), IMAGE);
        assert!(viewer.is_dragging());
    }

    #[test]
    fn test_wheel_zoom_is_clamped() {
        let mut viewer = ViewerState::default();
        viewer.handle(ViewerInput::Wheel(-120.0), IMAGE);
        assert!((viewer.zoom - 1.24).abs() < 1e-9);

        for _ in 0..50 {
            viewer.handle(ViewerInput::Wheel(-120.0), IMAGE);
        }
        assert_eq!(viewer.zoom, 5.0);

        for _ in 0..50 {
            viewer.handle(ViewerInput::Wheel(120.0), IMAGE);
        }
        assert_eq!(viewer.zoom, 1.0);

        // images narrower than the zoom limit can't be zoomed at all
        viewer.handle(ViewerInput::Wheel(-120.0), (300, 150));
        assert_eq!(viewer.zoom, 1.0);
    }

    #[test]
    fn test_visible_region() {
        let mut viewer = ViewerState::default();
        assert_eq!(viewer.visible_region(IMAGE), None);

        viewer.handle(ViewerInput::Resize { width: 800.0, height: 400.0 }, IMAGE);
        viewer.select_view("v", true, IMAGE);
        viewer.zoom = 2.0;
        assert_eq!(
            viewer.visible_region(IMAGE),
            Some(Region { x: 500, y: 250, width: 1000, height: 500 })
        );

        // centre pushed against the corner gets pulled back inside
        viewer.center_x = 0.0;
        viewer.center_y = 10_000.0;
        assert_eq!(
            viewer.visible_region(IMAGE),
            Some(Region { x: 0, y: 500, width: 1000, height: 500 })
        );
        assert_eq!((viewer.center_x, viewer.center_y), (500.0, 750.0));
    }

    #[test]
    fn test_pending_selection() {
        let mut viewer = ViewerState::default();
        viewer.select_view("spin", false, (0, 0));
        assert_eq!(viewer.current_view, "");
        assert!(!viewer.frame_arrived("other", IMAGE));
        assert!(viewer.frame_arrived("spin", IMAGE));
        assert_eq!(viewer.current_view, "spin");
        assert_eq!((viewer.center_x, viewer.center_y), (1000.0, 500.0));

        viewer.view_closed("spin");
        assert_eq!(viewer.current_view, "");
    }
}
