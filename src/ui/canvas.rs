use iced::keyboard::{self, key::Named, Key};
use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Program};
use iced::{Color, Pixels, Point, Rectangle, Renderer, Theme};

use crate::state::viewer::{DragButton, ViewerInput, ViewerKey};
use crate::Message;

/// Input layer stacked on top of the map image
///
/// Turns mouse, wheel and keyboard events into `ViewerInput`s and draws a
/// small readout of the current longitude and zoom.
pub struct ViewerCanvas {
    pub longitude: f64,
    pub zoom: f64,
    /// Shown while the selected view has no frame yet
    pub waiting_for: Option<String>,
}

impl Program<Message> for ViewerCanvas {
    type State = DragState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        let readout = format!("{:+.0}°  x{:.2}", self.longitude, self.zoom);
        frame.fill_text(canvas::Text {
            content: readout,
            position: Point::new(8.0, bounds.height - 22.0),
            color: Color::from_rgba(1.0, 1.0, 1.0, 0.7),
            size: Pixels(14.0),
            ..canvas::Text::default()
        });

        if let Some(view) = &self.waiting_for {
            frame.fill_text(canvas::Text {
                content: format!("Waiting for frames of {}...", view),
                position: Point::new(8.0, 8.0),
                color: Color::from_rgba(1.0, 1.0, 1.0, 0.7),
                size: Pixels(16.0),
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        let input = match event {
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if !cursor.is_over(bounds) {
                    return (canvas::event::Status::Ignored, None);
                }
                // 120 units per notch, as reported by most mice
                let units = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => y as f64 * 120.0,
                    mouse::ScrollDelta::Pixels { y, .. } => y as f64,
                };
                ViewerInput::Wheel(units)
            }

            canvas::Event::Mouse(mouse::Event::ButtonPressed(button)) => {
                // clicking elsewhere hands the keyboard back to the forms
                state.focused = cursor.is_over(bounds);
                let (Some(button), Some(pos)) = (drag_button(button), cursor.position_in(bounds))
                else {
                    return (canvas::event::Status::Ignored, None);
                };
                ViewerInput::Press {
                    button,
                    x: pos.x as f64,
                    y: pos.y as f64,
                }
            }

            canvas::Event::Mouse(mouse::Event::ButtonReleased(button)) => {
                let Some(button) = drag_button(button) else {
                    return (canvas::event::Status::Ignored, None);
                };
                ViewerInput::Release(button)
            }

            // Drags keep tracking outside the widget
            canvas::Event::Mouse(mouse::Event::CursorMoved { position }) => ViewerInput::Move {
                x: (position.x - bounds.x) as f64,
                y: (position.y - bounds.y) as f64,
            },

            canvas::Event::Keyboard(keyboard::Event::KeyPressed { key, .. }) => {
                let Some(key) = state.focused.then(|| viewer_key(&key)).flatten() else {
                    return (canvas::event::Status::Ignored, None);
                };
                ViewerInput::Key(key)
            }

            _ => return (canvas::event::Status::Ignored, None),
        };

        let message = Message::Viewer {
            input,
            width: bounds.width as f64,
            height: bounds.height as f64,
        };
        let status = match input {
            ViewerInput::Move { .. } => canvas::event::Status::Ignored,
            _ => canvas::event::Status::Captured,
        };
        (status, Some(message))
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if cursor.is_over(bounds) {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }
}

/// Whether the viewer has been clicked and should react to keys
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pub focused: bool,
}

fn drag_button(button: mouse::Button) -> Option<DragButton> {
    match button {
        mouse::Button::Left => Some(DragButton::Left),
        mouse::Button::Right => Some(DragButton::Right),
        _ => None,
    }
}

/// Arrows rotate and pan; WASD and ZQSD pan too.
fn viewer_key(key: &Key) -> Option<ViewerKey> {
    match key.as_ref() {
        Key::Named(Named::ArrowRight) => Some(ViewerKey::RotateEast),
        Key::Named(Named::ArrowLeft) => Some(ViewerKey::RotateWest),
        Key::Named(Named::ArrowUp) => Some(ViewerKey::PanUp),
        Key::Named(Named::ArrowDown) => Some(ViewerKey::PanDown),
        Key::Character(c) => match c.to_lowercase().as_str() {
            "w" | "z" => Some(ViewerKey::PanUp),
            "s" => Some(ViewerKey::PanDown),
            "a" | "q" => Some(ViewerKey::PanLeft),
            "d" => Some(ViewerKey::PanRight),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(
            viewer_key(&Key::Named(Named::ArrowRight)),
            Some(ViewerKey::RotateEast)
        );
        assert_eq!(
            viewer_key(&Key::Character("Z".into())),
            Some(ViewerKey::PanUp)
        );
        assert_eq!(
            viewer_key(&Key::Character("q".into())),
            Some(ViewerKey::PanLeft)
        );
        assert_eq!(viewer_key(&Key::Character("x".into())), None);
    }

    #[test]
    fn test_only_left_and_right_drag() {
        assert_eq!(drag_button(mouse::Button::Left), Some(DragButton::Left));
        assert_eq!(drag_button(mouse::Button::Right), Some(DragButton::Right));
        assert_eq!(drag_button(mouse::Button::Middle), None);
    }
}
