//! Frame-coherent keyboard and mouse state.

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Input state accumulated from window events, reset once per frame.
pub struct Input {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    mouse_down: HashSet<MouseButton>,
    mouse_position: Vec2,
    last_mouse_position: Vec2,
    scroll: f32,
}

impl Input {
    pub fn new() -> Self {
        Self {
            keys_down: HashSet::new(),
            keys_pressed: HashSet::new(),
            mouse_down: HashSet::new(),
            mouse_position: Vec2::ZERO,
            last_mouse_position: Vec2::ZERO,
            scroll: 0.0,
        }
    }

    /// Clears the per-frame edges. Call after the frame has been processed.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.scroll = 0.0;
        self.last_mouse_position = self.mouse_position;
    }

    /// Feeds one window event into the state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.on_key(code, event.state == ElementState::Pressed);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => {
                    self.mouse_down.insert(*button);
                }
                ElementState::Released => {
                    self.mouse_down.remove(button);
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = Vec2::new(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
            }
            _ => {}
        }
    }

    fn on_key(&mut self, code: KeyCode, pressed: bool) {
        if pressed {
            if self.keys_down.insert(code) {
                self.keys_pressed.insert(code);
            }
        } else {
            self.keys_down.remove(&code);
        }
    }

    /// True while the key is held.
    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// True only on the frame the key went down.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_down.contains(&button)
    }

    /// Cursor movement since the previous frame, in pixels.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_position - self.last_mouse_position
    }

    /// Scroll accumulated this frame, in lines.
    pub fn scroll(&self) -> f32 {
        self.scroll
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressed_is_edge_triggered() {
        let mut input = Input::new();
        input.on_key(KeyCode::ArrowRight, true);
        assert!(input.key_pressed(KeyCode::ArrowRight));
        assert!(input.key_down(KeyCode::ArrowRight));

        input.end_frame();
        assert!(!input.key_pressed(KeyCode::ArrowRight));
        assert!(input.key_down(KeyCode::ArrowRight));

        // Holding the key does not retrigger the edge.
        input.on_key(KeyCode::ArrowRight, true);
        assert!(!input.key_pressed(KeyCode::ArrowRight));
        input.on_key(KeyCode::ArrowRight, false);
        assert!(!input.key_down(KeyCode::ArrowRight));
    }
}
