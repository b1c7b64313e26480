use bevy::prelude::*;
use bevy::window::PrimaryWindow;

/// A click that was not the start of a camera drag: pointer-down followed by
/// pointer-up with no movement in between. Orbit and pan gestures share the
/// canvas with selection clicks, so raw button-up events are useless here.
#[derive(Event, Debug, Clone, Copy)]
pub struct StillClickEvent {
    pub button: MouseButton,
}

/// Current pointer position in window coordinates and normalized device
/// coordinates, plus the still-click tracking state.
#[derive(Resource, Default)]
pub struct PointerState {
    pub position: Vec2,
    pub ndc: Vec2,
    still: bool,
}

impl PointerState {
    pub fn pointer_down(&mut self) {
        self.still = true;
    }

    /// Any movement between down and up turns the gesture into a drag.
    pub fn pointer_moved(&mut self, position: Vec2, window_size: Vec2) {
        self.position = position;
        self.ndc = Vec2::new(
            (position.x / window_size.x) * 2.0 - 1.0,
            -(position.y / window_size.y) * 2.0 + 1.0,
        );
        self.still = false;
    }

    /// Returns whether the release completes a still click.
    pub fn pointer_up(&mut self) -> bool {
        std::mem::take(&mut self.still)
    }
}

/// Tracks the pointer and emits [`StillClickEvent`]s. Movement is read from
/// `CursorMoved` so the NDC conversion always matches the primary window.
pub fn track_pointer(
    windows: Query<&Window, With<PrimaryWindow>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut cursor_moved: EventReader<CursorMoved>,
    mut pointer: ResMut<PointerState>,
    mut clicks: EventWriter<StillClickEvent>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let window_size = Vec2::new(window.width(), window.height());

    for button in [MouseButton::Left, MouseButton::Right] {
        if mouse.just_pressed(button) {
            pointer.pointer_down();
        }
    }

    for moved in cursor_moved.read() {
        pointer.pointer_moved(moved.position, window_size);
    }

    for button in [MouseButton::Left, MouseButton::Right] {
        if mouse.just_released(button) && pointer.pointer_up() {
            clicks.write(StillClickEvent { button });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn down_then_up_is_a_click() {
        let mut pointer = PointerState::default();
        pointer.pointer_down();
        assert!(pointer.pointer_up());
    }

    #[test]
    fn down_move_up_is_a_drag_not_a_click() {
        let mut pointer = PointerState::default();
        pointer.pointer_down();
        pointer.pointer_moved(Vec2::new(10.0, 10.0), Vec2::new(800.0, 600.0));
        assert!(!pointer.pointer_up());
    }

    #[test]
    fn click_state_does_not_leak_into_the_next_release() {
        let mut pointer = PointerState::default();
        pointer.pointer_down();
        assert!(pointer.pointer_up());
        // A stray release without a preceding press is not a click.
        assert!(!pointer.pointer_up());
    }

    #[test]
    fn ndc_conversion_spans_the_window() {
        let mut pointer = PointerState::default();
        let window = Vec2::new(800.0, 600.0);

        pointer.pointer_moved(Vec2::ZERO, window);
        assert_eq!(pointer.ndc, Vec2::new(-1.0, 1.0));

        pointer.pointer_moved(window, window);
        assert_eq!(pointer.ndc, Vec2::new(1.0, -1.0));

        pointer.pointer_moved(window / 2.0, window);
        assert_eq!(pointer.ndc, Vec2::ZERO);
    }
}
