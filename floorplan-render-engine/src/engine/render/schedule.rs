use bevy::prelude::*;
use bevy::window::RequestRedraw;

/// Render-on-demand scheduler. The app runs winit in reactive mode, so a
/// frame is only drawn when something asks for one; every state change that
/// affects the picture calls [`RenderSchedule::request_render`] and the
/// requests collapse into at most one redraw per display frame.
#[derive(Resource, Default)]
pub struct RenderSchedule {
    surface_attached: bool,
    pending: bool,
}

impl RenderSchedule {
    /// Mark the render surface (window + camera) as constructed. Must happen
    /// before the first render request.
    pub fn attach_surface(&mut self) {
        self.surface_attached = true;
    }

    pub fn is_attached(&self) -> bool {
        self.surface_attached
    }

    /// Mark a render as needed. Any number of calls before the next frame
    /// flush results in exactly one redraw.
    ///
    /// Panics if no surface has been attached yet: a render request during
    /// construction is an ordering bug in the integrating code, not a state
    /// to limp through.
    pub fn request_render(&mut self) {
        if !self.surface_attached {
            panic!("render requested before a surface was attached; spawn the camera first");
        }
        self.pending = true;
    }

    /// Consume the pending flag, returning whether a redraw is due.
    pub fn take_pending(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

/// Emits at most one `RequestRedraw` per frame. Runs in `PostUpdate`, after
/// every system that may have requested a render.
pub fn flush_render_requests(
    mut schedule: ResMut<RenderSchedule>,
    mut redraw: EventWriter<RequestRedraw>,
) {
    if schedule.take_pending() {
        redraw.write(RequestRedraw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_requests_coalesce_into_one_redraw() {
        let mut schedule = RenderSchedule::default();
        schedule.attach_surface();

        for _ in 0..5 {
            schedule.request_render();
        }

        assert!(schedule.take_pending());
        // The flush consumed the flag; nothing further is due.
        assert!(!schedule.take_pending());
    }

    #[test]
    fn requests_after_a_flush_schedule_a_new_redraw() {
        let mut schedule = RenderSchedule::default();
        schedule.attach_surface();

        schedule.request_render();
        assert!(schedule.take_pending());

        schedule.request_render();
        assert!(schedule.take_pending());
    }

    #[test]
    #[should_panic(expected = "before a surface was attached")]
    fn requesting_without_a_surface_is_a_construction_bug() {
        let mut schedule = RenderSchedule::default();
        schedule.request_render();
    }
}
