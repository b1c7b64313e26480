use bevy::asset::AssetMetaCheck;
use bevy::prelude::*;
use bevy::window::PresentMode;
use bevy::winit::WinitSettings;
use bevy_common_assets::json::JsonAssetPlugin;

mod engine;
mod rpc;
mod tools;
mod viewer;

use engine::camera::camera_tween::{advance_camera_tween, CameraTween};
use engine::camera::orbit_camera::{camera_controller, sync_camera_transform, OrbitCamera};
use engine::core::app_state::{transition_to_model_ready, transition_to_running, AppState};
use engine::loading::config_loader::{
    poll_demo_rooms, poll_region_config, start_loading, ConfigLoader,
};
use engine::loading::model_loader::{flatten_model_when_ready, spawn_architectural_model};
use engine::loading::progress::LoadingProgress;
use engine::picking::pointer::{track_pointer, PointerState, StillClickEvent};
use engine::render::schedule::{flush_render_requests, RenderSchedule};
use engine::scene::cursor::{
    spawn_cursor_widgets, update_cursor, update_snapping, CursorMovedEvent, SnapState, SnapThrottle,
};
use engine::spatial::FlattenedGeometry;
use rpc::web_rpc::WebRpcPlugin;
use tools::polyline_widget::update_outline_widget;
use tools::room_outline::{
    handle_editor_actions, handle_outline_clicks, EditorActionEvent, PolygonClosedEvent,
    RoomOutlineTool,
};
use viewer::regions::{
    apply_region_toggles, apply_viewpoint_moves, CameraToViewpointEvent, RegionConfig,
    RoomUnselectEvent, ToggleRegionEvent,
};
use viewer::room::{create_room_materials, RoomsFile};
use viewer::room_registry::{
    apply_room_updates, apply_selection, emit_room_clicks, update_hover, HoverThrottle,
    RoomClickEvent, RoomRegistry, SelectionChangedEvent, SetRoomsEvent, SetSelectionEvent,
};

fn main() {
    let mut app = create_app();

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            app.run();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.run();
    }
}

/// Create the application: render-on-demand windowing, JSON config assets,
/// the RPC bridge and the interaction systems.
fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .add_plugins(JsonAssetPlugin::<RegionConfig>::new(&["regions.json"]))
        .add_plugins(JsonAssetPlugin::<RoomsFile>::new(&["rooms.json"]))
        .add_plugins(WebRpcPlugin)
        // Frames are drawn on request only; see RenderSchedule.
        .insert_resource(WinitSettings::desktop_app())
        .insert_resource(ClearColor(Color::WHITE))
        .init_state::<AppState>();

    app.init_resource::<RenderSchedule>()
        .init_resource::<OrbitCamera>()
        .init_resource::<CameraTween>()
        .init_resource::<PointerState>()
        .init_resource::<FlattenedGeometry>()
        .init_resource::<SnapState>()
        .init_resource::<SnapThrottle>()
        .init_resource::<HoverThrottle>()
        .init_resource::<RoomOutlineTool>()
        .init_resource::<RoomRegistry>()
        .init_resource::<ConfigLoader>()
        .init_resource::<LoadingProgress>();

    app.add_event::<StillClickEvent>()
        .add_event::<CursorMovedEvent>()
        .add_event::<EditorActionEvent>()
        .add_event::<PolygonClosedEvent>()
        .add_event::<SetRoomsEvent>()
        .add_event::<SetSelectionEvent>()
        .add_event::<RoomClickEvent>()
        .add_event::<SelectionChangedEvent>()
        .add_event::<ToggleRegionEvent>()
        .add_event::<CameraToViewpointEvent>()
        .add_event::<RoomUnselectEvent>();

    app.add_systems(
        Startup,
        (
            setup,
            spawn_cursor_widgets,
            create_room_materials,
            spawn_architectural_model,
            start_loading,
        ),
    );

    // Pointer input feeds the cursor, which feeds snapping.
    app.add_systems(Update, (track_pointer, update_cursor, update_snapping).chain());

    // Drag input, then the tween (which supersedes it), then one transform
    // sync so each camera change draws exactly one frame.
    app.add_systems(
        Update,
        (camera_controller, advance_camera_tween, sync_camera_transform).chain(),
    );

    app.add_systems(
        Update,
        (handle_editor_actions, handle_outline_clicks, update_outline_widget).chain(),
    );

    app.add_systems(
        Update,
        (apply_room_updates, apply_selection, update_hover, emit_room_clicks).chain(),
    );

    app.add_systems(Update, (apply_region_toggles, apply_viewpoint_moves));

    app.add_systems(
        Update,
        (
            flatten_model_when_ready,
            poll_region_config,
            poll_demo_rooms,
            transition_to_model_ready,
        )
            .run_if(in_state(AppState::Loading)),
    );
    app.add_systems(OnEnter(AppState::ModelReady), transition_to_running);

    // After everything that may have requested a render this frame.
    app.add_systems(PostUpdate, flush_render_requests);

    app
}

/// Spawn the camera and lighting, then mark the render surface attached.
fn setup(
    mut commands: Commands,
    mut orbit: ResMut<OrbitCamera>,
    mut schedule: ResMut<RenderSchedule>,
) {
    let home_position = Vec3::new(-0.3, 5.5, -7.0);
    let home_target = Vec3::new(0.0, 0.0, -2.0);
    orbit.set_pose(home_position, home_target);

    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(home_position).looking_at(home_target, Vec3::Y),
    ));

    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.87, 0.87, 0.87),
        brightness: 400.0,
        ..default()
    });
    commands.spawn((
        DirectionalLight {
            illuminance: 4000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_translation(Vec3::new(1.0, 2.0, 3.0)).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    schedule.attach_surface();
    schedule.request_render();
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}

fn create_window_config() -> Window {
    #[cfg(target_arch = "wasm32")]
    {
        Window {
            canvas: Some("#floorplan".into()),
            fit_canvas_to_parent: true,
            prevent_default_event_handling: false,
            present_mode: PresentMode::AutoVsync,
            ..default()
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        Window {
            title: "floorplan".into(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }
    }
}
