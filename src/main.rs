use bevy::prelude::*;

use tilt_maze::{self, MainPlugin};

fn main() {
    App::new()
        .insert_resource(WindowDescriptor {
            title: "Tilt Maze".to_string(),
            width: 480.,
            height: 640.,
            resizable: false,
            cursor_visible: true,
            ..default()
        })
        .add_plugins(DefaultPlugins)
        .add_plugin(MainPlugin)
        .run();
}
