use bevy::{prelude::*, render::texture::ImageSettings};
use components::{
    CountdownTextComponent, LevelTextComponent, OverlayComponent, SplashComponent,
    TimerTextComponent,
};
use configuration::Settings;
use maze::{MazeGame, Phase};
use maze_plugin::{
    events::{CountdownTickEvent, LevelCompleteEvent, NextLevelEvent},
    resources::LevelResource,
    MazePlugin,
};

pub mod configuration;
pub mod maze;
pub mod maze_plugin;

pub struct MainPlugin;
impl Plugin for MainPlugin {
    fn build(&self, app: &mut App) {
        let window_description = app.world.resource::<WindowDescriptor>();

        let text_height = 30.;

        let padding = 5.;
        // calculate the region where to put the board
        let top = window_description.height / 2. - text_height;
        let bottom = -window_description.height / 2. + padding;
        let right = window_description.width / 2. - padding;
        let left = -window_description.width / 2. + padding;

        app.insert_resource(ImageSettings::default_nearest())
            .add_startup_system(setup(text_height))
            .add_system(update_countdown_overlay)
            .add_system(update_timer_text)
            .add_system(show_victory_splash)
            .add_system(request_next_level)
            .add_system(reset_hud.after("next_level"))
            .add_plugin(MazePlugin {
                rect: UiRect {
                    top,
                    left,
                    right,
                    bottom,
                },
                settings: Settings::default(),
            });
    }
}

/// Mirrors the countdown on the overlay and drops the overlay once play
/// starts.
fn update_countdown_overlay(
    mut commands: Commands,
    mut countdown_tick_event_reader: EventReader<CountdownTickEvent>,
    mut countdown_text_query: Query<&mut Text, With<CountdownTextComponent>>,
    overlay_query: Query<Entity, With<OverlayComponent>>,
) {
    let left = match countdown_tick_event_reader.iter().last() {
        None => return,
        Some(CountdownTickEvent(left)) => *left,
    };

    if left == 0 {
        for entity in overlay_query.iter() {
            commands.entity(entity).despawn_recursive();
        }
        return;
    }

    for mut text in countdown_text_query.iter_mut() {
        text.sections[0].value = left.to_string();
    }
}

fn update_timer_text(
    time: Res<Time>,
    game: Res<MazeGame>,
    mut timer_text_query: Query<&mut Text, With<TimerTextComponent>>,
) {
    let elapsed = match game.elapsed(time.time_since_startup()) {
        // still counting down
        None => return,
        Some(elapsed) => elapsed,
    };

    for mut text in timer_text_query.iter_mut() {
        text.sections[0].value = format!("Time: {}s", elapsed.as_secs());
    }
}

fn show_victory_splash(
    mut level_complete_event_reader: EventReader<LevelCompleteEvent>,
    commands: Commands,
    asset_server: Res<AssetServer>,
    level: Res<LevelResource>,
) {
    let result = match level_complete_event_reader.iter().last() {
        None => return,
        Some(LevelCompleteEvent(result)) => result.clone(),
    };

    info!(
        "level {} complete in {}s",
        level.number(),
        result.elapsed_seconds()
    );

    spawn_victory_screen(
        commands,
        asset_server,
        level.number(),
        result.elapsed_seconds(),
    );
}

/// Return advances to the next level, but only once the current one is done.
fn request_next_level(
    keyboard: Res<Input<KeyCode>>,
    game: Res<MazeGame>,
    mut next_level_event_writer: EventWriter<NextLevelEvent>,
) {
    if !matches!(game.phase(), Phase::Completed { .. }) {
        return;
    }

    if keyboard.just_pressed(KeyCode::Return) {
        next_level_event_writer.send(NextLevelEvent);
    }
}

/// Runs after the plugin has rebuilt the session: clears the victory splash,
/// refreshes the level label and puts the countdown overlay back up.
fn reset_hud(
    mut commands: Commands,
    mut next_level_event_reader: EventReader<NextLevelEvent>,
    asset_server: Res<AssetServer>,
    settings: Res<Settings>,
    level: Res<LevelResource>,
    splash_query: Query<Entity, With<SplashComponent>>,
    mut level_text_query: Query<&mut Text, With<LevelTextComponent>>,
) {
    if next_level_event_reader.iter().count() == 0 {
        return;
    }

    for entity in splash_query.iter() {
        commands.entity(entity).despawn_recursive();
    }

    for mut text in level_text_query.iter_mut() {
        text.sections[0].value = format!("Level {}", level.number());
    }

    spawn_countdown_overlay(&mut commands, &asset_server, settings.countdown_ticks);
}

fn setup(
    text_height: f32,
) -> impl Fn(Commands, Res<AssetServer>, Res<Settings>, Res<LevelResource>) {
    move |mut commands: Commands,
          asset_server: Res<AssetServer>,
          settings: Res<Settings>,
          level: Res<LevelResource>| {
        let font = asset_server.load("RobotoMedium-Owv4.ttf");

        // set up the camera
        let camera = Camera2dBundle::default();
        commands.spawn_bundle(camera);

        let distance_from_border_top = 5.;
        let distance_from_bottom = 5.;
        let font_size = text_height - distance_from_border_top - distance_from_bottom;

        let text_style = TextStyle {
            font,
            font_size,
            color: Color::WHITE,
        };

        commands
            .spawn_bundle(
                TextBundle::from_section(format!("Level {}", level.number()), text_style.clone())
                    .with_text_alignment(TextAlignment::TOP_LEFT)
                    .with_style(Style {
                        align_self: AlignSelf::FlexEnd,
                        position_type: PositionType::Absolute,
                        position: UiRect {
                            top: Val::Px(distance_from_border_top),
                            left: Val::Px(15.0),
                            ..default()
                        },
                        ..default()
                    }),
            )
            .insert(LevelTextComponent);

        commands
            .spawn_bundle(
                TextBundle::from_section("Time: 0s", text_style)
                    .with_text_alignment(TextAlignment::TOP_RIGHT)
                    .with_style(Style {
                        align_self: AlignSelf::FlexEnd,
                        position_type: PositionType::Absolute,
                        position: UiRect {
                            top: Val::Px(distance_from_border_top),
                            right: Val::Px(15.0),
                            ..default()
                        },
                        ..default()
                    }),
            )
            .insert(TimerTextComponent);

        spawn_countdown_overlay(&mut commands, &asset_server, settings.countdown_ticks);
    }
}

fn spawn_countdown_overlay(commands: &mut Commands, asset_server: &AssetServer, ticks: u8) {
    let font = asset_server.load("RobotoMedium-Owv4.ttf");
    let text_style = TextStyle {
        font,
        font_size: 72.0,
        color: Color::CYAN,
    };

    commands
        .spawn_bundle(NodeBundle {
            style: Style {
                size: Size::new(Val::Percent(100.0), Val::Percent(100.0)),
                position_type: PositionType::Absolute,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            color: Color::rgba(0.0, 0.0, 0.0, 0.6).into(),
            ..default()
        })
        .insert(OverlayComponent)
        .with_children(|parent| {
            parent
                .spawn_bundle(
                    TextBundle::from_section(ticks.to_string(), text_style)
                        .with_text_alignment(TextAlignment::CENTER),
                )
                .insert(CountdownTextComponent);
        });
}

fn spawn_victory_screen(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    level_number: usize,
    seconds: u64,
) {
    let box_size = Vec2::new(300.0, 300.0);
    let box_position = Vec2::new(0.0, 0.0);

    let font = asset_server.load("RobotoMedium-Owv4.ttf");
    let text_style = TextStyle {
        font,
        font_size: 30.0,
        color: Color::WHITE,
    };

    commands
        .spawn_bundle(SpriteBundle {
            sprite: Sprite {
                color: Color::rgba(0.0, 0.0, 0.0, 0.975),
                custom_size: Some(Vec2::new(box_size.x, box_size.y)),
                ..default()
            },
            transform: Transform::from_translation(box_position.extend(5.0)),
            ..default()
        })
        .insert(SplashComponent);

    commands
        .spawn_bundle(NodeBundle {
            style: Style {
                size: Size::new(Val::Percent(100.0), Val::Percent(100.0)),
                position_type: PositionType::Absolute,
                justify_content: JustifyContent::Center,
                ..default()
            },
            color: Color::NONE.into(),
            ..default()
        })
        .insert(SplashComponent)
        .with_children(|parent| {
            parent.spawn_bundle(
                TextBundle::from_section(
                    format!(
                        "Victory!\nLevel {} in {}s\nPress Enter for the next level",
                        level_number, seconds
                    ),
                    text_style.clone(),
                )
                .with_text_alignment(TextAlignment::CENTER)
                .with_style(Style {
                    align_self: AlignSelf::Center,
                    ..default()
                }),
            );
        });
}

mod components {
    use bevy::prelude::Component;

    #[derive(Component)]
    pub struct LevelTextComponent;

    #[derive(Component)]
    pub struct TimerTextComponent;

    #[derive(Component)]
    pub struct OverlayComponent;

    #[derive(Component)]
    pub struct CountdownTextComponent;

    #[derive(Component)]
    pub struct SplashComponent;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bevy::prelude::*;

    use crate::{
        maze::{MazeGame, Phase, Position, TiltSample},
        maze_plugin::events::TiltEvent,
        MainPlugin,
    };

    #[test]
    fn test_e2e() {
        let mut app = create_app();
        app.update();

        // input is frozen until the countdown has run out
        send_tilt(&mut app, 0.8, 0.0, Duration::from_millis(50));
        app.update();
        {
            let game = app.world.resource::<MazeGame>();
            assert!(matches!(game.phase(), Phase::Countdown { .. }));
            assert_eq!(game.player(), Position::new(0, 0));
        }

        // skip the countdown deterministically instead of waiting on timers
        {
            let mut game = app.world.resource_mut::<MazeGame>();
            while game.tick_countdown(Duration::ZERO).is_some() {}
            assert!(matches!(game.phase(), Phase::Playing { .. }));
        }

        // a perfect maze always opens at least one of the two start neighbours
        let (sample, expected) = {
            let game = app.world.resource::<MazeGame>();
            if game.grid().is_path(Position::new(1, 0)) {
                (
                    TiltSample::new(0.8, 0.0, Duration::from_millis(500)),
                    Position::new(1, 0),
                )
            } else {
                (
                    TiltSample::new(0.0, -0.8, Duration::from_millis(500)),
                    Position::new(0, 1),
                )
            }
        };

        send_tilt(&mut app, sample.x, sample.y, sample.at);
        app.update();
        assert_eq!(app.world.resource::<MazeGame>().player(), expected);

        info!("first move accepted, checking the debounce");

        // the reverse move leads back to an open cell, so only the debounce
        // can be holding it back
        send_tilt(
            &mut app,
            -sample.x,
            -sample.y,
            sample.at + Duration::from_millis(50),
        );
        app.update();
        assert_eq!(app.world.resource::<MazeGame>().player(), expected);

        // once the window has passed the reverse move goes through
        send_tilt(
            &mut app,
            -sample.x,
            -sample.y,
            sample.at + Duration::from_millis(200),
        );
        app.update();
        assert_eq!(
            app.world.resource::<MazeGame>().player(),
            Position::new(0, 0)
        );
    }

    fn send_tilt(app: &mut App, x: f32, y: f32, at: Duration) {
        let world = &mut app.world;
        let mut tilt_events = world.get_resource_mut::<Events<TiltEvent>>().unwrap();
        tilt_events.send(TiltEvent(TiltSample::new(x, y, at)));
    }

    fn create_app() -> App {
        use bevy::{
            asset::AssetPlugin, core::CorePlugin, input::InputPlugin, time::TimePlugin,
            utils::tracing::subscriber::set_global_default, window::WindowPlugin,
        };
        use tracing_log::LogTracer;
        use tracing_subscriber::{prelude::*, registry::Registry, EnvFilter};

        if LogTracer::init().is_ok() {
            let filter_layer = EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new("OFF,tilt_maze=INFO"))
                .unwrap();
            let subscriber = Registry::default().with(filter_layer);
            let fmt_layer = tracing_subscriber::fmt::Layer::default();
            let subscriber = subscriber.with(fmt_layer);
            set_global_default(subscriber).unwrap();
        }

        let mut app = App::new();

        app.insert_resource(WindowDescriptor {
            title: "Tilt Maze".to_string(),
            width: 480.,
            height: 640.,
            resizable: false,
            ..default()
        });

        // no render, winit or GPU plugins: the game logic runs headless and
        // the spawned sprites are plain components
        app.add_plugin(CorePlugin::default());
        app.add_plugin(TimePlugin::default());
        app.add_plugin(TransformPlugin::default());
        app.add_plugin(HierarchyPlugin::default());
        app.add_plugin(InputPlugin::default());
        app.add_plugin(WindowPlugin::default());
        app.add_plugin(AssetPlugin::default());

        app.add_plugin(MainPlugin);

        app
    }
}
