use bevy::prelude::*;

use crate::configuration::Settings;
use crate::maze::{MazeGame, MoveOutcome, Phase, Position, TiltSample};

use self::{components::*, events::*, resources::*};

const WALL_Z: f32 = 0.;
const GOAL_Z: f32 = 0.;
// The player renders over the goal glow
const PLAYER_Z: f32 = 1.;

pub struct MazePlugin {
    pub rect: UiRect<f32>,
    pub settings: Settings,
}

impl Plugin for MazePlugin {
    fn build(&self, app: &mut App) {
        self.settings.validate().unwrap();

        let rect = BoardRectResource {
            left: self.rect.left,
            right: self.rect.right,
            top: self.rect.top,
            bottom: self.rect.bottom,
        };
        let game = MazeGame::new(self.settings.initial_difficulty, self.settings.tuning());
        let draw_configuration = fit_draw_configuration(&rect, self.settings.initial_difficulty);

        app.insert_resource(game)
            .insert_resource(LevelResource {
                difficulty: self.settings.initial_difficulty,
            })
            .insert_resource(rect)
            .insert_resource(draw_configuration)
            .insert_resource(CountdownTimerResource(Timer::from_seconds(1.0, true)))
            .insert_resource(SensorTimerResource(Timer::new(
                self.settings.sensor_interval,
                true,
            )))
            .insert_resource(self.settings.clone())
            .init_resource::<SpriteBundles>()
            .add_event::<TiltEvent>()
            .add_event::<CountdownTickEvent>()
            .add_event::<PlayerMovedEvent>()
            .add_event::<LevelCompleteEvent>()
            .add_event::<NextLevelEvent>()
            .add_startup_system(draw_board)
            .add_system(run_countdown)
            .add_system(sample_tilt.label("sensor"))
            .add_system(apply_tilt.label("play").after("sensor"))
            .add_system(update_player.after("play"))
            .add_system(start_next_level.label("next_level"));
    }
}

/// Drives the pre-game countdown off a one-second timer. Once play starts the
/// session leaves the countdown phase and this system goes quiet.
fn run_countdown(
    time: Res<Time>,
    mut countdown_timer: ResMut<CountdownTimerResource>,
    mut game: ResMut<MazeGame>,
    mut tick_event_writer: EventWriter<CountdownTickEvent>,
) {
    if !matches!(game.phase(), Phase::Countdown { .. }) {
        return;
    }
    if !countdown_timer.0.tick(time.delta()).finished() {
        return;
    }

    if let Some(left) = game.tick_countdown(time.time_since_startup()) {
        debug!("countdown: {}", left);
        tick_event_writer.send(CountdownTickEvent(left));
    }
}

/// Synthesizes one tilt sample per sensor interval from the first gamepad's
/// left stick and/or the held arrow keys. The sample is emitted regardless of
/// magnitude; the game's dead zone does the filtering, exactly like a real
/// accelerometer stream.
fn sample_tilt(
    time: Res<Time>,
    settings: Res<Settings>,
    mut sensor_timer: ResMut<SensorTimerResource>,
    keyboard: Res<Input<KeyCode>>,
    gamepads: Res<Gamepads>,
    axes: Res<Axis<GamepadAxis>>,
    mut tilt_event_writer: EventWriter<TiltEvent>,
) {
    if !sensor_timer.0.tick(time.delta()).finished() {
        return;
    }

    let (mut x, mut y) = (0.0_f32, 0.0_f32);

    if let Some(gamepad) = gamepads.iter().next() {
        x = axes
            .get(GamepadAxis::new(*gamepad, GamepadAxisType::LeftStickX))
            .unwrap_or(0.0);
        // pushing the stick forward reads like tilting the device forward
        y = -axes
            .get(GamepadAxis::new(*gamepad, GamepadAxisType::LeftStickY))
            .unwrap_or(0.0);
    }

    let magnitude = settings.tilt_magnitude;
    if keyboard.pressed(KeyCode::Left) {
        x -= magnitude;
    }
    if keyboard.pressed(KeyCode::Right) {
        x += magnitude;
    }
    // arrow keys follow the accelerometer convention: down is a forward tilt
    if keyboard.pressed(KeyCode::Up) {
        y += magnitude;
    }
    if keyboard.pressed(KeyCode::Down) {
        y -= magnitude;
    }

    tilt_event_writer.send(TiltEvent(TiltSample::new(x, y, time.time_since_startup())));
}

fn apply_tilt(
    mut tilt_event_reader: EventReader<TiltEvent>,
    mut game: ResMut<MazeGame>,
    mut moved_event_writer: EventWriter<PlayerMovedEvent>,
    mut complete_event_writer: EventWriter<LevelCompleteEvent>,
) {
    for TiltEvent(sample) in tilt_event_reader.iter() {
        match game.handle_tilt(*sample) {
            MoveOutcome::Moved(position) => moved_event_writer.send(PlayerMovedEvent(position)),
            MoveOutcome::Finished(result) => {
                moved_event_writer.send(PlayerMovedEvent(game.player()));
                complete_event_writer.send(LevelCompleteEvent(result));
            }
            // walls and jitter are everyday business, not worth an event
            MoveOutcome::Ignored | MoveOutcome::Blocked => {}
        }
    }
}

fn update_player(
    draw_configuration: Res<DrawConfigurationResource>,
    mut moved_event_reader: EventReader<PlayerMovedEvent>,
    mut player_query: Query<&mut Transform, With<PlayerComponent>>,
) {
    let position = match moved_event_reader.iter().last() {
        None => return,
        Some(PlayerMovedEvent(position)) => *position,
    };

    for mut transform in player_query.iter_mut() {
        move_to(&mut transform, position, &draw_configuration);
    }
}

/// Tears the finished level down and rebuilds the whole session two
/// difficulty steps up: fresh maze, player back at the start, countdown from
/// the top. Despawning every board entity before respawning keeps no stale
/// sprites around.
fn start_next_level(
    mut commands: Commands,
    mut next_level_event_reader: EventReader<NextLevelEvent>,
    settings: Res<Settings>,
    rect: Res<BoardRectResource>,
    bundles: Res<SpriteBundles>,
    mut level: ResMut<LevelResource>,
    mut game: ResMut<MazeGame>,
    mut draw_configuration: ResMut<DrawConfigurationResource>,
    mut countdown_timer: ResMut<CountdownTimerResource>,
    board_query: Query<Entity, With<BoardComponent>>,
) {
    if next_level_event_reader.iter().count() == 0 {
        return;
    }

    level.difficulty += settings.difficulty_step;
    info!(
        "starting level {} (difficulty {})",
        level.number(),
        level.difficulty
    );

    for entity in board_query.iter() {
        commands.entity(entity).despawn();
    }

    *game = MazeGame::new(level.difficulty, settings.tuning());
    *draw_configuration = fit_draw_configuration(&rect, level.difficulty);
    countdown_timer.0.reset();

    spawn_board(&mut commands, &bundles, &draw_configuration, &game);
}

fn draw_board(
    mut commands: Commands,
    bundles: Res<SpriteBundles>,
    draw_configuration: Res<DrawConfigurationResource>,
    game: Res<MazeGame>,
) {
    spawn_board(&mut commands, &bundles, &draw_configuration, &game);
}

fn spawn_board(
    commands: &mut Commands,
    bundles: &SpriteBundles,
    draw_configuration: &DrawConfigurationResource,
    game: &MazeGame,
) {
    let (cols, rows) = game.grid().dimension();
    let cell_size = draw_configuration.cell_size;

    for y in 0..rows {
        for x in 0..cols {
            let position = Position::new(x, y);
            if !game.grid().is_wall(position) {
                continue;
            }

            let mut wall = bundles.wall(cell_size);
            move_to(&mut wall.transform, position, draw_configuration);
            wall.transform.translation.z = WALL_Z;

            commands.spawn_bundle(wall).insert(BoardComponent);
        }
    }

    let mut goal = bundles.goal(cell_size);
    move_to(&mut goal.transform, game.grid().goal(), draw_configuration);
    goal.transform.translation.z = GOAL_Z;
    commands.spawn_bundle(goal).insert(BoardComponent);

    let mut player = bundles.player(cell_size);
    move_to(&mut player.transform, game.player(), draw_configuration);
    player.transform.translation.z = PLAYER_Z;
    commands
        .spawn_bundle(player)
        .insert(BoardComponent)
        .insert(PlayerComponent);
}

/// Fits square cells into the board rect, the way the original fits the maze
/// to the screen.
fn fit_draw_configuration(rect: &BoardRectResource, difficulty: usize) -> DrawConfigurationResource {
    let side = difficulty.max(1) as f32;
    let cell_width = (rect.right - rect.left) / side;
    let cell_height = (rect.top - rect.bottom) / side;
    let cell_size = cell_height.min(cell_width);

    DrawConfigurationResource {
        cell_size,
        half_cell: cell_size / 2.,
        origin: (rect.left, rect.top),
    }
}

fn move_to(transform: &mut Transform, to: Position, draw_configuration: &DrawConfigurationResource) {
    // row 0 sits at the top of the board, bevy's y axis grows upward
    transform.translation.x = draw_configuration.origin.0
        + to.x as f32 * draw_configuration.cell_size
        + draw_configuration.half_cell;
    transform.translation.y = draw_configuration.origin.1
        - to.y as f32 * draw_configuration.cell_size
        - draw_configuration.half_cell;
}

pub struct SpriteBundles {
    wall: SpriteBundle,
    goal: SpriteBundle,
    player: SpriteBundle,
}

impl SpriteBundles {
    pub fn wall(&self, cell_size: f32) -> SpriteBundle {
        sized(self.wall.clone(), cell_size)
    }
    pub fn goal(&self, cell_size: f32) -> SpriteBundle {
        sized(self.goal.clone(), cell_size)
    }
    pub fn player(&self, cell_size: f32) -> SpriteBundle {
        sized(self.player.clone(), cell_size)
    }
}

impl FromWorld for SpriteBundles {
    fn from_world(world: &mut World) -> Self {
        let asset_server = world.resource::<AssetServer>();

        SpriteBundles {
            wall: load_sprite(asset_server, "wall.png"),
            goal: load_sprite(asset_server, "goal.png"),
            player: load_sprite(asset_server, "player.png"),
        }
    }
}

// Cell size differs per level, so sprites get sized at spawn time
fn sized(mut bundle: SpriteBundle, cell_size: f32) -> SpriteBundle {
    bundle.sprite.custom_size = Some(Vec2::new(cell_size, cell_size));
    bundle
}

fn load_sprite(asset_server: &AssetServer, s: &'static str) -> SpriteBundle {
    SpriteBundle {
        texture: asset_server.load(s),
        ..default()
    }
}

pub mod resources {
    use bevy::time::Timer;

    #[derive(Clone)]
    pub struct DrawConfigurationResource {
        pub half_cell: f32,
        pub cell_size: f32,
        /// (left, top) corner of the board in world coordinates.
        pub origin: (f32, f32),
    }

    pub struct BoardRectResource {
        pub left: f32,
        pub right: f32,
        pub top: f32,
        pub bottom: f32,
    }

    pub struct CountdownTimerResource(pub Timer);

    pub struct SensorTimerResource(pub Timer);

    pub struct LevelResource {
        pub difficulty: usize,
    }

    impl LevelResource {
        /// The original game's numbering: difficulty 5 is level 1, +2 per level.
        pub fn number(&self) -> usize {
            self.difficulty.saturating_sub(3) / 2
        }
    }
}

pub mod events {
    use crate::maze::{LevelResult, Position, TiltSample};

    pub struct TiltEvent(pub TiltSample);

    /// Ticks left on the pre-game countdown; zero means play has started.
    pub struct CountdownTickEvent(pub u8);

    pub struct PlayerMovedEvent(pub Position);

    pub struct LevelCompleteEvent(pub LevelResult);

    pub struct NextLevelEvent;
}

mod components {
    use bevy::prelude::Component;

    #[derive(Component)]
    pub struct PlayerComponent;

    /// Everything torn down and respawned on a level change.
    #[derive(Component)]
    pub struct BoardComponent;
}
