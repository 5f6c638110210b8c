
#[macro_use]
extern crate tracing;

use platformer::{
    prelude::*,
    logging::init_logging,
    settings::SETTINGS_FILE_NAME,
};
use std::{
    cell::{
        Cell,
        RefCell,
    },
    env::args,
    path::Path,
    rc::Rc,
};
use anyhow::*;
use rand::prelude::*;
use rand_pcg::Pcg32;
use vek::*;


const CLI_INTRO: &'static str = r#"Headless platformer arena.

Simulates the arena with a scripted player for some seconds (default 30) and
logs what happened.

Usage:

    [this command] [seconds]

Env var examples:
    RUST_LOG=platformer=trace
    Changes logging levels"#;

const WIDTH: f32 = 640.0;
const HEIGHT: f32 = 360.0;

const DEFAULT_SECONDS: u32 = 30;
const SEED: u64 = 0x5eed_1e55;

const PLAYER_SPEED: f32 = 350.0;
const PLAYER_JUMP_VELOCITY: f32 = 1200.0;
const PLAYER_RESPAWN_DELAY: f32 = 2.0;
const SMALL_ENEMY_SPEED: f32 = 100.0;
const LARGE_ENEMY_SPEED: f32 = 150.0;
const SMALL_ENEMY_HEALTH: u8 = 3;
const LARGE_ENEMY_HEALTH: u8 = 7;
const RAGE_SPEEDUP: f32 = 1.25;
const ENEMIES_PER_WAVE: u32 = 3;
const PROJECTILE_SPEED: f32 = 600.0;
const SHOT_COOLDOWN: f32 = 0.2;

const ENEMY_MASK: u8 = LAYER_PLAYER | LAYER_TERRAIN;
const PLAYER_MASK: u8 = LAYER_ENEMY | LAYER_TERRAIN | LAYER_ENEMY_PASSTHROUGH;
const FIRE_MASK: u8 = LAYER_ENEMY | LAYER_PLAYER;
const PROJECTILE_MASK: u8 = LAYER_ENEMY | LAYER_TERRAIN;

const KIND_PLAYER: EntityKind = EntityKind(0);
const KIND_SMALL_ENEMY: EntityKind = EntityKind(1);
const KIND_LARGE_ENEMY: EntityKind = EntityKind(2);
const KIND_PROJECTILE: EntityKind = EntityKind(3);
const KIND_FIRE: EntityKind = EntityKind(4);

const PLAYER_SHEET: SpriteSheetId = SpriteSheetId(0);
const SMALL_ENEMY_SHEET: SpriteSheetId = SpriteSheetId(1);
const LARGE_ENEMY_SHEET: SpriteSheetId = SpriteSheetId(2);
const PROPS_SHEET: SpriteSheetId = SpriteSheetId(3);
const FIRE_SHEET: SpriteSheetId = SpriteSheetId(4);


/// Buttons held during a frame.
#[derive(Debug, Copy, Clone, Default)]
struct Input {
    left: bool,
    right: bool,
    jump: bool,
    shoot: bool,
}

const IDLE: Input = Input { left: false, right: false, jump: false, shoot: false };

/// Frame counts and the input held for them. Loops forever.
const SCRIPT: &'static [(u64, Input)] = &[
    (60, IDLE),
    (45, Input { right: true, ..IDLE }),
    (30, Input { right: true, shoot: true, ..IDLE }),
    (10, Input { jump: true, ..IDLE }),
    (80, Input { left: true, shoot: true, ..IDLE }),
    (20, Input { left: true, jump: true, ..IDLE }),
    (40, Input { shoot: true, ..IDLE }),
    (60, Input { right: true, ..IDLE }),
];

fn scripted_input(frame: u64) -> Input {
    let total: u64 = SCRIPT.iter().map(|&(frames, _)| frames).sum();
    let mut t = frame % total;
    for &(frames, input) in SCRIPT {
        if t < frames {
            return input;
        }
        t -= frames;
    }
    IDLE
}

#[derive(Debug, Copy, Clone)]
struct AnimationDefs {
    player_walk: AnimationDefHandle,
    player_idle: AnimationDefHandle,
    small_enemy: AnimationDefHandle,
    large_enemy: AnimationDefHandle,
    small_raged_enemy: AnimationDefHandle,
    large_raged_enemy: AnimationDefHandle,
    fire: AnimationDefHandle,
    projectile: AnimationDefHandle,
}

impl AnimationDefs {
    fn create(animations: &mut Animations) -> Result<Self> {
        let walk_cols = [1, 2, 3, 4, 5, 6, 7];
        let enemy_cols = [0, 1, 2, 3, 4, 5, 6, 7];
        Ok(AnimationDefs {
            player_walk: animations.def_create_uniform(PLAYER_SHEET, 0.1, 0, &walk_cols)?,
            player_idle: animations.def_create_uniform(PLAYER_SHEET, 0.0, 0, &[0])?,
            small_enemy: animations.def_create_uniform(SMALL_ENEMY_SHEET, 0.12, 1, &enemy_cols)?,
            large_enemy: animations.def_create_uniform(LARGE_ENEMY_SHEET, 0.12, 1, &enemy_cols)?,
            small_raged_enemy: animations.def_create_uniform(SMALL_ENEMY_SHEET, 0.12, 0, &enemy_cols)?,
            large_raged_enemy: animations.def_create_uniform(LARGE_ENEMY_SHEET, 0.12, 0, &enemy_cols)?,
            fire: animations.def_create_uniform(FIRE_SHEET, 0.1, 0, &[0, 1, 2, 3, 4, 5, 6])?,
            projectile: animations.def_create(PROPS_SHEET, &[0.05, 0.05], &[2, 2], &[0, 1])?,
        })
    }
}

#[derive(Debug, Default)]
struct Stats {
    enemies_spawned: u32,
    enemies_shot: u32,
    enemies_burned: u32,
    shots: u32,
    player_deaths: u32,
    frames_touching_enemy: u32,
    sprites_drawn: u64,
}

/// Game state shared between the main loop and the hit listeners.
struct Game {
    defs: AnimationDefs,
    rng: RefCell<Pcg32>,
    stats: RefCell<Stats>,
    player: Cell<Option<EntityHandle>>,
    player_on_ground: Cell<bool>,
    player_touching_enemy: Cell<bool>,
    player_direction: Cell<f32>,
    player_walk: AnimationHandle,
    player_idle: AnimationHandle,
    respawn_timer: TimerHandle,
    shot_timer: TimerHandle,
    spawn_timer: Cell<TimerHandle>,
    wave_left: Cell<u32>,
}

/// Entity of `body` if it is an enemy.
fn enemy_of(world: &World, body: BodyHandle) -> Option<EntityHandle> {
    let entity = world.entity_of(body)?;
    match world.entities.get(entity)?.kind {
        KIND_SMALL_ENEMY | KIND_LARGE_ENEMY => Some(entity),
        _ => None,
    }
}

fn build_arena(world: &mut World) {
    let terrain = |pos: [f32; 2], size: [f32; 2], layer: u8| BodyData {
        pos: pos.into(),
        size: size.into(),
        layer,
        ..Default::default()
    };
    let bodies = [
        // ceiling
        terrain([WIDTH * 0.5, HEIGHT - 16.0], [WIDTH, 32.0], LAYER_TERRAIN),
        // floor, split around the fire pit
        terrain([WIDTH * 0.25, 20.0], [WIDTH * 0.5 - 64.0, 38.0], LAYER_TERRAIN),
        terrain([WIDTH * 0.75, 20.0], [WIDTH * 0.5 - 64.0, 38.0], LAYER_TERRAIN),
        // walls
        terrain([16.0, HEIGHT * 0.5 - 64.0], [32.0, HEIGHT - 128.0], LAYER_TERRAIN),
        terrain([WIDTH - 16.0, HEIGHT * 0.5 - 64.0], [32.0, HEIGHT - 128.0], LAYER_TERRAIN),
        // upper platforms
        terrain([60.0, HEIGHT - 32.0 * 3.0 - 16.0], [200.0, 32.0], LAYER_TERRAIN),
        terrain([WIDTH - 60.0, HEIGHT - 32.0 * 3.0 - 16.0], [200.0, 32.0], LAYER_TERRAIN),
        terrain([WIDTH * 0.5, HEIGHT - 32.0 * 3.0 - 16.0], [192.0, 32.0], LAYER_TERRAIN),
        // middle platform
        terrain([WIDTH * 0.5, 32.0 * 3.0 + 24.0], [448.0, 32.0], LAYER_TERRAIN),
        // enemy entrances, closed to the player
        terrain([16.0, HEIGHT - 64.0], [32.0, 64.0], LAYER_ENEMY_PASSTHROUGH),
        terrain([WIDTH - 16.0, HEIGHT - 64.0], [32.0, 64.0], LAYER_ENEMY_PASSTHROUGH),
    ];
    for data in &bodies {
        world.physics.create_static_body(data);
    }
}

fn player_listener(game: &Rc<Game>) -> Rc<dyn HitListener<World>> {
    let hit_game = Rc::clone(game);
    let static_hit_game = Rc::clone(game);
    Callbacks::new()
        .on_hit(move |world: &mut World, _, collision| {
            if enemy_of(world, collision.other).is_some() {
                hit_game.player_touching_enemy.set(true);
            }
        })
        .on_static_hit(move |_: &mut World, _, collision| {
            if collision.normal.y > 0.0 {
                static_hit_game.player_on_ground.set(true);
            }
        })
        .build()
}

fn spawn_player(world: &mut World, game: &Rc<Game>) -> EntityHandle {
    let data = BodyData {
        pos: Vec2::new(300.0, 150.0),
        size: Extent2::new(25.0, 25.0),
        layer: LAYER_PLAYER,
        mask: PLAYER_MASK,
        ..Default::default()
    };
    let player = world.create_entity(&data, KIND_PLAYER, Vec2::zero(), Some(player_listener(game)));
    world.entities.set_animation(player, Some(game.player_idle));
    info!("player spawned");
    player
}

/// Enemies walk at a fixed speed and turn around at walls.
fn enemy_listener(speed: f32) -> Rc<dyn HitListener<World>> {
    Callbacks::new()
        .on_static_hit(move |world: &mut World, this, collision| {
            if collision.normal.x == 0.0 {
                return;
            }
            if let Some(body) = world.physics.body_mut(this) {
                body.velocity.x = speed * collision.normal.x;
            }
        })
        .build()
}

fn spawn_enemy(world: &mut World, game: &Game, large: bool, raged: bool, flipped: bool) {
    let (size, sprite_offset, speed, kind, health, def) =
        if large {
            let def = if raged { game.defs.large_raged_enemy } else { game.defs.large_enemy };
            (Extent2::new(34.0, 22.0), Vec2::new(0.0, 8.0), LARGE_ENEMY_SPEED, KIND_LARGE_ENEMY, LARGE_ENEMY_HEALTH, def)
        } else {
            let def = if raged { game.defs.small_raged_enemy } else { game.defs.small_enemy };
            (Extent2::new(16.0, 16.0), Vec2::new(0.0, 3.0), SMALL_ENEMY_SPEED, KIND_SMALL_ENEMY, SMALL_ENEMY_HEALTH, def)
        };
    let speed = if raged { speed * RAGE_SPEEDUP } else { speed };

    let data = BodyData {
        pos: Vec2::new(if flipped { WIDTH + 30.0 } else { -30.0 }, 280.0),
        size,
        velocity: Vec2::new(if flipped { -speed } else { speed }, 0.0),
        layer: LAYER_ENEMY,
        mask: ENEMY_MASK,
        ..Default::default()
    };
    let enemy = world.create_entity(&data, kind, sprite_offset, Some(enemy_listener(speed)));
    world.entities.set_health(enemy, health);
    let animation = world.animations.create(def, true);
    world.entities.set_animation(enemy, animation);

    game.stats.borrow_mut().enemies_spawned += 1;
    debug!(?kind, raged, flipped, "enemy spawned");
}

/// Burns anything on `FIRE_MASK` that falls into the pit. Burned enemies come
/// back raged.
fn fire_listener(game: &Rc<Game>) -> Rc<dyn HitListener<World>> {
    let game = Rc::clone(game);
    Callbacks::new()
        .on_hit(move |world: &mut World, _, collision| {
            let entity =
                match world.entity_of(collision.other) {
                    Some(entity) => entity,
                    None => return,
                };
            let kind =
                match world.entities.get(entity) {
                    Some(entity) => entity.kind,
                    None => return,
                };
            match kind {
                KIND_PLAYER => {
                    // player animations outlive the player
                    world.entities.set_animation(entity, None);
                    world.destroy_entity(entity);
                    world.timers.restart(game.respawn_timer);
                    game.player.set(None);
                    game.stats.borrow_mut().player_deaths += 1;
                    info!("player burned");
                }
                KIND_SMALL_ENEMY | KIND_LARGE_ENEMY => {
                    world.destroy_entity(entity);
                    let flipped = game.rng.borrow_mut().gen_bool(0.5);
                    spawn_enemy(world, &game, kind == KIND_LARGE_ENEMY, true, flipped);
                    game.wave_left.set(game.wave_left.get().saturating_sub(1));
                    game.stats.borrow_mut().enemies_burned += 1;
                }
                _ => (),
            }
        })
        .build()
}

fn projectile_listener(game: &Rc<Game>) -> Rc<dyn HitListener<World>> {
    let game = Rc::clone(game);
    Callbacks::new()
        .on_hit(move |world: &mut World, this, collision| {
            let enemy =
                match enemy_of(world, collision.other) {
                    Some(enemy) => enemy,
                    None => return,
                };
            if let Some(projectile) = world.entity_of(this) {
                world.destroy_entity(projectile);
            }
            if world.damage_entity(enemy, 1) {
                game.stats.borrow_mut().enemies_shot += 1;
            }
        })
        .on_static_hit(|world: &mut World, this, collision| {
            if collision.normal.x == 0.0 {
                return;
            }
            if let Some(projectile) = world.entity_of(this) {
                world.destroy_entity(projectile);
            }
        })
        .build()
}

fn shoot(world: &mut World, game: &Rc<Game>, from: Vec2<f32>) {
    let data = BodyData {
        pos: from,
        size: Extent2::new(25.0, 25.0),
        velocity: Vec2::new(PROJECTILE_SPEED * game.player_direction.get(), 0.0),
        layer: LAYER_PROJECTILE,
        mask: PROJECTILE_MASK,
        kinematic: true,
        ..Default::default()
    };
    let projectile = world.create_entity(&data, KIND_PROJECTILE, Vec2::zero(), Some(projectile_listener(game)));
    let animation = world.animations.create(game.defs.projectile, true);
    world.entities.set_animation(projectile, animation);
    game.stats.borrow_mut().shots += 1;
}

fn apply_input(world: &mut World, game: &Rc<Game>, player: EntityHandle, input: Input) {
    let body =
        match world.body_of(player) {
            Some(body) => body,
            None => return,
        };

    let mut vel_x = 0.0;
    let mut animation = game.player_idle;
    if input.left {
        vel_x -= PLAYER_SPEED;
        game.player_direction.set(-1.0);
        animation = game.player_walk;
    }
    if input.right {
        vel_x += PLAYER_SPEED;
        game.player_direction.set(1.0);
        animation = game.player_walk;
    }
    let flipped = game.player_direction.get() < 0.0;
    world.animations.set_flipped(game.player_walk, flipped);
    world.animations.set_flipped(game.player_idle, flipped);
    world.entities.set_animation(player, Some(animation));

    let on_ground = game.player_on_ground.replace(false);
    let pos =
        match world.physics.body_mut(body) {
            Some(body) => {
                body.velocity.x = vel_x;
                if input.jump && on_ground {
                    body.velocity.y = PLAYER_JUMP_VELOCITY;
                }
                body.aa_box.pos
            }
            None => return,
        };

    if input.shoot && !world.timers.is_running(game.shot_timer) {
        shoot(world, game, pos);
        world.timers.restart(game.shot_timer);
    }
}

/// Stand-in for the render pass: resolve every sprite's frame and position.
fn draw(world: &mut World) -> usize {
    let sprites = world.entities
        .iter()
        .filter_map(|(_, entity)| {
            let animation = entity.animation?;
            let body = world.physics.body(entity.body)?;
            Some((animation, body.velocity.x, body.aa_box.pos + entity.sprite_offset))
        })
        .collect::<Vec<_>>();

    let mut drawn = 0;
    for (animation, vel_x, pos) in sprites {
        if vel_x < -1.0 {
            world.animations.set_flipped(animation, true);
        } else if vel_x > 1.0 {
            world.animations.set_flipped(animation, false);
        }
        if let Some(frame) = world.animations.frame(animation) {
            trace!(?frame, ?pos, "drawing sprite");
            drawn += 1;
        }
    }
    drawn
}

fn spawn_wave(world: &mut World, game: &Game) {
    let duration = game.rng.borrow_mut().gen_range(2.0..4.0);
    world.timers.destroy(game.spawn_timer.get());
    game.spawn_timer.set(world.timers.create(duration, true));

    if game.wave_left.get() > 0 {
        let (large, flipped) = {
            let mut rng = game.rng.borrow_mut();
            (rng.gen_bool(0.5), rng.gen_bool(0.5))
        };
        spawn_enemy(world, game, large, false, flipped);
        game.wave_left.set(game.wave_left.get() - 1);
    }
    if game.wave_left.get() == 0 {
        game.wave_left.set(ENEMIES_PER_WAVE);
    }
}

fn main() -> Result<()> {
    println!("{}", CLI_INTRO);
    init_logging(Some(Path::new("log")))?;

    let seconds = match args().nth(1) {
        Some(arg) => arg.parse::<u32>()
            .with_context(|| format!("invalid number of seconds: {:?}", arg))?,
        None => DEFAULT_SECONDS,
    };
    let settings = Settings::read(SETTINGS_FILE_NAME);
    let frame_rate = settings.frame_rate.max(1);
    let dt = 1.0 / frame_rate as f32;
    let frames = seconds as u64 * frame_rate as u64;
    info!(?settings, frames, "simulating arena");

    let mut world = World::new(settings.physics);
    build_arena(&mut world);

    let defs = AnimationDefs::create(&mut world.animations)?;
    let player_walk = world.animations.create(defs.player_walk, true)
        .context("creating player walk animation")?;
    let player_idle = world.animations.create(defs.player_idle, true)
        .context("creating player idle animation")?;
    let fire_animation = world.animations.create(defs.fire, true)
        .context("creating fire animation")?;

    let game = Rc::new(Game {
        defs,
        rng: RefCell::new(Pcg32::seed_from_u64(SEED)),
        stats: RefCell::new(Stats::default()),
        player: Cell::new(None),
        player_on_ground: Cell::new(false),
        player_touching_enemy: Cell::new(false),
        player_direction: Cell::new(1.0),
        player_walk,
        player_idle,
        respawn_timer: world.timers.create(PLAYER_RESPAWN_DELAY, false),
        shot_timer: world.timers.create(SHOT_COOLDOWN, false),
        spawn_timer: Cell::new(world.timers.create(0.0, true)),
        wave_left: Cell::new(ENEMIES_PER_WAVE),
    });

    game.player.set(Some(spawn_player(&mut world, &game)));
    world.physics.create_trigger(
        [WIDTH * 0.5, -4.0],
        [64.0, 8.0],
        0,
        FIRE_MASK,
        fire_listener(&game),
    );
    for x in [0.0, 16.0, -16.0] {
        let data = BodyData {
            pos: Vec2::new(WIDTH * 0.5 + x, if x == 0.0 { 10.0 } else { 0.0 }),
            size: Extent2::new(32.0, 64.0),
            kinematic: true,
            ..Default::default()
        };
        let fire = world.create_entity(&data, KIND_FIRE, Vec2::zero(), None);
        world.entities.set_animation(fire, Some(fire_animation));
    }

    let mut clock = FrameClock::new(frame_rate);
    for frame in 0..frames {
        clock.tick();

        if game.player.get().is_none() && world.timers.is_complete(game.respawn_timer) {
            game.player.set(Some(spawn_player(&mut world, &game)));
        }
        if let Some(player) = game.player.get() {
            apply_input(&mut world, &game, player, scripted_input(frame));
        }

        game.player_touching_enemy.set(false);
        world.update(dt);
        if game.player_touching_enemy.get() {
            game.stats.borrow_mut().frames_touching_enemy += 1;
        }

        let drawn = draw(&mut world);
        game.stats.borrow_mut().sprites_drawn += drawn as u64;

        if world.timers.is_complete(game.spawn_timer.get()) {
            spawn_wave(&mut world, &game);
        }

        if (frame + 1) % frame_rate as u64 == 0 {
            debug!(
                second = (frame + 1) / frame_rate as u64,
                entities = world.entities.active_count(),
                fps = clock.fps(),
                "simulated second",
            );
        }
    }

    let stats = game.stats.borrow();
    info!(
        ?stats,
        entities = world.entities.active_count(),
        entity_slots = world.entities.count(),
        body_slots = world.physics.body_count(),
        static_bodies = world.physics.static_body_count(),
        animation_slots = world.animations.count(),
        "simulation done",
    );
    Ok(())
}
