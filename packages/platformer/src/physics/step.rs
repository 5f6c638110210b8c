//! Advance every body by one frame.

use super::{
    aa_box::AaBox,
    collision::{
        Collision,
        HitKind,
        sweep_ray,
    },
    engine::{
        Physics,
        PhysicsCtx,
    },
};
use crate::handle::{
    BodyHandle,
    StaticBodyHandle,
};
use vek::*;


/// Advance every live body by the physics delta.
///
/// Bodies are processed one after another in slot order. For each body:
///
/// 1. Unless kinematic, gravity is added to its vertical velocity, which is
///    then clamped to the terminal velocity. Acceleration is added.
/// 2. Its velocity scaled to one sub-step becomes the sub-step displacement.
/// 3. For each sub-step, the body is swept against static and dynamic
///    bodies, moved, and pushed out of any static bodies it still overlaps.
///
/// Listeners are called synchronously as contacts are found, and may destroy
/// anything. Destroyed bodies stop moving immediately and stop being
/// obstacles for whoever moves next.
pub fn step<C: PhysicsCtx>(ctx: &mut C) {
    let delta = ctx.physics().delta;
    let settings = ctx.physics().settings;
    let iterations = settings.iterations.max(1);
    let terminal = settings.terminal_velocity.abs();

    // bodies created by listeners during the step, recycled slots included,
    // start moving next step
    let movers = {
        let bodies = &ctx.physics().bodies;
        (0..bodies.len())
            .filter_map(|i| bodies.key_at(i))
            .map(BodyHandle)
            .collect::<Vec<_>>()
    };
    for handle in movers {
        let displacement = {
            let body =
                match ctx.physics_mut().bodies.get_mut(handle.0) {
                    Ok(body) => body,
                    Err(_) => continue,
                };
            if !body.kinematic {
                body.velocity.y += settings.gravity * delta;
                body.velocity.y = body.velocity.y.clamp(-terminal, terminal);
            }
            body.velocity += body.acceleration * delta;
            body.velocity * (delta / iterations as f32)
        };

        for _ in 0..iterations {
            if !ctx.physics().is_alive(handle) {
                break;
            }
            sweep_response(ctx, handle, displacement);
            stationary_response(ctx, handle);
        }
    }
}

/// Sweep the body along `displacement`, report hits, and move it.
fn sweep_response<C: PhysicsCtx>(
    ctx: &mut C,
    handle: BodyHandle,
    displacement: Vec2<f32>,
) {
    let (aa_box, mask) =
        match ctx.physics().sweep_params(handle) {
            Some(params) => params,
            None => return,
        };

    let static_hit = sweep_static_bodies(ctx.physics(), aa_box, mask, displacement);
    let dynamic_hit = sweep_bodies(ctx.physics(), handle, aa_box, mask, displacement);

    if let Some(hit) = dynamic_hit {
        trace!(index = handle.index(), other = hit.other.index(), time = hit.time, "swept into body");
        if let Some(listener) = ctx.physics().listener(handle) {
            listener.on_hit(ctx, handle, &hit);
        }
    }

    let body =
        match ctx.physics_mut().bodies.get_mut(handle.0) {
            Ok(body) => body,
            Err(_) => return,
        };

    let hit =
        match static_hit {
            Some(hit) => hit,
            None => {
                body.aa_box.pos += displacement;
                return;
            }
        };

    trace!(index = handle.index(), other = hit.other.index(), time = hit.time, "swept into static body");

    // snap to the contact, then keep sliding along the free axis
    let remaining = displacement * (1.0 - hit.time);
    body.aa_box.pos = hit.pos;
    for i in 0..2 {
        if hit.normal[i] != 0.0 {
            body.velocity[i] = 0.0;
        } else {
            body.aa_box.pos[i] += remaining[i];
        }
    }

    if let Some(listener) = body.listener.clone() {
        listener.on_static_hit(ctx, handle, &hit);
    }
}

/// Push the body out of static bodies it overlaps, then report every body it
/// overlaps.
fn stationary_response<C: PhysicsCtx>(ctx: &mut C, handle: BodyHandle) {
    ctx.physics_mut().depenetrate(handle);

    let listener =
        match ctx.physics().listener(handle) {
            Some(listener) if listener.wants_overlaps() => listener,
            _ => return,
        };

    let count = ctx.physics().bodies.len();
    for j in 0..count {
        let physics = ctx.physics();
        let (aa_box, mask) =
            match physics.sweep_params(handle) {
                Some(params) => params,
                None => return,
            };
        let other =
            match physics.bodies.key_at(j) {
                Some(key) if key != handle.0 => BodyHandle(key),
                _ => continue,
            };
        let other_body =
            match physics.bodies.get(other.0) {
                Ok(body) => body,
                Err(_) => continue,
            };
        if mask & other_body.layer == 0 {
            continue;
        }
        if !other_body.aa_box.minkowski_diff(aa_box).contains(Vec2::zero()) {
            continue;
        }

        let collision = Collision {
            time: 0.0,
            pos: aa_box.pos,
            normal: Vec2::zero(),
            other,
            kind: HitKind::Overlap,
        };
        listener.on_hit(ctx, handle, &collision);
    }
}

/// Earliest hit sweeping a box against static bodies on `mask`.
fn sweep_static_bodies<C>(
    physics: &Physics<C>,
    aa_box: AaBox,
    mask: u8,
    displacement: Vec2<f32>,
) -> Option<Collision<StaticBodyHandle>> {
    let mut first = None;
    for (key, static_body) in physics.static_bodies.iter() {
        if mask & static_body.layer == 0 {
            continue;
        }
        let target = static_body.aa_box.expand_by(aa_box.half);
        if let Some(hit) = sweep_ray(aa_box.pos, displacement, target) {
            let hit = hit.with_other(StaticBodyHandle(key));
            if supersedes(&hit, first.as_ref(), displacement) {
                first = Some(hit);
            }
        }
    }
    first
}

/// Earliest hit sweeping a box against other bodies on `mask`.
fn sweep_bodies<C>(
    physics: &Physics<C>,
    this: BodyHandle,
    aa_box: AaBox,
    mask: u8,
    displacement: Vec2<f32>,
) -> Option<Collision<BodyHandle>> {
    let mut first = None;
    for (key, body) in physics.bodies.iter() {
        if key == this.0 || mask & body.layer == 0 {
            continue;
        }
        let target = body.aa_box.expand_by(aa_box.half);
        if let Some(hit) = sweep_ray(aa_box.pos, displacement, target) {
            let hit = hit.with_other(BodyHandle(key));
            if supersedes(&hit, first.as_ref(), displacement) {
                first = Some(hit);
            }
        }
    }
    first
}

/// Whether `hit` should replace `first` as the contact to resolve.
///
/// Earlier hits win. On a tie, a hit along the dominant axis of motion wins.
fn supersedes<I>(
    hit: &Collision<I>,
    first: Option<&Collision<I>>,
    displacement: Vec2<f32>,
) -> bool {
    let first =
        match first {
            Some(first) => first,
            None => return true,
        };
    if hit.time < first.time {
        return true;
    }
    if hit.time > first.time {
        return false;
    }
    let (dx, dy) = (displacement.x.abs(), displacement.y.abs());
    (dx > dy && hit.normal.x != 0.0) || (dy > dx && hit.normal.y != 0.0)
}


#[cfg(test)]
use super::{
    body::{
        BodyData,
        LAYER_ENEMY,
        LAYER_PLAYER,
        LAYER_TERRAIN,
    },
    listener::{
        Callbacks,
        HitListener,
    },
};
#[cfg(test)]
use crate::settings::PhysicsSettings;
#[cfg(test)]
use std::rc::Rc;

#[cfg(test)]
struct Sim {
    physics: Physics<Sim>,
    hits: Vec<(BodyHandle, Collision<BodyHandle>)>,
    static_hits: Vec<(BodyHandle, Collision<StaticBodyHandle>)>,
    spawned: Vec<BodyHandle>,
}

#[cfg(test)]
impl PhysicsCtx for Sim {
    fn physics(&self) -> &Physics<Self> {
        &self.physics
    }

    fn physics_mut(&mut self) -> &mut Physics<Self> {
        &mut self.physics
    }
}

#[cfg(test)]
impl Sim {
    fn new(settings: PhysicsSettings) -> Self {
        Sim {
            physics: Physics::new(settings),
            hits: Vec::new(),
            static_hits: Vec::new(),
            spawned: Vec::new(),
        }
    }

    fn weightless() -> Self {
        Sim::new(PhysicsSettings {
            gravity: 0.0,
            ..Default::default()
        })
    }

    fn recorder() -> Rc<dyn HitListener<Sim>> {
        Callbacks::new()
            .on_hit(|sim: &mut Sim, this, collision| {
                sim.hits.push((this, *collision));
            })
            .on_static_hit(|sim: &mut Sim, this, collision| {
                sim.static_hits.push((this, *collision));
            })
            .build()
    }

    fn run(&mut self, dt: f32, frames: usize) {
        for _ in 0..frames {
            self.physics.set_delta(dt);
            step(self);
        }
    }

    fn pos(&self, handle: BodyHandle) -> Vec2<f32> {
        self.physics.body(handle).unwrap().aa_box.pos
    }
}

#[cfg(test)]
fn terrain(pos: [f32; 2], size: [f32; 2]) -> BodyData {
    BodyData {
        pos: pos.into(),
        size: size.into(),
        layer: LAYER_TERRAIN,
        ..Default::default()
    }
}

#[test]
fn test_resting_body_stays_put() {
    let mut sim = Sim::weightless();
    sim.physics.create_static_body(&terrain([0.0, 0.0], [400.0, 20.0]));
    let body = sim.physics.create_body(&BodyData {
        pos: Vec2::new(3.0, 40.0),
        size: Extent2::new(20.0, 20.0),
        ..Default::default()
    }, None);
    sim.run(1.0 / 60.0, 10);
    assert_eq!(sim.pos(body), Vec2::new(3.0, 40.0));
}

#[test]
fn test_unobstructed_body_moves_full_displacement() {
    let mut sim = Sim::weightless();
    sim.physics.create_static_body(&terrain([0.0, -100.0], [400.0, 20.0]));
    let body = sim.physics.create_body(&BodyData {
        pos: Vec2::new(0.0, 0.0),
        size: Extent2::new(10.0, 10.0),
        velocity: Vec2::new(60.0, 30.0),
        mask: LAYER_TERRAIN,
        ..Default::default()
    }, Some(Sim::recorder()));
    sim.run(0.5, 1);
    assert_eq!(sim.pos(body), Vec2::new(30.0, 15.0));
    assert!(sim.static_hits.is_empty());
}

#[test]
fn test_falling_body_comes_to_rest_on_floor() {
    let mut sim = Sim::new(PhysicsSettings::default());
    let floor = sim.physics.create_static_body(&terrain([0.0, 0.0], [400.0, 20.0]));
    let body = sim.physics.create_body(&BodyData {
        pos: Vec2::new(0.0, 100.0),
        size: Extent2::new(20.0, 20.0),
        mask: LAYER_TERRAIN,
        ..Default::default()
    }, Some(Sim::recorder()));

    sim.run(1.0 / 60.0, 60);

    let body_ref = sim.physics.body(body).unwrap();
    assert_eq!(body_ref.velocity.y, 0.0);
    let (body_min, _) = body_ref.aa_box.min_max();
    let (_, floor_max) = sim.physics.static_body(floor).unwrap().aa_box.min_max();
    assert!((body_min.y - floor_max.y).abs() < 1e-3, "{} vs {}", body_min.y, floor_max.y);

    let (this, landing) = sim.static_hits[0];
    assert_eq!(this, body);
    assert_eq!(landing.other, floor);
    assert_eq!(landing.normal, Vec2::new(0.0, 1.0));
    assert!(landing.time >= 0.0 && landing.time <= 1.0);
}

#[test]
fn test_wall_stops_horizontal_motion() {
    let mut sim = Sim::weightless();
    sim.physics.create_static_body(&terrain([50.0, 0.0], [20.0, 200.0]));
    let body = sim.physics.create_body(&BodyData {
        pos: Vec2::new(0.0, 0.0),
        size: Extent2::new(10.0, 10.0),
        velocity: Vec2::new(600.0, 0.0),
        mask: LAYER_TERRAIN,
        ..Default::default()
    }, None);
    sim.run(1.0 / 60.0, 30);

    let body_ref = sim.physics.body(body).unwrap();
    assert_eq!(body_ref.velocity, Vec2::zero());
    let (_, max) = body_ref.aa_box.min_max();
    assert!((max.x - 40.0).abs() < 1e-3, "{}", max.x);
}

#[test]
fn test_empty_mask_passes_through_everything() {
    let mut sim = Sim::weightless();
    sim.physics.create_static_body(&terrain([0.0, 0.0], [400.0, 20.0]));
    let body = sim.physics.create_body(&BodyData {
        pos: Vec2::new(0.0, 50.0),
        size: Extent2::new(10.0, 10.0),
        velocity: Vec2::new(0.0, -100.0),
        ..Default::default()
    }, Some(Sim::recorder()));
    sim.run(1.0, 1);
    assert_eq!(sim.pos(body), Vec2::new(0.0, -50.0));
    assert!(sim.static_hits.is_empty());
}

#[test]
fn test_kinematic_body_ignores_gravity() {
    let mut sim = Sim::new(PhysicsSettings::default());
    let body = sim.physics.create_body(&BodyData {
        size: Extent2::new(4.0, 4.0),
        velocity: Vec2::new(120.0, 0.0),
        kinematic: true,
        ..Default::default()
    }, None);
    sim.run(0.25, 4);
    assert_eq!(sim.physics.body(body).unwrap().velocity, Vec2::new(120.0, 0.0));
    assert_eq!(sim.pos(body), Vec2::new(120.0, 0.0));
}

#[test]
fn test_fall_speed_is_clamped() {
    let mut sim = Sim::new(PhysicsSettings {
        gravity: -1200.0,
        terminal_velocity: 100.0,
        iterations: 4,
    });
    let body = sim.physics.create_body(&BodyData {
        size: Extent2::new(4.0, 4.0),
        ..Default::default()
    }, None);
    sim.run(1.0 / 60.0, 60);
    assert_eq!(sim.physics.body(body).unwrap().velocity.y, -100.0);
}

#[test]
fn test_tie_resolves_dominant_axis_first() {
    let mut sim = Sim::new(PhysicsSettings {
        gravity: 0.0,
        iterations: 4,
        ..Default::default()
    });
    let _floor = sim.physics.create_static_body(&terrain([0.0, -5.5], [20.0, 8.0]));
    let wall = sim.physics.create_static_body(&terrain([3.0, 0.0], [2.0, 20.0]));
    let body = sim.physics.create_body(&BodyData {
        size: Extent2::new(2.0, 2.0),
        velocity: Vec2::new(8.0, -4.0),
        mask: LAYER_TERRAIN,
        ..Default::default()
    }, Some(Sim::recorder()));
    sim.run(1.0, 1);

    let (this, first) = sim.static_hits[0];
    assert_eq!(this, body);
    assert_eq!(first.time, 0.5);
    assert_eq!(first.other, wall);
    assert_eq!(first.normal, Vec2::new(-1.0, 0.0));
    assert_eq!(sim.physics.body(body).unwrap().velocity.x, 0.0);
}

#[test]
fn test_dynamic_contacts_are_reported_but_do_not_block() {
    let mut sim = Sim::weightless();
    let mover = sim.physics.create_body(&BodyData {
        size: Extent2::new(10.0, 10.0),
        velocity: Vec2::new(120.0, 0.0),
        layer: LAYER_PLAYER,
        mask: LAYER_ENEMY,
        ..Default::default()
    }, Some(Sim::recorder()));
    let enemy = sim.physics.create_body(&BodyData {
        pos: Vec2::new(12.0, 0.0),
        size: Extent2::new(10.0, 10.0),
        layer: LAYER_ENEMY,
        kinematic: true,
        ..Default::default()
    }, None);

    sim.run(1.0 / 60.0, 2);

    assert!((sim.pos(mover).x - 4.0).abs() < 1e-4);
    assert!(!sim.hits.is_empty());
    assert!(sim.hits.iter().all(|&(this, c)| this == mover && c.other == enemy));
    assert!(sim.hits.iter().any(|(_, c)| c.kind == HitKind::Sweep));
    assert!(sim.hits.iter().any(|(_, c)| c.kind == HitKind::Overlap));
}

#[test]
fn test_listener_may_destroy_obstacle() {
    let mut sim = Sim::weightless();
    let kill = Callbacks::new()
        .on_hit(|sim: &mut Sim, _, collision| {
            sim.physics.destroy_body(collision.other);
        })
        .build();
    let bullet = sim.physics.create_body(&BodyData {
        size: Extent2::new(2.0, 2.0),
        velocity: Vec2::new(600.0, 0.0),
        layer: LAYER_PLAYER,
        mask: LAYER_ENEMY,
        kinematic: true,
        ..Default::default()
    }, Some(kill));
    let enemy = sim.physics.create_body(&BodyData {
        pos: Vec2::new(6.0, 0.0),
        size: Extent2::new(4.0, 4.0),
        layer: LAYER_ENEMY,
        mask: LAYER_PLAYER,
        ..Default::default()
    }, Some(Sim::recorder()));

    sim.run(1.0 / 60.0, 1);

    assert!(sim.physics.is_alive(bullet));
    assert!(!sim.physics.is_alive(enemy));
    assert!(sim.hits.is_empty());
    assert_eq!(sim.physics.bodies().count(), 1);
}

#[test]
fn test_listener_may_destroy_self() {
    let mut sim = Sim::weightless();
    sim.physics.create_static_body(&terrain([20.0, 0.0], [10.0, 100.0]));
    let vanish = Callbacks::new()
        .on_static_hit(|sim: &mut Sim, this, _| {
            sim.physics.destroy_body(this);
        })
        .build();
    let body = sim.physics.create_body(&BodyData {
        size: Extent2::new(2.0, 2.0),
        velocity: Vec2::new(600.0, 0.0),
        mask: LAYER_TERRAIN,
        ..Default::default()
    }, Some(vanish));

    sim.run(1.0 / 60.0, 3);

    assert!(!sim.physics.is_alive(body));
    assert!(sim.physics.body(body).is_none());
}

#[test]
fn test_trigger_reports_overlapping_bodies() {
    let mut sim = Sim::weightless();
    let trigger = sim.physics.create_trigger(
        [0.0, 0.0],
        [20.0, 20.0],
        0,
        LAYER_PLAYER,
        Sim::recorder(),
    );
    let player = sim.physics.create_body(&BodyData {
        pos: Vec2::new(5.0, 5.0),
        size: Extent2::new(4.0, 4.0),
        layer: LAYER_PLAYER,
        mask: LAYER_ENEMY,
        ..Default::default()
    }, None);
    let _bystander = sim.physics.create_body(&BodyData {
        pos: Vec2::new(-5.0, 5.0),
        size: Extent2::new(4.0, 4.0),
        layer: LAYER_ENEMY,
        ..Default::default()
    }, None);

    sim.run(1.0 / 60.0, 1);

    let iterations = sim.physics.settings().iterations as usize;
    assert_eq!(sim.hits.len(), iterations);
    for (this, collision) in &sim.hits {
        assert_eq!(*this, trigger);
        assert_eq!(collision.other, player);
        assert_eq!(collision.kind, HitKind::Overlap);
    }
    assert_eq!(sim.pos(trigger), Vec2::zero());
}

#[test]
fn test_overlapping_spawn_is_pushed_out() {
    let mut sim = Sim::weightless();
    sim.physics.create_static_body(&terrain([0.0, 0.0], [100.0, 20.0]));
    let body = sim.physics.create_body(&BodyData {
        pos: Vec2::new(0.0, 12.0),
        size: Extent2::new(10.0, 10.0),
        mask: LAYER_TERRAIN,
        ..Default::default()
    }, None);
    sim.run(1.0 / 60.0, 1);
    assert_eq!(sim.pos(body), Vec2::new(0.0, 15.0));
}

#[test]
fn test_destroyed_body_slot_is_reused() {
    let mut sim = Sim::weightless();
    let a = sim.physics.create_body(&BodyData::default(), None);
    let b = sim.physics.create_body(&BodyData::default(), None);
    assert!(sim.physics.destroy_body(a));
    assert!(!sim.physics.destroy_body(a));

    let c = sim.physics.create_body(&BodyData {
        pos: Vec2::new(7.0, 8.0),
        size: Extent2::new(2.0, 4.0),
        layer: LAYER_ENEMY,
        ..Default::default()
    }, None);
    assert_eq!(c.index(), a.index());
    assert!(sim.physics.body(a).is_none());
    let body = sim.physics.body(c).unwrap();
    assert_eq!(body.aa_box, AaBox::new([7.0, 8.0], [1.0, 2.0]));
    assert_eq!(body.layer, LAYER_ENEMY);
    assert_eq!(body.entity, None);
    assert!(!body.has_listener());
    assert!(sim.physics.is_alive(b));
    assert_eq!(sim.physics.body_count(), 2);
}

#[test]
fn test_body_spawned_mid_step_waits_for_next_step() {
    let mut sim = Sim::weightless();
    sim.physics.create_static_body(&terrain([0.0, 0.0], [400.0, 20.0]));
    let spawn_on_landing = Callbacks::new()
        .on_static_hit(|sim: &mut Sim, _, _| {
            if !sim.spawned.is_empty() {
                return;
            }
            let spawned = sim.physics.create_body(&BodyData {
                pos: Vec2::new(0.0, 500.0),
                size: Extent2::new(4.0, 4.0),
                velocity: Vec2::new(60.0, 0.0),
                ..Default::default()
            }, None);
            sim.spawned.push(spawned);
        })
        .build();
    let lander = sim.physics.create_body(&BodyData {
        pos: Vec2::new(0.0, 20.0),
        size: Extent2::new(10.0, 10.0),
        velocity: Vec2::new(0.0, -100.0),
        mask: LAYER_TERRAIN,
        ..Default::default()
    }, Some(spawn_on_landing));
    let vacated = sim.physics.create_body(&BodyData::default(), None);
    sim.physics.destroy_body(vacated);

    sim.run(1.0, 1);

    // the spawn recycled a slot after the lander's
    let spawned = sim.spawned[0];
    assert_eq!(lander.index(), 0);
    assert_eq!(spawned.index(), vacated.index());
    assert_eq!(sim.pos(spawned), Vec2::new(0.0, 500.0));

    sim.run(1.0, 1);
    assert_eq!(sim.pos(spawned), Vec2::new(60.0, 500.0));
    assert_eq!(sim.spawned.len(), 1);
}

#[test]
fn test_contacts_reported_in_slot_order() {
    let mut sim = Sim::weightless();
    let trigger = sim.physics.create_trigger(
        [0.0, 0.0],
        [40.0, 40.0],
        0,
        LAYER_PLAYER,
        Sim::recorder(),
    );
    let touching = |x: f32| BodyData {
        pos: Vec2::new(x, 0.0),
        size: Extent2::new(4.0, 4.0),
        layer: LAYER_PLAYER,
        ..Default::default()
    };
    let first = sim.physics.create_body(&touching(-10.0), None);
    let second = sim.physics.create_body(&touching(0.0), None);
    let third = sim.physics.create_body(&touching(10.0), None);
    sim.physics.destroy_body(first);
    // created last, but lands in the lowest free slot
    let recycled = sim.physics.create_body(&touching(-5.0), None);
    assert_eq!(recycled.index(), first.index());

    sim.run(1.0 / 60.0, 1);

    let iterations = sim.physics.settings().iterations as usize;
    assert_eq!(sim.hits.len(), 3 * iterations);
    for sub_step in sim.hits.chunks(3) {
        let others = sub_step
            .iter()
            .map(|&(this, collision)| {
                assert_eq!(this, trigger);
                collision.other
            })
            .collect::<Vec<_>>();
        assert_eq!(others, [recycled, second, third]);
        assert!(others.windows(2).all(|pair| pair[0].index() < pair[1].index()));
    }
}
