//! See `World`.

use crate::{
    animation::Animations,
    entity::{
        Entities,
        EntityKind,
    },
    handle::{
        BodyHandle,
        EntityHandle,
    },
    physics::{
        body::BodyData,
        engine::{
            Physics,
            PhysicsCtx,
        },
        listener::HitListener,
        step::step,
    },
    settings::PhysicsSettings,
    timer::Timers,
};
use std::rc::Rc;
use vek::*;


/// Everything that gets simulated, and the context hit listeners receive.
pub struct World {
    pub physics: Physics<World>,
    pub entities: Entities,
    pub animations: Animations,
    pub timers: Timers,
}

impl PhysicsCtx for World {
    fn physics(&self) -> &Physics<Self> {
        &self.physics
    }

    fn physics_mut(&mut self) -> &mut Physics<Self> {
        &mut self.physics
    }
}

impl World {
    pub fn new(settings: PhysicsSettings) -> Self {
        World {
            physics: Physics::new(settings),
            entities: Entities::new(),
            animations: Animations::new(),
            timers: Timers::new(),
        }
    }

    /// Run one frame of `dt` seconds: physics, then timers, then animations.
    pub fn update(&mut self, dt: f32) {
        self.physics.set_delta(dt);
        step(self);
        self.timers.update(dt);
        self.animations.update(dt);
    }

    pub fn create_entity(
        &mut self,
        data: &BodyData,
        kind: EntityKind,
        sprite_offset: Vec2<f32>,
        listener: Option<Rc<dyn HitListener<World>>>,
    ) -> EntityHandle {
        self.entities.create(&mut self.physics, data, kind, sprite_offset, listener)
    }

    /// Destroy an entity along with its body and animation. Returns whether
    /// the entity was alive.
    pub fn destroy_entity(&mut self, handle: EntityHandle) -> bool {
        let animation = self.entities
            .get(handle)
            .and_then(|entity| entity.animation);
        if !self.entities.destroy(&mut self.physics, handle) {
            return false;
        }
        if let Some(animation) = animation {
            self.animations.destroy(animation);
        }
        true
    }

    /// Damage an entity, destroying it along with its animation if its health
    /// runs out. Returns whether it was destroyed.
    pub fn damage_entity(&mut self, handle: EntityHandle, amount: u8) -> bool {
        let animation = self.entities
            .get(handle)
            .and_then(|entity| entity.animation);
        let died = self.entities.damage(&mut self.physics, handle, amount);
        if died {
            if let Some(animation) = animation {
                self.animations.destroy(animation);
            }
        }
        died
    }

    /// Entity owning a body, if the body is alive and belongs to one.
    pub fn entity_of(&self, body: BodyHandle) -> Option<EntityHandle> {
        self.physics.bodies
            .get(body.0)
            .ok()
            .and_then(|body| body.entity)
            .filter(|&entity| self.entities.is_alive(entity))
    }

    /// Body of an entity, if the entity is alive.
    pub fn body_of(&self, entity: EntityHandle) -> Option<BodyHandle> {
        self.entities.get(entity).map(|entity| entity.body)
    }
}


#[cfg(test)]
use crate::{
    animation::SpriteSheetId,
    physics::{
        body::{
            LAYER_ENEMY,
            LAYER_PLAYER,
            LAYER_TERRAIN,
        },
        listener::Callbacks,
    },
};

#[test]
fn test_world_update_order() {
    let mut world = World::new(PhysicsSettings::default());
    let timer = world.timers.create(0.04, true);
    let def = world.animations
        .def_create_uniform(SpriteSheetId(0), 1.0 / 60.0, 0, &[0, 1])
        .unwrap();
    let anim = world.animations.create(def, true).unwrap();
    let entity = world.create_entity(&BodyData {
        pos: Vec2::new(0.0, 100.0),
        size: Extent2::new(10.0, 10.0),
        ..Default::default()
    }, EntityKind(0), Vec2::zero(), None);
    world.entities.set_animation(entity, Some(anim));

    for _ in 0..3 {
        world.update(1.0 / 60.0);
    }
    let body = world.physics.body(world.body_of(entity).unwrap()).unwrap();
    assert!(body.aa_box.pos.y < 100.0);
    assert!(body.velocity.y < 0.0);
    assert!(world.timers.is_complete(timer));
    assert_eq!(world.animations.get(anim).unwrap().frame_index, 1);
}

#[test]
fn test_lethal_hit_destroys_entity() {
    let mut world = World::new(PhysicsSettings {
        gravity: 0.0,
        ..Default::default()
    });
    let def = world.animations
        .def_create_uniform(SpriteSheetId(0), 0.1, 0, &[0])
        .unwrap();

    let enemy = world.create_entity(&BodyData {
        pos: Vec2::new(20.0, 0.0),
        size: Extent2::new(10.0, 10.0),
        layer: LAYER_ENEMY,
        ..Default::default()
    }, EntityKind(1), Vec2::zero(), None);
    world.entities.set_health(enemy, 2);
    let enemy_anim = world.animations.create(def, true);
    world.entities.set_animation(enemy, enemy_anim);

    let hurt = Callbacks::new()
        .on_hit(|world: &mut World, _, collision| {
            if let Some(other) = world.entity_of(collision.other) {
                world.damage_entity(other, 1);
            }
        })
        .build();
    let player = world.create_entity(&BodyData {
        size: Extent2::new(10.0, 10.0),
        velocity: Vec2::new(600.0, 0.0),
        layer: LAYER_PLAYER,
        mask: LAYER_ENEMY | LAYER_TERRAIN,
        ..Default::default()
    }, EntityKind(0), Vec2::zero(), Some(hurt));

    world.update(1.0 / 60.0);
    world.update(1.0 / 60.0);

    assert!(!world.entities.is_alive(enemy));
    assert!(world.entities.is_alive(player));
    assert!(world.animations.get(enemy_anim.unwrap()).is_none());
    assert_eq!(world.physics.bodies().count(), 1);
    assert_eq!(world.entity_of(world.body_of(player).unwrap()), Some(player));
}

#[test]
fn test_destroy_entity_releases_everything() {
    let mut world = World::new(PhysicsSettings::default());
    let entity = world.create_entity(&BodyData::default(), EntityKind(0), Vec2::zero(), None);
    let body = world.body_of(entity).unwrap();
    assert_eq!(world.entity_of(body), Some(entity));

    assert!(world.destroy_entity(entity));
    assert!(!world.destroy_entity(entity));
    assert!(!world.physics.is_alive(body));
    assert_eq!(world.entity_of(body), None);
}
