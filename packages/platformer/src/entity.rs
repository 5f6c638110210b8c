//! Entities: a physics body plus what is needed to draw it.

use crate::{
    handle::{
        AnimationHandle,
        BodyHandle,
        EntityHandle,
    },
    physics::{
        body::BodyData,
        engine::Physics,
        listener::HitListener,
    },
};
use slots::Registry;
use std::rc::Rc;
use vek::*;


/// Game-defined entity type tag. The engine never interprets it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct EntityKind(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Body the entity lives in. Shares the entity's lifetime.
    pub body: BodyHandle,
    pub animation: Option<AnimationHandle>,
    /// Offset from the body center to where the sprite is drawn.
    pub sprite_offset: Vec2<f32>,
    pub kind: EntityKind,
    /// Remaining health, or `None` for entities which cannot be damaged.
    pub health: Option<u8>,
}

/// Entity registry.
///
/// An entity and its body are created and destroyed together, so a live
/// entity always has a live body.
#[derive(Debug, Default)]
pub struct Entities {
    entities: Registry<Entity>,
}

impl Entities {
    pub fn new() -> Self {
        Entities {
            entities: Registry::new(),
        }
    }

    /// Create an entity along with its body.
    pub fn create<C>(
        &mut self,
        physics: &mut Physics<C>,
        data: &BodyData,
        kind: EntityKind,
        sprite_offset: Vec2<f32>,
        listener: Option<Rc<dyn HitListener<C>>>,
    ) -> EntityHandle {
        let body = physics.create_body(data, listener);
        let handle = EntityHandle(self.entities.insert(Entity {
            body,
            animation: None,
            sprite_offset,
            kind,
            health: None,
        }));
        physics.set_body_entity(body, Some(handle));
        debug!(index = handle.index(), body = body.index(), ?kind, "created entity");
        handle
    }

    /// Destroy an entity and its body. Returns whether the entity was alive.
    pub fn destroy<C>(
        &mut self,
        physics: &mut Physics<C>,
        handle: EntityHandle,
    ) -> bool {
        let body =
            match self.entities.get(handle.0) {
                Ok(entity) => entity.body,
                Err(e) => {
                    warn!("cannot destroy entity: {}", e);
                    return false;
                }
            };
        if let Err(e) = self.entities.deactivate(handle.0) {
            warn!("cannot destroy entity: {}", e);
            return false;
        }
        if physics.is_alive(body) {
            physics.destroy_body(body);
        }
        debug!(index = handle.index(), "destroyed entity");
        true
    }

    /// Look up an entity. Logs and returns `None` if the handle is dead.
    pub fn get(&self, handle: EntityHandle) -> Option<&Entity> {
        self.entities
            .get(handle.0)
            .map_err(|e| warn!("entity lookup failed: {}", e))
            .ok()
    }

    /// Look up an entity mutably. Logs and returns `None` if the handle is
    /// dead.
    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        self.entities
            .get_mut(handle.0)
            .map_err(|e| warn!("entity lookup failed: {}", e))
            .ok()
    }

    pub fn is_alive(&self, handle: EntityHandle) -> bool {
        self.entities.contains(handle.0)
    }

    /// Number of entity slots, including destroyed ones.
    pub fn count(&self) -> usize {
        self.entities.len()
    }

    pub fn active_count(&self) -> usize {
        self.entities.active_count()
    }

    /// Live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item=(EntityHandle, &Entity)> + '_ {
        self.entities
            .iter()
            .map(|(key, entity)| (EntityHandle(key), entity))
    }

    pub fn set_animation(
        &mut self,
        handle: EntityHandle,
        animation: Option<AnimationHandle>,
    ) {
        if let Some(entity) = self.get_mut(handle) {
            entity.animation = animation;
        }
    }

    /// Make an entity damageable with the given health.
    pub fn set_health(&mut self, handle: EntityHandle, health: u8) {
        if let Some(entity) = self.get_mut(handle) {
            entity.health = Some(health);
        }
    }

    /// Take `amount` off an entity's health, destroying it once health hits
    /// zero. Returns whether the entity was destroyed.
    pub fn damage<C>(
        &mut self,
        physics: &mut Physics<C>,
        handle: EntityHandle,
        amount: u8,
    ) -> bool {
        let health =
            match self.get_mut(handle).and_then(|entity| entity.health.as_mut()) {
                Some(health) => health,
                None => return false,
            };
        *health = health.saturating_sub(amount);
        trace!(index = handle.index(), health = *health, "damaged entity");
        if *health == 0 {
            self.destroy(physics, handle)
        } else {
            false
        }
    }
}


#[cfg(test)]
use crate::{
    physics::body::LAYER_ENEMY,
    settings::PhysicsSettings,
};

#[cfg(test)]
fn test_physics() -> Physics<()> {
    Physics::new(PhysicsSettings::default())
}

#[cfg(test)]
fn enemy_data() -> BodyData {
    BodyData {
        pos: Vec2::new(10.0, 20.0),
        size: Extent2::new(16.0, 24.0),
        layer: LAYER_ENEMY,
        ..Default::default()
    }
}

#[test]
fn test_create_links_body() {
    let mut physics = test_physics();
    let mut entities = Entities::new();
    let entity = entities.create(
        &mut physics,
        &enemy_data(),
        EntityKind(3),
        Vec2::new(0.0, 4.0),
        None,
    );

    let record = entities.get(entity).unwrap();
    assert_eq!(record.kind, EntityKind(3));
    assert_eq!(record.animation, None);
    assert_eq!(record.health, None);
    assert_eq!(record.sprite_offset, Vec2::new(0.0, 4.0));

    let body = physics.body(record.body).unwrap();
    assert_eq!(body.entity, Some(entity));
    assert_eq!(body.layer, LAYER_ENEMY);
    assert_eq!(body.aa_box.pos, Vec2::new(10.0, 20.0));
}

#[test]
fn test_destroy_takes_body_along() {
    let mut physics = test_physics();
    let mut entities = Entities::new();
    let a = entities.create(&mut physics, &enemy_data(), EntityKind(0), Vec2::zero(), None);
    let b = entities.create(&mut physics, &enemy_data(), EntityKind(1), Vec2::zero(), None);
    let a_body = entities.get(a).unwrap().body;

    assert!(entities.destroy(&mut physics, a));
    assert!(!entities.is_alive(a));
    assert!(!physics.is_alive(a_body));
    assert!(entities.get(a).is_none());
    assert!(!entities.destroy(&mut physics, a));

    assert_eq!(entities.count(), 2);
    assert_eq!(entities.active_count(), 1);
    assert_eq!(entities.iter().map(|(h, _)| h).collect::<Vec<_>>(), vec![b]);

    // both slots get recycled
    let c = entities.create(&mut physics, &enemy_data(), EntityKind(2), Vec2::zero(), None);
    assert_eq!(c.index(), a.index());
    assert_eq!(entities.get(c).unwrap().body.index(), a_body.index());
    assert!(entities.get(a).is_none());
}

#[test]
fn test_damage_kills_at_zero() {
    let mut physics = test_physics();
    let mut entities = Entities::new();
    let tough = entities.create(&mut physics, &enemy_data(), EntityKind(0), Vec2::zero(), None);
    let immortal = entities.create(&mut physics, &enemy_data(), EntityKind(0), Vec2::zero(), None);
    entities.set_health(tough, 3);

    assert!(!entities.damage(&mut physics, tough, 2));
    assert_eq!(entities.get(tough).unwrap().health, Some(1));
    assert!(entities.damage(&mut physics, tough, 5));
    assert!(!entities.is_alive(tough));
    assert!(!entities.damage(&mut physics, tough, 1));

    assert!(!entities.damage(&mut physics, immortal, 255));
    assert!(entities.is_alive(immortal));
}
