//! Soft-delete registry with generational keys.

use crate::{
    error::SlotError,
    list::List,
};


/// Key to an entry in a `Registry`.
///
/// The index is stable for the lifetime of the entry. The generation tells
/// apart successive entries that occupy the same slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Key {
    index: usize,
    generation: u32,
}

impl Key {
    pub fn index(self) -> usize {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    active: bool,
    value: T,
}

/// Registry of entries which are soft-deleted rather than removed.
///
/// Deactivated slots keep their storage until `insert` recycles them. The
/// first inactive slot in index order is always the one recycled.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    slots: List<Slot<T>>,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Registry {
            slots: List::with_capacity(capacity),
        }
    }

    /// Insert `value` into the first inactive slot, or append a new one.
    pub fn insert(&mut self, value: T) -> Key {
        let vacant = self.slots.iter().position(|slot| !slot.active);
        match vacant {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.generation = slot.generation.wrapping_add(1);
                slot.active = true;
                slot.value = value;
                Key {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.append(Slot {
                    generation: 0,
                    active: true,
                    value,
                });
                Key {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Mark the entry inactive. Its slot becomes eligible for reuse.
    pub fn deactivate(&mut self, key: Key) -> Result<(), SlotError> {
        self.slot_mut(key)?.active = false;
        Ok(())
    }

    pub fn get(&self, key: Key) -> Result<&T, SlotError> {
        self.slot(key).map(|slot| &slot.value)
    }

    pub fn get_mut(&mut self, key: Key) -> Result<&mut T, SlotError> {
        self.slot_mut(key).map(|slot| &mut slot.value)
    }

    pub fn contains(&self, key: Key) -> bool {
        self.slot(key).is_ok()
    }

    /// Key of the active entry at `index`, if there is one.
    ///
    /// Lets callers walk the registry by index while mutating it in between
    /// visits.
    pub fn key_at(&self, index: usize) -> Option<Key> {
        self.slots
            .get(index)
            .ok()
            .filter(|slot| slot.active)
            .map(|slot| Key {
                index,
                generation: slot.generation,
            })
    }

    /// Number of slots, active or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.active).count()
    }

    /// Active entries in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item=(Key, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(index, slot)| (
                Key {
                    index,
                    generation: slot.generation,
                },
                &slot.value,
            ))
    }

    /// Active entries in ascending index order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item=(Key, &mut T)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(index, slot)| (
                Key {
                    index,
                    generation: slot.generation,
                },
                &mut slot.value,
            ))
    }

    fn slot(&self, key: Key) -> Result<&Slot<T>, SlotError> {
        let slot = self.slots.get(key.index)?;
        check(key, slot.generation, slot.active)?;
        Ok(slot)
    }

    fn slot_mut(&mut self, key: Key) -> Result<&mut Slot<T>, SlotError> {
        let slot = self.slots.get_mut(key.index)?;
        check(key, slot.generation, slot.active)?;
        Ok(slot)
    }
}

fn check(key: Key, generation: u32, active: bool) -> Result<(), SlotError> {
    if key.generation != generation {
        Err(SlotError::Stale {
            index: key.index,
            expected: key.generation,
            found: generation,
        })
    } else if !active {
        Err(SlotError::Inactive { index: key.index })
    } else {
        Ok(())
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Registry::new()
    }
}


#[test]
fn test_registry_reuses_first_inactive() {
    let mut reg = Registry::new();
    let a = reg.insert('a');
    let b = reg.insert('b');
    let c = reg.insert('c');
    reg.deactivate(c).unwrap();
    reg.deactivate(b).unwrap();

    let d = reg.insert('d');
    assert_eq!(d.index(), b.index());
    assert_eq!(reg.get(d), Ok(&'d'));
    let e = reg.insert('e');
    assert_eq!(e.index(), c.index());
    let f = reg.insert('f');
    assert_eq!(f.index(), 3);
    assert_eq!(reg.len(), 4);
    assert_eq!(reg.get(a), Ok(&'a'));
}

#[test]
fn test_registry_stale_key() {
    let mut reg = Registry::new();
    let old = reg.insert(1);
    reg.deactivate(old).unwrap();
    assert_eq!(reg.get(old), Err(SlotError::Inactive { index: 0 }));

    let new = reg.insert(2);
    assert_eq!(new.index(), old.index());
    assert_ne!(new, old);
    assert_eq!(
        reg.get(old),
        Err(SlotError::Stale { index: 0, expected: 0, found: 1 }),
    );
    assert!(reg.deactivate(old).is_err());
    assert_eq!(reg.get(new), Ok(&2));
}

#[test]
fn test_registry_iter_skips_inactive() {
    let mut reg = Registry::new();
    let keys = (0..5).map(|n| reg.insert(n)).collect::<Vec<_>>();
    reg.deactivate(keys[1]).unwrap();
    reg.deactivate(keys[3]).unwrap();

    let live = reg.iter().map(|(_, &n)| n).collect::<Vec<_>>();
    assert_eq!(live, [0, 2, 4]);
    assert_eq!(reg.active_count(), 3);
    assert_eq!(reg.key_at(1), None);
    assert_eq!(reg.key_at(2), Some(keys[2]));
    assert_eq!(reg.key_at(9), None);

    for (_, n) in reg.iter_mut() {
        *n *= 10;
    }
    assert_eq!(reg.get(keys[4]), Ok(&40));
}

#[test]
fn test_registry_out_of_bounds() {
    let mut big = Registry::new();
    for n in 0..3 {
        big.insert(n);
    }
    let far = big.key_at(2).unwrap();
    let small = Registry::<i32>::new();
    assert_eq!(
        small.get(far),
        Err(SlotError::OutOfBounds { index: 2, len: 0 }),
    );
}
