use crate::core::{BodyHandle, ConstraintHandle};
use crate::error::PhysicsError;
use crate::Result;

/// Generic storage trait for physics objects
pub trait Storage<T, H> {
    /// Creates a new empty storage
    fn new() -> Self;

    /// Adds an item to the storage and returns its handle
    fn add(&mut self, item: T) -> H;

    /// Gets a reference to an item by its handle
    fn get(&self, handle: H) -> Option<&T>;

    /// Gets a mutable reference to an item by its handle
    fn get_mut(&mut self, handle: H) -> Option<&mut T>;

    /// Removes an item from the storage
    fn remove(&mut self, handle: H) -> Option<T>;

    /// Returns the number of items in the storage
    fn len(&self) -> usize;

    /// Returns whether the storage is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns all live handles in insertion order
    fn handles(&self) -> Vec<H>;
}

/// Slot vector shared by both storages. Handle ids start at 1 so 0 is never valid.
#[derive(Debug, Clone)]
struct Slots<T> {
    items: Vec<Option<T>>,
    len: usize,
}

impl<T> Slots<T> {
    fn new() -> Self {
        Self { items: Vec::new(), len: 0 }
    }

    fn add(&mut self, item: T) -> u32 {
        self.items.push(Some(item));
        self.len += 1;
        self.items.len() as u32
    }

    fn index(id: u32) -> Option<usize> {
        (id as usize).checked_sub(1)
    }

    fn get(&self, id: u32) -> Option<&T> {
        Self::index(id).and_then(|i| self.items.get(i)).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        Self::index(id).and_then(|i| self.items.get_mut(i)).and_then(Option::as_mut)
    }

    fn remove(&mut self, id: u32) -> Option<T> {
        let removed = Self::index(id).and_then(|i| self.items.get_mut(i)).and_then(Option::take);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_some())
            .map(|(i, _)| i as u32 + 1)
    }
}

/// Storage for physics bodies
#[derive(Debug, Clone)]
pub struct BodyStorage<T> {
    slots: Slots<T>,
}

impl<T> Storage<T, BodyHandle> for BodyStorage<T> {
    fn new() -> Self {
        Self { slots: Slots::new() }
    }

    fn add(&mut self, item: T) -> BodyHandle {
        BodyHandle(self.slots.add(item))
    }

    fn get(&self, handle: BodyHandle) -> Option<&T> {
        self.slots.get(handle.0)
    }

    fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut T> {
        self.slots.get_mut(handle.0)
    }

    fn remove(&mut self, handle: BodyHandle) -> Option<T> {
        self.slots.remove(handle.0)
    }

    fn len(&self) -> usize {
        self.slots.len
    }

    fn handles(&self) -> Vec<BodyHandle> {
        self.slots.ids().map(BodyHandle).collect()
    }
}

impl<T> BodyStorage<T> {
    /// Gets a body by its handle, returning an error if not found
    pub fn get_body(&self, handle: BodyHandle) -> Result<&T> {
        self.get(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Body with handle {:?} not found", handle)))
    }

    /// Gets a mutable reference to a body by its handle, returning an error if not found
    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Result<&mut T> {
        self.get_mut(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Body with handle {:?} not found", handle)))
    }

    /// Gets mutable references to two distinct bodies at once
    pub fn get_pair_mut(&mut self, first: BodyHandle, second: BodyHandle) -> Result<(&mut T, &mut T)> {
        if first == second {
            return Err(PhysicsError::InvalidParameter(format!(
                "Body pair must be distinct, got {:?} twice",
                first
            )));
        }

        // Validate both handles before splitting the slot vector
        self.get_body(first)?;
        self.get_body(second)?;

        let i = first.0 as usize - 1;
        let j = second.0 as usize - 1;
        let (a, b) = if i < j {
            let (low, high) = self.slots.items.split_at_mut(j);
            (&mut low[i], &mut high[0])
        } else {
            let (low, high) = self.slots.items.split_at_mut(i);
            (&mut high[0], &mut low[j])
        };

        match (a.as_mut(), b.as_mut()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(PhysicsError::ResourceNotFound(format!(
                "Body pair {:?}/{:?} not found",
                first, second
            ))),
        }
    }

    /// Iterates over all bodies with their handles
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &T)> + '_ {
        self.slots
            .items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.as_ref().map(|item| (BodyHandle(i as u32 + 1), item)))
    }

    /// Iterates mutably over all bodies with their handles
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut T)> + '_ {
        self.slots
            .items
            .iter_mut()
            .enumerate()
            .filter_map(|(i, item)| item.as_mut().map(|item| (BodyHandle(i as u32 + 1), item)))
    }
}

/// Storage for physics constraints
pub struct ConstraintStorage<T> {
    slots: Slots<T>,
}

impl<T> Storage<T, ConstraintHandle> for ConstraintStorage<T> {
    fn new() -> Self {
        Self { slots: Slots::new() }
    }

    fn add(&mut self, item: T) -> ConstraintHandle {
        ConstraintHandle(self.slots.add(item))
    }

    fn get(&self, handle: ConstraintHandle) -> Option<&T> {
        self.slots.get(handle.0)
    }

    fn get_mut(&mut self, handle: ConstraintHandle) -> Option<&mut T> {
        self.slots.get_mut(handle.0)
    }

    fn remove(&mut self, handle: ConstraintHandle) -> Option<T> {
        self.slots.remove(handle.0)
    }

    fn len(&self) -> usize {
        self.slots.len
    }

    fn handles(&self) -> Vec<ConstraintHandle> {
        self.slots.ids().map(ConstraintHandle).collect()
    }
}

impl<T> ConstraintStorage<T> {
    /// Gets a constraint by its handle, returning an error if not found
    pub fn get_constraint(&self, handle: ConstraintHandle) -> Result<&T> {
        self.get(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Constraint with handle {:?} not found", handle)))
    }

    /// Gets a mutable reference to a constraint by its handle, returning an error if not found
    pub fn get_constraint_mut(&mut self, handle: ConstraintHandle) -> Result<&mut T> {
        self.get_mut(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Constraint with handle {:?} not found", handle)))
    }

    /// Iterates over all constraints in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.items.iter().filter_map(Option::as_ref)
    }

    /// Iterates mutably over all constraints in insertion order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.slots.items.iter_mut().filter_map(Option::as_mut)
    }
}
