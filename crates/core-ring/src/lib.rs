//! Fixed-capacity circular store with a rotating yank pointer.
//!
//! The ring backs the search-string histories and is generic enough to act
//! as a kill ring. Writes always land one slot after the previous write,
//! overwriting (and disposing) the oldest entry once the ring is full. Reads
//! go through a separate *yank pointer* which can be walked toward older or
//! newer entries without disturbing the write position.
//!
//! Positions are physical slot indices. Ordering questions ("which entry is
//! older") are answered through the *age* of a slot: the distance walking
//! backward from the most recent write. Age 0 is the newest entry, age
//! `len - 1` the oldest.
//!
//! Invariants:
//! - `yank_pos <= high_water_mark < capacity`.
//! - Slots `0..=high_water_mark` are occupied whenever the ring is non-empty.
//! - After `put_next`, `yank_pos == insert_pos` and the rotated flag is clear.
//!   The new entry also becomes the reference for relative rotation.
//! - An evicted value reaches the dispose hook exactly once.

use std::fmt;
use std::ops::{Deref, DerefMut};
use thiserror::Error;
use tracing::trace;

/// Values that can be stored in a [`RingBuffer`]. Empty values are never stored.
pub trait RingValue {
    fn is_empty_value(&self) -> bool;
}

impl RingValue for str {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl RingValue for String {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> RingValue for Vec<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> RingValue for [T] {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

/// Direction the yank pointer moves in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Toward older entries (what a yank-pop does).
    Older,
    /// Toward newer entries.
    Newer,
}

impl Rotation {
    pub fn reversed(self) -> Self {
        match self {
            Rotation::Older => Rotation::Newer,
            Rotation::Newer => Rotation::Older,
        }
    }
}

/// Behavior when the yank pointer runs off either logical end of the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationMode {
    /// Continue from the opposite end (infinite loop).
    #[default]
    Wrap,
    /// Stay on the last entry and report [`RingError::Boundary`].
    Bounded,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RingError {
    #[error("refusing to store an empty value")]
    EmptyValue,
    #[error("ring is empty")]
    Empty,
    #[error("no further entries in that direction")]
    Boundary,
}

type DisposeHook<T> = Box<dyn FnMut(T)>;

pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    /// Last write position; `None` until the first write.
    insert_pos: Option<usize>,
    high_water: usize,
    yank_pos: usize,
    last_yank_pos: usize,
    /// A manual rotation happened since the last yank.
    rotated: bool,
    mode: RotationMode,
    /// Configured rotation direction is inverted (Older <-> Newer).
    inverted: bool,
    len: usize,
    dispose: Option<DisposeHook<T>>,
}

impl<T> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.slots.len())
            .field("len", &self.len)
            .field("insert_pos", &self.insert_pos)
            .field("high_water", &self.high_water)
            .field("yank_pos", &self.yank_pos)
            .field("last_yank_pos", &self.last_yank_pos)
            .field("rotated", &self.rotated)
            .field("mode", &self.mode)
            .finish()
    }
}

impl<T> RingBuffer<T> {
    /// Create an empty ring. A capacity of zero is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            insert_pos: None,
            high_water: 0,
            yank_pos: 0,
            last_yank_pos: 0,
            rotated: false,
            mode: RotationMode::default(),
            inverted: false,
            len: 0,
            dispose: None,
        }
    }

    pub fn with_mode(mut self, mode: RotationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Install the cleanup hook invoked with every evicted value.
    pub fn set_dispose_hook(&mut self, hook: impl FnMut(T) + 'static) {
        self.dispose = Some(Box::new(hook));
    }

    pub fn mode(&self) -> RotationMode {
        self.mode
    }
    pub fn set_mode(&mut self, mode: RotationMode) {
        self.mode = mode;
    }
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }
    pub fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    pub fn insert_pos(&self) -> Option<usize> {
        self.insert_pos
    }
    pub fn high_water_mark(&self) -> usize {
        self.high_water
    }
    pub fn yank_pos(&self) -> usize {
        self.yank_pos
    }
    pub fn last_yank_pos(&self) -> usize {
        self.last_yank_pos
    }
    pub fn is_rotated(&self) -> bool {
        self.rotated
    }

    /// Element at a physical index. Indices past the high-water mark clamp to 0.
    pub fn get(&self, index: usize) -> Option<&T> {
        let index = if index > self.high_water { 0 } else { index };
        self.slots[index].as_ref()
    }

    /// Most recently written element.
    pub fn current(&self) -> Option<&T> {
        self.insert_pos.and_then(|pos| self.slots[pos].as_ref())
    }

    /// Element under the yank pointer, without recording a yank.
    pub fn at_yank(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.slots[self.yank_pos].as_ref()
    }

    /// Entries from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |age| self.slots[self.pos_at_age(age)].as_ref())
    }

    /// Store `value` after the previous write, evicting the oldest entry once full.
    pub fn put_next(&mut self, value: T) -> Result<&T, RingError>
    where
        T: RingValue,
    {
        if value.is_empty_value() {
            return Err(RingError::EmptyValue);
        }
        let next = match self.insert_pos {
            Some(pos) => (pos + 1) % self.capacity(),
            None => 0,
        };
        if let Some(old) = self.slots[next].replace(value) {
            self.dispose_value(old);
        } else {
            self.len += 1;
        }
        self.high_water = self.high_water.max(next);
        self.insert_pos = Some(next);
        self.yank_pos = next;
        self.last_yank_pos = next;
        self.rotated = false;
        trace!(target: "ring", insert_pos = next, len = self.len, high_water = self.high_water, "put_next");
        self.slots[next].as_ref().ok_or(RingError::Empty)
    }

    /// Return the element under the yank pointer and remember the position.
    pub fn yank(&mut self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.last_yank_pos = self.yank_pos;
        self.rotated = false;
        trace!(target: "ring", yank_pos = self.yank_pos, "yank");
        self.slots[self.yank_pos].as_ref()
    }

    /// Step one entry older (wrapping to the newest) and yank, unless the
    /// pointer was rotated manually since the last yank, in which case the
    /// rotated-to entry is yanked as is.
    pub fn yank_pop(&mut self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        if !self.rotated {
            let age = self.age(self.yank_pos);
            let next_age = if age + 1 >= self.len { 0 } else { age + 1 };
            self.yank_pos = self.pos_at_age(next_age);
        }
        self.yank()
    }

    /// Move the yank pointer one entry in `rotation` (subject to the configured
    /// inversion) and mark the ring as manually rotated.
    pub fn rotate_yank_pos(&mut self, rotation: Rotation) -> Result<&T, RingError> {
        if self.is_empty() {
            return Err(RingError::Empty);
        }
        self.rotated = true;
        self.step(rotation)?;
        self.slots[self.yank_pos].as_ref().ok_or(RingError::Empty)
    }

    /// Relative addressing: starting at the last yanked entry, rotate
    /// `|count| - 1` times toward older entries. A negative count walks the
    /// other way; the configured direction is restored on every exit path.
    pub fn rotate_by(&mut self, count: isize) -> Result<&T, RingError> {
        if self.is_empty() {
            return Err(RingError::Empty);
        }
        self.yank_pos = self.last_yank_pos;
        self.rotated = true;
        let steps = count.unsigned_abs().saturating_sub(1);
        {
            let mut scope = InvertedScope::enter(self, count < 0);
            for _ in 0..steps {
                scope.step(Rotation::Older)?;
            }
        }
        self.slots[self.yank_pos].as_ref().ok_or(RingError::Empty)
    }

    /// True when `candidate` should not be stored: it is empty, or equals the
    /// newest entry, the last yanked entry, or the entry under the yank
    /// pointer. When the ring is full and the candidate equals the oldest
    /// entry (the next one to be overwritten) the yank pointer snaps to it and
    /// the candidate is also reported as a duplicate.
    pub fn is_duplicate<Q>(&mut self, candidate: &Q) -> bool
    where
        Q: RingValue + ?Sized,
        T: PartialEq<Q>,
    {
        if candidate.is_empty_value() {
            return true;
        }
        let Some(insert) = self.insert_pos else {
            return false;
        };
        let slots = &self.slots;
        let holds = |pos: usize| slots[pos].as_ref().is_some_and(|v| *v == *candidate);
        if holds(insert) || holds(self.last_yank_pos) || holds(self.yank_pos) {
            return true;
        }
        if self.len == self.capacity() {
            let oldest = (insert + 1) % self.capacity();
            if holds(oldest) {
                self.yank_pos = oldest;
                trace!(target: "ring", yank_pos = oldest, "duplicate_snap_oldest");
                return true;
            }
        }
        false
    }

    /// Resize in place keeping the most recent `min(new_size, len)` entries.
    /// Shrinking below the current content resets both yank pointers to the
    /// newest entry; otherwise they keep pointing at the same entries.
    pub fn set_size(&mut self, new_size: usize) {
        let new_size = new_size.max(1);
        let old_len = self.len;
        let (yank_age, last_yank_age) = if old_len > 0 {
            (self.age(self.yank_pos), self.age(self.last_yank_pos))
        } else {
            (0, 0)
        };
        let mut newest_first = Vec::with_capacity(old_len);
        if self.insert_pos.is_some() {
            for age in 0..old_len {
                let pos = self.pos_at_age(age);
                if let Some(value) = self.slots[pos].take() {
                    newest_first.push(value);
                }
            }
        }
        let kept = newest_first.len().min(new_size);
        for value in newest_first.split_off(kept) {
            self.dispose_value(value);
        }
        self.slots = (0..new_size).map(|_| None).collect();
        for (idx, value) in newest_first.into_iter().rev().enumerate() {
            self.slots[idx] = Some(value);
        }
        self.len = kept;
        if kept == 0 {
            self.insert_pos = None;
            self.high_water = 0;
            self.yank_pos = 0;
            self.last_yank_pos = 0;
        } else {
            let newest = kept - 1;
            self.insert_pos = Some(newest);
            self.high_water = newest;
            if new_size < old_len {
                self.yank_pos = newest;
                self.last_yank_pos = newest;
            } else {
                self.yank_pos = newest - yank_age;
                self.last_yank_pos = newest - last_yank_age;
            }
        }
        self.rotated = false;
        trace!(target: "ring", capacity = new_size, len = kept, "set_size");
    }

    fn age(&self, pos: usize) -> usize {
        let insert = self.insert_pos.unwrap_or(0);
        (insert + self.capacity() - pos) % self.capacity()
    }

    fn pos_at_age(&self, age: usize) -> usize {
        let insert = self.insert_pos.unwrap_or(0);
        (insert + self.capacity() - age) % self.capacity()
    }

    fn step(&mut self, rotation: Rotation) -> Result<(), RingError> {
        let rotation = if self.inverted {
            rotation.reversed()
        } else {
            rotation
        };
        let age = self.age(self.yank_pos);
        let next_age = match rotation {
            Rotation::Older if age + 1 >= self.len => match self.mode {
                RotationMode::Wrap => 0,
                RotationMode::Bounded => {
                    trace!(target: "ring", yank_pos = self.yank_pos, "rotate_boundary_oldest");
                    return Err(RingError::Boundary);
                }
            },
            Rotation::Older => age + 1,
            Rotation::Newer if age == 0 => match self.mode {
                RotationMode::Wrap => self.len - 1,
                RotationMode::Bounded => {
                    trace!(target: "ring", yank_pos = self.yank_pos, "rotate_boundary_newest");
                    return Err(RingError::Boundary);
                }
            },
            Rotation::Newer => age - 1,
        };
        self.yank_pos = self.pos_at_age(next_age);
        trace!(target: "ring", yank_pos = self.yank_pos, ?rotation, "rotate");
        Ok(())
    }

    fn dispose_value(&mut self, value: T) {
        trace!(target: "ring", "evict");
        if let Some(hook) = self.dispose.as_mut() {
            hook(value);
        }
    }
}

/// Temporarily flips the configured rotation direction; restores it on drop.
struct InvertedScope<'a, T> {
    ring: &'a mut RingBuffer<T>,
    saved: bool,
}

impl<'a, T> InvertedScope<'a, T> {
    fn enter(ring: &'a mut RingBuffer<T>, invert: bool) -> Self {
        let saved = ring.inverted;
        ring.inverted = saved ^ invert;
        Self { ring, saved }
    }
}

impl<T> Deref for InvertedScope<'_, T> {
    type Target = RingBuffer<T>;
    fn deref(&self) -> &Self::Target {
        self.ring
    }
}

impl<T> DerefMut for InvertedScope<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ring
    }
}

impl<T> Drop for InvertedScope<'_, T> {
    fn drop(&mut self) {
        self.ring.inverted = self.saved;
    }
}
