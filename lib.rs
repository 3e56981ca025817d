//! A resizable circular buffer with overwrite-on-full writes.
//!
//! Storage is allocated once up front (and again only on an explicit
//! [`CircularBuffer::resize`]). Writing into a full buffer evicts the oldest
//! element instead of failing, reads are FIFO, and the oldest and newest
//! elements can be inspected either by copy or by reference.
//!
//! The buffer is not synchronized. Share it across threads by wrapping the
//! whole value in a single lock; every operation touches both cursors.

use std::fmt;
use std::mem;

use tracing::{debug, trace};

mod error;

pub use error::{Result, RingBufferError};

/// A circular buffer with a capacity chosen at runtime.
///
/// Slots in the logical range `tail..head` (wrapping) hold `Some`, every other
/// slot holds `None`.
pub struct CircularBuffer<T> {
    slots: Vec<Option<T>>,
    // next slot to write
    head: usize,
    // oldest unread slot
    tail: usize,
    full: bool,
}

impl<T> CircularBuffer<T> {
    /// Creates a new empty circular buffer with the given capacity.
    ///
    /// Fails with [`RingBufferError::Capacity`] for a zero capacity and with
    /// [`RingBufferError::Memory`] if the storage cannot be allocated.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(RingBufferError::Capacity {
                requested: 0,
                minimum: 1,
            });
        }
        let slots = allocate(capacity)?;
        debug!(
            capacity,
            element_size = mem::size_of::<T>(),
            "allocated circular buffer"
        );
        Ok(Self {
            slots,
            head: 0,
            tail: 0,
            full: false,
        })
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Size in bytes of one element.
    pub fn element_size(&self) -> usize {
        mem::size_of::<T>()
    }

    /// Number of readable elements.
    pub fn len(&self) -> usize {
        if self.full {
            self.capacity()
        } else {
            (self.head + self.capacity() - self.tail) % self.capacity()
        }
    }

    /// Returns true if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        !self.full && self.head == self.tail
    }

    /// Returns true if the next write will evict the oldest element.
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Empties the buffer, keeping its storage.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.head = 0;
        self.tail = 0;
        self.full = false;
        debug!(capacity = self.capacity(), "circular buffer reset");
    }

    /// Writes an element, overwriting the oldest one if the buffer is full.
    ///
    /// Returns the evicted element, if any.
    pub fn write(&mut self, value: T) -> Option<T> {
        let evicted = self.slots[self.head].replace(value);
        self.head = self.advance(self.head);
        if self.full {
            self.tail = self.advance(self.tail);
            trace!(capacity = self.capacity(), "overwrote oldest element");
        }
        self.full = self.head == self.tail;
        evicted
    }

    /// Removes and returns the oldest element.
    pub fn read(&mut self) -> Result<T> {
        if self.is_empty() {
            return Err(RingBufferError::Empty);
        }
        let value = self.slots[self.tail].take();
        debug_assert!(value.is_some(), "occupied slot {} holds no value", self.tail);
        let value = value.ok_or(RingBufferError::Empty)?;
        self.tail = self.advance(self.tail);
        self.full = false;
        Ok(value)
    }

    /// Borrows the oldest element.
    ///
    /// The reference lives as long as the shared borrow of the buffer, so it
    /// cannot be held across a write, read, resize or reset.
    pub fn first(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.slots[self.tail].as_ref()
    }

    /// Borrows the newest element. Same lifetime rules as [`Self::first`].
    pub fn last(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.slots[self.retreat(self.head)].as_ref()
    }

    /// Moves the buffer into new storage of `new_capacity` slots.
    ///
    /// Elements keep their oldest-to-newest order and are packed at the start
    /// of the new storage. Shrinking below the current length is refused with
    /// [`RingBufferError::Capacity`] rather than dropping elements. On any
    /// error the buffer is unchanged.
    pub fn resize(&mut self, new_capacity: usize) -> Result<()> {
        let len = self.len();
        let minimum = len.max(1);
        if new_capacity < minimum {
            return Err(RingBufferError::Capacity {
                requested: new_capacity,
                minimum,
            });
        }

        let mut slots = allocate(new_capacity)?;
        let mut index = self.tail;
        for slot in slots.iter_mut().take(len) {
            *slot = self.slots[index].take();
            index = self.advance(index);
        }

        debug!(
            old_capacity = self.capacity(),
            new_capacity, len, "resized circular buffer"
        );
        self.slots = slots;
        self.tail = 0;
        // a buffer resized to exactly its length is full and wraps back to 0
        self.head = len % new_capacity;
        self.full = len == new_capacity;
        Ok(())
    }

    /// Calls `visitor` on each element, oldest first.
    pub fn for_each<F>(&self, visitor: F)
    where
        F: FnMut(&T),
    {
        self.iter().for_each(visitor);
    }

    /// Like [`Self::for_each`], for callers whose visitor is optional.
    pub fn print(&self, visitor: Option<&mut dyn FnMut(&T)>) -> Result<()> {
        let visitor = visitor.ok_or(RingBufferError::InvalidCallback)?;
        for value in self.iter() {
            visitor(value);
        }
        Ok(())
    }

    /// Iterates from the oldest element to the newest.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            buffer: self,
            front: self.tail,
            back: self.head,
            remaining: self.len(),
        }
    }

    fn advance(&self, index: usize) -> usize {
        if index + 1 == self.capacity() {
            0
        } else {
            index + 1
        }
    }

    fn retreat(&self, index: usize) -> usize {
        if index == 0 {
            self.capacity() - 1
        } else {
            index - 1
        }
    }
}

impl<T: Clone> CircularBuffer<T> {
    /// Returns a copy of the oldest element without consuming it.
    pub fn peek_first(&self) -> Result<T> {
        self.first().cloned().ok_or(RingBufferError::Empty)
    }

    /// Returns a copy of the newest element without consuming it.
    pub fn peek_last(&self) -> Result<T> {
        self.last().cloned().ok_or(RingBufferError::Empty)
    }
}

fn allocate<T>(capacity: usize) -> Result<Vec<Option<T>>> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|_| RingBufferError::Memory { capacity })?;
    slots.resize_with(capacity, || None);
    Ok(slots)
}

impl<T> Extend<T> for CircularBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.write(value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for CircularBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircularBuffer")
            .field("capacity", &self.capacity())
            .field("elements", &Elements(self))
            .finish()
    }
}

struct Elements<'a, T>(&'a CircularBuffer<T>);

impl<T: fmt::Debug> fmt::Debug for Elements<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// Iterator over the elements of a [`CircularBuffer`], oldest first.
pub struct Iter<'a, T> {
    buffer: &'a CircularBuffer<T>,
    front: usize,
    // one past the back element
    back: usize,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let value = self.buffer.slots[self.front].as_ref();
        self.front = self.buffer.advance(self.front);
        self.remaining -= 1;
        value
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.back = self.buffer.retreat(self.back);
        self.remaining -= 1;
        self.buffer.slots[self.back].as_ref()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a CircularBuffer<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursors<T>(buffer: &CircularBuffer<T>) -> (usize, usize, bool) {
        (buffer.head, buffer.tail, buffer.full)
    }

    #[test]
    fn new_buffer_starts_at_origin() {
        let buffer: CircularBuffer<u8> = CircularBuffer::new(4).unwrap();
        assert_eq!(cursors(&buffer), (0, 0, false));
        assert!(buffer.slots.iter().all(Option::is_none));
    }

    #[test]
    fn write_wraps_head_and_sets_full() {
        let mut buffer = CircularBuffer::new(3).unwrap();
        buffer.write(1);
        buffer.write(2);
        assert_eq!(cursors(&buffer), (2, 0, false));
        buffer.write(3);
        assert_eq!(cursors(&buffer), (0, 0, true));
    }

    #[test]
    fn overwrite_drags_tail_along() {
        let mut buffer = CircularBuffer::new(3).unwrap();
        buffer.extend([1, 2, 3, 4]);
        assert_eq!(cursors(&buffer), (1, 1, true));
    }

    #[test]
    fn read_clears_full_and_empties_slot() {
        let mut buffer = CircularBuffer::new(2).unwrap();
        buffer.extend([1, 2]);
        assert_eq!(buffer.read(), Ok(1));
        assert_eq!(cursors(&buffer), (0, 1, false));
        assert!(buffer.slots[0].is_none());
    }

    #[test]
    fn failed_read_leaves_cursors_alone() {
        let mut buffer: CircularBuffer<i32> = CircularBuffer::new(3).unwrap();
        buffer.write(1);
        buffer.read().unwrap();
        let before = cursors(&buffer);
        assert_eq!(buffer.read(), Err(RingBufferError::Empty));
        assert_eq!(cursors(&buffer), before);
    }

    #[test]
    fn last_wraps_to_end_of_storage() {
        let mut buffer = CircularBuffer::new(3).unwrap();
        buffer.extend([1, 2, 3]);
        assert_eq!(buffer.head, 0);
        assert_eq!(buffer.last(), Some(&3));
    }

    #[test]
    fn resize_packs_wrapped_elements_at_start() {
        let mut buffer = CircularBuffer::new(3).unwrap();
        buffer.extend([1, 2, 3, 4]);
        buffer.resize(5).unwrap();
        assert_eq!(cursors(&buffer), (3, 0, false));
        assert_eq!(
            buffer.slots,
            vec![Some(2), Some(3), Some(4), None, None]
        );
    }

    #[test]
    fn resize_to_exact_length_keeps_head_in_range() {
        let mut buffer = CircularBuffer::new(5).unwrap();
        buffer.extend([1, 2, 3]);
        buffer.resize(3).unwrap();
        assert_eq!(cursors(&buffer), (0, 0, true));
        buffer.write(4);
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn reset_drops_held_values() {
        let mut buffer = CircularBuffer::new(2).unwrap();
        buffer.extend([String::from("a"), String::from("b")]);
        buffer.reset();
        assert_eq!(cursors(&buffer), (0, 0, false));
        assert!(buffer.slots.iter().all(Option::is_none));
        assert_eq!(buffer.capacity(), 2);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "holds no value")]
    fn read_catches_vacant_occupied_slot() {
        let mut buffer = CircularBuffer::new(2).unwrap();
        buffer.write(1);
        buffer.slots[0] = None;
        let _ = buffer.read();
    }
}
