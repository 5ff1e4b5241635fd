//! Fixed capacity circular queue.
//!
//! Every link driver stores its receive and transmit traffic in one of
//! these, and the dispatcher keeps a bounded command history in another.
//! There is no allocation; capacity is a const parameter.
//!
//! All mutation goes through `&mut self`. When a buffer is shared with
//! an interrupt handler it lives inside a [`Shared`](crate::drivers::shared::Shared)
//! cell, so a push or pop always completes before the other side can
//! observe the indices.

#[derive(Clone, Debug)]
pub struct RingBuffer<T, const N: usize> {
    storage: [T; N],
    head: usize,
    len: usize,
}

impl<T: Copy + Default, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self { Self::new() }
}

impl<T: Copy + Default, const N: usize> RingBuffer<T, N> {
    const NON_ZERO_CAPACITY: () = assert!(N > 0, "Ring buffers need a non-zero capacity");

    pub fn new() -> Self {
        let () = Self::NON_ZERO_CAPACITY;
        Self { storage: [T::default(); N], head: 0, len: 0 }
    }

    pub const fn capacity(&self) -> usize { N }
    pub fn size(&self) -> usize { self.len }
    pub fn free(&self) -> usize { N - self.len }
    pub fn is_empty(&self) -> bool { self.len == 0 }
    pub fn is_full(&self) -> bool { self.len == N }

    /// Appends an element at the back. Returns false, leaving the
    /// buffer untouched, when there is no room.
    pub fn push_back(&mut self, value: T) -> bool {
        if self.is_full() {
            return false;
        }
        self.storage[(self.head + self.len) % N] = value;
        self.len += 1;
        true
    }

    /// Removes the front element. Callers are expected to check
    /// `is_empty` first; an empty buffer yields `None`.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = self.storage[self.head];
        self.head = (self.head + 1) % N;
        self.len -= 1;
        Some(value)
    }

    pub fn front(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            Some(&self.storage[self.head])
        }
    }

    /// Element `offset` places behind the front, without removing it.
    pub fn peek(&self, offset: usize) -> Option<&T> {
        if offset < self.len {
            Some(&self.storage[(self.head + offset) % N])
        } else {
            None
        }
    }

    /// Inserts at the front. When full, the back (oldest) element is
    /// overwritten. Meant for diagnostic logs only.
    pub fn push_front_evict(&mut self, value: T) {
        self.head = (self.head + N - 1) % N;
        self.storage[self.head] = value;
        if self.len < N {
            self.len += 1;
        }
    }

    /// Appends at the back. When full, the front (oldest) element is
    /// dropped to make room.
    pub fn push_back_evict(&mut self, value: T) {
        if self.is_full() {
            self.head = (self.head + 1) % N;
            self.len -= 1;
        }
        self.push_back(value);
    }

    /// Empties the buffer and zeroes its storage.
    pub fn clear(&mut self) {
        self.storage = [T::default(); N];
        self.head = 0;
        self.len = 0;
    }

    /// Front to back.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).map(move |offset| &self.storage[(self.head + offset) % N])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn elements_come_out_in_insertion_order() {
        // Given
        let mut buffer = RingBuffer::<u8, 4>::new();

        // When
        assert!(buffer.push_back(1));
        assert!(buffer.push_back(2));
        assert!(buffer.push_back(3));

        // Then
        assert_eq!(buffer.size(), 3);
        assert_eq!(buffer.free(), 1);
        assert_eq!(buffer.front(), Some(&1));
        assert_eq!(buffer.pop_front(), Some(1));
        assert_eq!(buffer.pop_front(), Some(2));
        assert_eq!(buffer.pop_front(), Some(3));
        assert!(buffer.is_empty());
    }

    #[test]
    fn pushing_into_a_full_buffer_is_rejected_without_mutation() {
        let mut buffer = RingBuffer::<u8, 2>::new();
        assert!(buffer.push_back(10));
        assert!(buffer.push_back(20));
        assert!(buffer.is_full());

        assert!(!buffer.push_back(30));
        assert_eq!(buffer.size(), 2);
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![10, 20]);
    }

    #[test]
    fn popping_an_empty_buffer_yields_nothing() {
        let mut buffer = RingBuffer::<u32, 3>::new();
        assert_eq!(buffer.pop_front(), None);
        assert_eq!(buffer.front(), None);
        assert_eq!(buffer.size(), 0);
    }

    #[test]
    fn indices_wrap_around_the_backing_storage() {
        let mut buffer = RingBuffer::<u16, 3>::new();
        for round in 0..10u16 {
            assert!(buffer.push_back(round));
            assert!(buffer.push_back(round + 100));
            assert_eq!(buffer.pop_front(), Some(round));
            assert_eq!(buffer.pop_front(), Some(round + 100));
        }
        assert!(buffer.is_empty());
    }

    #[test]
    fn size_tracks_accepted_pushes_minus_pops() {
        // Deterministic pseudo random walk over pushes and pops
        let mut buffer = RingBuffer::<u8, 16>::new();
        let mut seed: u32 = 0x1234_5678;
        let (mut accepted, mut popped) = (0usize, 0usize);
        for step in 0..1000u32 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            if (seed >> 16) % 3 == 0 {
                if !buffer.is_empty() {
                    buffer.pop_front();
                    popped += 1;
                }
            } else if buffer.push_back(step as u8) {
                accepted += 1;
            }
            assert!(buffer.size() <= buffer.capacity());
            assert_eq!(buffer.size(), accepted - popped);
        }
    }

    #[test]
    fn front_insertion_evicts_the_oldest_entry_when_full() {
        // Given
        let mut history = RingBuffer::<u8, 3>::new();

        // When
        for value in 1..=5 {
            history.push_front_evict(value);
        }

        // Then
        assert_eq!(history.size(), 3);
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![5, 4, 3]);
    }

    #[test]
    fn back_insertion_with_eviction_drops_the_front() {
        let mut log = RingBuffer::<u8, 3>::new();
        for value in 1..=5 {
            log.push_back_evict(value);
        }
        assert_eq!(log.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(log.pop_front(), Some(3));
    }

    #[test]
    fn clearing_empties_and_zeroes_storage() {
        let mut buffer = RingBuffer::<u8, 4>::new();
        buffer.push_back(0xAA);
        buffer.push_back(0xBB);
        buffer.pop_front();

        buffer.clear();

        assert!(buffer.is_empty());
        assert!(buffer.storage.iter().all(|b| *b == 0));
        assert!(buffer.push_back(1));
        assert_eq!(buffer.pop_front(), Some(1));
    }

    #[test]
    fn peeking_looks_past_the_front_across_the_wrap() {
        // Given a buffer whose contents straddle the end of storage
        let mut buffer = RingBuffer::<u8, 4>::new();
        [1, 2, 3].iter().for_each(|b| assert!(buffer.push_back(*b)));
        buffer.pop_front();
        buffer.pop_front();
        [4, 5].iter().for_each(|b| assert!(buffer.push_back(*b)));

        // Then
        assert_eq!(buffer.peek(0), Some(&3));
        assert_eq!(buffer.peek(2), Some(&5));
        assert_eq!(buffer.peek(3), None);
        assert_eq!(buffer.size(), 3);
    }
}
