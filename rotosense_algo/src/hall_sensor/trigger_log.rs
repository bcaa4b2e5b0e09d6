// Implements the TriggerLog, a fixed-capacity circular log of edge timestamps
// written from the hall sensor interrupt and read from the control loop.

// Key Features:
// - Single producer, lock-free, allocation-free recording suitable for interrupt context.
// - Strict circular overwrite: the oldest timestamp is replaced once the log is full.
// - Monotonic trigger counter kept independently of overwrites.
// - Every field is a single atomic word, so readers never observe a torn timestamp.

// Detailed Operation:
// The producer stores the timestamp into the slot at `head`, then publishes the advanced
// `head` with Release ordering, then bumps the trigger counter. A reader that loads `head`
// with Acquire ordering is therefore guaranteed to see the timestamp of every slot behind it.
// A reader may see a `head` or counter that is one event old, which only delays the estimate
// by one edge. Slots start at the sentinel value EMPTY, meaning "never written".

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Slot value meaning "never written".
pub const EMPTY: u32 = 0;

/// Default number of timestamps kept in the log.
pub const DEFAULT_CAPACITY: usize = 10;

#[allow(clippy::declare_interior_mutable_const)]
const EMPTY_SLOT: AtomicU32 = AtomicU32::new(EMPTY);

pub struct TriggerLog<const N: usize> {
    slots: [AtomicU32; N], // Edge timestamps in microseconds
    head: AtomicUsize,     // Next slot to write
    total: AtomicU32,      // Edges recorded since boot
}

impl<const N: usize> TriggerLog<N> {
    const CAPACITY_OK: () = assert!(N > 0, "TriggerLog capacity must be at least 1");

    /// Creates an empty log. Usable in `static` initializers.
    pub const fn new() -> Self {
        let () = Self::CAPACITY_OK; // Zero capacity fails to compile here
        Self {
            slots: [EMPTY_SLOT; N],
            head: AtomicUsize::new(0),
            total: AtomicU32::new(0),
        }
    }

    /// Records one edge. Interrupt context, never blocks, never fails.
    #[inline(always)]
    pub fn record(&self, now_us: u32) {
        // A real edge at clock value 0 would read back as EMPTY, nudge it by one tick
        let stamp = if now_us == EMPTY { 1 } else { now_us };

        let head = self.head.load(Ordering::Relaxed); // Only the producer writes head
        self.slots[head].store(stamp, Ordering::Relaxed);
        self.head.store(Self::wrap_forward(head), Ordering::Release);
        self.total.fetch_add(1, Ordering::Release);
    }

    /// Number of slots in the log
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Index of the next slot to be written
    #[inline(always)]
    pub fn head(&self) -> usize {
        self.head.load(Ordering::Acquire)
    }

    /// Edges recorded since construction, unaffected by overwrites
    #[inline(always)]
    pub fn total(&self) -> u32 {
        self.total.load(Ordering::Acquire)
    }

    /// Raw slot value, EMPTY if never written
    #[inline(always)]
    pub fn slot(&self, idx: usize) -> u32 {
        self.slots[idx % N].load(Ordering::Acquire)
    }

    /// Index of the most recently written slot relative to `head`
    #[inline(always)]
    pub const fn latest_index(head: usize) -> usize {
        Self::wrap_back(head, 1)
    }

    /// Steps `steps` slots backward from `idx`, wrapping around the ring
    #[inline(always)]
    pub const fn wrap_back(idx: usize, steps: usize) -> usize {
        (idx + N - (steps % N)) % N
    }

    /// Circular distance walking forward from `from` to `to`
    #[inline(always)]
    pub const fn distance(from: usize, to: usize) -> usize {
        (to + N - from) % N
    }

    #[inline(always)]
    const fn wrap_forward(idx: usize) -> usize {
        (idx + 1) % N
    }
}

impl<const N: usize> Default for TriggerLog<N> {
    fn default() -> Self {
        Self::new()
    }
}
