// Microsecond time source shared by the edge recorder and the estimator.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use core::sync::atomic::{AtomicU32, Ordering};

/// Free-running microsecond counter. Wraps at `u32::MAX`, callers use wrapping arithmetic.
pub trait Clock {
    fn now_us(&self) -> u32;
}

/// Clock driven by hand, used for host simulation and tests.
pub struct ManualClock {
    now: AtomicU32,
}

impl ManualClock {
    pub const fn new(start_us: u32) -> Self {
        Self {
            now: AtomicU32::new(start_us),
        }
    }

    /// Jumps to an absolute time
    pub fn set(&self, now_us: u32) {
        self.now.store(now_us, Ordering::Relaxed);
    }

    /// Moves time forward with wraparound
    pub fn advance(&self, delta_us: u32) {
        self.now.fetch_add(delta_us, Ordering::Relaxed); // fetch_add wraps on overflow
    }
}

impl Clock for ManualClock {
    #[inline(always)]
    fn now_us(&self) -> u32 {
        self.now.load(Ordering::Relaxed)
    }
}

impl<C: Clock> Clock for &C {
    #[inline(always)]
    fn now_us(&self) -> u32 {
        (**self).now_us()
    }
}
