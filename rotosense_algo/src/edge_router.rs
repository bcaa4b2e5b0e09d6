// Implements the EdgeRouter, a registration table that routes zero-argument hardware
// edge interrupts to exactly one handler per interrupt line.

// Key Features:
// - `const` constructible, lives in a `static` next to the interrupt vector.
// - Binding is validated: out-of-range lines and double attachment are reported as errors.
// - Dispatch from interrupt context is a table lookup plus one virtual call.

// Detailed Operation:
// Each line holds an optional `&'static dyn EdgeSink` inside a critical-section mutex.
// `bind` runs once during initialization and fails if the line already has a handler.
// The interrupt vector for a line calls `dispatch(line)`, which copies the handler
// reference out of the table and invokes `on_edge`. Unbound lines are ignored so a
// spurious interrupt before initialization completes is harmless.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use core::cell::Cell;

use critical_section::Mutex;

use crate::error::BindError;

/// Receiver of hardware edge events. Called from interrupt context.
pub trait EdgeSink: Sync {
    fn on_edge(&self);
}

type Slot = Mutex<Cell<Option<&'static dyn EdgeSink>>>;

#[allow(clippy::declare_interior_mutable_const)]
const UNBOUND: Slot = Mutex::new(Cell::new(None));

/// Number of external interrupt lines on the STM32G4 EXTI controller
pub const EXTI_LINES: usize = 16;

pub struct EdgeRouter<const LINES: usize = EXTI_LINES> {
    handlers: [Slot; LINES],
}

impl<const LINES: usize> EdgeRouter<LINES> {
    pub const fn new() -> Self {
        Self {
            handlers: [UNBOUND; LINES],
        }
    }

    /// Attaches `sink` to `line`. Each line accepts a single handler for its lifetime.
    pub fn bind(&self, line: u8, sink: &'static dyn EdgeSink) -> Result<(), BindError> {
        let slot = self.slot(line)?;

        critical_section::with(|cs| {
            let cell = slot.borrow(cs);
            if cell.get().is_some() {
                #[cfg(feature = "defmt")]
                defmt::error!("EDGE: line {} already bound, refusing second handler", line);
                return Err(BindError::AlreadyBound { line });
            }
            cell.set(Some(sink));
            Ok(())
        })?;

        #[cfg(feature = "defmt")]
        defmt::info!("EDGE: handler bound to line {}", line);
        Ok(())
    }

    /// Routes one edge on `line` to its handler. Returns false if nothing is bound.
    #[inline(always)]
    pub fn dispatch(&self, line: u8) -> bool {
        let handler = match self.slot(line) {
            Ok(slot) => critical_section::with(|cs| slot.borrow(cs).get()),
            Err(_) => None,
        };

        match handler {
            Some(sink) => {
                sink.on_edge();
                true
            }
            None => false,
        }
    }

    pub fn is_bound(&self, line: u8) -> bool {
        match self.slot(line) {
            Ok(slot) => critical_section::with(|cs| slot.borrow(cs).get().is_some()),
            Err(_) => false,
        }
    }

    #[inline(always)]
    fn slot(&self, line: u8) -> Result<&Slot, BindError> {
        self.handlers
            .get(line as usize)
            .ok_or(BindError::LineOutOfRange { line, lines: LINES })
    }
}

impl<const LINES: usize> Default for EdgeRouter<LINES> {
    fn default() -> Self {
        Self::new()
    }
}
