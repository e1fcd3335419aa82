//! Single-fluid tanks.
//!
//! A [`FluidTank`] holds at most one fluid kind at a time. Draining it to
//! zero forgets the kind so a different fluid may enter next. Inserts and
//! extracts are all-or-part but never leave a tank half-updated.

use serde::{Deserialize, Serialize};

use crate::id::FluidKindId;

/// An amount of one fluid kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FluidStack {
    pub kind: FluidKindId,
    pub amount: u32,
}

impl FluidStack {
    pub fn new(kind: FluidKindId, amount: u32) -> Self {
        Self { kind, amount }
    }
}

/// Bounded storage for a single fluid kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FluidTank {
    fluid: Option<FluidKindId>,
    amount: u32,
    capacity: u32,
}

impl FluidTank {
    pub fn new(capacity: u32) -> Self {
        Self {
            fluid: None,
            amount: 0,
            capacity,
        }
    }

    /// A tank pre-filled with `stack`, truncated to capacity.
    pub fn with_contents(capacity: u32, stack: FluidStack) -> Self {
        let mut tank = Self::new(capacity);
        tank.insert(stack);
        tank
    }

    pub fn fluid(&self) -> Option<FluidKindId> {
        self.fluid
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn remaining(&self) -> u32 {
        self.capacity - self.amount
    }

    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }

    pub fn is_full(&self) -> bool {
        self.amount >= self.capacity
    }

    /// Current contents, if any.
    pub fn contents(&self) -> Option<FluidStack> {
        self.fluid
            .filter(|_| self.amount > 0)
            .map(|kind| FluidStack::new(kind, self.amount))
    }

    /// Whether `kind` may enter this tank right now.
    pub fn can_accept(&self, kind: FluidKindId) -> bool {
        !self.is_full() && self.fluid.is_none_or(|k| k == kind)
    }

    /// How much of `stack` would be accepted, without changing anything.
    pub fn simulate_insert(&self, stack: FluidStack) -> u32 {
        if !self.can_accept(stack.kind) {
            return 0;
        }
        stack.amount.min(self.remaining())
    }

    /// Insert as much of `stack` as fits. Returns the accepted amount.
    pub fn insert(&mut self, stack: FluidStack) -> u32 {
        let accepted = self.simulate_insert(stack);
        if accepted > 0 {
            self.fluid = Some(stack.kind);
            self.amount += accepted;
        }
        accepted
    }

    /// Remove up to `max` units. Returns `None` when nothing was removed.
    pub fn extract(&mut self, max: u32) -> Option<FluidStack> {
        let kind = self.fluid?;
        let taken = max.min(self.amount);
        if taken == 0 {
            return None;
        }
        self.amount -= taken;
        if self.amount == 0 {
            self.fluid = None;
        }
        Some(FluidStack::new(kind, taken))
    }
}
