//! Fixed-timestep accumulator
//!
//! Real frame time goes in, a whole number of fixed steps comes out. The
//! frame delta is capped first so a long stall (tab in background, debugger)
//! costs at most a few steps of catch-up instead of a spiral of death.

use crate::consts::{FIXED_DT, MAX_FRAME_DT, MAX_SUBSTEPS};

#[derive(Debug, Clone)]
pub struct SimulationClock {
    accumulator: f32,
    fixed_dt: f32,
    max_frame_dt: f32,
    max_substeps: u32,
    total_steps: u64,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(FIXED_DT, MAX_FRAME_DT, MAX_SUBSTEPS)
    }
}

impl SimulationClock {
    pub fn new(fixed_dt: f32, max_frame_dt: f32, max_substeps: u32) -> Self {
        Self {
            accumulator: 0.0,
            fixed_dt,
            max_frame_dt,
            max_substeps: max_substeps.max(1),
            total_steps: 0,
        }
    }

    #[inline]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Unconsumed time, always below one fixed step after [`advance`](Self::advance)
    #[inline]
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Steps run since creation
    #[inline]
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Drop pending time (after a pause or a mode switch)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    /// Feed one rendered frame's delta and run `step(fixed_dt)` for every
    /// whole step it covers. Returns the number of steps run.
    pub fn advance<F: FnMut(f32)>(&mut self, real_dt: f32, mut step: F) -> u32 {
        let dt = real_dt.max(0.0).min(self.max_frame_dt);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= self.fixed_dt && substeps < self.max_substeps {
            step(self.fixed_dt);
            self.accumulator -= self.fixed_dt;
            substeps += 1;
        }

        // Hit the substep cap: forget the backlog rather than carry it
        if self.accumulator >= self.fixed_dt {
            log::debug!("Clock dropped {:.3}s of backlog", self.accumulator);
            self.accumulator %= self.fixed_dt;
        }

        self.total_steps += substeps as u64;
        substeps
    }
}
