// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Linear alpha fades used for dimming and flashing the overlay.

use std::time::Duration;

/// Total length of one fade.
pub const FADE_DURATION: Duration = Duration::from_millis(200);

/// Time between two fade steps.
pub const FADE_INTERVAL: Duration = Duration::from_millis(20);

/// Outcome of advancing a [`Fader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeStep {
    Idle,
    Running,
    Finished,
}

/// Steps an alpha value towards a target in fixed ticks.
///
/// A fade takes `FADE_DURATION / FADE_INTERVAL` steps to reach its target.
/// The tick after the last step stops the fader and reports
/// [`FadeStep::Finished`] once.
#[derive(Debug, Clone)]
pub struct Fader {
    alpha: f32,
    target: f32,
    delta: f32,
    ticks: i64,
    running: bool,
    pending: Duration,
}

impl Fader {
    pub fn new(alpha: u8) -> Self {
        Self {
            alpha: alpha as f32,
            target: alpha as f32,
            delta: 0.0,
            ticks: 0,
            running: false,
            pending: Duration::ZERO,
        }
    }

    pub fn alpha(&self) -> u8 {
        self.alpha.round().clamp(0.0, 255.0) as u8
    }

    /// Jump to `alpha` without animating. Stops a running fade.
    pub fn set_alpha(&mut self, alpha: u8) {
        self.alpha = alpha as f32;
        self.running = false;
        self.pending = Duration::ZERO;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start fading from the current alpha to `target`.
    pub fn fade(&mut self, target: u8) {
        let ticks = (FADE_DURATION.as_millis() / FADE_INTERVAL.as_millis()) as i64;
        self.target = target as f32;
        self.ticks = ticks;
        self.delta = (self.target - self.alpha) / ticks as f32;
        self.running = true;
        self.pending = Duration::ZERO;
    }

    /// Consume `elapsed` time in whole intervals.
    pub fn advance(&mut self, elapsed: Duration) -> FadeStep {
        if !self.running {
            return FadeStep::Idle;
        }

        self.pending += elapsed;
        while self.pending >= FADE_INTERVAL {
            self.pending -= FADE_INTERVAL;
            self.ticks -= 1;
            if self.ticks < 0 {
                self.running = false;
                self.pending = Duration::ZERO;
                return FadeStep::Finished;
            }
            if self.ticks == 0 {
                self.alpha = self.target;
            } else {
                self.alpha = (self.alpha + self.delta).clamp(0.0, 255.0);
            }
        }
        FadeStep::Running
    }
}
