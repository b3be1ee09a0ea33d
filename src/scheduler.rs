//! The frame loop.
//!
//! One frame is computed at a time. Each iteration checks the stop flag, ticks
//! the network, delivers the frame, then hands control to the host's per-frame
//! primitive ([`FrameHost::next_frame`]), which is the only suspension point.
//! Setter calls the host makes there apply from the start of the next frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::cppn::Cppn;
use crate::frame::DisplaySurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Requests that the loop stop before its next iteration. The frame in flight
/// always completes and is delivered.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }
}

/// The host's per-frame scheduling primitive.
pub trait FrameHost {
    /// Runs between two frames. Returning an error ends the loop.
    fn next_frame(&mut self, cppn: &mut Cppn, stop: &StopHandle) -> Result<()>;
}

impl<F> FrameHost for F
where
    F: FnMut(&mut Cppn, &StopHandle) -> Result<()>,
{
    fn next_frame(&mut self, cppn: &mut Cppn, stop: &StopHandle) -> Result<()> {
        self(cppn, stop)
    }
}

/// Sleeps until the next frame deadline for a fixed frame rate.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Duration,
    next_frame_at: Option<Instant>,
}

impl FramePacer {
    pub fn new(fps: u32) -> Result<Self> {
        if fps == 0 {
            bail!("fps must be > 0");
        }
        Ok(Self {
            interval: Duration::from_secs_f64(1.0 / f64::from(fps)),
            next_frame_at: None,
        })
    }

    /// No waiting between frames.
    pub fn unpaced() -> Self {
        Self {
            interval: Duration::ZERO,
            next_frame_at: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameHost for FramePacer {
    fn next_frame(&mut self, _cppn: &mut Cppn, _stop: &StopHandle) -> Result<()> {
        if self.interval.is_zero() {
            return Ok(());
        }

        let now = Instant::now();
        let deadline = self.next_frame_at.unwrap_or(now) + self.interval;
        if deadline > now {
            thread::sleep(deadline - now);
            self.next_frame_at = Some(deadline);
        } else {
            // Running behind; re-anchor instead of bursting to catch up.
            self.next_frame_at = Some(now);
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct AnimationScheduler {
    state: SchedulerState,
    stop: StopHandle,
    frames_delivered: u64,
    frame_limit: Option<u64>,
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Idle,
            stop: StopHandle::default(),
            frames_delivered: 0,
            frame_limit: None,
        }
    }

    /// Stops each run after `limit` frames have been delivered.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Total across every run of this scheduler.
    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered
    }

    /// Runs the frame loop until stopped, the frame limit is hit, or a step
    /// fails. The latent clock lives in `cppn`, so a later `start` resumes
    /// where this one left off.
    pub fn start<S, H>(&mut self, cppn: &mut Cppn, surface: &mut S, host: &mut H) -> Result<()>
    where
        S: DisplaySurface + ?Sized,
        H: FrameHost + ?Sized,
    {
        self.stop.clear();
        self.state = SchedulerState::Running;
        info!(surface = surface.label(), "animation started");

        let result = self.run_loop(cppn, surface, host);

        self.state = SchedulerState::Idle;
        info!(frames = self.frames_delivered, "animation stopped");
        result
    }

    fn run_loop<S, H>(&mut self, cppn: &mut Cppn, surface: &mut S, host: &mut H) -> Result<()>
    where
        S: DisplaySurface + ?Sized,
        H: FrameHost + ?Sized,
    {
        let mut delivered_this_run = 0_u64;
        loop {
            if self.stop.is_stop_requested() {
                return Ok(());
            }
            if self
                .frame_limit
                .is_some_and(|limit| delivered_this_run >= limit)
            {
                return Ok(());
            }

            let frame = cppn
                .render_frame()
                .with_context(|| format!("failed computing frame {}", self.frames_delivered))?;
            surface.present(&frame).with_context(|| {
                format!(
                    "{} failed to accept frame {}",
                    surface.label(),
                    self.frames_delivered
                )
            })?;
            self.frames_delivered += 1;
            delivered_this_run += 1;
            debug!(frame = self.frames_delivered, "frame delivered");

            host.next_frame(cppn, &self.stop)?;
        }
    }
}
