//! Admission control for motion submissions.
//!
//! The gate is a rate limiter, not a queue: a throttled submission is
//! dropped for good and the next keystroke simply tries again.
//!
//! A submission holds the gate's single [`SubmissionSlot`] from the moment it
//! is handed to the runtime until the worker has finished with it, so a
//! second submission arriving in that window is dropped as
//! [`Throttle::Busy`] instead of waiting behind the first.
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::debug;

use game_core::{Motion, MotionRequest};

/// Tuning for [`CooldownGate`].
#[derive(Clone, Debug, PartialEq)]
pub struct CooldownConfig {
    /// Minimum interval between accepted submissions.
    pub base: Duration,
    /// Smoothed round-trip time above which `slow_penalty` applies.
    pub slow_latency: Duration,
    pub slow_penalty: Duration,
    /// Smoothed round-trip time above which `very_slow_penalty` applies
    /// instead of `slow_penalty`.
    pub very_slow_latency: Duration,
    pub very_slow_penalty: Duration,
    /// Window in which a repeated single-step motion counts as key repeat.
    pub repeat_window: Duration,
    pub repeat_penalty: Duration,
    /// Weight of the newest sample in the latency average, in percent.
    pub latency_smoothing_percent: u32,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(50),
            slow_latency: Duration::from_millis(150),
            slow_penalty: Duration::from_millis(50),
            very_slow_latency: Duration::from_millis(300),
            very_slow_penalty: Duration::from_millis(120),
            repeat_window: Duration::from_millis(150),
            repeat_penalty: Duration::from_millis(60),
            latency_smoothing_percent: 25,
        }
    }
}

/// Why a submission was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error, serde::Serialize)]
pub enum Throttle {
    #[error("a previous submission is still being processed")]
    Busy,

    #[error("cooldown active for another {remaining:?}")]
    Cooldown { remaining: Duration },
}

/// The one-submission-at-a-time slot shared by the gate and every handle.
#[derive(Clone, Debug)]
pub struct SubmissionSlot(Arc<Semaphore>);

impl SubmissionSlot {
    pub fn new() -> Self {
        Self(Arc::new(Semaphore::new(1)))
    }

    /// Claims the slot, or fails with [`Throttle::Busy`] while another
    /// submission holds it.
    pub fn claim(&self) -> Result<SubmissionPermit, Throttle> {
        Arc::clone(&self.0)
            .try_acquire_owned()
            .map(SubmissionPermit)
            .map_err(|_| Throttle::Busy)
    }

    pub fn is_busy(&self) -> bool {
        self.0.available_permits() == 0
    }
}

impl Default for SubmissionSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof that a submission holds the slot. Dropping it frees the slot.
#[derive(Debug)]
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct SubmissionPermit(OwnedSemaphorePermit);

impl SubmissionPermit {
    /// Marks the submission as processed.
    pub fn complete(self) {
        drop(self);
    }
}

/// Rejects submissions that arrive while busy or inside the cooldown.
#[derive(Clone, Debug)]
pub struct CooldownGate {
    config: CooldownConfig,
    slot: SubmissionSlot,
    last_accepted: Option<(Motion, Instant)>,
    latency: Option<Duration>,
}

impl CooldownGate {
    pub fn new(config: CooldownConfig) -> Self {
        Self {
            config,
            slot: SubmissionSlot::new(),
            last_accepted: None,
            latency: None,
        }
    }

    /// Handle on the gate's slot, for claiming it before a submission is
    /// queued.
    pub fn slot(&self) -> SubmissionSlot {
        self.slot.clone()
    }

    /// Admits `request` at `now`, or says why it must be dropped.
    ///
    /// The returned permit keeps the gate busy until it is completed or
    /// dropped.
    pub fn admit(
        &mut self,
        request: &MotionRequest,
        now: Instant,
    ) -> Result<SubmissionPermit, Throttle> {
        let permit = self.slot.claim()?;
        self.accept(request, now)?;
        Ok(permit)
    }

    /// Cooldown check for a submission that already holds the slot.
    pub fn accept(&mut self, request: &MotionRequest, now: Instant) -> Result<(), Throttle> {
        if let Some((_, accepted_at)) = self.last_accepted {
            let elapsed = now.saturating_duration_since(accepted_at);
            let cooldown = self.cooldown_for(request, now);
            if elapsed < cooldown {
                let remaining = cooldown - elapsed;
                debug!(
                    target: "runtime::gate",
                    motion = %request,
                    family = %request.motion.family(),
                    ?remaining,
                    "submission throttled"
                );
                return Err(Throttle::Cooldown { remaining });
            }
        }

        self.last_accepted = Some((request.motion, now));
        Ok(())
    }

    pub fn is_busy(&self) -> bool {
        self.slot.is_busy()
    }

    /// Folds a round-trip sample into the smoothed latency estimate.
    pub fn record_latency(&mut self, rtt: Duration) {
        let weight = u128::from(self.config.latency_smoothing_percent.clamp(1, 100));
        self.latency = Some(match self.latency {
            None => rtt,
            Some(previous) => {
                let nanos = (previous.as_nanos() * (100 - weight) + rtt.as_nanos() * weight) / 100;
                Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
            }
        });
    }

    pub fn smoothed_latency(&self) -> Option<Duration> {
        self.latency
    }

    /// Cooldown that applies to `request` if submitted at `now`.
    pub fn cooldown_for(&self, request: &MotionRequest, now: Instant) -> Duration {
        let mut cooldown = self.config.base + self.latency_penalty();

        if let Some((motion, accepted_at)) = self.last_accepted
            && request.motion.is_single_step()
            && motion == request.motion
            && now.saturating_duration_since(accepted_at) < self.config.repeat_window
        {
            cooldown += self.config.repeat_penalty;
        }
        cooldown
    }

    fn latency_penalty(&self) -> Duration {
        match self.latency {
            Some(rtt) if rtt > self.config.very_slow_latency => self.config.very_slow_penalty,
            Some(rtt) if rtt > self.config.slow_latency => self.config.slow_penalty,
            _ => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn gate() -> CooldownGate {
        CooldownGate::new(CooldownConfig::default())
    }

    #[test]
    fn test_busy_gate_drops_submissions() {
        let mut gate = gate();
        let now = Instant::now();
        let request = MotionRequest::single(Motion::WordForward);

        let permit = gate.admit(&request, now).unwrap();
        assert!(gate.is_busy());
        assert_eq!(
            gate.admit(&request, now + ms(500)).unwrap_err(),
            Throttle::Busy
        );

        permit.complete();
        assert!(!gate.is_busy());
        assert!(gate.admit(&request, now + ms(500)).is_ok());
    }

    #[test]
    fn test_slot_claimed_elsewhere_keeps_gate_busy() {
        let mut gate = gate();
        let slot = gate.slot();
        let now = Instant::now();
        let request = MotionRequest::single(Motion::WordForward);

        let held = slot.claim().unwrap();
        assert_eq!(gate.admit(&request, now).unwrap_err(), Throttle::Busy);
        assert_eq!(slot.claim().unwrap_err(), Throttle::Busy);

        // The holder itself only goes through the cooldown check.
        assert_eq!(gate.accept(&request, now), Ok(()));
        drop(held);
        assert!(slot.claim().is_ok());
    }

    #[test]
    fn test_base_cooldown() {
        let mut gate = gate();
        let now = Instant::now();
        let request = MotionRequest::single(Motion::WordForward);

        gate.admit(&request, now).unwrap().complete();
        assert_eq!(
            gate.admit(&request, now + ms(20)).unwrap_err(),
            Throttle::Cooldown { remaining: ms(30) }
        );
        assert!(!gate.is_busy());
        assert!(gate.admit(&request, now + ms(50)).is_ok());
    }

    #[test]
    fn test_latency_bands_raise_cooldown() {
        let mut gate = gate();
        let now = Instant::now();
        let request = MotionRequest::single(Motion::WordEnd);
        assert_eq!(gate.cooldown_for(&request, now), ms(50));

        gate.record_latency(ms(200));
        assert_eq!(gate.cooldown_for(&request, now), ms(100));

        gate.record_latency(ms(1_000));
        assert_eq!(gate.smoothed_latency(), Some(ms(400)));
        assert_eq!(gate.cooldown_for(&request, now), ms(170));
    }

    #[test]
    fn test_repeated_single_step_gets_penalty() {
        let mut gate = gate();
        let now = Instant::now();
        let down = MotionRequest::single(Motion::Down);

        gate.admit(&down, now).unwrap().complete();

        assert_eq!(gate.cooldown_for(&down, now + ms(60)), ms(110));
        assert_eq!(
            gate.admit(&down, now + ms(60)).unwrap_err(),
            Throttle::Cooldown { remaining: ms(50) }
        );
        // A different direction is not key repeat.
        assert!(
            gate.admit(&MotionRequest::single(Motion::Up), now + ms(60))
                .is_ok()
        );
    }

    #[test]
    fn test_repeat_penalty_only_for_single_steps() {
        let mut gate = gate();
        let now = Instant::now();
        let word = MotionRequest::single(Motion::WordForward);

        gate.admit(&word, now).unwrap().complete();
        assert_eq!(gate.cooldown_for(&word, now + ms(60)), ms(50));
    }
}
