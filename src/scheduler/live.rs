use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::clock::Clock;
use crate::elements::ElementRecord;
use crate::propagation::{PositionSample, Propagator, Sgp4Propagator};
use crate::roster::{tick_events, Reconciler, RenderEvent, RosterDiff};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("live updates already running")]
    AlreadyRunning,
    #[error("tick interval must be greater than zero")]
    ZeroInterval,
    #[error("event buffer must hold at least one batch")]
    ZeroCapacity,
}

/// Batches buffered for a slow consumer before new ones are dropped.
pub const EVENT_BUFFER: usize = 64;

/// Everything the rendering boundary needs to apply for one refresh or tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderBatch {
    pub at: DateTime<Utc>,
    pub events: Vec<RenderEvent>,
}

struct Shared<P> {
    reconciler: Reconciler<P>,
    last_at: Option<DateTime<Utc>>,
}

impl<P> Shared<P> {
    /// Never hands out an instant earlier than the previous one.
    fn advance(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let at = match self.last_at {
            Some(previous) if previous > now => previous,
            _ => now,
        };
        self.last_at = Some(at);
        at
    }
}

struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

/// Drives `Reconciler::tick` on a fixed cadence and publishes render events.
///
/// Refreshes and ticks run under one lock, each as a full pass, so observers never
/// see a half-updated roster. Events are sent while the lock is held and therefore
/// arrive in the order the roster changed. The event channel is bounded: when the
/// consumer falls behind, batches are dropped with a warning rather than queued.
pub struct LiveScheduler<P = Sgp4Propagator> {
    shared: Arc<Mutex<Shared<P>>>,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
    events: mpsc::Sender<RenderBatch>,
    worker: Option<WorkerHandle>,
}

impl<P: Propagator + 'static> LiveScheduler<P> {
    pub fn new(
        reconciler: Reconciler<P>,
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
    ) -> Result<(Self, mpsc::Receiver<RenderBatch>), SchedulerError> {
        Self::with_capacity(reconciler, clock, tick_interval, EVENT_BUFFER)
    }

    pub fn with_capacity(
        reconciler: Reconciler<P>,
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
        capacity: usize,
    ) -> Result<(Self, mpsc::Receiver<RenderBatch>), SchedulerError> {
        if tick_interval.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }
        if capacity == 0 {
            return Err(SchedulerError::ZeroCapacity);
        }

        let (events, rx) = mpsc::channel(capacity);
        let scheduler = Self {
            shared: Arc::new(Mutex::new(Shared {
                reconciler,
                last_at: None,
            })),
            clock,
            tick_interval,
            events,
            worker: None,
        };
        Ok((scheduler, rx))
    }

    /// Replaces the tracked set and publishes the resulting creations, updates and removals.
    pub fn refresh(&self, records: &[ElementRecord]) -> RosterDiff {
        let mut shared = lock(&self.shared);
        let at = shared.advance(self.clock.now());
        let diff = shared.reconciler.refresh(records, at);

        let batch = RenderBatch {
            at,
            events: diff.render_events(),
        };
        if !publish(&self.events, batch) {
            log::debug!("Render event receiver dropped, refresh events discarded");
        }

        diff
    }

    /// Runs one tick immediately. Returns `None` while the roster is empty.
    pub fn tick(&self) -> Option<Vec<PositionSample>> {
        let (samples, _) = tick_and_publish(&self.shared, self.clock.as_ref(), &self.events)?;
        Some(samples)
    }

    /// Starts the cadence. Must be called inside a tokio runtime.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.worker.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(run_tick_loop(
            Arc::clone(&self.shared),
            Arc::clone(&self.clock),
            self.events.clone(),
            self.tick_interval,
            stop_rx,
        ));

        self.worker = Some(WorkerHandle { stop_tx, join });
        log::info!("Live updates started, every {:?}", self.tick_interval);
        Ok(())
    }

    /// Stops the cadence and waits for the loop to exit. No tick runs after this returns.
    pub async fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.join.await;
            log::info!("Live updates stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Read access to the roster between operations.
    pub fn with_roster<R>(&self, f: impl FnOnce(&Reconciler<P>) -> R) -> R {
        f(&lock(&self.shared).reconciler)
    }
}

impl<P> Drop for LiveScheduler<P> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.join.abort();
        }
    }
}

async fn run_tick_loop<P: Propagator>(
    shared: Arc<Mutex<Shared<P>>>,
    clock: Arc<dyn Clock>,
    events: mpsc::Sender<RenderBatch>,
    period: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            _ = interval.tick() => {
                if let Some((_, false)) = tick_and_publish(&shared, clock.as_ref(), &events) {
                    log::info!("Render event receiver dropped, stopping live updates");
                    break;
                }
            }
        }
    }
}

/// One full pass over the roster. Returns the samples and whether the receiver is
/// still there, or `None` if there is nothing to tick yet.
fn tick_and_publish<P: Propagator>(
    shared: &Mutex<Shared<P>>,
    clock: &dyn Clock,
    events: &mpsc::Sender<RenderBatch>,
) -> Option<(Vec<PositionSample>, bool)> {
    let mut shared = lock(shared);
    if shared.reconciler.is_empty() {
        return None;
    }

    let at = shared.advance(clock.now());
    let samples = shared.reconciler.tick(at);
    let connected = publish(
        events,
        RenderBatch {
            at,
            events: tick_events(&samples),
        },
    );

    Some((samples, connected))
}

/// Never blocks. Returns false only once the receiver is gone.
fn publish(events: &mpsc::Sender<RenderBatch>, batch: RenderBatch) -> bool {
    match events.try_send(batch) {
        Ok(()) => true,
        Err(TrySendError::Full(batch)) => {
            log::warn!(
                "Render consumer is behind, dropped batch at {} ({} events)",
                batch.at,
                batch.events.len()
            );
            true
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

fn lock<P>(shared: &Mutex<Shared<P>>) -> MutexGuard<'_, Shared<P>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{fixtures, parse, DEFAULT_DECAY_LIMIT_MINUTES};
    use crate::propagation::ObjectId;
    use crate::scheduler::{ManualClock, SimulatedClock};
    use chrono::Duration as ChronoDuration;
    use tokio::sync::mpsc::error::TryRecvError;

    const SECOND: Duration = Duration::from_secs(1);

    fn start_instant() -> DateTime<Utc> {
        parse(&fixtures::iss()).unwrap().epoch() + ChronoDuration::minutes(10)
    }

    fn scheduler(clock: Arc<dyn Clock>) -> (LiveScheduler, mpsc::Receiver<RenderBatch>) {
        LiveScheduler::new(Reconciler::default(), clock, SECOND).unwrap()
    }

    fn drain(rx: &mut mpsc::Receiver<RenderBatch>) -> Vec<RenderBatch> {
        let mut batches = Vec::new();
        while let Ok(batch) = rx.try_recv() {
            batches.push(batch);
        }
        batches
    }

    #[test]
    fn zero_interval_is_rejected() {
        let clock = Arc::new(ManualClock::new(start_instant()));
        let result = LiveScheduler::new(
            Reconciler::new(Sgp4Propagator, DEFAULT_DECAY_LIMIT_MINUTES),
            clock,
            Duration::ZERO,
        );
        assert!(matches!(result, Err(SchedulerError::ZeroInterval)));

        let clock = Arc::new(ManualClock::new(start_instant()));
        let result = LiveScheduler::with_capacity(Reconciler::default(), clock, SECOND, 0);
        assert!(matches!(result, Err(SchedulerError::ZeroCapacity)));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_until_first_refresh() {
        let clock = Arc::new(SimulatedClock::new(start_instant(), 1.0));
        let (mut scheduler, mut rx) = scheduler(clock);
        assert_eq!(scheduler.tick_interval(), SECOND);
        scheduler.start().unwrap();

        tokio::time::sleep(3 * SECOND).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(scheduler.tick(), None);

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_after_refresh() {
        let clock = Arc::new(SimulatedClock::new(start_instant(), 1.0));
        let (mut scheduler, mut rx) = scheduler(clock);
        scheduler.start().unwrap();

        let diff = scheduler.refresh(&[fixtures::iss(), fixtures::hst()]);
        assert_eq!(diff.created.len(), 2);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.events.len(), 2);
        assert!(first
            .events
            .iter()
            .all(|e| matches!(e, RenderEvent::Created { .. })));

        tokio::time::sleep(3 * SECOND + SECOND / 2).await;
        let ticks = drain(&mut rx);
        assert!(ticks.len() >= 3, "got {} ticks", ticks.len());

        let mut previous = first.at;
        for batch in &ticks {
            assert!(batch.at >= previous);
            previous = batch.at;
            assert_eq!(batch.events.len(), 2);
            assert!(batch
                .events
                .iter()
                .all(|e| matches!(e, RenderEvent::Updated { .. })));
        }

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_cadence() {
        let clock = Arc::new(SimulatedClock::new(start_instant(), 1.0));
        let (mut scheduler, mut rx) = scheduler(clock);
        scheduler.refresh(&[fixtures::iss()]);
        scheduler.start().unwrap();
        assert!(matches!(scheduler.start(), Err(SchedulerError::AlreadyRunning)));

        tokio::time::sleep(2 * SECOND).await;
        scheduler.stop().await;
        assert!(!scheduler.is_running());
        drain(&mut rx);

        tokio::time::sleep(5 * SECOND).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(scheduler.with_roster(|r| r.len()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_between_ticks_replaces_roster() {
        let clock = Arc::new(SimulatedClock::new(start_instant(), 1.0));
        let (mut scheduler, mut rx) = scheduler(clock);
        scheduler.refresh(&[fixtures::named("A"), fixtures::named("B")]);
        scheduler.start().unwrap();
        tokio::time::sleep(SECOND + SECOND / 2).await;

        let diff = scheduler.refresh(&[fixtures::named("B"), fixtures::named("C")]);
        assert_eq!(diff.removed, vec![ObjectId::from("A")]);

        drain(&mut rx);
        tokio::time::sleep(SECOND).await;
        let ticks = drain(&mut rx);
        assert!(!ticks.is_empty());
        for batch in ticks {
            let ids: Vec<&str> = batch.events.iter().map(|e| e.id().as_str()).collect();
            assert_eq!(ids, vec!["B", "C"]);
        }

        scheduler.stop().await;
    }

    #[test]
    fn time_never_runs_backwards() {
        let clock = Arc::new(ManualClock::new(start_instant()));
        let (scheduler, mut rx) = scheduler(clock.clone());
        scheduler.refresh(&[fixtures::iss()]);

        clock.set(start_instant() - ChronoDuration::seconds(30));
        let samples = scheduler.tick().unwrap();
        assert_eq!(samples[0].at, start_instant());

        clock.advance(ChronoDuration::minutes(1));
        let samples = scheduler.tick().unwrap();
        assert_eq!(samples[0].at, start_instant() + ChronoDuration::seconds(30));

        assert_eq!(drain(&mut rx).len(), 3);
    }

    #[test]
    fn slow_consumer_drops_batches_without_stalling() {
        let clock = Arc::new(ManualClock::new(start_instant()));
        let (scheduler, mut rx) =
            LiveScheduler::with_capacity(Reconciler::default(), clock.clone(), SECOND, 2).unwrap();
        scheduler.refresh(&[fixtures::iss()]);

        for _ in 0..5 {
            clock.advance(ChronoDuration::seconds(1));
            assert_eq!(scheduler.tick().map(|s| s.len()), Some(1));
        }

        let kept = drain(&mut rx);
        assert_eq!(kept.len(), 2);
        assert!(matches!(kept[0].events[0], RenderEvent::Created { .. }));
        assert_eq!(kept[1].at, start_instant() + ChronoDuration::seconds(1));
    }

    #[test]
    fn closed_receiver_is_reported() {
        let clock = Arc::new(ManualClock::new(start_instant()));
        let (scheduler, rx) = scheduler(clock.clone());
        scheduler.refresh(&[fixtures::iss()]);
        drop(rx);

        let (samples, connected) =
            tick_and_publish(&scheduler.shared, clock.as_ref(), &scheduler.events).unwrap();
        assert_eq!(samples.len(), 1);
        assert!(!connected);
    }
}
