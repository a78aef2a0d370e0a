//! Month tick and delayed inflation timing
//!
//! Time only moves when the host calls [`Scheduler::update`] with the current
//! wall-clock milliseconds (from `requestAnimationFrame`, a native loop, or a
//! test). Every month tick lands a savings drop and queues an inflation step
//! `INFLATION_DELAY_MS` later, tagged with the engine session at queue time.
//!
//! Pausing stops month ticks only; inflation steps queued before the pause
//! still run when due.

use std::collections::VecDeque;

use chrono::NaiveDate;

use super::engine::{SavingsOutcome, SimulationEngine};
use super::state::Phase;
use crate::consts::{INFLATION_DELAY_MS, MONTH_INTERVAL_MS};

/// Something that happened during [`Scheduler::update`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchedulerEvent {
    /// Savings landed and the month advanced
    MonthTick {
        at_ms: f64,
        date: NaiveDate,
        outcome: SavingsOutcome,
    },
    /// Inflation applied; `dollars` sizes the visual drop headed for the mug
    InflationApplied { at_ms: f64, dollars: f64 },
    /// Inflation step queued before a restart, ignored
    StaleInflationDiscarded { session: u64 },
    /// 30-year horizon reached
    Finished { date: NaiveDate },
}

#[derive(Debug, Clone, Copy)]
struct PendingInflation {
    due_ms: f64,
    session: u64,
}

/// Fixed-interval month timer plus the queue of delayed inflation steps
#[derive(Debug, Clone)]
pub struct Scheduler {
    active: bool,
    next_tick_ms: Option<f64>,
    pending: VecDeque<PendingInflation>,
    /// Engine session the month timer was armed for
    armed_session: u64,
    interval_ms: f64,
    delay_ms: f64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_timing(MONTH_INTERVAL_MS, INFLATION_DELAY_MS)
    }

    pub fn with_timing(interval_ms: f64, delay_ms: f64) -> Self {
        Self {
            active: false,
            next_tick_ms: None,
            pending: VecDeque::new(),
            armed_session: 0,
            interval_ms: interval_ms.max(1.0),
            delay_ms: delay_ms.max(0.0),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Inflation steps waiting to fire
    pub fn pending_inflation(&self) -> usize {
        self.pending.len()
    }

    /// Leave the start phase and begin ticking; first month lands one interval from `now_ms`
    pub fn start(&mut self, now_ms: f64, engine: &mut SimulationEngine) {
        engine.start();
        self.arm(now_ms, engine.session());
        log::info!("Scheduler started at {:.0}ms", now_ms);
    }

    /// Restart the run and the month timer; the new run's first month lands one interval from `now_ms`
    pub fn restart(&mut self, now_ms: f64, engine: &mut SimulationEngine) {
        engine.restart();
        self.arm(now_ms, engine.session());
        log::info!("Scheduler restarted at {:.0}ms (session {})", now_ms, engine.session());
    }

    fn arm(&mut self, now_ms: f64, session: u64) {
        self.active = true;
        self.armed_session = session;
        self.next_tick_ms = Some(now_ms + self.interval_ms);
    }

    /// Stop month ticks. Queued inflation steps stay queued.
    pub fn stop(&mut self) {
        self.active = false;
        self.next_tick_ms = None;
    }

    /// Run every tick and inflation step due at or before `now_ms`, in time order
    pub fn update(&mut self, now_ms: f64, engine: &mut SimulationEngine) -> Vec<SchedulerEvent> {
        let mut events = Vec::new();
        loop {
            let ticking = self.active && engine.state().phase == Phase::Running;
            if !ticking {
                self.next_tick_ms = None;
            } else if self.next_tick_ms.is_none() || self.armed_session != engine.session() {
                // Resumed or reset since the last update
                self.armed_session = engine.session();
                self.next_tick_ms = Some(now_ms + self.interval_ms);
            }

            let inflation_due = self.pending.front().map(|p| p.due_ms).filter(|&t| t <= now_ms);
            let tick_due = self.next_tick_ms.filter(|&t| t <= now_ms);

            match (inflation_due, tick_due) {
                (Some(i), Some(t)) if i <= t => self.fire_inflation(engine, &mut events),
                (Some(_), None) => self.fire_inflation(engine, &mut events),
                (_, Some(t)) => self.fire_tick(t, engine, &mut events),
                (None, None) => break,
            }
        }
        events
    }

    fn fire_tick(&mut self, at_ms: f64, engine: &mut SimulationEngine, events: &mut Vec<SchedulerEvent>) {
        engine.record_drop_time(at_ms);
        let landing = engine.land_savings_drop();
        self.pending.push_back(PendingInflation {
            due_ms: at_ms + self.delay_ms,
            session: landing.session,
        });
        events.push(SchedulerEvent::MonthTick {
            at_ms,
            date: landing.date,
            outcome: landing.outcome,
        });

        if landing.finished {
            self.next_tick_ms = None;
            events.push(SchedulerEvent::Finished { date: landing.date });
        } else {
            self.next_tick_ms = Some(at_ms + self.interval_ms);
        }
    }

    fn fire_inflation(&mut self, engine: &mut SimulationEngine, events: &mut Vec<SchedulerEvent>) {
        let Some(job) = self.pending.pop_front() else {
            return;
        };
        match engine.apply_scheduled_inflation(job.session) {
            Some(dollars) => events.push(SchedulerEvent::InflationApplied {
                at_ms: job.due_ms,
                dollars,
            }),
            None => events.push(SchedulerEvent::StaleInflationDiscarded {
                session: job.session,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIMULATION_MONTHS;
    use crate::persistence::MemoryPreferences;
    use crate::platform::FixedClock;
    use crate::settings::Settings;

    fn engine() -> SimulationEngine {
        SimulationEngine::new(
            Settings::new(50_000.0, 100.0, 7.0),
            Box::new(FixedClock(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())),
            Box::new(MemoryPreferences::new()),
        )
    }

    fn count_ticks(events: &[SchedulerEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SchedulerEvent::MonthTick { .. }))
            .count()
    }

    #[test]
    fn test_nothing_happens_before_start() {
        let mut engine = engine();
        let mut scheduler = Scheduler::new();
        assert!(scheduler.update(10_000.0, &mut engine).is_empty());
        assert_eq!(engine.state().months_elapsed, 0);
    }

    #[test]
    fn test_tick_then_delayed_inflation() {
        let mut engine = engine();
        let mut scheduler = Scheduler::new();
        scheduler.start(0.0, &mut engine);

        assert!(scheduler.update(999.0, &mut engine).is_empty());

        let events = scheduler.update(1000.0, &mut engine);
        assert_eq!(count_ticks(&events), 1);
        assert_eq!(engine.state().total_savings, 50_100.0);
        assert_eq!(engine.state().cumulative_inflation_factor, 1.0);
        let fill_after_savings = engine.state().fill_level;

        assert!(scheduler.update(1499.0, &mut engine).is_empty());
        let events = scheduler.update(1500.0, &mut engine);
        assert!(matches!(events[..], [SchedulerEvent::InflationApplied { dollars, .. }] if dollars > 0.0));
        assert!(engine.state().cumulative_inflation_factor > 1.0);
        assert!(engine.state().fill_level < fill_after_savings);
        assert_eq!(engine.state().last_drop_time, 1000.0);
    }

    #[test]
    fn test_catch_up_preserves_order() {
        let mut engine = engine();
        let mut scheduler = Scheduler::new();
        scheduler.start(0.0, &mut engine);

        let events = scheduler.update(3600.0, &mut engine);
        let kinds: Vec<&str> = events
            .iter()
            .map(|e| match e {
                SchedulerEvent::MonthTick { .. } => "tick",
                SchedulerEvent::InflationApplied { .. } => "inflation",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, ["tick", "inflation", "tick", "inflation", "tick", "inflation"]);
        assert_eq!(engine.state().months_elapsed, 3);
    }

    #[test]
    fn test_restart_mid_delay_discards_inflation() {
        let mut engine = engine();
        let mut scheduler = Scheduler::new();
        scheduler.start(0.0, &mut engine);
        scheduler.update(1000.0, &mut engine);
        assert_eq!(scheduler.pending_inflation(), 1);

        engine.reset_simulation(None);
        let bank_before = engine.state().total_bank_savings;

        let events = scheduler.update(1600.0, &mut engine);
        assert!(events.contains(&SchedulerEvent::StaleInflationDiscarded { session: 1 }));
        assert_eq!(engine.state().cumulative_inflation_factor, 1.0);
        assert_eq!(engine.state().total_bank_savings, bank_before);
    }

    #[test]
    fn test_restart_rearms_month_timer() {
        let mut engine = engine();
        let mut scheduler = Scheduler::new();
        scheduler.start(0.0, &mut engine);
        scheduler.update(1000.0, &mut engine);
        scheduler.update(1950.0, &mut engine);
        assert_eq!(engine.state().months_elapsed, 1);

        scheduler.restart(1950.0, &mut engine);
        assert_eq!(engine.state().months_elapsed, 0);

        // The old run's 2000ms deadline no longer applies
        let events = scheduler.update(2000.0, &mut engine);
        assert_eq!(count_ticks(&events), 0);
        assert_eq!(engine.state().months_elapsed, 0);

        assert_eq!(count_ticks(&scheduler.update(2949.0, &mut engine)), 0);
        let events = scheduler.update(2950.0, &mut engine);
        assert_eq!(count_ticks(&events), 1);
        assert_eq!(engine.state().months_elapsed, 1);
    }

    #[test]
    fn test_engine_reset_rearms_month_timer() {
        let mut engine = engine();
        let mut scheduler = Scheduler::new();
        scheduler.start(0.0, &mut engine);
        scheduler.update(1950.0, &mut engine);

        engine.restart();
        let events = scheduler.update(2000.0, &mut engine);
        assert_eq!(count_ticks(&events), 0);
        assert_eq!(engine.state().months_elapsed, 0);

        assert_eq!(count_ticks(&scheduler.update(2999.0, &mut engine)), 0);
        assert_eq!(count_ticks(&scheduler.update(3000.0, &mut engine)), 1);
    }

    #[test]
    fn test_pause_lets_inflight_inflation_complete() {
        let mut engine = engine();
        let mut scheduler = Scheduler::new();
        scheduler.start(0.0, &mut engine);
        scheduler.update(1000.0, &mut engine);

        engine.pause();
        let events = scheduler.update(5000.0, &mut engine);
        assert_eq!(count_ticks(&events), 0);
        assert_eq!(events.len(), 1);
        assert!(engine.state().cumulative_inflation_factor > 1.0);
        assert_eq!(engine.state().months_elapsed, 1);

        // Resuming re-arms the month timer from the resume time
        engine.resume();
        assert!(scheduler.update(5500.0, &mut engine).is_empty());
        let events = scheduler.update(6500.0, &mut engine);
        assert_eq!(count_ticks(&events), 1);
    }

    #[test]
    fn test_stops_at_horizon() {
        let mut engine = engine();
        let mut scheduler = Scheduler::new();
        scheduler.start(0.0, &mut engine);

        let end = SIMULATION_MONTHS as f64 * MONTH_INTERVAL_MS;
        let events = scheduler.update(end + 10_000.0, &mut engine);
        assert_eq!(count_ticks(&events), SIMULATION_MONTHS as usize);
        assert!(events.iter().any(|e| matches!(e, SchedulerEvent::Finished { .. })));
        assert!(engine.state().is_simulation_finished());
        assert_eq!(scheduler.pending_inflation(), 0);

        assert!(scheduler.update(end + 20_000.0, &mut engine).is_empty());
    }

    #[test]
    fn test_stop_halts_ticks() {
        let mut engine = engine();
        let mut scheduler = Scheduler::new();
        scheduler.start(0.0, &mut engine);
        scheduler.update(1000.0, &mut engine);
        scheduler.stop();
        let events = scheduler.update(10_000.0, &mut engine);
        assert_eq!(count_ticks(&events), 0);
        assert!(!scheduler.is_active());
    }
}
