//! Timezone resolvers.
//!
//! A facility either pins one zone or maps the local time of day at which the
//! sweep starts onto a timezone group, so each tick of the scheduler picks up
//! the labs whose day has rolled over.

use chrono::{Local, NaiveTime};
use sweep_config::{ClockWindows, TimezoneSettings};
use sweep_types::{ConfigurationError, ProcessingTimezone};

use crate::stage::TimezoneResolver;

/// Source of the local wall-clock time.
pub trait Clock: Send + Sync {
    fn local_time(&self) -> NaiveTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn local_time(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveTime);

impl Clock for FixedClock {
    fn local_time(&self) -> NaiveTime {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct FixedTimezone(ProcessingTimezone);

impl FixedTimezone {
    #[must_use]
    pub fn new(zone: ProcessingTimezone) -> Self {
        Self(zone)
    }
}

impl TimezoneResolver for FixedTimezone {
    fn resolve(&self) -> Result<ProcessingTimezone, ConfigurationError> {
        Ok(self.0.clone())
    }
}

/// Fails every time; stands in when the facility configured no timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsetTimezone;

impl TimezoneResolver for UnsetTimezone {
    fn resolve(&self) -> Result<ProcessingTimezone, ConfigurationError> {
        Err(ConfigurationError::MissingTimezone)
    }
}

/// Picks the zone of the first window whose `until` is after the local time.
pub struct ClockWindowTimezone<C = SystemClock> {
    windows: ClockWindows,
    clock: C,
}

impl<C: Clock> ClockWindowTimezone<C> {
    pub fn with_clock(windows: ClockWindows, clock: C) -> Self {
        Self { windows, clock }
    }

    /// Zone in effect at `time`, or the fallback after the last window.
    pub fn zone_at(&self, time: NaiveTime) -> Result<ProcessingTimezone, ConfigurationError> {
        self.windows
            .windows()
            .iter()
            .find(|w| time < w.until)
            .map(|w| &w.zone)
            .or_else(|| self.windows.fallback())
            .cloned()
            .ok_or_else(|| ConfigurationError::UncoveredTime {
                time: time.format("%H:%M:%S").to_string(),
            })
    }
}

impl<C: Clock> TimezoneResolver for ClockWindowTimezone<C> {
    fn resolve(&self) -> Result<ProcessingTimezone, ConfigurationError> {
        let now = self.clock.local_time();
        let zone = self.zone_at(now)?;
        tracing::debug!(
            local_time = %now.format("%H:%M:%S"),
            timezone = %zone,
            "Matched timezone window"
        );
        Ok(zone)
    }
}

/// Build the resolver described by `settings`, reading time from `clock`.
pub fn resolver_from_settings<C>(
    settings: &TimezoneSettings,
    clock: C,
) -> Box<dyn TimezoneResolver>
where
    C: Clock + 'static,
{
    match settings {
        TimezoneSettings::Unset => Box::new(UnsetTimezone),
        TimezoneSettings::Fixed(zone) => Box::new(FixedTimezone::new(zone.clone())),
        TimezoneSettings::Windows(windows) => {
            Box::new(ClockWindowTimezone::with_clock(windows.clone(), clock))
        }
    }
}
