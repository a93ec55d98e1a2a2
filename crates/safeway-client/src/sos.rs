//! SOS trigger: press-and-hold, countdown, then an SMS to every contact.
//!
//! The trigger is a pure state machine driven by elapsed time; the caller
//! owns the timer and feeds it to [`SosTrigger::advance`].

use std::time::Duration;

use safeway_core::Coordinate;
use safeway_geocode::GeocodeClient;
use thiserror::Error;

use crate::platform::Platform;
use crate::types::EmergencyContact;

const MAP_LINK_BASE: &str = "https://map.kakao.com/link/map/SOS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SosError {
    #[error("register emergency contacts first")]
    NoContacts,

    #[error("could not open the SMS composer: {0}")]
    Composer(String),
}

/// Device SMS capability. Receives the deep link once per alert.
pub trait SmsComposer {
    /// # Errors
    ///
    /// Returns [`SosError::Composer`] when the device refuses the link.
    fn compose(&self, uri: &str) -> Result<(), SosError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SosConfig {
    pub hold_duration: Duration,
    pub countdown: Duration,
}

impl Default for SosConfig {
    fn default() -> Self {
        Self {
            hold_duration: Duration::from_secs(3),
            countdown: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SosState {
    Idle,
    Holding { held: Duration },
    Countdown { remaining: Duration },
    Sent,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SosAction {
    ComposeSms(String),
}

#[derive(Debug)]
pub struct SosTrigger {
    config: SosConfig,
    platform: Platform,
    state: SosState,
    pending_uri: Option<String>,
}

impl SosTrigger {
    #[must_use]
    pub fn new(config: SosConfig, platform: Platform) -> Self {
        Self {
            config,
            platform,
            state: SosState::Idle,
            pending_uri: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> SosState {
        self.state
    }

    /// Hold progress in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        match self.state {
            SosState::Holding { held } => {
                let hold = self.config.hold_duration.as_secs_f64();
                if hold <= 0.0 {
                    1.0
                } else {
                    (held.as_secs_f64() / hold).min(1.0)
                }
            }
            SosState::Countdown { .. } | SosState::Sent => 1.0,
            SosState::Idle | SosState::Cancelled => 0.0,
        }
    }

    /// Starts a hold. The message is composed now, from the fix known at
    /// press time.
    ///
    /// # Errors
    ///
    /// Returns [`SosError::NoContacts`] for an empty contact list; nothing
    /// is composed and the state is unchanged.
    pub fn press(
        &mut self,
        contacts: &[EmergencyContact],
        last_fix: Option<Coordinate>,
    ) -> Result<(), SosError> {
        if contacts.is_empty() {
            tracing::warn!("sos pressed with no emergency contacts");
            return Err(SosError::NoContacts);
        }
        if matches!(
            self.state,
            SosState::Holding { .. } | SosState::Countdown { .. }
        ) {
            return Ok(());
        }

        let numbers: Vec<&str> = contacts.iter().map(|c| c.phone.as_str()).collect();
        self.pending_uri = Some(self.platform.sms_uri(&numbers, &sos_message(last_fix)));
        self.state = SosState::Holding {
            held: Duration::ZERO,
        };
        Ok(())
    }

    /// Moves the clock forward by `dt`.
    ///
    /// Returns [`SosAction::ComposeSms`] exactly once, when the countdown
    /// reaches zero.
    pub fn advance(&mut self, dt: Duration) -> Option<SosAction> {
        match self.state {
            SosState::Holding { held } => {
                let held = held + dt;
                let Some(overflow) = held.checked_sub(self.config.hold_duration) else {
                    self.state = SosState::Holding { held };
                    return None;
                };
                tracing::info!("sos hold complete; counting down");
                // Time past the hold threshold already counts against the countdown.
                let remaining = self.config.countdown.saturating_sub(overflow);
                if remaining.is_zero() {
                    return self.send();
                }
                self.state = SosState::Countdown { remaining };
                None
            }
            SosState::Countdown { remaining } => {
                let remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    self.send()
                } else {
                    self.state = SosState::Countdown { remaining };
                    None
                }
            }
            SosState::Idle | SosState::Sent | SosState::Cancelled => None,
        }
    }

    /// Lifting the finger before the hold completes resets progress.
    pub fn release(&mut self) {
        if matches!(self.state, SosState::Holding { .. }) {
            self.state = SosState::Idle;
            self.pending_uri = None;
        }
    }

    /// Aborts during the countdown.
    pub fn cancel(&mut self) {
        if matches!(self.state, SosState::Countdown { .. }) {
            tracing::info!("sos cancelled during countdown");
            self.state = SosState::Cancelled;
            self.pending_uri = None;
        }
    }

    /// [`advance`](Self::advance), handing any resulting link to `composer`.
    ///
    /// # Errors
    ///
    /// Propagates the composer's error.
    pub fn tick<C: SmsComposer + ?Sized>(
        &mut self,
        dt: Duration,
        composer: &C,
    ) -> Result<SosState, SosError> {
        if let Some(SosAction::ComposeSms(uri)) = self.advance(dt) {
            composer.compose(&uri)?;
        }
        Ok(self.state)
    }

    fn send(&mut self) -> Option<SosAction> {
        self.state = SosState::Sent;
        tracing::info!("sos countdown finished; composing sms");
        self.pending_uri.take().map(SosAction::ComposeSms)
    }
}

/// `https://map.kakao.com/link/map/SOS,{lat},{lng}`
#[must_use]
pub fn map_link(fix: Coordinate) -> String {
    format!("{MAP_LINK_BASE},{},{}", fix.lat, fix.lng)
}

#[must_use]
pub fn sos_message(last_fix: Option<Coordinate>) -> String {
    let location = last_fix.map_or_else(|| "location unavailable".to_owned(), map_link);
    format!("[SafeWay SOS] I need help. My current location: {location}")
}

/// Human-readable label for the SOS screen's "current location" line.
///
/// Falls back to the raw coordinate when reverse geocoding fails or has no
/// answer; the SMS itself always carries the map link.
pub async fn location_label(geocoder: &GeocodeClient, fix: Option<Coordinate>) -> String {
    let Some(fix) = fix else {
        return "location unavailable".to_owned();
    };
    match geocoder.reverse_geocode(fix).await {
        Ok(Some(label)) => label,
        Ok(None) => fix.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "reverse geocode failed; showing raw coordinate");
            fix.to_string()
        }
    }
}
