use crate::shared::entity::{Entity, ID};
use crate::shared::status::{InvalidTransition, Status};
use crate::status_strings;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An `Event` is one ticketed occasion published by an organization
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: ID,
    /// The organization that owns the `Event`
    pub org_id: ID,
    pub name: String,
    /// When the `Event` starts, in millis
    pub date_time: i64,
    /// When ticket sales open for an `Event` in `Scheduled` mode
    pub opens_at: Option<i64>,
    /// When ticket sales close and the admission window opens
    pub deadline: Option<i64>,
    /// IANA timezone the organizer entered the dates in
    pub timezone: String,
    pub status: EventStatus,
    pub mode: EventMode,
    pub created: i64,
    pub updated: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventStatus {
    Draft,
    /// Waitlist is open, sales are not
    Notify,
    /// Tickets are on sale
    Open,
    /// Check-in window at the venue
    Admission,
    Completed,
    Canceled,
    Expired,
    /// Soft deleted
    Archived,
}

impl Status for EventStatus {
    const ENTITY: &'static str = "event";

    fn next(&self) -> &'static [Self] {
        use EventStatus::*;
        match self {
            Draft => &[Notify, Open, Canceled, Archived],
            Notify => &[Open, Canceled, Expired],
            Open => &[Admission, Canceled, Expired],
            Admission => &[Completed, Canceled, Expired],
            Completed | Canceled | Expired => &[Archived],
            Archived => &[],
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Notify => "notify",
            Self::Open => "open",
            Self::Admission => "admission",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::Expired => "expired",
            Self::Archived => "archived",
        }
    }
}

status_strings!(
    EventStatus,
    [
        EventStatus::Draft,
        EventStatus::Notify,
        EventStatus::Open,
        EventStatus::Admission,
        EventStatus::Completed,
        EventStatus::Canceled,
        EventStatus::Expired,
        EventStatus::Archived,
    ]
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventMode {
    Default,
    Manual,
    Scheduled,
}

impl EventMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Manual => "manual",
            Self::Scheduled => "scheduled",
        }
    }
}

impl std::str::FromStr for EventMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "manual" => Ok(Self::Manual),
            "scheduled" => Ok(Self::Scheduled),
            _ => Err(format!("Unknown event mode: {}", s)),
        }
    }
}

/// What caused an `Event` status change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionTrigger {
    /// An organizer changed the status by hand
    Manual,
    /// A fired `JobTask`
    Job,
}

impl TransitionTrigger {
    pub fn resulting_mode(&self) -> EventMode {
        match self {
            Self::Manual => EventMode::Manual,
            Self::Job => EventMode::Default,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ScheduleError {
    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),
    #[error("The event must start in the future")]
    StartsInPast,
    #[error("The deadline must be before the event starts")]
    DeadlineAfterStart,
    #[error("Scheduled events need both opensAt and deadline")]
    MissingScheduleDates,
    #[error("opensAt must be in the future and before the deadline")]
    InvalidOpensAt,
}

impl Event {
    pub fn new(org_id: ID, name: String, date_time: i64, timezone: String, now: i64) -> Self {
        Self {
            id: Default::default(),
            org_id,
            name,
            date_time,
            opens_at: None,
            deadline: None,
            timezone,
            status: EventStatus::Draft,
            mode: EventMode::Default,
            created: now,
            updated: now,
        }
    }

    /// Checks `opensAt < deadline < dateTime`. Only done at creation.
    pub fn validate_schedule(&self, now: i64) -> Result<(), ScheduleError> {
        if self.timezone.parse::<Tz>().is_err() {
            return Err(ScheduleError::InvalidTimezone(self.timezone.clone()));
        }
        if self.date_time <= now {
            return Err(ScheduleError::StartsInPast);
        }
        if let Some(deadline) = self.deadline {
            if deadline >= self.date_time {
                return Err(ScheduleError::DeadlineAfterStart);
            }
        }
        if self.mode == EventMode::Scheduled {
            let (opens_at, deadline) = match (self.opens_at, self.deadline) {
                (Some(opens_at), Some(deadline)) => (opens_at, deadline),
                _ => return Err(ScheduleError::MissingScheduleDates),
            };
            if opens_at <= now || opens_at >= deadline {
                return Err(ScheduleError::InvalidOpensAt);
            }
        }
        Ok(())
    }

    /// Moves the `Event` to `to` if the transition table allows it and
    /// returns the previous status
    pub fn transition(
        &mut self,
        to: EventStatus,
        trigger: TransitionTrigger,
        now: i64,
    ) -> Result<EventStatus, InvalidTransition> {
        let from = self.status;
        self.status = from.transition(to)?;
        self.mode = trigger.resulting_mode();
        self.updated = now;
        Ok(from)
    }
}

impl Entity for Event {
    fn id(&self) -> &ID {
        &self.id
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn event(now: i64) -> Event {
        Event::new(
            ID::default(),
            "Concert".into(),
            now + 10_000,
            "Europe/Oslo".into(),
            now,
        )
    }

    #[test]
    fn follows_the_transition_table() {
        use EventStatus::*;
        assert!(Draft.can_transition_to(Notify));
        assert!(Draft.can_transition_to(Open));
        assert!(Notify.can_transition_to(Open));
        assert!(Open.can_transition_to(Admission));
        assert!(Admission.can_transition_to(Completed));
        assert!(Completed.can_transition_to(Archived));

        assert!(!Draft.can_transition_to(Admission));
        assert!(!Notify.can_transition_to(Admission));
        assert!(!Open.can_transition_to(Notify));
        assert!(!Completed.can_transition_to(Open));
        assert!(!Open.can_transition_to(Open));
        assert!(Archived.is_terminal());
    }

    #[test]
    fn transition_sets_mode_from_trigger() {
        let mut e = event(0);
        let prev = e
            .transition(EventStatus::Open, TransitionTrigger::Manual, 5)
            .unwrap();
        assert_eq!(prev, EventStatus::Draft);
        assert_eq!(e.mode, EventMode::Manual);
        assert_eq!(e.updated, 5);

        e.transition(EventStatus::Admission, TransitionTrigger::Job, 6)
            .unwrap();
        assert_eq!(e.mode, EventMode::Default);

        let err = e
            .transition(EventStatus::Open, TransitionTrigger::Job, 7)
            .unwrap_err();
        assert_eq!(err.from, "admission");
        assert_eq!(err.to, "open");
        assert_eq!(e.status, EventStatus::Admission);
    }

    #[test]
    fn validates_schedule() {
        let now = 1000;
        let mut e = event(now);
        assert!(e.validate_schedule(now).is_ok());

        e.mode = EventMode::Scheduled;
        assert_eq!(
            e.validate_schedule(now),
            Err(ScheduleError::MissingScheduleDates)
        );

        e.opens_at = Some(now + 100);
        e.deadline = Some(now + 200);
        assert!(e.validate_schedule(now).is_ok());

        e.opens_at = Some(now + 300);
        assert_eq!(e.validate_schedule(now), Err(ScheduleError::InvalidOpensAt));

        e.opens_at = Some(now + 100);
        e.deadline = Some(e.date_time + 1);
        assert_eq!(
            e.validate_schedule(now),
            Err(ScheduleError::DeadlineAfterStart)
        );

        let mut e = event(now);
        e.timezone = "Mars/Olympus".into();
        assert!(matches!(
            e.validate_schedule(now),
            Err(ScheduleError::InvalidTimezone(_))
        ));

        let e = event(now);
        assert_eq!(
            e.validate_schedule(e.date_time),
            Err(ScheduleError::StartsInPast)
        );
    }

    #[test]
    fn status_strings_roundtrip_through_serde() {
        let json = serde_json::to_string(&EventStatus::Admission).unwrap();
        assert_eq!(json, "\"admission\"");
        assert!(serde_json::from_str::<EventStatus>("\"closed\"").is_err());
    }
}
