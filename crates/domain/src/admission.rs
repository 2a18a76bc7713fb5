use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};

/// The single, terminal redemption of a `Reservation` at the venue.
/// At most one exists per `Reservation`.
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    pub id: ID,
    pub reservation_id: ID,
    /// The user who scanned the code
    pub by: ID,
    pub kind: AdmissionKind,
    pub status: AdmissionStatus,
    pub created: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionKind {
    Single,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionStatus {
    Completed,
}

impl AdmissionKind {
    pub fn as_str(&self) -> &'static str {
        "single"
    }
}

impl AdmissionStatus {
    pub fn as_str(&self) -> &'static str {
        "completed"
    }
}

impl Admission {
    pub fn new(reservation_id: ID, by: ID, now: i64) -> Self {
        Self {
            id: Default::default(),
            reservation_id,
            by,
            kind: AdmissionKind::Single,
            status: AdmissionStatus::Completed,
            created: now,
        }
    }
}

impl Entity for Admission {
    fn id(&self) -> &ID {
        &self.id
    }
}

/// Plaintext of the encrypted code printed on a ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionCode {
    pub ticket_id: ID,
    pub reservation_id: ID,
}
