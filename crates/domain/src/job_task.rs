use crate::queue::Topic;
use crate::shared::entity::{Entity, ID};
use crate::shared::status::Status;
use crate::status_strings;
use serde::{Deserialize, Serialize};

/// A durable "run this once at `runs_at`" record. It is the persisted shadow of
/// an entry in the in-process scheduler and the only source of truth for it.
#[derive(Debug, Clone, PartialEq)]
pub struct JobTask {
    pub id: ID,
    pub name: String,
    pub job_type: JobType,
    /// Timestamp in millis to fire at
    pub runs_at: i64,
    pub handler_params: serde_json::Value,
    /// Echoed back by the consumer of the fired message to mark the job done
    pub payload_id: ID,
    pub payload: JobPayload,
    pub status: JobTaskStatus,
    pub created: i64,
    pub updated: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobType {
    OneTimeAt,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        "OneTimeJobStartDateTime"
    }
}

impl std::str::FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OneTimeJobStartDateTime" => Ok(Self::OneTimeAt),
            _ => Err(format!("Unknown job type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobTaskStatus {
    Pending,
    Done,
    Expired,
}

impl Status for JobTaskStatus {
    const ENTITY: &'static str = "job task";

    fn next(&self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Done, Self::Expired],
            Self::Done | Self::Expired => &[],
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Expired => "expired",
        }
    }
}

status_strings!(
    JobTaskStatus,
    [
        JobTaskStatus::Pending,
        JobTaskStatus::Done,
        JobTaskStatus::Expired,
    ]
);

/// The message published on `topic` when the job fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub payload_id: ID,
    /// The entity the consumer acts on, e.g. an `Event` or a `Booking`
    pub entity_id: ID,
    pub topic: Topic,
}

impl JobTask {
    pub fn new(name: String, runs_at: i64, topic: Topic, entity_id: ID, now: i64) -> Self {
        let payload_id = ID::default();
        Self {
            id: Default::default(),
            name,
            job_type: JobType::OneTimeAt,
            runs_at,
            handler_params: serde_json::json!({ "runsAt": runs_at, "topic": topic }),
            payload_id: payload_id.clone(),
            payload: JobPayload {
                payload_id,
                entity_id,
                topic,
            },
            status: JobTaskStatus::Pending,
            created: now,
            updated: now,
        }
    }

    pub fn topic(&self) -> Topic {
        self.payload.topic
    }
}

impl Entity for JobTask {
    fn id(&self) -> &ID {
        &self.id
    }
}
