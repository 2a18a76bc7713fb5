use boxoffice_domain::{Admission, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionDTO {
    pub id: ID,
    pub reservation_id: ID,
    pub by: ID,
    pub created: i64,
}

impl AdmissionDTO {
    pub fn new(admission: Admission) -> Self {
        Self {
            id: admission.id,
            reservation_id: admission.reservation_id,
            by: admission.by,
            created: admission.created,
        }
    }
}
