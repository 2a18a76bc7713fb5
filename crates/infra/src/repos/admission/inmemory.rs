use super::IAdmissionRepo;
use crate::repos::shared::inmemory_repo::*;
use boxoffice_domain::{Admission, ID};
use std::sync::Mutex;

pub struct InMemoryAdmissionRepo {
    pub(crate) admissions: Mutex<Vec<Admission>>,
}

impl InMemoryAdmissionRepo {
    pub fn new() -> Self {
        Self {
            admissions: Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl IAdmissionRepo for InMemoryAdmissionRepo {
    async fn find_by_reservation(&self, reservation_id: &ID) -> Option<Admission> {
        find_by(&self.admissions, |a| a.reservation_id == *reservation_id)
            .into_iter()
            .next()
    }
}
