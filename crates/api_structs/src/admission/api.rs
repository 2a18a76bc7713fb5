use crate::dtos::AdmissionDTO;
use boxoffice_domain::{Admission, ID};
use serde::{Deserialize, Serialize};

pub mod get_admission_code {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub reservation_id: ID,
    }

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        /// Encrypted code to print as a QR code
        pub code: String,
    }
}

pub mod admit {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub code: String,
    }

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub admission: AdmissionDTO,
    }

    impl APIResponse {
        pub fn new(admission: Admission) -> Self {
            Self {
                admission: AdmissionDTO::new(admission),
            }
        }
    }
}
