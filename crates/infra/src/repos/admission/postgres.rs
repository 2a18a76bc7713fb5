use super::IAdmissionRepo;
use boxoffice_domain::{Admission, AdmissionKind, AdmissionStatus, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresAdmissionRepo {
    pool: PgPool,
}

impl PostgresAdmissionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AdmissionRaw {
    admission_uid: Uuid,
    reservation_uid: Uuid,
    admitted_by: Uuid,
    created: i64,
}

impl From<AdmissionRaw> for Admission {
    fn from(a: AdmissionRaw) -> Self {
        Self {
            id: a.admission_uid.into(),
            reservation_id: a.reservation_uid.into(),
            by: a.admitted_by.into(),
            kind: AdmissionKind::Single,
            status: AdmissionStatus::Completed,
            created: a.created,
        }
    }
}

#[async_trait::async_trait]
impl IAdmissionRepo for PostgresAdmissionRepo {
    async fn find_by_reservation(&self, reservation_id: &ID) -> Option<Admission> {
        match sqlx::query_as::<_, AdmissionRaw>(
            r#"
            SELECT admission_uid, reservation_uid, admitted_by, created FROM admissions AS a
            WHERE a.reservation_uid = $1
            "#,
        )
        .bind(reservation_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        {
            Ok(admission) => admission.map(Admission::from),
            Err(e) => {
                error!("Unable to query admission of {}: {:?}", reservation_id, e);
                None
            }
        }
    }
}
