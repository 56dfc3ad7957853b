use crate::{
    db::DbPool,
    entities::{department, hospital},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Maintains hospitals and their departments. Only the CLI and test setup
/// write through here; the HTTP surface reads them during bulk create.
#[derive(Clone)]
pub struct HospitalService {
    db_pool: Arc<DbPool>,
}

impl HospitalService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Ensures `name` exists with at least the given departments.
    /// Safe to run repeatedly.
    #[instrument(skip(self))]
    pub async fn seed(
        &self,
        name: &str,
        departments: &[&str],
    ) -> Result<hospital::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::BadRequest("Hospital name is required".to_string()));
        }

        let now = Utc::now();
        let hospital = match hospital::Entity::find()
            .filter(hospital::Column::HospitalName.eq(name))
            .one(db)
            .await?
        {
            Some(existing) => existing,
            None => {
                let created = hospital::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    hospital_name: Set(name.to_string()),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(db)
                .await?;
                info!(hospital_id = %created.id, "Hospital created");
                created
            }
        };

        for department_name in departments.iter().map(|d| d.trim()).filter(|d| !d.is_empty()) {
            let exists = department::Entity::find()
                .filter(department::Column::Department.eq(department_name))
                .filter(department::Column::HospitalId.eq(hospital.id))
                .one(db)
                .await?
                .is_some();
            if exists {
                continue;
            }

            department::ActiveModel {
                id: Set(Uuid::new_v4()),
                department: Set(department_name.to_string()),
                hospital_id: Set(hospital.id),
                created_at: Set(now),
            }
            .insert(db)
            .await?;
            info!(hospital_id = %hospital.id, department = department_name, "Department created");
        }

        Ok(hospital)
    }

    pub async fn departments(&self, hospital_id: Uuid) -> Result<Vec<department::Model>, ServiceError> {
        let departments = department::Entity::find()
            .filter(department::Column::HospitalId.eq(hospital_id))
            .order_by_asc(department::Column::Department)
            .all(self.db_pool.as_ref())
            .await?;
        Ok(departments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeding_twice_does_not_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("seed.db").display());
        let db = Arc::new(sea_orm::Database::connect(&url).await.unwrap());
        crate::db::run_migrations(&db).await.unwrap();

        let service = HospitalService::new(db);
        let first = service.seed("General", &["Pharmacy"]).await.unwrap();
        let second = service
            .seed("General", &["Pharmacy", "Surgery", " "])
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        let names: Vec<String> = service
            .departments(first.id)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.department)
            .collect();
        assert_eq!(names, vec!["Pharmacy", "Surgery"]);
    }
}
