use crate::{
    auth::SessionIdentity,
    db::DbPool,
    dto::inventory::{InventoryLine, InventoryRow, InventoryUpdate, HOSPITAL_NOT_FOUND, RECORD_NOT_FOUND},
    entities::{department, hospital, item, medical_inventory},
    errors::ServiceError,
};
use chrono::Utc;
use metrics::counter;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionError, TransactionTrait,
};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Rows per INSERT. Nine bound columns per row stays under the smallest bind
/// parameter limit we run against (999 on older SQLite builds).
const INSERT_CHUNK_SIZE: usize = 100;

/// Hospital-scoped inventory operations.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Records every line for the caller's hospital and returns how many
    /// records were inserted.
    ///
    /// Runs in a single transaction: a line naming a department of another
    /// hospital rolls back catalog upserts made for earlier lines.
    #[instrument(skip(self, identity, lines), fields(hospital = %identity.hospital_name, lines = lines.len()))]
    pub async fn create_bulk(
        &self,
        identity: &SessionIdentity,
        lines: Vec<InventoryLine>,
    ) -> Result<u64, ServiceError> {
        if lines.is_empty() {
            return Ok(0);
        }

        let hospital_name = identity.hospital_name.clone();
        let count = self
            .db_pool
            .transaction::<_, u64, ServiceError>(move |txn| {
                Box::pin(async move {
                    let hospital = hospital::Entity::find()
                        .filter(hospital::Column::HospitalName.eq(hospital_name.as_str()))
                        .one(txn)
                        .await?
                        .ok_or_else(|| ServiceError::NotFound(HOSPITAL_NOT_FOUND.to_string()))?;

                    let now = Utc::now();
                    let mut records = Vec::with_capacity(lines.len());
                    let mut department_ids: HashMap<&str, Uuid> = HashMap::new();
                    for line in &lines {
                        let department_id = match department_ids.get(line.department.as_str()) {
                            Some(id) => *id,
                            None => {
                                let department = department::Entity::find()
                                    .filter(department::Column::Department.eq(line.department.as_str()))
                                    .filter(department::Column::HospitalId.eq(hospital.id))
                                    .one(txn)
                                    .await?
                                    .ok_or_else(|| {
                                        ServiceError::BadRequest(format!(
                                            "Invalid department for hospital {}",
                                            hospital.hospital_name
                                        ))
                                    })?;
                                department_ids.insert(line.department.as_str(), department.id);
                                department.id
                            }
                        };

                        let catalog_item = upsert_item(txn, line).await?;

                        records.push(medical_inventory::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            department_id: Set(department_id),
                            hospital_id: Set(hospital.id),
                            item_id: Set(catalog_item.item_id),
                            batch_number: Set(line.batch_number.clone()),
                            expiry_date: Set(line.expiry_date),
                            quantity: Set(line.quantity),
                            created_at: Set(now),
                            updated_at: Set(now),
                        });
                    }

                    let mut inserted = 0;
                    for chunk in records.chunks(INSERT_CHUNK_SIZE) {
                        inserted += medical_inventory::Entity::insert_many(chunk.to_vec())
                            .exec_without_returning(txn)
                            .await?;
                    }
                    Ok(inserted)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(count, "Inventory records created");
        counter!("hospital_inventory.records.created", count);
        Ok(count)
    }

    /// All records of the caller's hospital, soonest expiry first.
    #[instrument(skip(self, identity), fields(hospital_id = %identity.user_id))]
    pub async fn list(&self, identity: &SessionIdentity) -> Result<Vec<InventoryRow>, ServiceError> {
        let rows = medical_inventory::Entity::find()
            .select_only()
            .column(medical_inventory::Column::Id)
            .column(medical_inventory::Column::DepartmentId)
            .column(medical_inventory::Column::HospitalId)
            .column(medical_inventory::Column::ItemId)
            .column(item::Column::ItemName)
            .column(item::Column::Description)
            .column(medical_inventory::Column::BatchNumber)
            .column(medical_inventory::Column::ExpiryDate)
            .column(medical_inventory::Column::Quantity)
            .column(item::Column::UnitPrice)
            .column(item::Column::Supplier)
            .column(item::Column::Category)
            .column_as(department::Column::Department, "department")
            .inner_join(department::Entity)
            .inner_join(item::Entity)
            .filter(medical_inventory::Column::HospitalId.eq(identity.user_id))
            .order_by_asc(medical_inventory::Column::ExpiryDate)
            .into_model::<InventoryRow>()
            .all(self.db_pool.as_ref())
            .await?;

        debug!(rows = rows.len(), "Inventory listed");
        Ok(rows)
    }

    /// Applies the supplied fields to a record owned by the caller.
    #[instrument(skip(self, identity), fields(hospital_id = %identity.user_id))]
    pub async fn update(
        &self,
        identity: &SessionIdentity,
        update: InventoryUpdate,
    ) -> Result<medical_inventory::Model, ServiceError> {
        let record = medical_inventory::Entity::find_by_id(update.id)
            .filter(medical_inventory::Column::HospitalId.eq(identity.user_id))
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(RECORD_NOT_FOUND.to_string()))?;

        let mut active: medical_inventory::ActiveModel = record.into();
        if let Some(quantity) = update.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(expiry_date) = update.expiry_date {
            active.expiry_date = Set(expiry_date);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(self.db_pool.as_ref()).await?;
        info!(record_id = %updated.id, "Inventory record updated");
        Ok(updated)
    }

    /// Deletes a record owned by the caller.
    #[instrument(skip(self, identity), fields(hospital_id = %identity.user_id))]
    pub async fn delete(&self, identity: &SessionIdentity, id: Uuid) -> Result<(), ServiceError> {
        let result = medical_inventory::Entity::delete_many()
            .filter(medical_inventory::Column::Id.eq(id))
            .filter(medical_inventory::Column::HospitalId.eq(identity.user_id))
            .exec(self.db_pool.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(RECORD_NOT_FOUND.to_string()));
        }

        info!(record_id = %id, "Inventory record deleted");
        counter!("hospital_inventory.records.deleted", 1);
        Ok(())
    }
}

/// Creates the catalog item for `(item_name, supplier)` or refreshes its
/// price and category in one statement, then reads the row back.
async fn upsert_item<C>(conn: &C, line: &InventoryLine) -> Result<item::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let mut refreshed = vec![
        item::Column::UnitPrice,
        item::Column::Category,
        item::Column::UpdatedAt,
    ];
    if line.description.is_some() {
        refreshed.push(item::Column::Description);
    }

    let candidate = item::ActiveModel {
        item_id: Set(Uuid::new_v4()),
        item_name: Set(line.item_name.clone()),
        supplier: Set(line.supplier.clone()),
        unit_price: Set(line.unit_price),
        category: Set(line.category.clone()),
        description: Set(line.description.clone()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    item::Entity::insert(candidate)
        .on_conflict(
            OnConflict::columns([item::Column::ItemName, item::Column::Supplier])
                .update_columns(refreshed)
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    item::Entity::find()
        .filter(item::Column::ItemName.eq(line.item_name.as_str()))
        .filter(item::Column::Supplier.eq(line.supplier.as_str()))
        .one(conn)
        .await?
        .ok_or_else(|| {
            ServiceError::InternalError(format!(
                "catalog item {} / {} missing after upsert",
                line.item_name, line.supplier
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::hospitals::HospitalService;
    use assert_matches::assert_matches;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use sea_orm::PaginatorTrait;

    struct Fixture {
        _dir: tempfile::TempDir,
        db: Arc<DbPool>,
        service: InventoryService,
        general: SessionIdentity,
        riverside: SessionIdentity,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("inventory.db").display());
        let db = Arc::new(sea_orm::Database::connect(&url).await.unwrap());
        crate::db::run_migrations(&db).await.unwrap();

        let hospitals = HospitalService::new(db.clone());
        let general = hospitals
            .seed("General", &["Pharmacy", "Surgery"])
            .await
            .unwrap();
        let riverside = hospitals.seed("Riverside", &["Oncology"]).await.unwrap();

        Fixture {
            _dir: dir,
            service: InventoryService::new(db.clone()),
            db,
            general: SessionIdentity {
                user_id: general.id,
                hospital_name: general.hospital_name,
            },
            riverside: SessionIdentity {
                user_id: riverside.id,
                hospital_name: riverside.hospital_name,
            },
        }
    }

    fn line(department: &str, item_name: &str, price: rust_decimal::Decimal) -> InventoryLine {
        InventoryLine {
            department: department.into(),
            item_name: item_name.into(),
            batch_number: "B-1".into(),
            expiry_date: Utc::now() + Duration::days(90),
            quantity: 40,
            unit_price: price,
            supplier: "Baxter".into(),
            category: "Fluids".into(),
            description: None,
        }
    }

    #[tokio::test]
    async fn upsert_refreshes_existing_catalog_price() {
        let f = fixture().await;
        f.service
            .create_bulk(&f.general, vec![line("Pharmacy", "Saline", dec!(2.00))])
            .await
            .unwrap();
        f.service
            .create_bulk(&f.general, vec![line("Surgery", "Saline", dec!(2.50))])
            .await
            .unwrap();

        let items = item::Entity::find().all(f.db.as_ref()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price, dec!(2.50));

        let rows = f.service.list(&f.general).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.item_id == items[0].item_id));
    }

    #[tokio::test]
    async fn upsert_keeps_item_id_and_only_overwrites_supplied_description() {
        let f = fixture().await;
        let mut first = line("Pharmacy", "Saline", dec!(2.00));
        first.description = Some("0.9% 500ml".into());
        let created = upsert_item(f.db.as_ref(), &first).await.unwrap();

        let second = line("Surgery", "Saline", dec!(2.75));
        let refreshed = upsert_item(f.db.as_ref(), &second).await.unwrap();

        assert_eq!(refreshed.item_id, created.item_id);
        assert_eq!(refreshed.unit_price, dec!(2.75));
        assert_eq!(refreshed.description.as_deref(), Some("0.9% 500ml"));
        assert_eq!(item::Entity::find().count(f.db.as_ref()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn large_batches_are_inserted_in_chunks() {
        let f = fixture().await;
        let lines: Vec<_> = (0..INSERT_CHUNK_SIZE * 2 + 7)
            .map(|_| line("Pharmacy", "Gauze", dec!(0.30)))
            .collect();
        let expected = lines.len() as u64;

        let created = f.service.create_bulk(&f.general, lines).await.unwrap();

        assert_eq!(created, expected);
        assert_eq!(
            medical_inventory::Entity::find().count(f.db.as_ref()).await.unwrap(),
            expected
        );
    }

    #[tokio::test]
    async fn failing_line_rolls_back_earlier_catalog_upserts() {
        let f = fixture().await;
        let err = f
            .service
            .create_bulk(
                &f.general,
                vec![
                    line("Pharmacy", "Gauze", dec!(0.30)),
                    line("Oncology", "Syringe", dec!(0.10)),
                ],
            )
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::BadRequest(ref msg) if msg == "Invalid department for hospital General");
        assert_eq!(item::Entity::find().count(f.db.as_ref()).await.unwrap(), 0);
        assert_eq!(
            medical_inventory::Entity::find().count(f.db.as_ref()).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn unknown_hospital_is_not_found() {
        let f = fixture().await;
        let stranger = SessionIdentity {
            user_id: Uuid::new_v4(),
            hospital_name: "Nowhere".into(),
        };
        let err = f
            .service
            .create_bulk(&stranger, vec![line("Pharmacy", "Gauze", dec!(0.30))])
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::NotFound(ref msg) if msg == HOSPITAL_NOT_FOUND);
    }

    #[tokio::test]
    async fn update_and_delete_are_scoped_to_the_caller() {
        let f = fixture().await;
        f.service
            .create_bulk(&f.general, vec![line("Pharmacy", "Gauze", dec!(0.30))])
            .await
            .unwrap();
        let record_id = f.service.list(&f.general).await.unwrap()[0].id;

        let foreign_update = f
            .service
            .update(
                &f.riverside,
                InventoryUpdate {
                    id: record_id,
                    quantity: Some(1),
                    expiry_date: None,
                },
            )
            .await
            .unwrap_err();
        assert_matches!(foreign_update, ServiceError::NotFound(_));

        let foreign_delete = f.service.delete(&f.riverside, record_id).await.unwrap_err();
        assert_matches!(foreign_delete, ServiceError::NotFound(ref msg) if msg == RECORD_NOT_FOUND);

        let updated = f
            .service
            .update(
                &f.general,
                InventoryUpdate {
                    id: record_id,
                    quantity: Some(7),
                    expiry_date: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.quantity, 7);
        assert_eq!(updated.batch_number, "B-1");

        f.service.delete(&f.general, record_id).await.unwrap();
        assert!(f.service.list(&f.general).await.unwrap().is_empty());
    }
}
