use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A hospital department. Names are only unique within one hospital.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "departments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub department: String,
    pub hospital_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::hospital::Entity",
        from = "Column::HospitalId",
        to = "super::hospital::Column::Id",
        on_delete = "Cascade"
    )]
    Hospital,
    #[sea_orm(has_many = "super::medical_inventory::Entity")]
    MedicalInventory,
}

impl Related<super::hospital::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Hospital.def()
    }
}

impl Related<super::medical_inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MedicalInventory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
