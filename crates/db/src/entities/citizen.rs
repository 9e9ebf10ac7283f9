//! Citizen entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "citizen")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// 10-digit mobile number, verified by OTP
    #[sea_orm(unique)]
    pub mobile: String,

    #[sea_orm(nullable)]
    pub name: Option<String>,

    #[sea_orm(nullable)]
    pub email: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::grievance::Entity")]
    Grievance,
}

impl Related<super::grievance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grievance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
