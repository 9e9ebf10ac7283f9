//! Reminder entity (log of reminders sent for a grievance).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reminder")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub grievance_id: String,

    /// Mobile of the citizen who asked for the reminder
    pub mobile: String,

    pub sent_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::grievance::Entity",
        from = "Column::GrievanceId",
        to = "super::grievance::Column::Id",
        on_delete = "Cascade"
    )]
    Grievance,
}

impl Related<super::grievance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grievance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
