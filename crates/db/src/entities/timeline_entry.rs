//! Timeline entry entity (append-only audit log of a grievance).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::grievance::GrievanceState;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "timeline_entry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub grievance_id: String,

    /// Position in the grievance's timeline, starting at 1
    pub sequence: i32,

    /// Human-readable action, e.g. "Submitted" or "Escalated"
    pub action: String,

    /// State the grievance entered with this entry
    pub status: GrievanceState,

    #[sea_orm(column_type = "Text", nullable)]
    pub remarks: Option<String>,

    /// NULL for entries written by the system or the citizen
    #[sea_orm(nullable)]
    pub officer_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,
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
