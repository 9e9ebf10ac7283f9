//! Feedback entity (citizen rating of a resolved grievance).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feedback")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// At most one feedback per grievance
    #[sea_orm(unique)]
    pub grievance_id: String,

    /// 1 to 5
    pub rating: i16,

    /// Citizen confirms the grievance was actually resolved
    pub resolved: bool,

    #[sea_orm(column_type = "Text", nullable)]
    pub comments: Option<String>,

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
