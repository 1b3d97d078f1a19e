//! Alert entity for rule-triggered notifications.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "alerts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub report_id: Uuid,
    pub alert_type: String,
    pub severity: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub trigger_metric: Option<String>,
    #[sea_orm(column_type = "Json", nullable)]
    pub matched_keywords: Option<JsonValue>,
    pub threshold: Option<f64>,
    pub actual_value: Option<f64>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::report::Entity",
        from = "Column::ReportId",
        to = "super::report::Column::Id",
        on_delete = "Cascade"
    )]
    Report,
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Report.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
