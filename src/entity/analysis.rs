//! Analysis entity, at most one row per report.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "analyses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub report_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub executive_summary: String,
    #[sea_orm(column_type = "Json")]
    pub key_highlights: JsonValue,
    #[sea_orm(column_type = "Json")]
    pub strategic_initiatives: JsonValue,
    #[sea_orm(column_type = "Text", nullable)]
    pub market_outlook: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub risk_factors: JsonValue,
    #[sea_orm(column_type = "Text", nullable)]
    pub competitive_position: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub investment_thesis: Option<String>,
    pub sentiment_score: f64,
    pub sentiment_label: String,
    pub confidence: f64,
    pub model: String,
    pub processing_ms: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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
