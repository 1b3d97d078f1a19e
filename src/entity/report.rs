//! Report entity for ingested documents.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_name: String,
    pub report_type: String,
    pub title: String,
    #[sea_orm(unique)]
    pub source_url: String,
    pub download_url: Option<String>,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub fiscal_quarter: Option<String>,
    pub fiscal_year: Option<i32>,
    pub published_date: Option<DateTimeUtc>,
    pub region: Option<String>,
    pub sector: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub extracted_text: Option<String>,
    pub page_count: Option<i32>,
    pub language: Option<String>,
    pub required_ocr: bool,
    #[sea_orm(column_type = "Json", nullable)]
    pub tags: Option<JsonValue>,
    #[sea_orm(column_type = "Json", nullable)]
    pub metadata: Option<JsonValue>,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub processed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::metric::Entity")]
    Metrics,
    #[sea_orm(has_many = "super::alert::Entity")]
    Alerts,
    #[sea_orm(has_one = "super::analysis::Entity")]
    Analysis,
}

impl Related<super::metric::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Metrics.def()
    }
}

impl Related<super::alert::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Alerts.def()
    }
}

impl Related<super::analysis::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Analysis.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
