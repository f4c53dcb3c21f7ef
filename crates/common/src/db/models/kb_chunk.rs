//! Knowledge-base chunk entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "kb_chunks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub source_id: Uuid,

    pub chunk_index: i32,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// pgvector embedding stored as text for SeaORM compatibility.
    /// Actual vector operations are done via raw SQL.
    #[sea_orm(column_type = "Text", nullable)]
    pub embedding: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::kb_source::Entity",
        from = "Column::SourceId",
        to = "super::kb_source::Column::Id",
        on_delete = "Cascade"
    )]
    Source,
}

impl Related<super::kb_source::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Source.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Parse embedding from stored text format to Vec<f32>
    pub fn parse_embedding(&self) -> Option<Vec<f32>> {
        self.embedding.as_ref().and_then(|s| {
            // Format: "[1.0,2.0,3.0,...]"
            let inner = s.trim_start_matches('[').trim_end_matches(']');
            inner
                .split(',')
                .map(|v| v.trim().parse::<f32>().ok())
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_parse_embedding() {
        let chunk = Model {
            id: Uuid::new_v4(),
            source_id: Uuid::new_v4(),
            chunk_index: 0,
            content: "opening hours".into(),
            embedding: Some("[0.1, -0.5, 1.0]".into()),
            created_at: Utc::now().into(),
        };

        let parsed = chunk.parse_embedding().unwrap();
        assert_eq!(parsed, vec![0.1, -0.5, 1.0]);
    }

    #[test]
    fn test_parse_embedding_missing() {
        let chunk = Model {
            id: Uuid::new_v4(),
            source_id: Uuid::new_v4(),
            chunk_index: 0,
            content: "no embedding yet".into(),
            embedding: None,
            created_at: Utc::now().into(),
        };

        assert!(chunk.parse_embedding().is_none());
    }
}
