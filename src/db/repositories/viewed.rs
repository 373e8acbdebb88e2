use crate::db::{cutoff, timestamp};
use crate::entities::{prelude::*, viewed_state};
use crate::models::Platform;
use anyhow::Result;
use chrono::{Duration, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewedEntry {
    pub platform: Platform,
    pub displayed_index: usize,
    pub viewed_at: String,
}

impl ViewedEntry {
    fn from_model(model: viewed_state::Model) -> Option<Self> {
        let platform = model.platform.parse().ok()?;
        Some(Self {
            platform,
            displayed_index: usize::try_from(model.displayed_index).unwrap_or(0),
            viewed_at: model.viewed_at,
        })
    }
}

pub struct ViewedRepository {
    conn: DatabaseConnection,
}

impl ViewedRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(
        &self,
        user_id: &str,
        query: &str,
        platform: Platform,
        ttl: Duration,
    ) -> Result<Option<ViewedEntry>> {
        let row = ViewedState::find()
            .filter(viewed_state::Column::UserId.eq(user_id))
            .filter(viewed_state::Column::Query.eq(query))
            .filter(viewed_state::Column::Platform.eq(platform.as_str()))
            .filter(viewed_state::Column::ViewedAt.gte(cutoff(ttl)))
            .one(&self.conn)
            .await?;

        Ok(row.and_then(ViewedEntry::from_model))
    }

    pub async fn get_all_platforms(
        &self,
        user_id: &str,
        query: &str,
        ttl: Duration,
    ) -> Result<Vec<ViewedEntry>> {
        let rows = ViewedState::find()
            .filter(viewed_state::Column::UserId.eq(user_id))
            .filter(viewed_state::Column::Query.eq(query))
            .filter(viewed_state::Column::ViewedAt.gte(cutoff(ttl)))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().filter_map(ViewedEntry::from_model).collect())
    }

    pub async fn put(
        &self,
        user_id: &str,
        query: &str,
        platform: Platform,
        displayed_index: usize,
    ) -> Result<()> {
        let active_model = viewed_state::ActiveModel {
            user_id: Set(user_id.to_string()),
            query: Set(query.to_string()),
            platform: Set(platform.as_str().to_string()),
            displayed_index: Set(i64::try_from(displayed_index).unwrap_or(i64::MAX)),
            viewed_at: Set(timestamp(Utc::now())),
            ..Default::default()
        };

        ViewedState::insert(active_model)
            .on_conflict(
                OnConflict::columns([
                    viewed_state::Column::UserId,
                    viewed_state::Column::Query,
                    viewed_state::Column::Platform,
                ])
                .update_columns([
                    viewed_state::Column::DisplayedIndex,
                    viewed_state::Column::ViewedAt,
                ])
                .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn delete_expired(&self, older_than: Duration) -> Result<u64> {
        let result = ViewedState::delete_many()
            .filter(viewed_state::Column::ViewedAt.lt(cutoff(older_than)))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}
