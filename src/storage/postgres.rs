use super::{Datastore, EntityChanges};
use crate::core::{EntityId, JsonMap, StoreResult};
use crate::model::{Entity, EntityFilters, OneOrMany, OrderBy, ParentFilter};
use crate::schema::EntitySchema;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder, Row};
use tracing::{debug, info};

const ENTITY_COLUMNS: &str = "id, space_id, type, parent_id, parent_type, title, summary, content, \
     metadata, status, encryption_type, is_edited, edited_at, edited_by, deleted_by, deleted_at, \
     thread_count, last_activity_at, created_by, created_at, updated_at";

const SCHEMA_COLUMNS: &str = "type, version, schema, is_active, created_at";

/// Parses stored content as JSONB, or NULL when it is not valid JSON.
const TRY_JSONB_FN: &str = "teamspace_try_jsonb";

const BOOTSTRAP_SQL: [&str; 6] = [
    r#"
    CREATE TABLE IF NOT EXISTS entity_schemas (
        type TEXT NOT NULL,
        version INTEGER NOT NULL,
        schema JSONB NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (type, version)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS entities (
        id UUID PRIMARY KEY,
        space_id UUID NOT NULL,
        type TEXT NOT NULL,
        parent_id UUID,
        parent_type TEXT,
        title TEXT,
        summary TEXT,
        content TEXT,
        metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
        status TEXT NOT NULL DEFAULT 'approved',
        encryption_type TEXT NOT NULL DEFAULT 'none',
        is_edited BOOLEAN NOT NULL DEFAULT FALSE,
        edited_at TIMESTAMPTZ,
        edited_by UUID,
        deleted_by UUID,
        deleted_at TIMESTAMPTZ,
        thread_count INTEGER NOT NULL DEFAULT 0,
        last_activity_at TIMESTAMPTZ,
        created_by UUID,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS entities_space_type_idx ON entities (space_id, type)",
    "CREATE INDEX IF NOT EXISTS entities_parent_idx ON entities (parent_id)",
    "CREATE INDEX IF NOT EXISTS entities_status_idx ON entities (status)",
    r#"
    CREATE OR REPLACE FUNCTION teamspace_try_jsonb(raw TEXT) RETURNS JSONB AS $body$
    BEGIN
        RETURN raw::jsonb;
    EXCEPTION WHEN others THEN
        RETURN NULL;
    END;
    $body$ LANGUAGE plpgsql IMMUTABLE
    "#,
];

#[derive(Clone)]
pub struct PgDatastore {
    pool: PgPool,
}

impl PgDatastore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Datastore for PgDatastore {
    async fn init(&self) -> StoreResult<()> {
        for statement in BOOTSTRAP_SQL {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("postgres entity tables ready");
        Ok(())
    }

    async fn insert_entity(&self, entity: Entity) -> StoreResult<Entity> {
        let sql = format!(
            "INSERT INTO entities ({ENTITY_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21) \
             RETURNING {ENTITY_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(entity.id)
            .bind(entity.space_id)
            .bind(entity.entity_type.as_str())
            .bind(entity.parent_id)
            .bind(entity.parent_type.as_deref())
            .bind(entity.title.as_deref())
            .bind(entity.summary.as_deref())
            .bind(entity.content.as_deref())
            .bind(Json(&entity.metadata))
            .bind(entity.status.as_str())
            .bind(entity.encryption_type.as_str())
            .bind(entity.is_edited)
            .bind(entity.edited_at)
            .bind(entity.edited_by)
            .bind(entity.deleted_by)
            .bind(entity.deleted_at)
            .bind(entity.thread_count)
            .bind(entity.last_activity_at)
            .bind(entity.created_by)
            .bind(entity.created_at)
            .bind(entity.updated_at)
            .fetch_one(&self.pool)
            .await?;

        entity_from_row(&row)
    }

    async fn fetch_entity(&self, id: EntityId) -> StoreResult<Option<Entity>> {
        let sql = format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(entity_from_row).transpose()
    }

    async fn query_entities(&self, filters: &EntityFilters) -> StoreResult<Vec<Entity>> {
        let mut builder = select_query(filters);
        debug!(sql = builder.sql(), "postgres entity scan");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(entity_from_row).collect()
    }

    async fn update_entity(&self, id: EntityId, changes: EntityChanges) -> StoreResult<Option<Entity>> {
        let mut builder = update_query(id, changes);
        let row = builder.build().fetch_optional(&self.pool).await?;

        row.as_ref().map(entity_from_row).transpose()
    }

    async fn delete_entity(&self, id: EntityId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM entities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn active_schema(&self, entity_type: &str) -> StoreResult<Option<EntitySchema>> {
        let sql = format!(
            "SELECT {SCHEMA_COLUMNS} FROM entity_schemas \
             WHERE type = $1 AND is_active = TRUE ORDER BY version DESC LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(entity_type)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(schema_from_row).transpose()
    }

    async fn active_schemas(&self) -> StoreResult<Vec<EntitySchema>> {
        let sql = format!(
            "SELECT {SCHEMA_COLUMNS} FROM entity_schemas WHERE is_active = TRUE ORDER BY type"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(schema_from_row).collect()
    }

    async fn register_schema(&self, schema: EntitySchema) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        if schema.is_active {
            sqlx::query("UPDATE entity_schemas SET is_active = FALSE WHERE type = $1")
                .bind(schema.entity_type.as_str())
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO entity_schemas (type, version, schema, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (type, version)
            DO UPDATE SET schema = EXCLUDED.schema, is_active = EXCLUDED.is_active
            "#,
        )
        .bind(schema.entity_type.as_str())
        .bind(schema.version)
        .bind(Json(&schema.schema))
        .bind(schema.is_active)
        .bind(schema.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn select_query(filters: &EntityFilters) -> QueryBuilder<'static, Postgres> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {ENTITY_COLUMNS} FROM entities"));
    push_filters(&mut builder, filters);

    let direction = filters.order_direction.keyword();
    builder
        .push(" ORDER BY ")
        .push(filters.order_by.column())
        .push(" ")
        .push(direction);
    if filters.order_by != OrderBy::CreatedAt {
        builder.push(", created_at ").push(direction);
    }

    if let Some(limit) = filters.limit {
        builder.push(" LIMIT ").push_bind(to_i64(limit));
    }
    if let Some(offset) = filters.offset {
        builder.push(" OFFSET ").push_bind(to_i64(offset));
    }

    builder
}

fn push_filters(builder: &mut QueryBuilder<'static, Postgres>, filters: &EntityFilters) {
    let mut has_where = false;

    if let Some(space_id) = filters.space_id {
        push_condition(builder, &mut has_where);
        builder.push("space_id = ").push_bind(space_id);
    }

    match &filters.entity_type {
        Some(OneOrMany::One(entity_type)) => {
            push_condition(builder, &mut has_where);
            builder.push("type = ").push_bind(entity_type.clone());
        }
        Some(OneOrMany::Many(entity_types)) => {
            push_condition(builder, &mut has_where);
            builder
                .push("type = ANY(")
                .push_bind(entity_types.clone())
                .push(")");
        }
        None => {}
    }

    match filters.parent {
        ParentFilter::Any => {}
        ParentFilter::Root => {
            push_condition(builder, &mut has_where);
            builder.push("parent_id IS NULL");
        }
        ParentFilter::Is(parent_id) => {
            push_condition(builder, &mut has_where);
            builder.push("parent_id = ").push_bind(parent_id);
        }
    }

    match &filters.status {
        Some(OneOrMany::One(status)) => {
            push_condition(builder, &mut has_where);
            builder.push("status = ").push_bind(status.as_str());
        }
        Some(OneOrMany::Many(statuses)) => {
            let statuses: Vec<String> = statuses
                .iter()
                .map(|status| status.as_str().to_string())
                .collect();
            push_condition(builder, &mut has_where);
            builder.push("status = ANY(").push_bind(statuses).push(")");
        }
        None => {}
    }

    if let Some(created_by) = filters.created_by {
        push_condition(builder, &mut has_where);
        builder.push("created_by = ").push_bind(created_by);
    }

    for (key, value) in &filters.content_eq {
        push_condition(builder, &mut has_where);
        builder
            .push(format!("({TRY_JSONB_FN}(content) -> "))
            .push_bind(key.clone())
            .push(") = ")
            .push_bind(Json(value.clone()));
    }
}

fn update_query(id: EntityId, changes: EntityChanges) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new("UPDATE entities SET ");
    let mut first = true;

    if let Some(parent_id) = changes.parent_id {
        push_set_prefix(&mut builder, &mut first);
        builder.push("parent_id = ").push_bind(parent_id);
    }
    if let Some(parent_type) = changes.parent_type {
        push_set_prefix(&mut builder, &mut first);
        builder.push("parent_type = ").push_bind(parent_type);
    }
    if let Some(title) = changes.title {
        push_set_prefix(&mut builder, &mut first);
        builder.push("title = ").push_bind(title);
    }
    if let Some(summary) = changes.summary {
        push_set_prefix(&mut builder, &mut first);
        builder.push("summary = ").push_bind(summary);
    }
    if let Some(content) = changes.content {
        push_set_prefix(&mut builder, &mut first);
        builder.push("content = ").push_bind(content);
    }
    if let Some(metadata) = changes.metadata {
        push_set_prefix(&mut builder, &mut first);
        builder.push("metadata = ").push_bind(Json(metadata));
    }
    if let Some(status) = changes.status {
        push_set_prefix(&mut builder, &mut first);
        builder.push("status = ").push_bind(status.as_str());
    }
    if let Some(encryption_type) = changes.encryption_type {
        push_set_prefix(&mut builder, &mut first);
        builder
            .push("encryption_type = ")
            .push_bind(encryption_type.as_str());
    }
    if let Some(stamp) = changes.edited {
        push_set_prefix(&mut builder, &mut first);
        builder.push("is_edited = TRUE, edited_by = ").push_bind(stamp.by);
        builder.push(", edited_at = ").push_bind(stamp.at);
    }
    if let Some(deleted) = changes.deleted {
        push_set_prefix(&mut builder, &mut first);
        builder
            .push("deleted_by = ")
            .push_bind(deleted.and_then(|stamp| stamp.by));
        builder
            .push(", deleted_at = ")
            .push_bind(deleted.map(|stamp| stamp.at));
    }
    if let Some(delta) = changes.thread_count_delta {
        push_set_prefix(&mut builder, &mut first);
        builder
            .push("thread_count = LEAST(GREATEST(thread_count::BIGINT + ")
            .push_bind(i64::from(delta))
            .push(", 0), 2147483647)::INTEGER");
    }
    if let Some(at) = changes.last_activity_at {
        push_set_prefix(&mut builder, &mut first);
        builder.push("last_activity_at = ").push_bind(at);
    }

    push_set_prefix(&mut builder, &mut first);
    builder.push("updated_at = ").push_bind(changes.updated_at);

    builder
        .push(" WHERE id = ")
        .push_bind(id)
        .push(format!(" RETURNING {ENTITY_COLUMNS}"));

    builder
}

fn push_condition(builder: &mut QueryBuilder<'static, Postgres>, has_where: &mut bool) {
    if *has_where {
        builder.push(" AND ");
    } else {
        builder.push(" WHERE ");
        *has_where = true;
    }
}

fn push_set_prefix(builder: &mut QueryBuilder<'static, Postgres>, first: &mut bool) {
    if *first {
        *first = false;
    } else {
        builder.push(", ");
    }
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn entity_from_row(row: &PgRow) -> StoreResult<Entity> {
    let status: String = row.try_get("status")?;
    let encryption_type: String = row.try_get("encryption_type")?;
    let metadata: Json<JsonMap> = row.try_get("metadata")?;

    Ok(Entity {
        id: row.try_get("id")?,
        space_id: row.try_get("space_id")?,
        entity_type: row.try_get("type")?,
        parent_id: row.try_get("parent_id")?,
        parent_type: row.try_get("parent_type")?,
        title: row.try_get("title")?,
        summary: row.try_get("summary")?,
        content: row.try_get("content")?,
        metadata: metadata.0,
        status: status.parse()?,
        encryption_type: encryption_type.parse()?,
        is_edited: row.try_get("is_edited")?,
        edited_at: row.try_get("edited_at")?,
        edited_by: row.try_get("edited_by")?,
        deleted_by: row.try_get("deleted_by")?,
        deleted_at: row.try_get("deleted_at")?,
        thread_count: row.try_get("thread_count")?,
        last_activity_at: row.try_get("last_activity_at")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn schema_from_row(row: &PgRow) -> StoreResult<EntitySchema> {
    let schema: Json<JsonValue> = row.try_get("schema")?;

    Ok(EntitySchema {
        entity_type: row.try_get("type")?,
        version: row.try_get("version")?,
        schema: schema.0,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityStatus;
    use crate::model::OrderDirection;
    use crate::storage::Stamp;
    use chrono::Utc;

    #[test]
    fn unfiltered_scan_orders_by_created_at_desc() {
        let builder = select_query(&EntityFilters::new());
        assert!(builder.sql().ends_with("FROM entities ORDER BY created_at DESC"));
    }

    #[test]
    fn root_filter_emits_is_null() {
        let builder = select_query(&EntityFilters::new().parent(None));
        assert!(builder.sql().contains(" WHERE parent_id IS NULL"));
    }

    #[test]
    fn filters_are_joined_with_and() {
        let filters = EntityFilters::new()
            .space(uuid::Uuid::new_v4())
            .entity_types(["project", "project_list"])
            .statuses([EntityStatus::Approved, EntityStatus::Draft])
            .content_eq("list_id", "l1")
            .order(OrderBy::Title, OrderDirection::Asc)
            .limit(10)
            .offset(20);
        let builder = select_query(&filters);
        let sql = builder.sql();

        assert!(sql.contains("WHERE space_id = $1 AND type = ANY($2) AND status = ANY($3)"));
        assert!(sql.contains("(teamspace_try_jsonb(content) -> $4) = $5"));
        assert!(sql.contains("ORDER BY title ASC, created_at ASC LIMIT $6 OFFSET $7"));
    }

    #[test]
    fn content_match_never_casts_raw_text() {
        let builder = select_query(&EntityFilters::new().content_eq("project_id", "p1"));
        let sql = builder.sql();

        assert!(!sql.contains("::jsonb"));
        assert!(sql.contains("WHERE (teamspace_try_jsonb(content) -> $1) = $2"));
        assert!(
            BOOTSTRAP_SQL
                .iter()
                .any(|statement| statement.contains("FUNCTION teamspace_try_jsonb(raw TEXT)")
                    && statement.contains("RETURN NULL"))
        );
    }

    #[test]
    fn thread_count_update_is_clamped_to_integer_range() {
        let mut changes = EntityChanges::at(Utc::now());
        changes.thread_count_delta = Some(i32::MAX);

        let builder = update_query(uuid::Uuid::new_v4(), changes);
        assert!(builder.sql().contains(
            "thread_count = LEAST(GREATEST(thread_count::BIGINT + $1, 0), 2147483647)::INTEGER"
        ));
    }

    #[test]
    fn update_sets_only_changed_columns() {
        let now = Utc::now();
        let mut changes = EntityChanges::at(now);
        changes.parent_id = Some(Some(uuid::Uuid::new_v4()));
        changes.edited = Some(Stamp { by: None, at: now });

        let builder = update_query(uuid::Uuid::new_v4(), changes);
        let sql = builder.sql();

        assert!(sql.starts_with(
            "UPDATE entities SET parent_id = $1, is_edited = TRUE, edited_by = $2, edited_at = $3, updated_at = $4 WHERE id = $5"
        ));
        assert!(!sql.contains("content ="));
        assert!(sql.contains("RETURNING id, space_id, type"));
    }
}
