use super::Entity;
use crate::core::{EntityError, EntityId, EntityStatus, SpaceId, StoreResult, UserId};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::str::FromStr;

/// How a query constrains `parent_id`.
///
/// `Any` is "not specified", `Root` is the explicit `parent_id IS NULL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParentFilter {
    #[default]
    Any,
    Root,
    Is(EntityId),
}

impl ParentFilter {
    pub fn matches(&self, parent_id: Option<EntityId>) -> bool {
        match self {
            ParentFilter::Any => true,
            ParentFilter::Root => parent_id.is_none(),
            ParentFilter::Is(expected) => parent_id == Some(*expected),
        }
    }
}

impl From<Option<EntityId>> for ParentFilter {
    fn from(parent_id: Option<EntityId>) -> Self {
        match parent_id {
            Some(id) => ParentFilter::Is(id),
            None => ParentFilter::Root,
        }
    }
}

/// Exact match or membership in a set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: PartialEq> OneOrMany<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            OneOrMany::One(expected) => expected == value,
            OneOrMany::Many(values) => values.contains(value),
        }
    }
}

impl<T: Clone> OneOrMany<T> {
    pub fn to_vec(&self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value.clone()],
            OneOrMany::Many(values) => values.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderBy {
    #[default]
    CreatedAt,
    UpdatedAt,
    LastActivityAt,
    Title,
}

impl OrderBy {
    pub fn column(&self) -> &'static str {
        match self {
            OrderBy::CreatedAt => "created_at",
            OrderBy::UpdatedAt => "updated_at",
            OrderBy::LastActivityAt => "last_activity_at",
            OrderBy::Title => "title",
        }
    }
}

impl FromStr for OrderBy {
    type Err = EntityError;

    fn from_str(raw: &str) -> StoreResult<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "created_at" => Ok(OrderBy::CreatedAt),
            "updated_at" => Ok(OrderBy::UpdatedAt),
            "last_activity_at" => Ok(OrderBy::LastActivityAt),
            "title" => Ok(OrderBy::Title),
            _ => Err(EntityError::InvalidValue(format!("unknown order column: {raw}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    Asc,
    #[default]
    Desc,
}

impl OrderDirection {
    pub fn keyword(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

impl FromStr for OrderDirection {
    type Err = EntityError;

    fn from_str(raw: &str) -> StoreResult<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" => Ok(OrderDirection::Asc),
            "desc" => Ok(OrderDirection::Desc),
            _ => Err(EntityError::InvalidValue(format!(
                "unknown order direction: {raw}"
            ))),
        }
    }
}

/// Query filters. Unset fields place no restriction on the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityFilters {
    pub space_id: Option<SpaceId>,
    pub entity_type: Option<OneOrMany<String>>,
    pub parent: ParentFilter,
    pub status: Option<OneOrMany<EntityStatus>>,
    pub created_by: Option<UserId>,
    pub content_eq: Vec<(String, JsonValue)>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub order_by: OrderBy,
    pub order_direction: OrderDirection,
}

impl EntityFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters restricted to live (`approved`) entities.
    pub fn active() -> Self {
        Self::default().status(EntityStatus::Approved)
    }

    pub fn space(mut self, space_id: SpaceId) -> Self {
        self.space_id = Some(space_id);
        self
    }

    pub fn entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(OneOrMany::One(entity_type.into()));
        self
    }

    pub fn entity_types<I, S>(mut self, entity_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entity_type = Some(OneOrMany::Many(
            entity_types.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// `Some(id)` selects children of `id`, `None` selects root-level entities.
    pub fn parent(mut self, parent_id: Option<EntityId>) -> Self {
        self.parent = ParentFilter::from(parent_id);
        self
    }

    pub fn any_parent(mut self) -> Self {
        self.parent = ParentFilter::Any;
        self
    }

    pub fn status(mut self, status: EntityStatus) -> Self {
        self.status = Some(OneOrMany::One(status));
        self
    }

    pub fn statuses(mut self, statuses: impl IntoIterator<Item = EntityStatus>) -> Self {
        self.status = Some(OneOrMany::Many(statuses.into_iter().collect()));
        self
    }

    pub fn created_by(mut self, user_id: UserId) -> Self {
        self.created_by = Some(user_id);
        self
    }

    pub fn content_eq(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.content_eq.push((key.into(), value.into()));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn order(mut self, order_by: OrderBy, direction: OrderDirection) -> Self {
        self.order_by = order_by;
        self.order_direction = direction;
        self
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        if self.space_id.is_some_and(|space_id| entity.space_id != space_id) {
            return false;
        }
        if let Some(types) = &self.entity_type
            && !types.matches(&entity.entity_type)
        {
            return false;
        }
        if !self.parent.matches(entity.parent_id) {
            return false;
        }
        if let Some(statuses) = &self.status
            && !statuses.matches(&entity.status)
        {
            return false;
        }
        if let Some(created_by) = self.created_by
            && entity.created_by != Some(created_by)
        {
            return false;
        }
        self.content_eq
            .iter()
            .all(|(key, expected)| entity.content_field(key).as_ref() == Some(expected))
    }

    pub fn compare(&self, left: &Entity, right: &Entity) -> Ordering {
        let order = match self.order_by {
            OrderBy::CreatedAt => left.created_at.cmp(&right.created_at),
            OrderBy::UpdatedAt => left.updated_at.cmp(&right.updated_at),
            OrderBy::LastActivityAt => {
                compare_nulls_last(&left.last_activity_at, &right.last_activity_at)
            }
            OrderBy::Title => compare_nulls_last(&left.title, &right.title),
        }
        .then_with(|| left.created_at.cmp(&right.created_at));

        match self.order_direction {
            OrderDirection::Asc => order,
            OrderDirection::Desc => order.reverse(),
        }
    }

    /// Filters, sorts and paginates an in-memory row set.
    pub fn apply(&self, rows: impl IntoIterator<Item = Entity>) -> Vec<Entity> {
        let mut rows: Vec<Entity> = rows.into_iter().filter(|row| self.matches(row)).collect();
        rows.sort_by(|left, right| self.compare(left, right));

        let offset = self.offset.unwrap_or(0);
        let limit = self.limit.unwrap_or(usize::MAX);
        rows.into_iter().skip(offset).take(limit).collect()
    }
}

// Postgres sorts NULL as the largest value.
fn compare_nulls_last<T: Ord>(left: &Option<T>, right: &Option<T>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => left.cmp(right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
