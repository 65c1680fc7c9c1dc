// ============================================================================
// Teamspace entity store
// ============================================================================

//! Generic, schema-gated content store for a team collaboration workspace.
//!
//! Every domain object (projects, kanban lists and tasks, events, votes, files,
//! folders, comments) is a row of one polymorphic `entities` table whose
//! type-specific payload is stored as JSON in `content`.
//!
//! ```no_run
//! use teamspace::{StoreConfig, bootstrap};
//! use teamspace::content::Project;
//! use teamspace::facade::projects;
//! use uuid::Uuid;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let store = bootstrap(&StoreConfig::default()).await?;
//! let project = Project { name: "Launch".into(), ..Project::default() };
//! let created = projects::create_project(&store, Uuid::new_v4(), &project, None).await?;
//! println!("{}", created.id);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod content;
pub mod core;
pub mod facade;
pub mod model;
pub mod schema;
pub mod storage;
pub mod store;

pub use config::{Backend, StoreConfig, bootstrap};
pub use content::{ContentShape, EntityKind, TypedContent};
pub use core::{EncryptionType, EntityError, EntityId, EntityStatus, SpaceId, StoreResult, UserId};
pub use model::{CreateEntityInput, Entity, EntityFilters, EntityWithContent, UpdateEntityInput};
pub use schema::{EntitySchema, SchemaRegistry};
pub use storage::{Datastore, InMemoryDatastore, PgDatastore};
pub use store::{EntityPlacement, EntityStore};
