pub mod error;
pub mod types;

pub use error::{EntityError, StoreResult};
pub use types::{EncryptionType, EntityId, EntityStatus, JsonMap, SpaceId, UserId};
