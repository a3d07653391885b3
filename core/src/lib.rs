// accounts/src/lib.rs

//! User identity records.
//!
//! - `User` / `UserChangeset`: the persisted record and the candidate values used to create or change it.
//! - `validation`: the ordered rule set, the email grammar and structured `ValidationErrors`.
//! - `Users`: save / validate / authenticate through an injected `UserStore`.
//! - `store`: the storage trait and an in-memory implementation with a unique `email_lower` index.
//! - `migration`: backfilling `email_lower` before the unique index is switched on.
//! - `avatar`: Gravatar URLs and image tags.
//! - `pipeline`: the async step pipeline that drives a save.
//!
//! Email uniqueness is case-insensitive. It is checked during validation for a
//! friendly error and enforced by the store's unique index, which is what
//! actually stops two concurrent sign-ups from claiming the same address.

pub mod avatar;
pub mod error;
pub mod migration;
pub mod password;
pub mod pipeline;
pub mod store;
pub mod user;
pub mod users;
pub mod validation;

pub use crate::avatar::{gravatar_id, AvatarConfig};
pub use crate::error::{AccountsError, AccountsResult};
pub use crate::migration::{BackfillReport, LegacyUserRow, MigrationError};
pub use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineError, PipelineResult};
pub use crate::store::{MemoryUserStore, StoreError, UserStore};
pub use crate::user::{normalize_email, User, UserChangeset};
pub use crate::users::{SaveOptions, SaveOutcome, Users};
pub use crate::validation::{ErrorKind, Field, ValidationError, ValidationErrors};
