//! Data Transfer Objects for REST request/response serialization.

pub mod account_dto;
pub mod banner_dto;
pub mod metadata_dto;
pub mod sync_dto;

pub use account_dto::*;
pub use banner_dto::*;
pub use metadata_dto::*;
pub use sync_dto::*;
