//! Data Transfer Objects for REST request/response serialization.
//!
//! All monetary amounts are serialized as JSON strings to keep the exact
//! decimal value. RTP is `null` when nothing was wagered.

pub mod common_dto;
pub mod report_dto;
pub mod session_dto;

pub use common_dto::*;
pub use report_dto::*;
pub use session_dto::*;
