//! Meeting bounded context - backend-owned scheduling records a call may be bound to

pub mod entity;
pub mod repository;

pub use entity::{MeetingRecord, MeetingStatus};
pub use repository::MeetingRepository;
