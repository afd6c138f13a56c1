pub mod api;
pub mod likes;
pub mod models;
pub mod pagination;

pub use likes::{LikeTarget, LikeTargetError, TargetKind};
pub use pagination::{Page, PageRequest};
