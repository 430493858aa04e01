pub mod aggregator;
pub mod assembler;
pub mod cache;

pub use crate::domain::model::{Comment, FailurePolicy, LightComment, Post, Response, User};
pub use crate::domain::ports::{ConfigProvider, Upstream};
pub use crate::utils::error::Result;
