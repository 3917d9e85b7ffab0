//! Geographic search
//!
//! # 模块结构
//!
//! - [`query`] - 查询参数解析 (typed constraint bag)
//! - [`geodesic`] - 椭球面测地计算 (Vincenty)
//! - [`engine`] - 过滤与距离排序

pub mod engine;
pub mod geodesic;
pub mod query;

pub use engine::{BoundingBox, search};
pub use query::{DEFAULT_LIMIT, QueryPresence, SpotSearchQuery};
