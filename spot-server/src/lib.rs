//! Spot Server - 位置资源 REST API
//!
//! # 架构概述
//!
//! 提供以下核心功能：
//!
//! - **乐观并发** (`etag`): 基于资源指纹 (ETag/If-Match) 的条件更新
//! - **地理搜索** (`search`): bounding box 过滤 + 测地距离排序
//! - **数据库** (`db`): SQLite 存储 (spot + extended info)
//! - **认证** (`auth`): 启动时选定的可插拔认证模块
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! spot-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # 认证模块与中间件
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层 (models, repository)
//! ├── etag/          # 条件更新控制器
//! ├── search/        # 地理搜索引擎
//! └── utils/         # 错误、日志、校验
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod etag;
pub mod search;
pub mod utils;

// Re-export 公共类型
pub use crate::core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
