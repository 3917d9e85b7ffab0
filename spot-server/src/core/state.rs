use std::sync::Arc;

use anyhow::Context;

use crate::auth::{AuthModule, Authenticator};
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::SqliteSpotStore;
use crate::etag::EtagController;

/// 服务器状态 - 持有所有服务的共享引用
///
/// ServerState 使用 Arc/Clone 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | DbService | SQLite 连接池 |
/// | store | SqliteSpotStore | Spot 存储 |
/// | auth | Arc<Authenticator> | 启动时选定的认证模块 |
/// | etags | Arc<EtagController> | 条件更新控制器 (按资源加锁) |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 数据库服务
    pub db: DbService,
    /// Spot 存储
    pub store: SqliteSpotStore,
    /// 认证模块 (进程级单例)
    pub auth: Arc<Authenticator>,
    /// 条件更新控制器
    pub etags: Arc<EtagController>,
}

impl ServerState {
    /// 初始化服务器状态：工作目录、数据库、认证模块
    pub async fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)
            .with_context(|| format!("Failed to create work dir {}", config.work_dir))?;

        let db_path = config.db_path();
        let db_path = db_path
            .to_str()
            .context("Database path is not valid UTF-8")?;
        let db = DbService::new(db_path).await?;

        let auth = Authenticator::from_config(config)?;
        tracing::info!(module = auth.name(), "Auth module selected");

        let store = SqliteSpotStore::new(db.pool.clone());

        Ok(Self {
            config: config.clone(),
            db,
            store,
            auth: Arc::new(auth),
            etags: Arc::new(EtagController::new()),
        })
    }
}
