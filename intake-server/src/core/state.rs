use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::{BranchRepository, CustomerRepository};
use crate::orders::{BranchLocator, OrderAggregator, OrderSequence, OrderService, ShardRouter};
use crate::services::{DistanceProvider, DistanceService};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | orders | Arc<OrderService> | 下单/改单编排 |
/// | aggregator | OrderAggregator | 跨分区聚合查询 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// 订单服务
    pub orders: Arc<OrderService>,
    /// 跨分区聚合
    pub aggregator: OrderAggregator,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (确保目录存在)
    /// 2. 数据库 (work_dir/database/intake.db)
    /// 3. 距离服务、定位策略链、分片路由、序号、聚合、订单服务
    ///
    /// # Panics
    ///
    /// 数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("intake.db");
        let db_service = DbService::new(&db_path)
            .await
            .expect("Failed to initialize database");
        let db = db_service.db;

        let distance: Arc<dyn DistanceProvider> = Arc::new(DistanceService::new(config));
        let locator = Arc::new(BranchLocator::new(distance));

        let router = ShardRouter::new(db.clone());
        let sequence = OrderSequence::new(db.clone());
        let branches = BranchRepository::new(db.clone());
        let customers = CustomerRepository::new(db.clone());
        let aggregator = OrderAggregator::new(router.clone(), branches.clone());

        let orders = Arc::new(OrderService::new(
            router,
            sequence,
            locator,
            branches,
            customers,
            aggregator.clone(),
        ));

        Self {
            config: config.clone(),
            db,
            orders,
            aggregator,
        }
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }
}
