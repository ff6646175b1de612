//! 订单路由核心 - 分片、序号、积分结算
//!
//! # 模块结构
//!
//! - [`address`] - 地址解析（纯函数）
//! - [`locator`] - 最近门店解析（显式策略链）
//! - [`shard`] - 分片路由（城市 → 分区）
//! - [`sequence`] - 全局订单序号
//! - [`loyalty`] - 积分结算引擎
//! - [`aggregate`] - 跨分区聚合查询
//! - [`service`] - 下单/改单编排

pub mod address;
pub mod aggregate;
pub mod locator;
pub mod loyalty;
pub mod sequence;
pub mod service;
pub mod shard;

pub use aggregate::OrderAggregator;
pub use locator::{BranchLocator, BranchMatch, LocateContext};
pub use sequence::OrderSequence;
pub use service::{Caller, OrderService};
pub use shard::ShardRouter;
