//! # PostgreSQL 存储实现模块
//!
//! 本模块提供所有存储接口的 PostgreSQL 实现，用于生产环境。
//!
//! ## 设计原则
//!
//! 1. **参数化查询**：所有 SQL 查询使用参数绑定，防止 SQL 注入攻击
//! 2. **单语句写入**：写路径都是单条语句，中途取消不会留下部分副作用
//! 3. **原子 upsert**：自然键判定放在数据库内完成，不做读改写
//! 4. **连接池管理**：使用连接池复用数据库连接（`connection.rs`，最大 8）
//!
//! ## 包含的实现
//!
//! - **StateSpanStore** (`span.rs`)：状态区间存储
//! - **TreatmentStore** (`treatment.rs`)：原生平面记录存储
//!
//! ## 数据库模式要求
//!
//! - `state_span`：区间表
//!   （span_id text 主键, category text, state text, start_ts timestamptz,
//!   end_ts timestamptz null, source text, original_id text null,
//!   metadata jsonb）
//! - `treatment`：原生记录表
//!   （treatment_id text 主键, ts timestamptz, event_type text,
//!   duration double precision null, rate double precision null,
//!   absolute double precision null, reason text null, notes text null,
//!   entered_by text null）
//!
//! ### 索引
//!
//! - `uq_state_span_identity`：
//!   `create unique index uq_state_span_identity on state_span (category, original_id)
//!   where original_id is not null`
//!   —— upsert 的 `on conflict` 目标，同一自然键至多一个存活区间
//! - `idx_state_span_category_start`：(category, start_ts) 复合索引
//! - `idx_treatment_type_ts`：(event_type, ts) 复合索引
//!
//! ## 错误处理
//!
//! 所有存储操作返回 `Result<T, StorageError>`；查不到用
//! `Option<T>` / `bool` 表达，不作为错误。

// 导出各个 PostgreSQL 存储实现
pub mod span;
pub mod treatment;

// 导出到 crate 根目录，方便外部引用
pub use span::*;
pub use treatment::*;
