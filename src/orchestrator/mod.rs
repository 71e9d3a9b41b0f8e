//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 负责跨越多个步骤、需要等待服务端的流程。
//!
//! ### `loader` - 表单加载
//! - 拉取表单，失败时固定间隔重试
//! - 维护加载状态，重试用尽时挂出错误面板
//! - 记录每次尝试，后台补报加载记录
//!
//! ### `submitter` - 表单提交
//! - 提交前重新校验
//! - 忙碌状态守卫
//! - 序列化并提交
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator (loader / submitter)
//!     ↓
//! workflow::FormEditor (编辑状态)
//!     ↓
//! services (validator / serializer / attempt_store)
//!     ↓
//! clients::FormApi (HTTP)
//! ```

pub mod loader;
pub mod submitter;

pub use loader::{CancelToken, FormLoader, LoadOutcome, LoadState};
pub use submitter::FormSubmitter;
