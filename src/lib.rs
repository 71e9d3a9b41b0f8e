//! # Form Builder
//!
//! 动态问卷表单的编辑、校验、序列化与加载
//!
//! ## 架构设计
//!
//! 页面上的编辑状态全部落在显式的模型上，界面只负责绑定。
//!
//! ### ① 数据层（Models）
//! - `models/` - 表单、题目、元数据、活动日期、线上结构、TOML 草稿
//!
//! ### ② 业务能力层（Services）
//! - `Validator` - 校验整张表单，收集全部错误
//! - `Serializer` - 表单 → 线上结构 / 提交隐藏字段
//! - `LoadAttemptStore` - 每个表单最近的加载尝试
//!
//! ### ③ 客户端（Clients）
//! - `FormApi` - 服务端能力；`FormClient` 为 reqwest 实现
//!
//! ### ④ 流程层（Workflow）
//! - `FormEditor` - 题目卡片、元数据、字段错误、提示、提交按钮
//! - 控件名 → 动作 对照表（`FormEditor::dispatch`）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `FormLoader` - 固定间隔重试的加载流程，可取消
//! - `FormSubmitter` - 校验 → 忙碌 → 序列化 → 提交
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{FormApi, FormClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{AnswerType, ContainerRef, Form, FormRecord, Question, QuestionId};
pub use orchestrator::{CancelToken, FormLoader, FormSubmitter, LoadOutcome, LoadState};
pub use services::{Serializer, Validator};
pub use workflow::{FormEditor, LoaderAction, NoticeLevel};
