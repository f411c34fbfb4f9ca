//! Claude Switcher Core Library
//!
//! 核心业务逻辑库，负责 Claude Code 的多模型 API 切换：模型目录的
//! 加载/合并/迁移，激活记录的持久化，以及环境投影（进程环境快照、
//! settings.json、环境脚本、Shell 启动文件接线）。
//! 此库不依赖任何终端交互，可在 CLI 或服务端使用。
//!
//! # 架构设计
//!
//! ```text
//! switcher-core/
//! ├── lib.rs           - 公共 API 导出
//! ├── config.rs        - 配置文件路径和原子读写
//! ├── error.rs         - 统一错误类型
//! ├── profile.rs       - 模型档案、旧格式迁移、字段级合并
//! ├── catalog.rs       - 模型目录的加载/保存/增删改
//! ├── active.rs        - 激活模型记录
//! └── services/        - 业务逻辑服务层
//!     ├── projector.rs - 环境投影（四个外部通道）
//!     ├── probe.rs     - 连通性探测
//!     └── switcher.rs  - 切换编排
//! ```
//!
//! # 使用示例
//!
//! ```rust,no_run
//! use switcher_core::{ActiveService, CatalogService};
//!
//! // 列出所有模型
//! let catalog = CatalogService::load();
//! for (key, profile) in &catalog {
//!     println!("{}: {}", key, profile.name);
//! }
//!
//! // 当前激活的模型
//! let active = ActiveService::get();
//! println!("当前模型: {}", active.model);
//! ```

pub mod active;
pub mod catalog;
pub mod config;
pub mod error;
pub mod profile;
pub mod services;

// 公共类型导出
pub use active::{ActiveSelection, ActiveService};
pub use catalog::{builtin_catalog, Catalog, CatalogService, CustomProfileInput, BUILTIN_KEYS};
pub use config::{
    get_active_path, get_catalog_path, get_claude_settings_path, get_global_env_path,
    get_home_dir, get_session_env_path, get_shell_config_files, get_switcher_config_dir,
    read_json_file, write_json_file, write_text_file,
};
pub use error::AppError;
pub use profile::{ModelProfile, API_KEY_VAR, BASE_URL_VAR};
pub use services::{
    EnvironmentSnapshot, ModelStatus, ProbeService, ProjectionReport, ProjectorService,
    SwitchOutcome, SwitchPrompt, SwitchService,
};

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用名称
pub const APP_NAME: &str = "claude-switcher";
