//! 激活模型记录模块
//!
//! 持久化当前激活的模型键与切换时间戳。记录与目录分开存放，
//! 避免每次编辑档案都改写激活状态。

use serde::{Deserialize, Serialize};

use crate::config::{get_active_path, read_json_file, write_json_file};
use crate::error::Result;

/// 当前激活的模型记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSelection {
    /// 激活的模型键；允许指向已不存在的键，由消费方按"无激活模型"处理
    pub model: String,
    /// 最近一次切换的毫秒时间戳，仅用于展示
    pub timestamp: i64,
}

impl ActiveSelection {
    fn now(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// 激活记录服务
pub struct ActiveService;

impl ActiveService {
    /// 读取激活记录
    ///
    /// 文件不存在或读取失败时返回默认值（claude + 当前时间），不抛错。
    pub fn get() -> ActiveSelection {
        let path = get_active_path();
        if !path.exists() {
            return ActiveSelection::now("claude");
        }

        match read_json_file(&path) {
            Ok(active) => active,
            Err(e) => {
                log::error!("读取激活记录失败，使用默认值: {}", e);
                ActiveSelection::now("claude")
            }
        }
    }

    /// 写入激活记录
    ///
    /// 无条件整体覆盖；键是否存在由调用方事先校验。
    pub fn set(model: &str) -> Result<ActiveSelection> {
        let active = ActiveSelection::now(model);
        write_json_file(&get_active_path(), &active)?;
        Ok(active)
    }
}
