//! 配置文件路径和读写模块
//!
//! 处理各类配置文件的路径解析和原子读写操作。

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// 获取用户主目录
///
/// 支持 CLAUDE_SWITCHER_HOME 环境变量覆盖（用于测试隔离）
pub fn get_home_dir() -> PathBuf {
    if let Ok(home) = std::env::var("CLAUDE_SWITCHER_HOME") {
        let trimmed = home.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    #[cfg(windows)]
    if let Ok(home) = std::env::var("HOME") {
        let trimmed = home.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    dirs::home_dir().unwrap_or_else(|| {
        log::warn!("无法获取用户主目录，回退到当前目录");
        PathBuf::from(".")
    })
}

/// 获取应用配置目录路径
///
/// 默认: `~/.claude-model-switcher`
pub fn get_switcher_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CLAUDE_SWITCHER_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    get_home_dir().join(".claude-model-switcher")
}

/// 获取模型目录文件路径
pub fn get_catalog_path() -> PathBuf {
    get_switcher_config_dir().join("config.json")
}

/// 获取当前激活模型记录文件路径
pub fn get_active_path() -> PathBuf {
    get_switcher_config_dir().join("active.json")
}

/// 获取会话环境脚本路径
///
/// 该脚本可在当前终端中手动 source
pub fn get_session_env_path() -> PathBuf {
    get_switcher_config_dir().join("current-env.sh")
}

/// 获取全局环境脚本路径
///
/// 默认: `~/.claude-env`，由 Shell 启动文件 source
pub fn get_global_env_path() -> PathBuf {
    get_home_dir().join(".claude-env")
}

/// 获取 Claude Code 配置目录路径
///
/// 默认: `~/.claude`
pub fn get_claude_config_dir() -> PathBuf {
    get_home_dir().join(".claude")
}

/// 获取 Claude Code settings.json 路径
pub fn get_claude_settings_path() -> PathBuf {
    if let Ok(path) = std::env::var("CLAUDE_SWITCHER_SETTINGS_PATH") {
        return PathBuf::from(path);
    }
    get_claude_config_dir().join("settings.json")
}

/// 获取 Shell 启动文件列表
///
/// 只处理存在的文件，不存在的由调用方跳过
pub fn get_shell_config_files() -> Vec<PathBuf> {
    let home = get_home_dir();
    vec![
        home.join(".zshrc"),
        home.join(".bashrc"),
        home.join(".bash_profile"),
    ]
}

/// 读取 JSON 配置文件
pub fn read_json_file<T: for<'a> Deserialize<'a>>(path: &Path) -> Result<T, AppError> {
    if !path.exists() {
        return Err(AppError::Config(format!("文件不存在: {}", path.display())));
    }

    let content = fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;

    serde_json::from_str(&content).map_err(|e| AppError::json(path, e))
}

/// 写入 JSON 配置文件（原子写入）
pub fn write_json_file<T: Serialize>(path: &Path, data: &T) -> Result<(), AppError> {
    let json =
        serde_json::to_string_pretty(data).map_err(|e| AppError::JsonSerialize { source: e })?;

    atomic_write(path, json.as_bytes())
}

/// 写入文本文件（原子写入）
pub fn write_text_file(path: &Path, data: &str) -> Result<(), AppError> {
    atomic_write(path, data.as_bytes())
}

/// 原子写入：写入临时文件后 rename 替换，避免半写状态
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| AppError::io(parent, e))?;
    }

    let parent = path
        .parent()
        .ok_or_else(|| AppError::Config("无效的路径".to_string()))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| AppError::Config("无效的文件名".to_string()))?
        .to_string_lossy()
        .to_string();

    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    let mut tmp = parent.to_path_buf();
    tmp.push(format!("{file_name}.tmp.{ts}"));

    {
        let mut f = fs::File::create(&tmp).map_err(|e| AppError::io(&tmp, e))?;
        f.write_all(data).map_err(|e| AppError::io(&tmp, e))?;
        f.flush().map_err(|e| AppError::io(&tmp, e))?;
    }

    // Unix: 保留原文件权限
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = fs::metadata(path) {
            let perm = meta.permissions().mode();
            let _ = fs::set_permissions(&tmp, fs::Permissions::from_mode(perm));
        }
    }

    // 原子替换
    fs::rename(&tmp, path).map_err(|e| AppError::IoContext {
        context: format!("原子替换失败: {} -> {}", tmp.display(), path.display()),
        source: e,
    })?;

    Ok(())
}

/// 设置脚本可执行权限（755）
///
/// Windows 下没有执行位概念，直接返回成功
pub fn set_executable(path: &Path) -> Result<(), AppError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .map_err(|e| AppError::io(path, e))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.json");

        let data = r#"{"key": "value"}"#;
        atomic_write(&path, data.as_bytes()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, data);
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.json");

        atomic_write(&path, b"old").unwrap();
        atomic_write(&path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        // 临时文件不残留
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_set_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("script.sh");
        atomic_write(&path, b"#!/bin/bash\n").unwrap();
        set_executable(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
