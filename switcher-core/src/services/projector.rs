//! 环境投影服务模块
//!
//! 把一个模型档案的配置投影到四个外部通道：进程环境快照、
//! Claude Code settings.json、会话环境脚本、全局环境脚本 + Shell
//! 启动文件接线。各通道之间没有事务，部分失败只记录不回滚。

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::{
    get_claude_settings_path, get_global_env_path, get_session_env_path, get_shell_config_files,
    read_json_file, set_executable, write_json_file, write_text_file,
};
use crate::error::{AppError, Result};
use crate::profile::{ModelProfile, API_KEY_VAR, BASE_URL_VAR};

/// 本工具在 Shell 启动文件中的标记注释
const BLOCK_MARKER: &str = "# Claude Model Switcher";

/// 全局环境脚本的文件名标记（用于识别旧的 source 行）
const GLOBAL_ENV_MARKER: &str = ".claude-env";

/// 环境变量快照
///
/// 投影到真实进程环境是唯一一次显式副作用调用（`apply`），
/// 放在程序入口边界执行，其余代码只传递这个值。
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentSnapshot {
    pub base_url: String,
    /// 凭据；未配置时为 None，不写入任何通道
    pub api_key: Option<String>,
}

impl EnvironmentSnapshot {
    /// 从档案解析快照
    ///
    /// 变量名是固定约定（下游工具只读这两个名字），与档案
    /// 自身的 apiKeyName 无关。
    pub fn from_profile(profile: &ModelProfile) -> Self {
        Self {
            base_url: profile.base_url.clone(),
            api_key: if profile.api_key.is_empty() {
                None
            } else {
                Some(profile.api_key.clone())
            },
        }
    }

    /// 展开为 (变量名, 值) 列表
    pub fn variables(&self) -> Vec<(&'static str, String)> {
        let mut vars = vec![(BASE_URL_VAR, self.base_url.clone())];
        if let Some(api_key) = &self.api_key {
            vars.push((API_KEY_VAR, api_key.clone()));
        }
        vars
    }

    /// 写入当前进程环境
    ///
    /// 只影响本进程及之后派生的子进程。
    pub fn apply(&self) {
        for (name, value) in self.variables() {
            std::env::set_var(name, value);
        }
    }

    /// 生成 export 语句行
    pub fn export_lines(&self) -> Vec<String> {
        self.variables()
            .into_iter()
            .map(|(name, value)| format!(r#"export {}="{}""#, name, shell_quote(&value)))
            .collect()
    }
}

/// 转义双引号字符串中的特殊字符
fn shell_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '"' | '$' | '`' => {
                quoted.push('\\');
                quoted.push(c);
            }
            _ => quoted.push(c),
        }
    }
    quoted
}

/// 投影结果报告
///
/// 记录各通道是否成功，供调用方展示；不用于回滚。
#[derive(Debug, Clone, Default)]
pub struct ProjectionReport {
    /// settings.json 已更新（文件不存在时为 false，非致命）
    pub settings_updated: bool,
    /// 会话脚本已写入
    pub session_script_written: bool,
    /// 全局脚本已写入
    pub global_script_written: bool,
    /// 完成接线的 Shell 启动文件
    pub shell_files_updated: Vec<PathBuf>,
}

/// 环境投影服务
pub struct ProjectorService;

impl ProjectorService {
    /// 将档案投影到所有文件通道
    ///
    /// 永不抛错：单个通道失败记录日志并反映在报告中，
    /// 已写入的通道保持新值，后续通道保持旧值。
    pub fn project(profile: &ModelProfile) -> (EnvironmentSnapshot, ProjectionReport) {
        let snapshot = EnvironmentSnapshot::from_profile(profile);
        let mut report = ProjectionReport::default();

        match Self::patch_claude_settings(&snapshot) {
            Ok(updated) => report.settings_updated = updated,
            Err(e) => log::error!("更新 Claude Code settings.json 失败: {}", e),
        }

        let session_path = get_session_env_path();
        match Self::write_env_script(&session_path, SESSION_HEADER, &snapshot) {
            Ok(()) => report.session_script_written = true,
            Err(e) => log::error!("写入会话环境脚本失败: {}", e),
        }

        let global_path = get_global_env_path();
        match Self::write_env_script(&global_path, GLOBAL_HEADER, &snapshot) {
            Ok(()) => report.global_script_written = true,
            Err(e) => log::error!("写入全局环境脚本失败: {}", e),
        }

        report.shell_files_updated = Self::wire_shell_configs(&global_path);

        (snapshot, report)
    }

    /// 最小化修补 Claude Code settings.json
    ///
    /// 文件归下游工具所有：只改 env 包里的两个键，保留所有
    /// 无关字段。文件不存在时跳过并警告（不创建），非致命。
    pub fn patch_claude_settings(snapshot: &EnvironmentSnapshot) -> Result<bool> {
        let path = get_claude_settings_path();
        if !path.exists() {
            log::warn!("Claude Code settings.json 不存在，跳过同步");
            return Ok(false);
        }

        let mut settings: Value = read_json_file(&path)?;
        let root = settings
            .as_object_mut()
            .ok_or_else(|| AppError::Config(format!("settings.json 不是 JSON 对象: {}", path.display())))?;

        let env = root
            .entry("env")
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        let env = env
            .as_object_mut()
            .ok_or_else(|| AppError::Config("settings.json 的 env 字段不是对象".to_string()))?;

        env.insert(BASE_URL_VAR.to_string(), Value::String(snapshot.base_url.clone()));
        if let Some(api_key) = &snapshot.api_key {
            env.insert(API_KEY_VAR.to_string(), Value::String(api_key.clone()));
        }

        write_json_file(&path, &settings)?;
        Ok(true)
    }

    /// 写入环境脚本并设置可执行权限
    fn write_env_script(path: &Path, header: &str, snapshot: &EnvironmentSnapshot) -> Result<()> {
        let mut lines = vec!["#!/bin/bash".to_string()];
        lines.extend(header.lines().map(str::to_string));
        lines.extend(snapshot.export_lines());

        write_text_file(path, &(lines.join("\n") + "\n"))?;
        set_executable(path)
    }

    /// 为所有存在的 Shell 启动文件接线
    ///
    /// 单个文件失败只记录并继续，一个坏掉的 Shell 配置不阻塞其他文件。
    /// 返回成功更新的文件列表。
    pub fn wire_shell_configs(global_env_path: &Path) -> Vec<PathBuf> {
        let mut updated = Vec::new();

        for rc_path in get_shell_config_files() {
            if !rc_path.exists() {
                continue;
            }

            let result = std::fs::read_to_string(&rc_path)
                .map_err(|e| AppError::io(&rc_path, e))
                .and_then(|content| {
                    write_text_file(&rc_path, &rewire_rc_content(&content, global_env_path))
                });

            match result {
                Ok(()) => updated.push(rc_path),
                Err(e) => log::warn!("更新 Shell 启动文件失败: {}: {}", rc_path.display(), e),
            }
        }

        updated
    }
}

const SESSION_HEADER: &str = "# Claude Model Switcher - Current Environment";

const GLOBAL_HEADER: &str = "# Claude Model Switcher - Global Environment\n\
# Source this file in your shell startup script";

/// 重写 Shell 启动文件内容（纯函数）
///
/// 解析/打印对：先丢弃属于本工具的行（含孤立的 fi 收尾行），
/// 去掉结尾空行，再在末尾追加规范 source 块——除非清理后仍保留
/// source 行。对同一输入重复应用产生相同输出（幂等）。
pub fn rewire_rc_content(content: &str, global_env_path: &Path) -> String {
    let mut lines = strip_switcher_lines(content);

    while lines.last().map(|l| l.trim().is_empty()).unwrap_or(false) {
        lines.pop();
    }

    let has_source_line = lines.iter().any(|l| l.contains(GLOBAL_ENV_MARKER));
    if !has_source_line {
        lines.extend(render_source_block(global_env_path));
    }

    lines.join("\n") + "\n"
}

/// 过滤属于本工具的行（纯函数）
///
/// 匹配固定标记：两个环境变量名、标记注释、全局脚本文件名，
/// 以及残留的独立 fi 行。
fn strip_switcher_lines(content: &str) -> Vec<String> {
    content
        .split('\n')
        .filter(|line| {
            !line.contains(BASE_URL_VAR)
                && !line.contains(API_KEY_VAR)
                && !line.contains(BLOCK_MARKER)
                && !line.contains(GLOBAL_ENV_MARKER)
                && line.trim() != "fi"
        })
        .map(str::to_string)
        .collect()
}

/// 生成规范 source 块
fn render_source_block(global_env_path: &Path) -> Vec<String> {
    let path = global_env_path.display();
    vec![
        String::new(),
        format!("{} - Auto Generated", BLOCK_MARKER),
        format!(r#"if [ -f "{}" ]; then"#, path),
        format!(r#"  source "{}""#, path),
        "fi".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    fn sample_profile() -> ModelProfile {
        ModelProfile {
            key: "kimi".into(),
            name: "Kimi (Moonshot)".into(),
            base_url: "https://api.moonshot.cn/anthropic".into(),
            api_key_name: Some("MOONSHOT_API_KEY".into()),
            api_key: "sk-test".into(),
            default_model: "kimi-k2-0905-preview".into(),
            is_custom: false,
            description: None,
            user_model: None,
        }
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("plain"), "plain");
        assert_eq!(shell_quote(r#"a"b"#), r#"a\"b"#);
        assert_eq!(shell_quote("pa$$word"), r"pa\$\$word");
        assert_eq!(shell_quote("tick`tock"), r"tick\`tock");
    }

    #[test]
    fn test_snapshot_without_api_key() {
        let mut profile = sample_profile();
        profile.api_key = String::new();

        let snapshot = EnvironmentSnapshot::from_profile(&profile);
        assert_eq!(snapshot.api_key, None);
        assert_eq!(snapshot.variables().len(), 1);
        assert_eq!(snapshot.export_lines().len(), 1);
    }

    #[test]
    #[serial]
    fn test_session_script_has_one_export_per_variable() {
        let dir = tempdir().unwrap();
        std::env::set_var("CLAUDE_SWITCHER_HOME", dir.path());

        let (_, report) = ProjectorService::project(&sample_profile());
        assert!(report.session_script_written);
        assert!(report.global_script_written);

        let script = std::fs::read_to_string(get_session_env_path()).unwrap();
        let base_url_lines: Vec<&str> = script
            .lines()
            .filter(|l| l.starts_with(&format!("export {}=", BASE_URL_VAR)))
            .collect();
        let api_key_lines: Vec<&str> = script
            .lines()
            .filter(|l| l.starts_with(&format!("export {}=", API_KEY_VAR)))
            .collect();

        assert_eq!(base_url_lines.len(), 1);
        assert_eq!(api_key_lines.len(), 1);
        assert_eq!(
            base_url_lines[0],
            r#"export ANTHROPIC_BASE_URL="https://api.moonshot.cn/anthropic""#
        );
        assert_eq!(api_key_lines[0], r#"export ANTHROPIC_API_KEY="sk-test""#);

        std::env::remove_var("CLAUDE_SWITCHER_HOME");
    }

    #[test]
    fn test_rewire_is_idempotent() {
        let global = PathBuf::from("/home/user/.claude-env");
        let original = "export PATH=\"$HOME/bin:$PATH\"\nalias ll='ls -l'\n\n# Claude Model Switcher - Auto Generated\nif [ -f \"/home/user/.claude-env\" ]; then\n  source \"/home/user/.claude-env\"\nfi\n";

        let once = rewire_rc_content(original, &global);
        let twice = rewire_rc_content(&once, &global);

        assert_eq!(once, twice);
        // 用户内容保留
        assert!(once.contains("alias ll='ls -l'"));
        // 恰好一个 source 块（if 判断行 + source 行）
        assert_eq!(once.matches(GLOBAL_ENV_MARKER).count(), 2);
    }

    #[test]
    fn test_rewire_removes_stale_exports_and_orphan_fi() {
        let global = PathBuf::from("/home/user/.claude-env");
        let stale = "export ANTHROPIC_BASE_URL=\"https://old.example.com\"\nexport ANTHROPIC_API_KEY=\"sk-old\"\nfi\nexport EDITOR=vim\n";

        let rewired = rewire_rc_content(stale, &global);

        assert!(!rewired.contains("old.example.com"));
        assert!(!rewired.contains("sk-old"));
        assert!(rewired.contains("export EDITOR=vim"));
        // 只剩规范块里的 fi
        assert_eq!(rewired.matches("\nfi\n").count(), 1);
    }

    #[test]
    fn test_rewire_keeps_other_if_blocks() {
        let global = PathBuf::from("/home/user/.claude-env");
        let content = "if [ -d \"$HOME/.cargo\" ]; then\n  . \"$HOME/.cargo/env\"\nfi\n";

        let rewired = rewire_rc_content(content, &global);

        // 无关 if 块的主体保留；其收尾 fi 会被规范块补回
        assert!(rewired.contains(".cargo/env"));
        assert!(rewired.contains(BLOCK_MARKER));
    }

    #[test]
    #[serial]
    fn test_patch_settings_preserves_unrelated_fields() {
        let dir = tempdir().unwrap();
        std::env::set_var("CLAUDE_SWITCHER_HOME", dir.path());

        let settings_path = get_claude_settings_path();
        let existing = serde_json::json!({
            "permissions": { "allow": ["Bash(ls:*)"] },
            "env": { "CUSTOM_VAR": "keep-me" }
        });
        write_json_file(&settings_path, &existing).unwrap();

        let snapshot = EnvironmentSnapshot::from_profile(&sample_profile());
        assert!(ProjectorService::patch_claude_settings(&snapshot).unwrap());

        let patched: Value = read_json_file(&settings_path).unwrap();
        assert_eq!(patched["permissions"]["allow"][0], "Bash(ls:*)");
        assert_eq!(patched["env"]["CUSTOM_VAR"], "keep-me");
        assert_eq!(patched["env"][BASE_URL_VAR], "https://api.moonshot.cn/anthropic");
        assert_eq!(patched["env"][API_KEY_VAR], "sk-test");

        std::env::remove_var("CLAUDE_SWITCHER_HOME");
    }

    #[test]
    #[serial]
    fn test_patch_settings_missing_file_is_skipped() {
        let dir = tempdir().unwrap();
        std::env::set_var("CLAUDE_SWITCHER_HOME", dir.path());

        let snapshot = EnvironmentSnapshot::from_profile(&sample_profile());
        assert!(!ProjectorService::patch_claude_settings(&snapshot).unwrap());
        // 不创建文件
        assert!(!get_claude_settings_path().exists());

        std::env::remove_var("CLAUDE_SWITCHER_HOME");
    }

    #[test]
    #[serial]
    fn test_wire_shell_configs_twice_is_byte_identical() {
        let dir = tempdir().unwrap();
        std::env::set_var("CLAUDE_SWITCHER_HOME", dir.path());

        let zshrc = dir.path().join(".zshrc");
        std::fs::write(&zshrc, "export PATH=\"$HOME/bin:$PATH\"\n").unwrap();

        let global = get_global_env_path();
        let updated = ProjectorService::wire_shell_configs(&global);
        assert_eq!(updated, vec![zshrc.clone()]);
        let first = std::fs::read_to_string(&zshrc).unwrap();

        ProjectorService::wire_shell_configs(&global);
        let second = std::fs::read_to_string(&zshrc).unwrap();

        assert_eq!(first, second);
        assert!(first.contains(BLOCK_MARKER));

        std::env::remove_var("CLAUDE_SWITCHER_HOME");
    }
}
