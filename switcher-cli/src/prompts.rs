//! 终端交互模块
//!
//! 实现核心库的 SwitchPrompt 接口，以及编辑/确认等通用输入。

use anyhow::Result;
use colored::Colorize;
use std::io::{self, Write};

use switcher_core::{CustomProfileInput, ModelProfile, SwitchPrompt};

/// 读取用户输入
pub fn read_input(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// 读取可选输入（允许空，回车采用默认值）
pub fn read_optional(prompt: &str, default: Option<&str>) -> Result<Option<String>> {
    let prompt_with_default = if let Some(d) = default {
        format!("{} [{}]: ", prompt, d.dimmed())
    } else {
        format!("{} (可选): ", prompt)
    };

    let input = read_input(&prompt_with_default)?;
    if input.is_empty() {
        Ok(default.map(|s| s.to_string()))
    } else {
        Ok(Some(input))
    }
}

/// 读取必填输入
pub fn read_required(prompt: &str) -> Result<String> {
    loop {
        let input = read_input(&format!("{}: ", prompt))?;
        if !input.is_empty() {
            return Ok(input);
        }
        println!("{}", "此项为必填，请输入内容".yellow());
    }
}

/// 读取是/否确认
pub fn confirm(prompt: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "[Y/n]" } else { "[y/N]" };
    let input = read_input(&format!("{} {}: ", prompt, hint))?;
    Ok(match input.to_lowercase().as_str() {
        "" => default_yes,
        "y" | "yes" => true,
        _ => false,
    })
}

/// 终端实现的切换交互
pub struct TerminalPrompt;

impl SwitchPrompt for TerminalPrompt {
    fn offer_custom_creation(&self, key: &str) -> Option<CustomProfileInput> {
        println!("{}", format!("未知模型: {}", key).yellow());

        let create = confirm(&format!("是否创建自定义模型 \"{}\"?", key), false).ok()?;
        if !create {
            return None;
        }

        let base_url = read_required("Base URL").ok()?;
        let api_key = read_optional("API Key", None).ok()?.unwrap_or_default();
        let default_model = read_optional("默认模型", None).ok()?.unwrap_or_default();
        let description = read_optional("备注", None).ok()?;

        Some(CustomProfileInput {
            key: key.to_string(),
            base_url,
            api_key_name: None,
            api_key,
            default_model,
            description,
        })
    }

    fn request_api_key(&self, profile: &ModelProfile) -> Option<String> {
        println!(
            "{}",
            format!("🔑 {} 需要配置 API Key", profile.name).yellow()
        );

        let configure = confirm("现在配置吗?", true).ok()?;
        if !configure {
            return None;
        }

        read_required(&format!("请输入 {} 的 API Key", profile.name)).ok()
    }
}
