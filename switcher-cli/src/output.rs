//! 输出格式化模块
//!
//! 处理表格、JSON、YAML 等输出格式。

use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::cli::OutputFormat;

/// 输出上下文
pub struct OutputContext {
    pub format: OutputFormat,
    #[allow(dead_code)]
    pub no_color: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, no_color }
    }
}

/// 模型列表行
#[derive(Tabled, Serialize)]
pub struct ModelRow {
    #[tabled(rename = " ")]
    #[serde(skip)]
    pub marker: String,
    #[tabled(rename = "键")]
    pub key: String,
    #[tabled(rename = "名称")]
    pub name: String,
    #[tabled(rename = "Base URL")]
    pub base_url: String,
    #[tabled(rename = "模型")]
    pub model: String,
    #[tabled(rename = "API Key")]
    pub api_key: String,
}

/// 连通性状态行
#[derive(Tabled, Serialize)]
pub struct StatusRow {
    #[tabled(rename = "键")]
    pub key: String,
    #[tabled(rename = "名称")]
    pub name: String,
    #[tabled(rename = "连通性")]
    pub connected: String,
    #[tabled(rename = "API Key")]
    pub api_key: String,
}

/// 按输出格式打印行集合
pub fn print_rows<T: Tabled + Serialize>(ctx: &OutputContext, rows: Vec<T>, empty_hint: &str) {
    match ctx.format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", empty_hint.dimmed());
                return;
            }
            let table = Table::new(&rows).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&rows).unwrap_or_default();
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&rows).unwrap_or_default();
            println!("{}", yaml);
        }
    }
}

/// 打印成功消息
pub fn print_success(msg: &str) {
    println!("{} {}", "✅".green(), msg.green());
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "❌".red(), msg.red());
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    println!("{} {}", "⚠️".yellow(), msg.yellow());
}

/// 打印提示消息
pub fn print_info(msg: &str) {
    println!("{} {}", "ℹ️".blue(), msg);
}

/// 掩码敏感值
///
/// 按字符而非字节截取，凭据包含多字节字符时不会落在字符边界外。
pub fn mask_value(value: &str) -> String {
    if value.is_empty() {
        return "未配置".to_string();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_value() {
        assert_eq!(mask_value(""), "未配置");
        assert_eq!(mask_value("short"), "*****");
        assert_eq!(mask_value("sk-ant-api03-xxxxxxxxxxxxx"), "sk-a...xxxx");
    }

    #[test]
    fn test_mask_value_multibyte() {
        // 中文等多字节凭据按字符掩码
        assert_eq!(mask_value("密钥密钥密钥"), "******");
        assert_eq!(mask_value("密钥密钥密钥密钥密"), "密钥密钥...钥密钥密");
    }
}
