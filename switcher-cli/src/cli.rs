//! CLI 参数定义模块
//!
//! 使用 clap 定义命令行接口结构。

use clap::{Parser, Subcommand, ValueEnum};

/// Claude Switcher - 多模型 API 切换工具
///
/// 在 Claude/Gemini/DeepSeek/Qwen/Kimi/GLM/Ollama 等 API 端点之间
/// 切换 Claude Code 使用的供应商。
#[derive(Parser, Debug)]
#[command(
    name = "claude-switcher",
    version,
    author,
    about = "🔄 Claude Code 多模型 API 切换工具",
    args_conflicts_with_subcommands = true,
    long_about = r#"
在多个 AI 供应商端点之间切换本机 Claude Code 使用的 API 配置。

切换会同时更新：当前进程环境、~/.claude/settings.json、
会话环境脚本以及 Shell 启动文件 source 的全局环境脚本。

🚀 快速开始:
   claude-switcher list           查看所有模型
   claude-switcher kimi           切换到 Kimi
   claude-switcher kimi -e        先编辑 Kimi 配置再切换
   claude-switcher current        查看当前激活的模型
"#,
    after_help = r#"💡 提示: claude-switcher <模型键> 可直接切换，无需 use 子命令"#
)]
pub struct Cli {
    /// 输出格式
    #[arg(
        short = 'o',
        long,
        value_enum,
        default_value = "table",
        global = true,
        help = "输出格式 (table, json, yaml)"
    )]
    pub format: OutputFormat,

    /// 禁用彩色输出
    #[arg(long, global = true, help = "禁用彩色输出")]
    pub no_color: bool,

    /// 显示详细信息
    #[arg(short, long, global = true, help = "显示详细信息")]
    pub verbose: bool,

    /// 子命令
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// 直接切换到指定模型（等价于 use 子命令）
    pub model: Option<String>,

    /// 切换前先编辑模型配置
    #[arg(short = 'e', long)]
    pub edit: bool,
}

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// 表格格式（默认）
    Table,
    /// JSON 格式
    Json,
    /// YAML 格式
    Yaml,
}

/// 子命令定义
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 🔄 切换到指定模型
    #[command(
        visible_aliases = ["switch", "s"],
        long_about = "切换 Claude Code 到指定的模型端点。\n\n示例:\n  claude-switcher use kimi       切换到 Kimi\n  claude-switcher use kimi -e    先编辑配置再切换"
    )]
    Use {
        /// 模型键 (claude/gemini/deepseek/qwen/kimi/glm/ollama 或自定义键)
        model: String,

        /// 切换前先编辑模型配置
        #[arg(short = 'e', long)]
        edit: bool,
    },

    /// 📋 列出所有模型
    #[command(
        visible_aliases = ["ls", "l"],
        long_about = "列出目录中的所有模型，标记当前激活项。\n\n示例:\n  claude-switcher list            表格输出\n  claude-switcher list -o json    JSON 输出"
    )]
    List,

    /// 🧩 只列出自定义模型
    Custom,

    /// ❌ 删除自定义模型
    #[command(
        visible_alias = "rm",
        long_about = "删除指定的自定义模型，内置模型不可删除。\n\n示例:\n  claude-switcher remove myproxy     删除 myproxy\n  claude-switcher rm myproxy -y      跳过确认直接删除"
    )]
    Remove {
        /// 要删除的模型键
        key: String,

        /// 跳过确认直接删除
        #[arg(short = 'y', long, help = "跳过确认")]
        yes: bool,
    },

    /// 📍 显示当前激活的模型
    #[command(visible_alias = "c")]
    Current,

    /// 🔧 编辑模型配置 (Base URL / API Key / 模型版本)
    Edit {
        /// 模型键
        model: String,
    },

    /// 📊 探测所有模型的连通性状态
    #[command(long_about = "并发探测目录中每个模型的可达性并汇总展示。\n本地端点做真实探测，远端模型为占位结果。")]
    Status,
}
