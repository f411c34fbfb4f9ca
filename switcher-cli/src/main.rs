//! Claude Switcher CLI
//!
//! Claude Code 多模型 API 切换工具。切换会同时更新进程环境、
//! Claude Code settings.json、环境脚本与 Shell 启动文件接线。
//!
//! # 使用示例
//!
//! ```bash
//! # 列出所有模型
//! claude-switcher list
//!
//! # 切换到 Kimi
//! claude-switcher kimi
//!
//! # 先编辑配置再切换
//! claude-switcher kimi -e
//!
//! # 查看当前激活的模型
//! claude-switcher current
//! ```

mod cli;
mod commands;
mod output;
mod prompts;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use cli::Cli;
use commands::execute;

fn main() -> Result<()> {
    // 初始化日志
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    // 解析命令行参数
    let cli = Cli::parse();

    // 无子命令也无模型键时显示帮助
    if cli.command.is_none() && cli.model.is_none() {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    }

    // 执行命令
    execute(cli)
}
