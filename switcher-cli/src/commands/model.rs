//! 模型操作命令实现
//!
//! 切换、编辑、删除、查看当前模型。

use anyhow::{bail, Result};
use chrono::{Local, TimeZone};
use colored::Colorize;

use switcher_core::{
    ActiveService, CatalogService, ProjectionReport, SwitchOutcome, SwitchService,
};

use crate::output::{print_error, print_info, print_success, print_warning, OutputContext};
use crate::prompts::{confirm, read_optional, TerminalPrompt};

/// 切换到指定模型
pub fn switch(ctx: &OutputContext, key: &str, edit_first: bool) -> Result<()> {
    if edit_first {
        edit(ctx, key)?;
    }

    let catalog = CatalogService::load();
    if let Some(profile) = catalog.get(key) {
        print_info(&format!("🔄 正在切换到 {}...", profile.name));
    }

    let outcome = tokio::runtime::Runtime::new()?
        .block_on(SwitchService::switch(&TerminalPrompt, key))?;

    match outcome {
        SwitchOutcome::Completed {
            profile,
            snapshot,
            report,
            probe_ok,
        } => {
            // 进程环境的投影：入口边界唯一一次显式副作用
            snapshot.apply();

            print_success(&format!("已切换到 {}", profile.name));
            print_info(&format!("🔗 Base URL: {}", profile.base_url));
            print_info(&format!("🤖 模型: {}", profile.resolved_model()));
            if profile.has_api_key() {
                print_info("🔑 API Key 已配置");
            }

            report_projection(&report);

            if probe_ok {
                print_success("连通性探测通过");
            } else {
                print_warning("连通性探测失败（部分模型属正常情况）");
            }

            println!(
                "{}",
                "💡 新终端会自动生效；当前终端可执行 source ~/.claude-env".dimmed()
            );
            Ok(())
        }
        SwitchOutcome::Aborted { reason } => {
            print_warning(&format!("已取消切换: {}", reason));

            // 提示可用的模型键
            let catalog = CatalogService::load();
            print_info("可用的模型:");
            for (key, profile) in &catalog {
                println!("  - {} {}", key.cyan(), profile.name);
            }
            Ok(())
        }
    }
}

/// 展示投影报告中的非致命异常
fn report_projection(report: &ProjectionReport) {
    if !report.settings_updated {
        print_warning("未找到 Claude Code settings.json，已跳过同步");
    }
    if !report.session_script_written || !report.global_script_written {
        print_warning("部分环境脚本写入失败，详见日志");
    }
    log::debug!("已接线的 Shell 启动文件: {:?}", report.shell_files_updated);
}

/// 编辑模型配置
pub fn edit(_ctx: &OutputContext, key: &str) -> Result<()> {
    let catalog = CatalogService::load();
    let profile = match catalog.get(key) {
        Some(profile) => profile.clone(),
        None => {
            print_error(&format!("未知模型: {}", key));
            bail!("模型不存在");
        }
    };

    println!("{}", format!("🔧 编辑 {} 的配置", profile.name).blue());

    let base_url = read_optional("Base URL", Some(&profile.base_url))?;
    let api_key = if profile.requires_api_key() {
        read_optional(
            "API Key",
            if profile.has_api_key() {
                Some(profile.api_key.as_str())
            } else {
                None
            },
        )?
    } else {
        None
    };
    let model_override = read_optional("模型版本", Some(profile.resolved_model()))?;

    CatalogService::update(key, base_url, api_key)?;
    if let Some(model) = model_override {
        if model != profile.default_model {
            CatalogService::set_model_override(key, &model)?;
        }
    }

    print_success(&format!("已更新 {} 的配置", profile.name));
    Ok(())
}

/// 删除自定义模型
pub fn remove(_ctx: &OutputContext, key: &str, yes: bool) -> Result<()> {
    if !yes && !confirm(&format!("确认删除模型 \"{}\"?", key), false)? {
        print_info("已取消删除");
        return Ok(());
    }

    match CatalogService::delete(key) {
        Ok(()) => {
            print_success(&format!("已删除模型: {}", key));
            Ok(())
        }
        Err(e) => {
            print_error(&e.to_string());
            bail!("删除失败");
        }
    }
}

/// 显示当前激活的模型
pub fn current(_ctx: &OutputContext) -> Result<()> {
    let active = ActiveService::get();
    let catalog = CatalogService::load();

    match catalog.get(&active.model) {
        Some(profile) => {
            print_success(&format!("📍 当前模型: {} ({})", profile.name, active.model));
            print_info(&format!("🔗 Base URL: {}", profile.base_url));
            print_info(&format!("🤖 模型: {}", profile.resolved_model()));

            if let Some(switched_at) = Local.timestamp_millis_opt(active.timestamp).single() {
                println!(
                    "{}",
                    format!("📅 最近切换: {}", switched_at.format("%Y-%m-%d %H:%M:%S")).dimmed()
                );
            }
        }
        None => {
            // 激活记录指向已删除的键，按"无激活模型"处理
            print_warning("当前没有激活的模型");
        }
    }

    Ok(())
}
