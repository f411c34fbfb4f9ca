//! 连通性状态命令实现

use anyhow::Result;
use colored::Colorize;

use switcher_core::{CatalogService, ProbeService};

use crate::cli::OutputFormat;
use crate::output::{print_rows, OutputContext, StatusRow};

/// 并发探测所有模型并汇总展示
pub async fn show_status(ctx: &OutputContext) -> Result<()> {
    let catalog = CatalogService::load();
    let statuses = ProbeService::status_all(&catalog).await;
    // 与列表命令一致：仅表格输出着色
    let styled = matches!(ctx.format, OutputFormat::Table);

    let rows: Vec<StatusRow> = statuses
        .into_iter()
        .map(|s| {
            let connected = if s.connected { "✓ 可达" } else { "✗ 不可达" };
            StatusRow {
                key: s.key,
                name: s.name,
                connected: match (styled, s.connected) {
                    (true, true) => connected.green().to_string(),
                    (true, false) => connected.red().to_string(),
                    (false, _) => connected.to_string(),
                },
                api_key: if s.has_api_key {
                    "已配置".to_string()
                } else if styled {
                    "未配置".dimmed().to_string()
                } else {
                    "未配置".to_string()
                },
            }
        })
        .collect();

    print_rows(ctx, rows, "没有配置模型");
    Ok(())
}
