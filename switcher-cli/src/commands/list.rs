//! 模型列表命令实现

use anyhow::Result;
use colored::Colorize;

use switcher_core::{ActiveService, CatalogService};

use crate::cli::OutputFormat;
use crate::output::{mask_value, print_rows, ModelRow, OutputContext};

/// 列出模型
///
/// `custom_only` 为 true 时只列出自定义模型。
pub fn list_models(ctx: &OutputContext, custom_only: bool) -> Result<()> {
    let catalog = CatalogService::load();
    let active = ActiveService::get();
    // 仅表格输出着色；JSON/YAML 序列化纯文本，不能混入 ANSI 转义
    let styled = matches!(ctx.format, OutputFormat::Table);

    let rows: Vec<ModelRow> = catalog
        .values()
        .filter(|p| !custom_only || p.is_custom)
        .map(|p| {
            let is_active = p.key == active.model;
            let marker = if is_active { "●" } else { "○" };
            ModelRow {
                marker: match (styled, is_active) {
                    (true, true) => marker.green().to_string(),
                    (true, false) => marker.dimmed().to_string(),
                    (false, _) => marker.to_string(),
                },
                key: p.key.clone(),
                name: if styled && is_active {
                    p.name.green().bold().to_string()
                } else {
                    p.name.clone()
                },
                base_url: p.base_url.clone(),
                model: p.resolved_model().to_string(),
                api_key: mask_value(&p.api_key),
            }
        })
        .collect();

    let empty_hint = if custom_only {
        "没有自定义模型"
    } else {
        "没有配置模型"
    };
    print_rows(ctx, rows, empty_hint);
    Ok(())
}
