//! 命令执行模块
//!
//! 实现各个 CLI 子命令的具体逻辑。

pub mod list;
pub mod model;
pub mod status;

use anyhow::Result;

use crate::cli::{Cli, Commands};
use crate::output::OutputContext;

/// 执行 CLI 命令
pub fn execute(cli: Cli) -> Result<()> {
    let ctx = OutputContext::new(cli.format, cli.no_color);

    // 直接传模型键时等价于 use 子命令
    let command = match cli.command {
        Some(command) => command,
        None => {
            let model = cli
                .model
                .expect("main.rs 已处理无参数的情况");
            return model::switch(&ctx, &model.to_lowercase(), cli.edit);
        }
    };

    match command {
        Commands::Use { model, edit } => model::switch(&ctx, &model.to_lowercase(), edit),
        Commands::List => list::list_models(&ctx, false),
        Commands::Custom => list::list_models(&ctx, true),
        Commands::Remove { key, yes } => model::remove(&ctx, &key, yes),
        Commands::Current => model::current(&ctx),
        Commands::Edit { model } => model::edit(&ctx, &model.to_lowercase()),
        Commands::Status => {
            tokio::runtime::Runtime::new()?.block_on(status::show_status(&ctx))
        }
    }
}
