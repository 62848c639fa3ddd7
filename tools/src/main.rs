//! duel-tools：搜尋、自我對戰與隊伍檢查

mod common;
mod search;
mod selfplay;
mod validate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// 雙隊棋盤對戰引擎的命令列工具
#[derive(Parser, Debug)]
#[command(name = "duel-tools")]
#[command(version, about, long_about = None)]
struct Args {
    /// 額外的資料檔（TOML），覆蓋內建的同名英雄與技能
    #[arg(long = "data", global = true)]
    data: Vec<PathBuf>,

    /// 引擎設定檔（TOML）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 讀取 JSON 搜尋請求，輸出 JSON 回應
    Search {
        /// 請求檔；省略時從 stdin 讀取
        input: Option<PathBuf>,

        /// 覆蓋請求中的深度
        #[arg(short, long)]
        depth: Option<u32>,
    },

    /// 兩邊都用搜尋下完一局（只限決鬥模式）
    Selfplay {
        /// 對局檔（TOML）
        #[arg(required = true)]
        match_file: PathBuf,

        /// 最多執行的行動數
        #[arg(long, default_value = "200")]
        max_actions: u32,
    },

    /// 檢查隊伍檔
    Validate {
        /// 隊伍檔（TOML）
        #[arg(required = true)]
        team_file: PathBuf,
    },
}

fn run(args: Args) -> anyhow::Result<()> {
    let data = common::load_data(&args.data)?;
    let config = common::load_config(args.config.as_deref())?;
    match args.command {
        Commands::Search { input, depth } => {
            search::execute(&data, &config, input.as_deref(), depth)
        }
        Commands::Selfplay {
            match_file,
            max_actions,
        } => selfplay::execute(&data, &config, &match_file, max_actions),
        Commands::Validate { team_file } => validate::execute(&data, &team_file),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // stdout 留給 JSON 輸出
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
