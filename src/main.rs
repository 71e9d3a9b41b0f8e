//! form-builder 命令行
//!
//! ```bash
//! form-builder validate drafts/
//! form-builder submit drafts/survey.toml
//! form-builder load 42 43 --out drafts/
//! form-builder history 42 --page 2
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use form_builder::app::App;
use form_builder::config::Config;
use form_builder::logger;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "form-builder")]
#[command(version)]
#[command(about = "表单构建器：校验、提交、加载表单", long_about = None)]
struct Cli {
    /// 服务端根地址
    #[arg(long, env = "FORM_BUILDER_BASE_URL")]
    base_url: Option<String>,

    /// TOML 配置文件
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// 显示详细日志
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 校验草稿文件或文件夹
    Validate { path: PathBuf },
    /// 提交草稿
    Submit {
        path: PathBuf,
        /// 使用 JSON 接口而不是原生表单提交
        #[arg(long)]
        json: bool,
    },
    /// 按 id 加载表单
    Load {
        #[arg(required = true)]
        ids: Vec<String>,
        /// 另存为 TOML 草稿的文件夹
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// 查看加载记录
    History {
        id: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        per_page: u32,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Validate { .. } => "validate",
            Commands::Submit { .. } => "submit",
            Commands::Load { .. } => "load",
            Commands::History { .. } => "history",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置：文件优先，其次环境变量；命令行参数覆盖
    let mut config = match &cli.config {
        Some(path) => Config::from_toml_file(path)
            .with_context(|| format!("无法加载配置文件: {}", path.display()))?,
        None => Config::from_env(),
    };
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    config.verbose_logging |= cli.verbose;

    // 初始化日志
    logger::init_with_verbose(config.verbose_logging);

    let app = App::initialize(config, cli.command.name())?;

    match cli.command {
        Commands::Validate { path } => app.validate(&path).await,
        Commands::Submit { path, json } => app.submit(&path, json).await,
        Commands::Load { ids, out } => app.load(&ids, out.as_deref()).await,
        Commands::History { id, page, per_page } => app.history(&id, page, per_page).await,
    }
}
