use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use tracing::{info, warn};

use biblia_fluida::utils::logging;
use biblia_fluida::{App, Config};

const USAGE: &str = "用法:
  biblia-fluida read <语言> <书卷> <章>
  biblia-fluida batch <书卷> [章数]

环境变量 CONFIG_FILE 可指定 TOML 配置文件";

/// 命令行命令
enum Command {
    Read {
        language: String,
        book: String,
        chapter: u32,
    },
    Batch {
        book: String,
        total: Option<u32>,
    },
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args {
        [cmd, language, book, chapter] if cmd == "read" => Ok(Command::Read {
            language: language.clone(),
            book: book.clone(),
            chapter: chapter
                .parse()
                .with_context(|| format!("章节号无效: {}", chapter))?,
        }),
        [cmd, book] if cmd == "batch" => Ok(Command::Batch {
            book: book.clone(),
            total: None,
        }),
        [cmd, book, total] if cmd == "batch" => Ok(Command::Batch {
            book: book.clone(),
            total: Some(
                total
                    .parse()
                    .with_context(|| format!("章数无效: {}", total))?,
            ),
        }),
        _ => bail!("{}", USAGE),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config_path = std::env::var("CONFIG_FILE").ok().map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    // 初始化日志
    logging::init(&config.log_filter);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    // 初始化并运行应用
    let app = App::initialize(config).await?;

    match command {
        Command::Read {
            language,
            book,
            chapter,
        } => {
            let content = app.read(&language, &book, chapter).await?;
            println!("{}", content.to_markdown());
        }
        Command::Batch { book, total } => run_batch(&app, &book, total).await?,
    }

    Ok(())
}

/// 运行批量任务：打印进度，Ctrl-C 取消，结束后写日志文件
async fn run_batch(app: &App, book: &str, total: Option<u32>) -> Result<()> {
    let handle = app.start_batch(book, total)?;

    let cancel = handle.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 收到中断信号，当前章节结束后停止");
            cancel.cancel();
        }
    });

    let mut printed = 0;
    let mut snapshots = Box::pin(handle.snapshots());
    while let Some(run) = snapshots.next().await {
        for line in run.log.iter().skip(printed) {
            println!("{}", line);
        }
        printed = run.log.len();
        info!(
            "进度 {}/{}: 生成 {} / 已存在 {} / 失败 {}",
            run.current, run.total, run.generated, run.skipped, run.errors
        );
    }

    let run = handle.join().await?;
    logging::append_run_log(Path::new(&app.config().output_log_file), &run).await?;
    Ok(())
}
