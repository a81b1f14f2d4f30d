use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, info, warn};

use patent_dl::cli::{Cli, Command};
use patent_dl::common::api::client::PatentClient;
use patent_dl::common::config::ClientConfig;
use patent_dl::common::qr_display::display_qr;
use patent_dl::console::{CaptchaPrompt, ConsolePresenter};
use patent_dl::log_success;
use patent_dl::task::{TaskRunner, TaskState};

type Runner = TaskRunner<PatentClient, ConsolePresenter>;

fn create_runner(client: Arc<PatentClient>, config: &ClientConfig) -> Runner {
    let presenter = ConsolePresenter::new(config.output_dir.join("captcha"));
    TaskRunner::new(client, presenter, config.poll_interval)
}

/// 下载流程：启动任务后轮询，需要验证码时从终端读取
async fn handle_download(
    client: Arc<PatentClient>,
    config: &ClientConfig,
    patent_no: &str,
    save: bool,
) -> Result<()> {
    let mut runner = create_runner(Arc::clone(&client), config);
    let Some(task_id) = runner.start_download(patent_no).await else {
        return Ok(());
    };

    let mut prompt = CaptchaPrompt::stdin();
    loop {
        match runner.run_until_blocked().await {
            TaskState::NeedCaptcha => {
                let Some(code) = prompt.read_code().await? else {
                    bail!("输入已结束，未提交验证码");
                };
                runner.submit_captcha(&task_id, &code);
            }
            TaskState::Completed => break,
            TaskState::Failed => bail!("专利下载失败"),
            state => bail!("任务意外停止: {}", state),
        }
    }

    let filename = runner
        .coordinator()
        .active_task()
        .and_then(|task| task.filename.clone());
    match (save, filename) {
        (true, Some(filename)) => {
            let path = client
                .fetch_file(&filename, &config.output_dir)
                .await
                .with_context(|| format!("取回文件失败: {}", filename))?;
            log_success!("已保存到 {}", path.display());
        }
        (true, None) => warn!("服务端未返回文件名，无法取回"),
        _ => {}
    }
    Ok(())
}

async fn run(args: Cli) -> Result<()> {
    let config = args.client_config();
    debug!("配置: {:?}", config);
    let client = Arc::new(PatentClient::new(&config).context("创建客户端失败")?);

    match &args.command {
        Command::Download { patent_no, save } => {
            info!("开始下载专利: {}", patent_no);
            handle_download(client, &config, patent_no, *save).await?;
        }
        Command::Search { keywords, page } => {
            let mut runner = create_runner(client, &config);
            runner.search(keywords, *page).await;
        }
        Command::Files => {
            let mut runner = create_runner(client, &config);
            runner.refresh_files().await;
        }
        Command::Fetch { filename } => {
            let path = client
                .fetch_file(filename, &config.output_dir)
                .await
                .with_context(|| format!("取回文件失败: {}", filename))?;
            log_success!("已保存到 {}", path.display());
        }
        Command::Qr { filename } => {
            let url = client.file_url(filename)?;
            display_qr(url.as_str()).context("生成二维码失败")?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // 初始化日志
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    tokio::select! {
        result = run(args) => result,
        _ = tokio::signal::ctrl_c() => {
            // 丢弃运行器时轮询计时器随之取消
            warn!("已取消");
            Ok(())
        }
    }
}
