use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::common::config::{ClientConfig, DEFAULT_SERVER};

/// 专利下载客户端
#[derive(Parser, Debug)]
#[command(name = "patentdl")]
#[command(version = "0.1")]
#[command(author = "rpeng252@gmail.com")]
#[command(about = "专利下载服务的命令行客户端", long_about = None)]
pub struct Cli {
    /// 服务地址
    #[arg(long, global = true, value_name = "URL")]
    #[arg(default_value = DEFAULT_SERVER)]
    #[arg(value_hint = clap::ValueHint::Url)]
    pub server: String,

    /// 状态轮询周期（毫秒）
    #[arg(long, global = true, value_name = "MS")]
    #[arg(default_value_t = 2000)]
    #[arg(value_parser = clap::value_parser!(u64).range(100..))]
    pub poll_interval: u64,

    /// 验证码图片和取回文件的保存目录
    #[arg(long, global = true, value_name = "DIR")]
    #[arg(default_value = "./downloads")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub output_dir: PathBuf,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 下载专利，需要时在终端输入验证码
    Download {
        /// 专利号
        #[arg(value_name = "PATENT_NO")]
        patent_no: String,

        /// 完成后把 PDF 取回到本地
        #[arg(long)]
        save: bool,
    },
    /// 按关键词检索专利
    Search {
        #[arg(value_name = "KEYWORDS")]
        keywords: String,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// 列出服务端已下载的文件
    Files,
    /// 把服务端已下载的文件取回到本地
    Fetch {
        #[arg(value_name = "FILENAME")]
        filename: String,
    },
    /// 显示文件下载链接的二维码
    Qr {
        #[arg(value_name = "FILENAME")]
        filename: String,
    },
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            server: self.server.clone(),
            poll_interval: Duration::from_millis(self.poll_interval),
            output_dir: self.output_dir.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_with_defaults() {
        let cli = Cli::try_parse_from(["patentdl", "download", "CN202310000000.1"]).unwrap();
        let config = cli.client_config();

        assert_eq!(config.poll_interval, Duration::from_millis(2000));
        assert_eq!(config.server, DEFAULT_SERVER);
        match cli.command {
            Command::Download { patent_no, save } => {
                assert_eq!(patent_no, "CN202310000000.1");
                assert!(!save);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "patentdl",
            "search",
            "锂电池",
            "--page",
            "3",
            "--server",
            "http://10.0.0.2:9898",
        ])
        .unwrap();
        assert_eq!(cli.server, "http://10.0.0.2:9898");
        assert!(matches!(cli.command, Command::Search { page: 3, .. }));
    }

    #[test]
    fn poll_interval_has_a_floor() {
        assert!(Cli::try_parse_from(["patentdl", "--poll-interval", "10", "files"]).is_err());
    }

    #[test]
    fn verify_command() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
