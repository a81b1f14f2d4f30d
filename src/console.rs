use std::io::Write;
use std::path::{Path, PathBuf};

use colored::Colorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, error, warn};

use crate::common::api::error::ApiError;
use crate::common::api::models::files::FileEntry;
use crate::common::api::models::patent::PatentSummary;
use crate::common::api::models::task::{CaptchaImage, TaskStatus};
use crate::common::logger::PrettyLogger;
use crate::common::utils::{format_file_size, format_modified_time};
use crate::task::{NoticeLevel, Presenter};

/// 终端展示层，验证码图片写到磁盘供用户打开
#[derive(Debug)]
pub struct ConsolePresenter {
    captcha_dir: PathBuf,
    captcha_path: Option<PathBuf>,
}

impl ConsolePresenter {
    pub fn new(captcha_dir: impl Into<PathBuf>) -> Self {
        Self {
            captcha_dir: captcha_dir.into(),
            captcha_path: None,
        }
    }

    /// 当前验证码图片的位置
    pub fn captcha_path(&self) -> Option<&Path> {
        self.captcha_path.as_deref()
    }

    fn save_captcha(&mut self, task_id: &str, image: &CaptchaImage) -> Result<PathBuf, ApiError> {
        let bytes = image.decode()?;
        std::fs::create_dir_all(&self.captcha_dir)?;
        let path = self
            .captcha_dir
            .join(format!("captcha_{}.png", sanitize_file_stem(task_id)));
        std::fs::write(&path, bytes)?;
        self.captcha_path = Some(path.clone());
        Ok(path)
    }

    fn present_captcha(&mut self, task_id: &str, image: &CaptchaImage) {
        match self.save_captcha(task_id, image) {
            Ok(path) => {
                PrettyLogger::file_info("验证码图片", path.display().to_string());
            }
            Err(e) => {
                error!("保存验证码图片失败: {}", e);
                PrettyLogger::error(format!("无法保存验证码图片: {}", e));
            }
        }
    }
}

impl Presenter for ConsolePresenter {
    fn show_status(&mut self, status: &TaskStatus, message: &str, filename: Option<&str>) {
        PrettyLogger::task_status(status.as_str(), message);
        if let (TaskStatus::Completed, Some(filename)) = (status, filename) {
            println!("  {} {}", "文件名:".bright_black(), filename);
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => PrettyLogger::info(message),
            NoticeLevel::Success => PrettyLogger::success(message),
            NoticeLevel::Warning => PrettyLogger::warning(message),
            NoticeLevel::Danger => PrettyLogger::error(message),
        }
    }

    fn show_captcha(&mut self, task_id: &str, image: Option<&CaptchaImage>) {
        PrettyLogger::separator();
        PrettyLogger::warning(format!("任务 {} 需要输入验证码", task_id));
        match image {
            Some(image) => self.present_captcha(task_id, image),
            None => PrettyLogger::warning("服务端未提供验证码图片"),
        }
    }

    fn update_captcha(&mut self, image: &CaptchaImage) {
        // 文件名只和任务有关，新图片直接覆盖旧图片
        let stem = self
            .captcha_path
            .as_ref()
            .and_then(|path| path.file_stem())
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.strip_prefix("captcha_"))
            .unwrap_or("current")
            .to_string();
        PrettyLogger::info("验证码已刷新");
        self.present_captcha(&stem, image);
    }

    fn reset_captcha_input(&mut self) {
        PrettyLogger::waiting("请重新输入验证码");
    }

    fn hide_captcha(&mut self) {
        debug!("关闭验证码提示");
        if let Some(path) = self.captcha_path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("删除验证码图片失败 {}: {}", path.display(), e);
            }
        }
        PrettyLogger::separator();
    }

    fn show_files(&mut self, files: &[FileEntry]) {
        if files.is_empty() {
            PrettyLogger::info("暂无已下载的文件");
            return;
        }
        for file in files {
            PrettyLogger::file_info(
                &file.filename,
                format!(
                    "大小: {} | 修改时间: {}",
                    format_file_size(file.size),
                    format_modified_time(file.modified_time)
                ),
            );
        }
    }

    fn show_search_results(&mut self, keywords: &str, page: u32, patents: &[PatentSummary]) {
        if patents.is_empty() {
            PrettyLogger::info("未找到相关专利");
            return;
        }

        println!(
            "关键词: {} | 第 {} 页 | 共 {} 条结果",
            keywords.bold(),
            page,
            patents.len()
        );
        PrettyLogger::separator();
        for patent in patents {
            println!("{}", patent.title.as_deref().unwrap_or("无标题").bold());
            println!(
                "  专利号: {}",
                patent.patent_no.as_deref().unwrap_or("未知").cyan()
            );
            println!("  申请人: {}", patent.applicant.as_deref().unwrap_or("未知"));
        }
    }
}

/// 从终端读取用户输入的验证码
pub struct CaptchaPrompt<R> {
    lines: Lines<R>,
}

impl CaptchaPrompt<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> CaptchaPrompt<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// 读取一行输入，输入流结束时返回 None
    pub async fn read_code(&mut self) -> std::io::Result<Option<String>> {
        print!("{} ", "请输入验证码:".cyan().bold());
        std::io::stdout().flush()?;
        self.lines.next_line().await
    }
}

/// 任务 ID 作文件名时只保留安全字符
pub fn sanitize_file_stem(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_ids_become_safe_file_names() {
        assert_eq!(sanitize_file_stem("download_CN1234_1700000000"), "download_CN1234_1700000000");
        assert_eq!(sanitize_file_stem("../a b/c"), "___a_b_c");
    }

    #[tokio::test]
    async fn prompt_reads_lines_until_eof() {
        let mut prompt = CaptchaPrompt::new(&b"AB12\n\n"[..]);
        assert_eq!(prompt.read_code().await.unwrap().as_deref(), Some("AB12"));
        assert_eq!(prompt.read_code().await.unwrap().as_deref(), Some(""));
        assert_eq!(prompt.read_code().await.unwrap(), None);
    }

    #[test]
    fn captcha_is_written_and_removed() {
        let dir = std::env::temp_dir().join(format!("patentdl-captcha-{}", std::process::id()));
        let mut presenter = ConsolePresenter::new(&dir);

        presenter.show_captcha("T1", Some(&CaptchaImage::new("aGVsbG8=")));
        let path = presenter.captcha_path().unwrap().to_path_buf();
        assert_eq!(path, dir.join("captcha_T1.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");

        presenter.update_captcha(&CaptchaImage::new("d29ybGQ="));
        assert_eq!(std::fs::read(&path).unwrap(), b"world");

        presenter.hide_captcha();
        assert!(!path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn hiding_survives_missing_captcha_file() {
        let dir = std::env::temp_dir().join(format!("patentdl-captcha-gone-{}", std::process::id()));
        let mut presenter = ConsolePresenter::new(&dir);

        presenter.show_captcha("T9", Some(&CaptchaImage::new("aGVsbG8=")));
        let path = presenter.captcha_path().unwrap().to_path_buf();
        std::fs::remove_file(&path).unwrap();

        presenter.hide_captcha();
        assert_eq!(presenter.captcha_path(), None);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
