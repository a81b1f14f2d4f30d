use crate::common::api::models::files::FileEntry;
use crate::common::api::models::patent::PatentSummary;
use crate::common::api::models::task::{CaptchaImage, TaskStatus};

use super::event::NoticeLevel;

/// 展示层协作者：状态文字、提示消息、验证码窗口、文件列表
pub trait Presenter: Send {
    fn show_status(&mut self, status: &TaskStatus, message: &str, filename: Option<&str>);

    fn notify(&mut self, level: NoticeLevel, message: &str);

    fn show_captcha(&mut self, task_id: &str, image: Option<&CaptchaImage>);

    /// 验证码窗口已打开时只替换图片
    fn update_captcha(&mut self, image: &CaptchaImage);

    fn reset_captcha_input(&mut self);

    fn hide_captcha(&mut self);

    fn show_files(&mut self, files: &[FileEntry]);

    fn show_search_results(&mut self, keywords: &str, page: u32, patents: &[PatentSummary]);
}
