use std::fmt;

use crate::common::api::models::task::{CaptchaImage, TaskStatus};

/// 协调器状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    #[default]
    Idle,
    Pending,
    Downloading,
    NeedCaptcha,
    Completed,
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }

    /// 处于这两个状态时轮询计时器应当存活
    pub fn is_polling(&self) -> bool {
        matches!(self, TaskState::Pending | TaskState::Downloading)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::Idle => "空闲",
            TaskState::Pending => "等待中",
            TaskState::Downloading => "下载中",
            TaskState::NeedCaptcha => "等待验证码",
            TaskState::Completed => "已完成",
            TaskState::Failed => "失败",
        };
        f.write_str(name)
    }
}

/// 当前活跃的下载任务
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub status: TaskStatus,
    pub message: Option<String>,
    pub filename: Option<String>,
    pub captcha_image: Option<CaptchaImage>,
}

impl Task {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: TaskStatus::Pending,
            message: None,
            filename: None,
            captcha_image: None,
        }
    }
}
