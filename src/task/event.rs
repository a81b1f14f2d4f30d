use crate::common::api::models::task::{CaptchaImage, CaptchaResponse, StatusResponse, TaskStatus};

/// 投递给状态机的事件，网络回调和计时器都会转换成事件
#[derive(Debug, Clone)]
pub enum Event {
    /// 服务端已创建任务
    Started { task_id: String },
    /// 轮询计时器触发，带着计时器的任务和代数
    Tick { task_id: String, generation: u64 },
    /// 状态响应，带着发起请求时计时器的代数
    StatusReceived {
        task_id: String,
        generation: u64,
        response: StatusResponse,
    },
    StatusFailed {
        task_id: String,
        generation: u64,
        error: String,
    },
    /// 用户输入了验证码
    CaptchaEntered { task_id: String, code: String },
    CaptchaAnswered {
        task_id: String,
        response: CaptchaResponse,
    },
    CaptchaFailed { task_id: String, error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Danger,
}

/// 状态机产出的副作用，按顺序执行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StopPolling,
    StartPolling { task_id: String, generation: u64 },
    FetchStatus { task_id: String, generation: u64 },
    SubmitCaptcha { task_id: String, code: String },
    ShowStatus {
        status: TaskStatus,
        message: String,
        filename: Option<String>,
    },
    ShowCaptcha {
        task_id: String,
        image: Option<CaptchaImage>,
    },
    UpdateCaptcha { image: CaptchaImage },
    /// 清空输入框并重新聚焦
    ResetCaptchaInput,
    HideCaptcha,
    Notify { level: NoticeLevel, message: String },
    /// 通知外部刷新文件列表
    RefreshFiles,
}
