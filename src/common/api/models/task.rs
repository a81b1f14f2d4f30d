use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::common::api::error::ApiError;

/// 服务端任务状态
///
/// 服务端的状态词表是权威来源，无法识别的值会落入 `Unknown`，
/// 由状态机当作空操作处理。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TaskStatus {
    Pending,
    Downloading,
    Completed,
    Failed,
    NeedCaptcha,
    Unknown(String),
}

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => TaskStatus::Pending,
            "downloading" => TaskStatus::Downloading,
            "completed" => TaskStatus::Completed,
            "failed" => TaskStatus::Failed,
            "need_captcha" => TaskStatus::NeedCaptcha,
            _ => TaskStatus::Unknown(value),
        }
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Downloading => "downloading",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::NeedCaptcha => "need_captcha",
            TaskStatus::Unknown(raw) => raw.as_str(),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// base64 编码的验证码图片
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CaptchaImage(String);

impl CaptchaImage {
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    pub fn as_base64(&self) -> &str {
        &self.0
    }

    /// 解码出原始图片字节
    pub fn decode(&self) -> Result<Vec<u8>, ApiError> {
        Ok(STANDARD.decode(self.0.trim())?)
    }

    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.0)
    }
}

// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PatentRequest<'a> {
    pub patent_no: &'a str,
}

/// 启动下载的响应
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartDownloadResponse {
    pub success: bool,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    // 文件已存在时服务端直接返回文件名，不创建任务
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

/// 任务状态查询的响应
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub captcha_image: Option<CaptchaImage>,
}

impl StatusResponse {
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }

    /// 服务端在没有文件名时返回空字符串
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref().filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct CaptchaRequest<'a> {
    pub task_id: &'a str,
    pub captcha_code: &'a str,
}

/// 提交验证码的响应
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptchaResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub captcha_image: Option<CaptchaImage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_response_with_captcha() {
        let raw = r#"{"success":true,"status":"need_captcha","message":"请输入验证码",
            "filename":"","patent_no":"CN1","captcha_image":"aGVsbG8="}"#;
        let resp: StatusResponse = serde_json::from_str(raw).unwrap();

        assert_eq!(resp.status, Some(TaskStatus::NeedCaptcha));
        assert_eq!(resp.filename(), None);
        let image = resp.captcha_image.unwrap();
        assert_eq!(image.decode().unwrap(), b"hello");
        assert_eq!(image.data_uri(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn unknown_status_is_kept_verbatim() {
        let resp: StatusResponse =
            serde_json::from_str(r#"{"success":true,"status":"queued"}"#).unwrap();
        assert_eq!(resp.status, Some(TaskStatus::Unknown("queued".to_string())));
        assert_eq!(resp.message(), "");
    }

    #[test]
    fn missing_task_response() {
        let resp: StatusResponse =
            serde_json::from_str(r#"{"success":false,"message":"任务不存在"}"#).unwrap();
        assert!(!resp.success);
        assert!(resp.status.is_none());
    }

    #[test]
    fn malformed_captcha_fails_to_decode() {
        assert!(CaptchaImage::new("@@not base64@@").decode().is_err());
    }
}
