use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("网络请求失败: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("响应解析失败: {0}")]
    InvalidResponse(String),

    #[error("服务暂时不可用，请稍后重试")]
    RetryLater,

    #[error("HTTP状态异常: {0}")]
    Status(u16),

    #[error("无效的服务地址: {0}")]
    InvalidUrl(String),

    #[error("IO操作失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("验证码图片解码失败: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl ApiError {
    /// 是否属于网络层面的失败（连接、超时、5xx）
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Reqwest(_) | ApiError::RetryLater)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}
