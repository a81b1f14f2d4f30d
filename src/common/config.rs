use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use super::api::error::ApiError;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:9898";
/// 状态轮询周期
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// 客户端运行配置，由命令行参数生成
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    // 验证码图片和取回的 PDF 都放在这里
    pub output_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            output_dir: PathBuf::from("./downloads"),
        }
    }
}

impl ClientConfig {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Default::default()
        }
    }

    /// 服务地址，保证以 `/` 结尾，方便拼接相对路径
    pub fn base_url(&self) -> Result<Url, ApiError> {
        let mut raw = self.server.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Url::parse(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let config = ClientConfig::new("http://localhost:9898");
        assert_eq!(config.base_url().unwrap().as_str(), "http://localhost:9898/");
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
    }

    #[test]
    fn bad_server_is_rejected() {
        assert!(ClientConfig::new("not a url").base_url().is_err());
    }
}
