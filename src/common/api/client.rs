use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{
    Client, ClientBuilder, Response, Url,
    header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error};

use super::error::ApiError;
use super::models::files::ListFilesResponse;
use super::models::patent::{CheckLocalResponse, SearchRequest, SearchResponse, ValidateResponse};
use super::models::task::{
    CaptchaRequest, CaptchaResponse, PatentRequest, StartDownloadResponse, StatusResponse,
};
use crate::common::config::ClientConfig;

/// 专利下载服务对外暴露的接口
///
/// 轮询器只依赖这个 trait，测试里可以换成脚本化的实现。
#[async_trait]
pub trait PatentApi: Send + Sync + 'static {
    async fn validate_patent(&self, patent_no: &str) -> Result<ValidateResponse, ApiError>;

    async fn check_local(&self, patent_no: &str) -> Result<CheckLocalResponse, ApiError>;

    async fn start_download(&self, patent_no: &str) -> Result<StartDownloadResponse, ApiError>;

    async fn download_status(&self, task_id: &str) -> Result<StatusResponse, ApiError>;

    async fn submit_captcha(
        &self,
        task_id: &str,
        captcha_code: &str,
    ) -> Result<CaptchaResponse, ApiError>;

    async fn search_patents(&self, keywords: &str, page: u32) -> Result<SearchResponse, ApiError>;

    async fn list_files(&self) -> Result<ListFilesResponse, ApiError>;
}

// 基于 reqwest 的服务端客户端
#[derive(Debug, Clone)]
pub struct PatentClient {
    inner: Client,
    base_url: Url,
}

impl PatentClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let inner = ClientBuilder::new()
            .timeout(config.request_timeout)
            .default_headers(Self::get_default_headers())
            .build()
            .map_err(|e| {
                error!("创建客户端失败: {}", e);
                ApiError::Reqwest(e)
            })?;

        Ok(Self {
            inner,
            base_url: config.base_url()?,
        })
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, */*;q=0.8"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("patentdl/", env!("CARGO_PKG_VERSION"))),
        );
        headers
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// 拼接接口地址，路径参数需要预先编码
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    /// 已下载文件的直链
    pub fn file_url(&self, filename: &str) -> Result<Url, ApiError> {
        self.endpoint(&format!("download/{}", urlencoding::encode(filename)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);
        let resp = self.inner.get(url).send().await?;
        Self::handle_response(resp).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!("POST {}", url);
        let resp = self.inner.post(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let status = resp.status();
        if status.is_server_error() {
            return Err(ApiError::RetryLater);
        }

        // 服务端的 404 等也会带 JSON 体，先尝试解析
        let raw_body = resp.bytes().await?;
        match serde_json::from_slice::<T>(&raw_body) {
            Ok(data) => Ok(data),
            Err(e) if status.is_success() => Err(ApiError::InvalidResponse(format!(
                "解析响应失败: {}. 原始响应: {}",
                e,
                String::from_utf8_lossy(&raw_body)
            ))),
            Err(_) => Err(ApiError::Status(status.as_u16())),
        }
    }

    /// 把服务端已下载的 PDF 保存到本地目录，返回保存路径
    pub async fn fetch_file(&self, filename: &str, dest_dir: &Path) -> Result<PathBuf, ApiError> {
        let url = self.file_url(filename)?;
        let resp = self.inner.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        tokio::fs::create_dir_all(dest_dir).await?;
        // 只取文件名部分，防止服务端返回的名字带目录
        let local_name = Path::new(filename)
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| ApiError::InvalidResponse(format!("无效的文件名: {}", filename)))?;
        // 先写到 .part 文件，完整收到后再改名
        let partial_path = dest_dir.join(format!("{}.part", local_name.to_string_lossy()));
        let output_path = dest_dir.join(local_name);

        let pb = ProgressBar::new(resp.content_length().unwrap_or(0));
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message("正在下载...");

        if let Err(e) = Self::write_body(resp, &partial_path, &pb).await {
            pb.abandon_with_message("下载中断");
            error!("取回文件中断 {}: {}", filename, e);
            if let Err(rm) = tokio::fs::remove_file(&partial_path).await {
                debug!("清理临时文件失败 {}: {}", partial_path.display(), rm);
            }
            return Err(e);
        }
        tokio::fs::rename(&partial_path, &output_path).await?;

        pb.finish_with_message("下载完成");
        Ok(output_path)
    }

    async fn write_body(resp: Response, path: &Path, pb: &ProgressBar) -> Result<(), ApiError> {
        let mut file = tokio::fs::File::create(path).await?;
        let mut stream = resp.bytes_stream();
        let mut downloaded = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl PatentApi for PatentClient {
    async fn validate_patent(&self, patent_no: &str) -> Result<ValidateResponse, ApiError> {
        self.post_json("api/validate_patent", &PatentRequest { patent_no })
            .await
    }

    async fn check_local(&self, patent_no: &str) -> Result<CheckLocalResponse, ApiError> {
        self.post_json("api/check_local", &PatentRequest { patent_no })
            .await
    }

    async fn start_download(&self, patent_no: &str) -> Result<StartDownloadResponse, ApiError> {
        self.post_json("api/download_patent", &PatentRequest { patent_no })
            .await
    }

    async fn download_status(&self, task_id: &str) -> Result<StatusResponse, ApiError> {
        self.get(&format!(
            "api/download_status/{}",
            urlencoding::encode(task_id)
        ))
        .await
    }

    async fn submit_captcha(
        &self,
        task_id: &str,
        captcha_code: &str,
    ) -> Result<CaptchaResponse, ApiError> {
        self.post_json(
            "api/submit_captcha",
            &CaptchaRequest {
                task_id,
                captcha_code,
            },
        )
        .await
    }

    async fn search_patents(&self, keywords: &str, page: u32) -> Result<SearchResponse, ApiError> {
        self.post_json("api/search_patents", &SearchRequest { keywords, page })
            .await
    }

    async fn list_files(&self) -> Result<ListFilesResponse, ApiError> {
        self.get("api/list_files").await
    }
}
