use serde::Deserialize;

/// 服务端已下载的文件
#[derive(Debug, Clone, Deserialize)]
pub struct FileEntry {
    pub filename: String,
    pub size: u64,
    // unix 秒，服务端给的是浮点数
    pub modified_time: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFilesResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}
