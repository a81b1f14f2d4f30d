use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckLocalResponse {
    pub exists: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub keywords: &'a str,
    pub page: u32,
}

/// 检索结果中的一条专利，字段名沿用服务端的中文键
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatentSummary {
    #[serde(rename = "标题", default)]
    pub title: Option<String>,
    #[serde(rename = "专利号", default)]
    pub patent_no: Option<String>,
    #[serde(rename = "申请人", default)]
    pub applicant: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub patents: Vec<PatentSummary>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_hits_use_server_keys() {
        let raw = r#"{"success":true,"keywords":"电池","page":2,
            "patents":[{"标题":"一种电池","专利号":"CN123456","申请人":"某公司"},{}]}"#;
        let resp: SearchResponse = serde_json::from_str(raw).unwrap();

        assert_eq!(resp.page, Some(2));
        assert_eq!(resp.patents.len(), 2);
        assert_eq!(resp.patents[0].patent_no.as_deref(), Some("CN123456"));
        assert!(resp.patents[1].title.is_none());
    }
}
