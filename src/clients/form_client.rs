/// 表单服务端 API 客户端
///
/// 封装所有与表单服务端相关的 HTTP 调用
use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::record::{
    FormEnvelope, FormRecord, HiddenFields, LoadHistoryEntry, LoadHistoryPage,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// 原生提交的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub status: u16,
    pub body: String,
}

/// `POST /api/forms` 的响应
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedForm {
    pub success: bool,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub sheets_sync: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

/// 表单服务端能力
///
/// 加载、提交流程只依赖这个 trait，测试时替换成内存实现
#[async_trait]
pub trait FormApi: Send + Sync {
    /// `GET /api/forms/{id}`；信封 success=false 也视为失败
    async fn fetch_form(&self, form_id: &str) -> AppResult<FormRecord>;

    /// `POST /api/form-load-history`
    async fn record_load_history(&self, entry: &LoadHistoryEntry) -> AppResult<()>;

    /// `GET /api/form/{id}/load-history?page=&per_page=`
    async fn fetch_load_history(
        &self,
        form_id: &str,
        page: u32,
        per_page: u32,
    ) -> AppResult<LoadHistoryPage>;

    /// 原生表单提交（multipart/form-data）
    async fn submit_form(&self, fields: &HiddenFields) -> AppResult<SubmitReceipt>;

    /// `POST /api/forms`（JSON）
    async fn create_form(&self, record: &FormRecord) -> AppResult<CreatedForm>;
}

/// 基于 reqwest 的客户端
#[derive(Debug, Clone)]
pub struct FormClient {
    http: reqwest::Client,
    base_url: String,
    submit_path: String,
}

impl FormClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::api_request_failed("client", e))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            submit_path: config.submit_path.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn form_path(form_id: &str) -> String {
        format!("/api/forms/{}", form_id)
    }

    pub fn history_path(form_id: &str) -> String {
        format!("/api/form/{}/load-history", form_id)
    }
}

#[async_trait]
impl FormApi for FormClient {
    async fn fetch_form(&self, form_id: &str) -> AppResult<FormRecord> {
        let endpoint = Self::form_path(form_id);
        debug!("GET {}", endpoint);

        let response = self
            .http
            .get(self.url(&endpoint))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;

        interpret_envelope(&endpoint, status, &body)
    }

    async fn record_load_history(&self, entry: &LoadHistoryEntry) -> AppResult<()> {
        let endpoint = "/api/form-load-history";
        let response = self
            .http
            .post(self.url(endpoint))
            .json(entry)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        if !response.status().is_success() {
            return Err(ApiError::BadStatus {
                endpoint: endpoint.to_string(),
                status: response.status().as_u16(),
            }
            .into());
        }
        Ok(())
    }

    async fn fetch_load_history(
        &self,
        form_id: &str,
        page: u32,
        per_page: u32,
    ) -> AppResult<LoadHistoryPage> {
        let endpoint = Self::history_path(form_id);
        let response = self
            .http
            .get(self.url(&endpoint))
            .query(&[("page", page), ("per_page", per_page)])
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;

        if !response.status().is_success() {
            return Err(ApiError::BadStatus {
                endpoint,
                status: response.status().as_u16(),
            }
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn submit_form(&self, fields: &HiddenFields) -> AppResult<SubmitReceipt> {
        let endpoint = self.submit_path.clone();
        let form = fields.to_multipart();

        debug!("POST {} (multipart)", endpoint);
        let response = self
            .http
            .post(self.url(&endpoint))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;

        if !status.is_success() && !status.is_redirection() {
            return Err(ApiError::BadStatus {
                endpoint,
                status: status.as_u16(),
            }
            .into());
        }

        Ok(SubmitReceipt {
            status: status.as_u16(),
            body,
        })
    }

    async fn create_form(&self, record: &FormRecord) -> AppResult<CreatedForm> {
        let endpoint = "/api/forms";
        let response = self
            .http
            .post(self.url(endpoint))
            .json(record)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        let body = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;
        let created: CreatedForm = serde_json::from_str(&body)?;

        if !created.success {
            return Err(ApiError::Unsuccessful {
                endpoint: endpoint.to_string(),
                message: created.error.unwrap_or_else(|| "unknown error".to_string()),
            }
            .into());
        }
        Ok(created)
    }
}

/// 解析加载接口的响应
///
/// 即使状态码非 2xx，只要正文是信封就以信封里的错误为准
pub fn interpret_envelope(endpoint: &str, status: u16, body: &str) -> AppResult<FormRecord> {
    let envelope: FormEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            if !(200..300).contains(&status) {
                return Err(ApiError::BadStatus {
                    endpoint: endpoint.to_string(),
                    status,
                }
                .into());
            }
            return Err(ApiError::JsonParseFailed {
                source: Box::new(e),
            }
            .into());
        }
    };

    if !envelope.success {
        return Err(ApiError::Unsuccessful {
            endpoint: endpoint.to_string(),
            message: envelope
                .error
                .unwrap_or_else(|| "Failed to load form".to_string()),
        }
        .into());
    }

    envelope.form.ok_or_else(|| {
        ApiError::EmptyResponse {
            endpoint: endpoint.to_string(),
        }
        .into()
    })
}
