//! 在线表格 API 客户端
//!
//! 按 Sheets v4 values 接口读写整张工作表：
//! - `GET  {base}/v4/spreadsheets/{id}/values/{sheet}`
//! - `PUT  {base}/v4/spreadsheets/{id}/values/{sheet}?valueInputOption=RAW`

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clients::TableStore;
use crate::config::Config;
use crate::error::StoreError;
use crate::models::Table;

/// values 接口的请求 / 响应体
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    major_dimension: Option<String>,
    #[serde(default)]
    values: Option<Vec<Vec<String>>>,
}

/// 在线表格客户端
pub struct SheetsClient {
    http: Client,
    base_url: String,
    spreadsheet_id: String,
    access_token: String,
}

impl SheetsClient {
    /// 创建新的表格客户端
    pub fn new(config: &Config) -> Self {
        Self::with_endpoint(
            &config.sheets_api_base_url,
            &config.spreadsheet_id,
            &config.sheets_access_token,
        )
    }

    pub fn with_endpoint(
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            spreadsheet_id: spreadsheet_id.into(),
            access_token: access_token.into(),
        }
    }

    /// 构建工作表 values 地址（各段做 URL 编码）
    fn values_url(&self, table: &str) -> Result<Url, StoreError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| StoreError::request_failed(table, e))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Malformed {
                table: table.to_string(),
                reason: format!("无效的 API 地址: {}", self.base_url),
            })?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", table]);
        Ok(url)
    }

    async fn check_status(
        table: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::BadResponse {
            table: table.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl TableStore for SheetsClient {
    async fn read(&self, table: &str) -> Result<Table, StoreError> {
        let url = self.values_url(table)?;
        debug!("读取工作表: {}", url);

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| StoreError::request_failed(table, e))?;

        let range: ValueRange = Self::check_status(table, response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::request_failed(table, e))?;

        range
            .values
            .and_then(Table::from_values)
            .ok_or_else(|| StoreError::MissingHeaders {
                table: table.to_string(),
            })
    }

    async fn update(&self, table: &str, data: &Table) -> Result<(), StoreError> {
        let mut url = self.values_url(table)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = ValueRange {
            range: Some(table.to_string()),
            major_dimension: Some("ROWS".to_string()),
            values: Some(data.to_values()),
        };

        debug!("写入工作表 {}: {} 行", table, data.len());

        let response = self
            .http
            .put(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::request_failed(table, e))?;

        Self::check_status(table, response).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sheets"
    }
}
