use crate::{
    query::QueryExpr, AnalysisResponse, AnalysisStage, ClientError, ErrorResponse, PingResponse,
    Result, SelectResponse,
};
use reqwest::header::HeaderValue;
use serde::Deserialize;

/// Blocking client for one core of the catalog search engine.
pub struct Client {
    base_url: String,
    core: String,
    api_key: Option<String>,
    http: reqwest::blocking::Client,
}

static HEADER_API_KEY: &'static str = "X-API-Key";

impl Client {
    pub fn new(base_url: String, core: String) -> Result<Self> {
        let parsed = url::Url::parse(&base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            core: core.trim_matches('/').to_string(),
            api_key: None,
            http: reqwest::blocking::Client::new(),
        })
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn core(&self) -> &str {
        &self.core
    }

    // Status endpoint
    pub fn ping(&self) -> Result<PingResponse> {
        self.get::<PingResponse>("/admin/ping", &[("wt", "json")])
    }

    /// Run `text` through the index-time analysis chain of `field_type` and
    /// return every stage in chain order.
    pub fn analyze_field(&self, field_type: &str, text: &str) -> Result<Vec<AnalysisStage>> {
        let response = self.get::<AnalysisResponse>(
            "/analysis/field",
            &[
                ("wt", "json"),
                ("json.nl", "arrmap"),
                ("analysis.fieldtype", field_type),
                ("analysis.fieldvalue", text),
            ],
        )?;

        let chain = response
            .analysis
            .field_types
            .get(field_type)
            .ok_or_else(|| ClientError::MissingAnalysis(field_type.to_string()))?;

        Ok(chain
            .index
            .iter()
            .flat_map(|stage| stage.iter())
            .map(|(qualified, output)| AnalysisStage::from_qualified(qualified, output.clone()))
            .collect())
    }

    /// Number of documents matching a raw `q` string.
    pub fn count(&self, query: &str) -> Result<u64> {
        let response = self.get::<SelectResponse>(
            "/select",
            &[("q", query), ("rows", "0"), ("wt", "json")],
        )?;
        Ok(response.response.num_found)
    }

    /// Number of documents matching a query expression
    pub fn count_expr(&self, expr: &QueryExpr) -> Result<u64> {
        self.count(&expr.to_query_string())
    }

    fn get<T>(&self, path: &str, params: &[(&str, &str)]) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let query_string = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<String>>()
            .join("&");
        let url = format!("{}/{}{}?{}", self.base_url, self.core, path, query_string);
        self.request::<T>(&url)
    }

    fn request<T>(&self, url: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut headers = reqwest::header::HeaderMap::new();

        if let Some(api_key) = &self.api_key {
            let value = HeaderValue::from_str(api_key)
                .map_err(|e| ClientError::Http(format!("invalid API key header: {}", e)))?;
            headers.insert(HEADER_API_KEY, value);
        }

        let response = self
            .http
            .get(url)
            .headers(headers)
            .send()
            .map_err(ClientError::Reqwest)?;

        self.handle_response::<T>(response)
    }

    fn handle_response<T>(
        &self,
        response: reqwest::blocking::Response,
    ) -> std::result::Result<T, ClientError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let status_code = response.status().as_u16();
        if status_code >= 200 && status_code < 300 {
            let raw_body = response.text().map_err(ClientError::Reqwest)?;
            serde_json::from_str::<T>(&raw_body).map_err(ClientError::Json)
        } else {
            // Try to parse as error response first
            let raw_body = response.text().unwrap_or_default();
            let parsed_err = serde_json::from_str::<ErrorResponse>(&raw_body);
            if let Ok(error_response) = parsed_err {
                Err(ClientError::Api {
                    code: status_code,
                    msg: error_response.error.msg,
                })
            } else {
                Err(ClientError::Http(format!(
                    "HTTP {}: {}",
                    status_code, raw_body
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_base_url() {
        let result = Client::new("not a url".to_string(), "catalog_core".to_string());
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_trims_slashes() {
        let client = Client::new(
            "http://localhost:8983/solr/".to_string(),
            "/catalog_core/".to_string(),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:8983/solr");
        assert_eq!(client.core(), "catalog_core");
    }
}
