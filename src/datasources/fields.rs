use super::api::ApiClient;
use crate::error::Result;
use crate::models::FieldSummary;
use reqwest::Request;

/// Lists the farm's fields so the CLI can fill in ids the config leaves out.
#[derive(Clone)]
pub struct FieldsClient {
    api: ApiClient,
}

impl FieldsClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn list_request(&self) -> Result<Request> {
        let url = self.api.endpoint("field/getAll", &[])?;
        self.api.get_request(url)
    }

    pub async fn list_fields(&self) -> Result<Vec<FieldSummary>> {
        let request = self.list_request()?;
        tracing::info!("Fetching field list");
        let mut fields: Vec<FieldSummary> = self.api.send_json(request, "field list").await?;
        fields.retain(|f| f.id > 0);
        fields.sort_by_key(|f| f.id);
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, RunMode};

    #[test]
    fn list_request_targets_get_all() {
        let config = ApiConfig {
            base_url: "https://farm.example".into(),
            token: None,
            retries: 0,
            forecast_days: 7,
            include_forecast: true,
        };
        let client = FieldsClient::new(ApiClient::new(&config, RunMode::Development).unwrap());
        let request = client.list_request().unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().as_str(), "https://farm.example/field/getAll");
    }
}
