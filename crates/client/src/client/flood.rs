//! Flood management API client methods

use super::{ApiClient, ClientError, RequestOptions};
use crate::endpoints::flood;
use crate::types::{BroadcastAlert, CrowdsourceReport, HelpRequest};
use serde_json::Value;

impl ApiClient {
    async fn get_json(&self, endpoint: &str) -> Result<Value, ClientError> {
        self.request(endpoint, &RequestOptions::get()).await
    }

    async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &T,
    ) -> Result<Value, ClientError> {
        let options = RequestOptions::post().json(payload)?;
        self.request(endpoint, &options).await
    }

    pub async fn forecast(&self) -> Result<Value, ClientError> {
        self.get_json(flood::FORECAST).await
    }

    pub async fn forecast_map(&self) -> Result<Value, ClientError> {
        self.get_json(flood::FORECAST_MAP).await
    }

    pub async fn tips(&self) -> Result<Value, ClientError> {
        self.get_json(flood::TIPS).await
    }

    pub async fn safety_check(&self) -> Result<Value, ClientError> {
        self.get_json(flood::SAFETY_CHECK).await
    }

    pub async fn inundation(&self) -> Result<Value, ClientError> {
        self.get_json(flood::INUNDATION).await
    }

    /// Submit a community flood observation
    pub async fn submit_crowdsource(
        &self,
        report: &CrowdsourceReport,
    ) -> Result<Value, ClientError> {
        self.post_json(flood::CROWDSOURCE, report).await
    }

    pub async fn crowdsource_list(&self) -> Result<Value, ClientError> {
        self.get_json(flood::CROWDSOURCE_LIST).await
    }

    pub async fn crowdsource_details(&self, id: u64) -> Result<Value, ClientError> {
        self.get_json(&flood::crowdsource_details(id)).await
    }

    /// Ask for rescue or assistance
    pub async fn submit_help_request(&self, request: &HelpRequest) -> Result<Value, ClientError> {
        self.post_json(flood::HELP, request).await
    }

    pub async fn help_list(&self) -> Result<Value, ClientError> {
        self.get_json(flood::HELP_LIST).await
    }

    pub async fn help_details(&self, id: u64) -> Result<Value, ClientError> {
        self.get_json(&flood::help_details(id)).await
    }

    /// Broadcast an alert message to an area
    pub async fn broadcast_alert(&self, message: &str, area: &str) -> Result<Value, ClientError> {
        self.post_json(flood::BROADCAST, &BroadcastAlert { message, area })
            .await
    }
}
