// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Performance and space metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::client::Client;
use super::request::Request;
use super::Error;

/// Aggregation interval of metrics samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricsInterval {
    /// Twenty seconds.
    #[serde(rename = "Twenty_Sec")]
    TwentySec,
    /// Five minutes.
    #[serde(rename = "Five_Mins")]
    FiveMins,
    /// One hour.
    #[serde(rename = "One_Hour")]
    OneHour,
    /// One day.
    #[serde(rename = "One_Day")]
    OneDay,
}

#[derive(Debug, Serialize)]
struct MetricsRequest<'a> {
    entity: &'static str,
    entity_id: &'a str,
    interval: MetricsInterval,
}

/// One performance sample of an appliance.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerformanceMetricsByAppliance {
    /// Appliance the sample describes.
    #[serde(default)]
    pub appliance_id: String,
    /// End of the sampled interval.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Average read latency in microseconds.
    #[serde(default)]
    pub avg_read_latency: f64,
    /// Average write latency in microseconds.
    #[serde(default)]
    pub avg_write_latency: f64,
    /// Total I/O operations per second.
    #[serde(default)]
    pub total_iops: f64,
    /// Total bandwidth in bytes per second.
    #[serde(default)]
    pub total_bandwidth: f64,
}

/// One space sample of an appliance.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpaceMetricsByAppliance {
    /// Appliance the sample describes.
    #[serde(default)]
    pub appliance_id: String,
    /// End of the sampled interval.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Physical capacity in bytes at the end of the interval.
    #[serde(default)]
    pub last_physical_total: u64,
    /// Physically used bytes at the end of the interval.
    #[serde(default)]
    pub last_physical_used: u64,
}

impl Client {
    async fn generate_metrics<R>(
        &self,
        entity: &'static str,
        entity_id: &str,
        interval: MetricsInterval,
    ) -> Result<R, Error>
    where
        R: serde::de::DeserializeOwned + Default,
    {
        self.execute(
            Request::post("metrics")
                .action("generate")
                .json(&MetricsRequest {
                    entity,
                    entity_id,
                    interval,
                })?,
        )
        .await
    }

    /// Fetch performance samples for an appliance.
    pub async fn performance_metrics_by_appliance<S: AsRef<str>>(
        &self,
        appliance_id: S,
        interval: MetricsInterval,
    ) -> Result<Vec<PerformanceMetricsByAppliance>, Error> {
        self.generate_metrics(
            "performance_metrics_by_appliance",
            appliance_id.as_ref(),
            interval,
        )
        .await
    }

    /// Fetch space samples for an appliance.
    pub async fn space_metrics_by_appliance<S: AsRef<str>>(
        &self,
        appliance_id: S,
        interval: MetricsInterval,
    ) -> Result<Vec<SpaceMetricsByAppliance>, Error> {
        self.generate_metrics(
            "space_metrics_by_appliance",
            appliance_id.as_ref(),
            interval,
        )
        .await
    }

    /// Free physical capacity of the array in bytes.
    ///
    /// Sums the latest space sample of every appliance. Appliances without
    /// samples yet contribute nothing.
    pub async fn capacity(&self) -> Result<u64, Error> {
        let mut free = 0u64;
        for appliance in self.appliances().await? {
            let samples = self
                .space_metrics_by_appliance(&appliance.id, MetricsInterval::FiveMins)
                .await?;
            if let Some(latest) = samples.last() {
                free = free.saturating_add(
                    latest
                        .last_physical_total
                        .saturating_sub(latest.last_physical_used),
                );
            }
        }
        Ok(free)
    }
}

#[cfg(test)]
mod test {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::MetricsInterval;
    use crate::{Client, ClientOptions, NoAuth};

    async fn noauth_client(server: &MockServer) -> Client {
        Client::new_with_auth(
            format!("{}/api/rest", server.uri()),
            NoAuth::new(),
            ClientOptions::default(),
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_interval_wire_format() {
        assert_eq!(
            serde_json::to_string(&MetricsInterval::FiveMins).unwrap(),
            "\"Five_Mins\""
        );
    }

    #[tokio::test]
    async fn test_space_metrics_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/rest/metrics/generate"))
            .and(body_partial_json(serde_json::json!({
                "entity": "space_metrics_by_appliance",
                "entity_id": "A1",
                "interval": "One_Hour"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"appliance_id": "A1", "last_physical_total": 100, "last_physical_used": 25}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = noauth_client(&server).await;
        let samples = client
            .space_metrics_by_appliance("A1", MetricsInterval::OneHour)
            .await
            .unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].last_physical_total, 100);
    }

    #[tokio::test]
    async fn test_capacity_sums_latest_samples() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rest/appliance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "A1", "name": "one"},
                {"id": "A2", "name": "two"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/rest/metrics/generate"))
            .and(body_partial_json(serde_json::json!({"entity_id": "A1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"appliance_id": "A1", "last_physical_total": 50, "last_physical_used": 20},
                {"appliance_id": "A1", "last_physical_total": 100, "last_physical_used": 30}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/rest/metrics/generate"))
            .and(body_partial_json(serde_json::json!({"entity_id": "A2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"appliance_id": "A2", "last_physical_total": 10, "last_physical_used": 5}
            ])))
            .mount(&server)
            .await;

        let client = noauth_client(&server).await;
        // Latest sample per appliance: (100 - 30) + (10 - 5).
        assert_eq!(client.capacity().await.unwrap(), 75);
    }
}
