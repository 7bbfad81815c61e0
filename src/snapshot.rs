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

//! Volume snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::client::Client;
use super::query::{QueryParams, Queryable};
use super::request::Request;
use super::types::{CreateResponse, EmptyResponse};
use super::Error;

const RESOURCE: &str = "snapshot";

/// A point-in-time snapshot of a volume.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    /// Identifier of the snapshot.
    pub id: String,
    /// Name of the snapshot.
    pub name: String,
    /// Volume the snapshot was taken from.
    #[serde(default)]
    pub source_id: String,
    /// Creation time.
    #[serde(default)]
    pub creation_timestamp: Option<DateTime<Utc>>,
    /// Time after which the array may delete the snapshot.
    #[serde(default)]
    pub expiration_timestamp: Option<DateTime<Utc>>,
}

impl Queryable for Snapshot {
    fn fields() -> &'static [&'static str] {
        &[
            "id",
            "name",
            "source_id",
            "creation_timestamp",
            "expiration_timestamp",
        ]
    }
}

/// Parameters for creating a snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SnapshotCreate {
    /// Name of the snapshot.
    pub name: String,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Time after which the array may delete the snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_timestamp: Option<DateTime<Utc>>,
}

impl Client {
    /// Take a snapshot of a volume.
    pub async fn create_snapshot<S: AsRef<str>>(
        &self,
        volume_id: S,
        body: &SnapshotCreate,
    ) -> Result<CreateResponse, Error> {
        self.execute(
            Request::post("volume")
                .id(volume_id.as_ref())
                .action(RESOURCE)
                .json(body)?,
        )
        .await
    }

    /// Fetch one snapshot.
    pub async fn snapshot<S: AsRef<str>>(&self, id: S) -> Result<Snapshot, Error> {
        self.execute(
            Request::get(RESOURCE)
                .id(id.as_ref())
                .query(QueryParams::fields::<Snapshot>()),
        )
        .await
    }

    /// List the snapshots of a volume.
    pub async fn snapshots_for_volume<S: AsRef<str>>(
        &self,
        volume_id: S,
    ) -> Result<Vec<Snapshot>, Error> {
        self.execute(
            Request::get(RESOURCE).query(
                QueryParams::fields::<Snapshot>()
                    .raw_arg("source_id", format!("eq.{}", volume_id.as_ref())),
            ),
        )
        .await
    }

    /// Delete a snapshot.
    pub async fn delete_snapshot<S: AsRef<str>>(&self, id: S) -> Result<EmptyResponse, Error> {
        self.execute(Request::delete(RESOURCE).id(id.as_ref())).await
    }
}

#[cfg(test)]
mod test {
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::SnapshotCreate;
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

    #[tokio::test]
    async fn test_create_snapshot_addresses_the_volume() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/rest/volume/vol-1/snapshot"))
            .and(body_partial_json(serde_json::json!({"name": "snap-1"})))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({"id": "snap-id"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = noauth_client(&server).await;
        let created = client
            .create_snapshot(
                "vol-1",
                &SnapshotCreate {
                    name: "snap-1".into(),
                    ..SnapshotCreate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(created.id, "snap-id");
    }

    #[tokio::test]
    async fn test_snapshots_for_volume_filters_by_source() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rest/snapshot"))
            .and(query_param("source_id", "eq.vol-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "s1", "name": "snap-1", "source_id": "vol-1"}
            ])))
            .mount(&server)
            .await;

        let client = noauth_client(&server).await;
        let snapshots = client.snapshots_for_volume("vol-1").await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].source_id, "vol-1");
    }
}
