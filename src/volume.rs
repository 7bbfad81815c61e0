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

//! Volumes.

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use log::warn;
use serde::{Deserialize, Serialize};

use super::client::Client;
use super::pagination::{paginate, ResponseMetadata, DEFAULT_PAGE_LIMIT};
use super::query::{QueryParams, Queryable};
use super::request::{MetadataHeaders, Request};
use super::types::{CreateResponse, EmptyResponse};
use super::{Error, ErrorKind};

const RESOURCE: &str = "volume";

/// Lifecycle state of a volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeState {
    /// The volume can serve I/O.
    Ready,
    /// The volume is being created.
    Initializing,
    /// The volume cannot serve I/O.
    Offline,
    /// The volume is being deleted.
    Destroying,
    /// A state this crate does not know about.
    Unknown(String),
}

impl Default for VolumeState {
    fn default() -> VolumeState {
        VolumeState::Unknown(String::new())
    }
}

impl<T: Into<String>> From<T> for VolumeState {
    fn from(value: T) -> VolumeState {
        let value = value.into();
        match value.as_str() {
            "Ready" => VolumeState::Ready,
            "Initializing" => VolumeState::Initializing,
            "Offline" => VolumeState::Offline,
            "Destroying" => VolumeState::Destroying,
            _ => VolumeState::Unknown(value),
        }
    }
}

impl<'de> Deserialize<'de> for VolumeState {
    fn deserialize<D>(deserializer: D) -> Result<VolumeState, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(VolumeState::from(String::deserialize(deserializer)?))
    }
}

/// One volume.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Volume {
    /// Identifier of the volume.
    pub id: String,
    /// Name of the volume, unique within the array.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Lifecycle state.
    #[serde(default)]
    pub state: VolumeState,
    /// Appliance hosting the volume.
    #[serde(default)]
    pub appliance_id: String,
    /// World-wide name under which the volume is exported.
    #[serde(default)]
    pub wwn: String,
    /// Creation time.
    #[serde(default)]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

impl Queryable for Volume {
    fn fields() -> &'static [&'static str] {
        &[
            "id",
            "name",
            "description",
            "size",
            "state",
            "appliance_id",
            "wwn",
            "creation_timestamp",
        ]
    }
}

/// Parameters for creating a volume.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VolumeCreate {
    /// Name of the new volume.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Appliances allowed to host the volume.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub appliance_ids: Vec<String>,
    /// Caller metadata, transmitted as request headers rather than body
    /// fields.
    #[serde(skip)]
    pub metadata: HashMap<String, String>,
}

impl MetadataHeaders for VolumeCreate {
    fn metadata_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (key, value) in &self.metadata {
            match (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    let _ = headers.insert(name, value);
                }
                _ => warn!("Dropping metadata entry {:?} with an invalid name or value", key),
            }
        }
        headers
    }
}

/// Parameters for modifying a volume.
///
/// Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VolumeModify {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New size in bytes; only growing is accepted by the array.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Parameters for cloning a volume.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VolumeClone {
    /// Name of the clone.
    pub name: String,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Client {
    /// Create a volume.
    pub async fn create_volume(&self, body: &VolumeCreate) -> Result<CreateResponse, Error> {
        self.execute(Request::post(RESOURCE).json_with_metadata(body)?)
            .await
    }

    /// Fetch one volume.
    pub async fn volume<S: AsRef<str>>(&self, id: S) -> Result<Volume, Error> {
        self.execute(
            Request::get(RESOURCE)
                .id(id.as_ref())
                .query(QueryParams::fields::<Volume>()),
        )
        .await
    }

    /// Fetch a volume by its name.
    pub async fn volume_by_name<S: AsRef<str>>(&self, name: S) -> Result<Volume, Error> {
        let matches: Vec<Volume> = self
            .execute(
                Request::get(RESOURCE).query(
                    QueryParams::fields::<Volume>()
                        .raw_arg("name", format!("eq.{}", name.as_ref())),
                ),
            )
            .await?;
        matches.into_iter().next().ok_or_else(|| {
            Error::new(
                ErrorKind::ResourceNotFound,
                format!("no volume named {}", name.as_ref()),
            )
        })
    }

    /// Fetch one page of volumes.
    ///
    /// Building block for [`volumes`](Client::volumes); useful directly when
    /// the caller wants to control pagination itself.
    pub async fn volume_page(
        &self,
        offset: u32,
    ) -> Result<(Vec<Volume>, ResponseMetadata), Error> {
        self.execute_with_metadata(
            Request::get(RESOURCE).query(
                QueryParams::fields::<Volume>()
                    .limit(DEFAULT_PAGE_LIMIT)
                    .offset(offset),
            ),
        )
        .await
    }

    /// List all volumes, draining pagination.
    pub async fn volumes(&self) -> Result<Vec<Volume>, Error> {
        let result = RefCell::new(Vec::new());
        paginate(|offset| {
            let result = &result;
            async move {
                let (page, meta) = self.volume_page(offset).await?;
                result.borrow_mut().extend(page);
                Ok(meta)
            }
        })
        .await?;
        Ok(result.into_inner())
    }

    /// Modify a volume.
    pub async fn modify_volume<S: AsRef<str>>(
        &self,
        id: S,
        body: &VolumeModify,
    ) -> Result<EmptyResponse, Error> {
        self.execute(Request::patch(RESOURCE).id(id.as_ref()).json(body)?)
            .await
    }

    /// Delete a volume.
    pub async fn delete_volume<S: AsRef<str>>(&self, id: S) -> Result<EmptyResponse, Error> {
        self.execute(Request::delete(RESOURCE).id(id.as_ref())).await
    }

    /// Clone a volume.
    pub async fn clone_volume<S: AsRef<str>>(
        &self,
        id: S,
        body: &VolumeClone,
    ) -> Result<CreateResponse, Error> {
        self.execute(
            Request::post(RESOURCE)
                .id(id.as_ref())
                .action("clone")
                .json(body)?,
        )
        .await
    }
}

#[cfg(test)]
mod test {
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{VolumeCreate, VolumeState};
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
    fn test_volume_state_from_string() {
        assert_eq!(VolumeState::from("Ready"), VolumeState::Ready);
        assert_eq!(
            VolumeState::from("Under_Migration"),
            VolumeState::Unknown("Under_Migration".into())
        );
    }

    #[tokio::test]
    async fn test_create_volume_sends_metadata_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/rest/volume"))
            .and(header("x-application", "csi-driver"))
            .and(body_partial_json(serde_json::json!({
                "name": "vol-1", "size": 1048576
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({"id": "new-id"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = noauth_client(&server).await;
        let mut body = VolumeCreate {
            name: "vol-1".into(),
            size: 1048576,
            ..VolumeCreate::default()
        };
        let _ = body
            .metadata
            .insert("x-application".into(), "csi-driver".into());

        let created = client.create_volume(&body).await.unwrap();
        assert_eq!(created.id, "new-id");
    }

    #[tokio::test]
    async fn test_volumes_drains_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rest/volume"))
            .and(query_param("offset", "0"))
            .respond_with(
                ResponseTemplate::new(206)
                    .insert_header("content-range", "0-1/3")
                    .set_body_json(serde_json::json!([
                        {"id": "v1", "name": "one"},
                        {"id": "v2", "name": "two"}
                    ])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/rest/volume"))
            .and(query_param("offset", "2"))
            .respond_with(
                ResponseTemplate::new(206)
                    .insert_header("content-range", "2-2/3")
                    .set_body_json(serde_json::json!([
                        {"id": "v3", "name": "three"}
                    ])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = noauth_client(&server).await;
        let volumes = client.volumes().await.unwrap();
        let ids: Vec<_> = volumes.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "v2", "v3"]);
    }

    #[tokio::test]
    async fn test_volume_by_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rest/volume"))
            .and(query_param("name", "eq.data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "v1", "name": "data", "state": "Ready"}
            ])))
            .mount(&server)
            .await;

        let client = noauth_client(&server).await;
        let volume = client.volume_by_name("data").await.unwrap();
        assert_eq!(volume.id, "v1");
        assert_eq!(volume.state, VolumeState::Ready);
    }
}
