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

//! Hosts and host/volume mappings.

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::query::{QueryParams, Queryable};
use super::request::Request;
use super::types::{CreateResponse, EmptyResponse};
use super::{Error, ErrorKind};

const RESOURCE: &str = "host";
const MAPPING_RESOURCE: &str = "host_volume_mapping";

/// An initiator port of a host.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Initiator {
    /// Port name (iSCSI IQN, FC WWN or NVMe NQN).
    pub port_name: String,
    /// Port protocol, e.g. `iSCSI` or `FC`.
    pub port_type: String,
}

/// A host that volumes can be attached to.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Host {
    /// Identifier of the host.
    pub id: String,
    /// Name of the host.
    pub name: String,
    /// Operating system family, e.g. `Linux`.
    #[serde(default)]
    pub os_type: String,
    /// Initiator ports registered for the host.
    #[serde(default)]
    pub host_initiators: Vec<Initiator>,
}

impl Queryable for Host {
    fn fields() -> &'static [&'static str] {
        &["id", "name", "os_type", "host_initiators"]
    }
}

/// Parameters for registering a host.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HostCreate {
    /// Name of the host.
    pub name: String,
    /// Operating system family, e.g. `Linux`.
    pub os_type: String,
    /// Initiator ports of the host.
    pub initiators: Vec<Initiator>,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A mapping between a host and a volume.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostVolumeMapping {
    /// Identifier of the mapping.
    pub id: String,
    /// Mapped host.
    pub host_id: String,
    /// Mapped volume.
    pub volume_id: String,
    /// Logical unit number under which the host sees the volume.
    #[serde(default)]
    pub logical_unit_number: Option<u32>,
}

impl Queryable for HostVolumeMapping {
    fn fields() -> &'static [&'static str] {
        &["id", "host_id", "volume_id", "logical_unit_number"]
    }
}

/// Parameters for attaching or detaching a volume.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VolumeAttach {
    /// Volume to attach or detach.
    pub volume_id: String,
    /// Requested logical unit number; the array picks one when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_unit_number: Option<u32>,
}

impl Client {
    /// Register a host.
    pub async fn create_host(&self, body: &HostCreate) -> Result<CreateResponse, Error> {
        self.execute(Request::post(RESOURCE).json(body)?).await
    }

    /// Fetch one host.
    pub async fn host<S: AsRef<str>>(&self, id: S) -> Result<Host, Error> {
        self.execute(
            Request::get(RESOURCE)
                .id(id.as_ref())
                .query(QueryParams::fields::<Host>()),
        )
        .await
    }

    /// Fetch a host by its name.
    pub async fn host_by_name<S: AsRef<str>>(&self, name: S) -> Result<Host, Error> {
        let matches: Vec<Host> = self
            .execute(
                Request::get(RESOURCE).query(
                    QueryParams::fields::<Host>().raw_arg("name", format!("eq.{}", name.as_ref())),
                ),
            )
            .await?;
        matches.into_iter().next().ok_or_else(|| {
            Error::new(
                ErrorKind::ResourceNotFound,
                format!("no host named {}", name.as_ref()),
            )
        })
    }

    /// Delete a host.
    pub async fn delete_host<S: AsRef<str>>(&self, id: S) -> Result<EmptyResponse, Error> {
        self.execute(Request::delete(RESOURCE).id(id.as_ref())).await
    }

    /// Attach a volume to a host.
    pub async fn attach_volume<S: AsRef<str>>(
        &self,
        host_id: S,
        body: &VolumeAttach,
    ) -> Result<EmptyResponse, Error> {
        self.execute(
            Request::post(RESOURCE)
                .id(host_id.as_ref())
                .action("attach")
                .json(body)?,
        )
        .await
    }

    /// Detach a volume from a host.
    pub async fn detach_volume<S: AsRef<str>>(
        &self,
        host_id: S,
        body: &VolumeAttach,
    ) -> Result<EmptyResponse, Error> {
        self.execute(
            Request::post(RESOURCE)
                .id(host_id.as_ref())
                .action("detach")
                .json(body)?,
        )
        .await
    }

    /// List the mappings of a volume.
    pub async fn mappings_for_volume<S: AsRef<str>>(
        &self,
        volume_id: S,
    ) -> Result<Vec<HostVolumeMapping>, Error> {
        self.execute(
            Request::get(MAPPING_RESOURCE).query(
                QueryParams::fields::<HostVolumeMapping>()
                    .raw_arg("volume_id", format!("eq.{}", volume_id.as_ref())),
            ),
        )
        .await
    }

    /// List the mappings of a host.
    pub async fn mappings_for_host<S: AsRef<str>>(
        &self,
        host_id: S,
    ) -> Result<Vec<HostVolumeMapping>, Error> {
        self.execute(
            Request::get(MAPPING_RESOURCE).query(
                QueryParams::fields::<HostVolumeMapping>()
                    .raw_arg("host_id", format!("eq.{}", host_id.as_ref())),
            ),
        )
        .await
    }
}

#[cfg(test)]
mod test {
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::VolumeAttach;
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
    async fn test_attach_volume() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/rest/host/h-1/attach"))
            .and(body_partial_json(serde_json::json!({"volume_id": "vol-1"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = noauth_client(&server).await;
        let _ = client
            .attach_volume(
                "h-1",
                &VolumeAttach {
                    volume_id: "vol-1".into(),
                    logical_unit_number: None,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_already_mapped_is_detectable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/rest/host/h-1/attach"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "messages": [{
                    "code": "0xE0A020010004",
                    "severity": "Error",
                    "message_l10n": "The volume is already mapped to the host."
                }]
            })))
            .mount(&server)
            .await;

        let client = noauth_client(&server).await;
        let err = client
            .attach_volume(
                "h-1",
                &VolumeAttach {
                    volume_id: "vol-1".into(),
                    logical_unit_number: None,
                },
            )
            .await
            .err()
            .unwrap();
        assert!(err.is_host_already_mapped());
    }

    #[tokio::test]
    async fn test_mappings_for_volume() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rest/host_volume_mapping"))
            .and(query_param("volume_id", "eq.vol-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "m1", "host_id": "h-1", "volume_id": "vol-1", "logical_unit_number": 3}
            ])))
            .mount(&server)
            .await;

        let client = noauth_client(&server).await;
        let mappings = client.mappings_for_volume("vol-1").await.unwrap();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].logical_unit_number, Some(3));
    }
}
