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

//! NAS servers, file systems and NFS exports.

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::query::{QueryParams, Queryable};
use super::request::Request;
use super::types::{CreateResponse, EmptyResponse};
use super::{Error, ErrorKind};

const NAS_RESOURCE: &str = "nas_server";
const FS_RESOURCE: &str = "file_system";
const NFS_RESOURCE: &str = "nfs_export";

/// A NAS server hosting file systems.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NasServer {
    /// Identifier of the NAS server.
    pub id: String,
    /// Name of the NAS server.
    pub name: String,
    /// Node the server currently runs on.
    #[serde(default)]
    pub current_node_id: String,
    /// Operational status reported by the array, e.g. `Started`.
    #[serde(default)]
    pub operational_status: String,
}

impl Queryable for NasServer {
    fn fields() -> &'static [&'static str] {
        &["id", "name", "current_node_id", "operational_status"]
    }
}

/// A file system on a NAS server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileSystem {
    /// Identifier of the file system.
    pub id: String,
    /// Name of the file system.
    pub name: String,
    /// NAS server hosting the file system.
    #[serde(default)]
    pub nas_server_id: String,
    /// Provisioned size in bytes.
    #[serde(default)]
    pub size_total: u64,
    /// Used size in bytes.
    #[serde(default)]
    pub size_used: u64,
}

impl Queryable for FileSystem {
    fn fields() -> &'static [&'static str] {
        &["id", "name", "nas_server_id", "size_total", "size_used"]
    }
}

/// Parameters for creating a file system.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileSystemCreate {
    /// Name of the file system.
    pub name: String,
    /// NAS server to host the file system.
    pub nas_server_id: String,
    /// Size in bytes.
    pub size_total: u64,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An NFS export of a file system.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NfsExport {
    /// Identifier of the export.
    pub id: String,
    /// Name of the export.
    pub name: String,
    /// Exported file system.
    #[serde(default)]
    pub file_system_id: String,
    /// Export path clients mount.
    #[serde(default)]
    pub path: String,
}

impl Queryable for NfsExport {
    fn fields() -> &'static [&'static str] {
        &["id", "name", "file_system_id", "path"]
    }
}

/// Parameters for creating an NFS export.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NfsExportCreate {
    /// Name of the export.
    pub name: String,
    /// File system to export.
    pub file_system_id: String,
    /// Export path.
    pub path: String,
}

impl Client {
    /// Fetch one NAS server.
    pub async fn nas_server<S: AsRef<str>>(&self, id: S) -> Result<NasServer, Error> {
        self.execute(
            Request::get(NAS_RESOURCE)
                .id(id.as_ref())
                .query(QueryParams::fields::<NasServer>()),
        )
        .await
    }

    /// Fetch a NAS server by its name.
    pub async fn nas_server_by_name<S: AsRef<str>>(&self, name: S) -> Result<NasServer, Error> {
        let matches: Vec<NasServer> = self
            .execute(
                Request::get(NAS_RESOURCE).query(
                    QueryParams::fields::<NasServer>()
                        .raw_arg("name", format!("eq.{}", name.as_ref())),
                ),
            )
            .await?;
        matches.into_iter().next().ok_or_else(|| {
            Error::new(
                ErrorKind::ResourceNotFound,
                format!("no NAS server named {}", name.as_ref()),
            )
        })
    }

    /// List all NAS servers.
    pub async fn nas_servers(&self) -> Result<Vec<NasServer>, Error> {
        self.execute(Request::get(NAS_RESOURCE).query(QueryParams::fields::<NasServer>()))
            .await
    }

    /// Create a file system.
    pub async fn create_file_system(
        &self,
        body: &FileSystemCreate,
    ) -> Result<CreateResponse, Error> {
        self.execute(Request::post(FS_RESOURCE).json(body)?).await
    }

    /// Fetch one file system.
    pub async fn file_system<S: AsRef<str>>(&self, id: S) -> Result<FileSystem, Error> {
        self.execute(
            Request::get(FS_RESOURCE)
                .id(id.as_ref())
                .query(QueryParams::fields::<FileSystem>()),
        )
        .await
    }

    /// Delete a file system.
    pub async fn delete_file_system<S: AsRef<str>>(&self, id: S) -> Result<EmptyResponse, Error> {
        self.execute(Request::delete(FS_RESOURCE).id(id.as_ref()))
            .await
    }

    /// Create an NFS export.
    pub async fn create_nfs_export(
        &self,
        body: &NfsExportCreate,
    ) -> Result<CreateResponse, Error> {
        self.execute(Request::post(NFS_RESOURCE).json(body)?).await
    }

    /// Fetch one NFS export.
    pub async fn nfs_export<S: AsRef<str>>(&self, id: S) -> Result<NfsExport, Error> {
        self.execute(
            Request::get(NFS_RESOURCE)
                .id(id.as_ref())
                .query(QueryParams::fields::<NfsExport>()),
        )
        .await
    }

    /// Fetch the export of a file system.
    pub async fn nfs_export_by_file_system<S: AsRef<str>>(
        &self,
        file_system_id: S,
    ) -> Result<NfsExport, Error> {
        let matches: Vec<NfsExport> = self
            .execute(
                Request::get(NFS_RESOURCE).query(
                    QueryParams::fields::<NfsExport>()
                        .raw_arg("file_system_id", format!("eq.{}", file_system_id.as_ref())),
                ),
            )
            .await?;
        matches.into_iter().next().ok_or_else(|| {
            Error::new(
                ErrorKind::ResourceNotFound,
                format!(
                    "no NFS export for file system {}",
                    file_system_id.as_ref()
                ),
            )
        })
    }
}

#[cfg(test)]
mod test {
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::FileSystemCreate;
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
    async fn test_create_file_system() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/rest/file_system"))
            .and(body_partial_json(serde_json::json!({
                "name": "fs-1", "nas_server_id": "nas-1", "size_total": 10737418240u64
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "fs-id"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = noauth_client(&server).await;
        let created = client
            .create_file_system(&FileSystemCreate {
                name: "fs-1".into(),
                nas_server_id: "nas-1".into(),
                size_total: 10737418240,
                description: None,
            })
            .await
            .unwrap();
        assert_eq!(created.id, "fs-id");
    }

    #[tokio::test]
    async fn test_nfs_export_by_file_system() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rest/nfs_export"))
            .and(query_param("file_system_id", "eq.fs-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "e1", "name": "export-1", "file_system_id": "fs-1", "path": "/export-1"}
            ])))
            .mount(&server)
            .await;

        let client = noauth_client(&server).await;
        let export = client.nfs_export_by_file_system("fs-1").await.unwrap();
        assert_eq!(export.path, "/export-1");
    }
}
