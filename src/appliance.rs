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

//! Appliances.

use serde::Deserialize;

use super::client::Client;
use super::query::{QueryParams, Queryable};
use super::request::Request;
use super::{Error, ErrorKind};

const RESOURCE: &str = "appliance";

/// One appliance of the array cluster.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Appliance {
    /// Identifier of the appliance.
    pub id: String,
    /// Name of the appliance.
    pub name: String,
    /// Dell service tag.
    #[serde(default)]
    pub service_tag: String,
    /// Model designation.
    #[serde(default)]
    pub model: String,
}

impl Queryable for Appliance {
    fn fields() -> &'static [&'static str] {
        &["id", "name", "service_tag", "model"]
    }
}

impl Client {
    /// List all appliances.
    pub async fn appliances(&self) -> Result<Vec<Appliance>, Error> {
        self.execute(Request::get(RESOURCE).query(QueryParams::fields::<Appliance>()))
            .await
    }

    /// Fetch one appliance.
    pub async fn appliance<S: AsRef<str>>(&self, id: S) -> Result<Appliance, Error> {
        self.execute(
            Request::get(RESOURCE)
                .id(id.as_ref())
                .query(QueryParams::fields::<Appliance>()),
        )
        .await
    }

    /// Fetch an appliance by its name.
    pub async fn appliance_by_name<S: AsRef<str>>(&self, name: S) -> Result<Appliance, Error> {
        let matches: Vec<Appliance> = self
            .execute(
                Request::get(RESOURCE).query(
                    QueryParams::fields::<Appliance>()
                        .raw_arg("name", format!("eq.{}", name.as_ref())),
                ),
            )
            .await?;
        matches.into_iter().next().ok_or_else(|| {
            Error::new(
                ErrorKind::ResourceNotFound,
                format!("no appliance named {}", name.as_ref()),
            )
        })
    }
}
