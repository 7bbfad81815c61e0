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

//! Replication rules, protection policies and replication sessions.

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::query::{QueryParams, Queryable};
use super::request::Request;
use super::types::{CreateResponse, EmptyResponse};
use super::{Error, ErrorKind};

const RULE_RESOURCE: &str = "replication_rule";
const POLICY_RESOURCE: &str = "policy";
const SESSION_RESOURCE: &str = "replication_session";

/// A replication rule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplicationRule {
    /// Identifier of the rule.
    pub id: String,
    /// Name of the rule.
    pub name: String,
    /// Recovery point objective, e.g. `Five_Minutes`.
    #[serde(default)]
    pub rpo: String,
    /// Remote system replicated to.
    #[serde(default)]
    pub remote_system_id: String,
}

impl Queryable for ReplicationRule {
    fn fields() -> &'static [&'static str] {
        &["id", "name", "rpo", "remote_system_id"]
    }
}

/// Parameters for creating a replication rule.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplicationRuleCreate {
    /// Name of the rule.
    pub name: String,
    /// Recovery point objective, e.g. `Five_Minutes`.
    pub rpo: String,
    /// Remote system to replicate to.
    pub remote_system_id: String,
}

/// A protection policy combining replication and snapshot rules.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProtectionPolicy {
    /// Identifier of the policy.
    pub id: String,
    /// Name of the policy.
    pub name: String,
    /// Replication rules of the policy.
    #[serde(default)]
    pub replication_rules: Vec<ReplicationRule>,
}

impl Queryable for ProtectionPolicy {
    fn fields() -> &'static [&'static str] {
        &["id", "name", "replication_rules"]
    }
}

/// Parameters for creating a protection policy.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProtectionPolicyCreate {
    /// Name of the policy.
    pub name: String,
    /// Replication rules to include.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replication_rule_ids: Vec<String>,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An active replication session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplicationSession {
    /// Identifier of the session.
    pub id: String,
    /// Session state, e.g. `OK` or `Failed_Over`.
    #[serde(default)]
    pub state: String,
    /// Role of the local resource, e.g. `Source` or `Destination`.
    #[serde(default)]
    pub role: String,
    /// Replicated resource on this array.
    #[serde(default)]
    pub local_resource_id: String,
    /// Replica on the remote array.
    #[serde(default)]
    pub remote_resource_id: String,
}

impl Queryable for ReplicationSession {
    fn fields() -> &'static [&'static str] {
        &[
            "id",
            "state",
            "role",
            "local_resource_id",
            "remote_resource_id",
        ]
    }
}

/// Parameters for failing over a replication session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FailoverParams {
    /// Planned failover (sync first) rather than disaster recovery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_planned: Option<bool>,
    /// Reverse the replication direction after failing over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse: Option<bool>,
}

impl Client {
    /// Create a replication rule.
    pub async fn create_replication_rule(
        &self,
        body: &ReplicationRuleCreate,
    ) -> Result<CreateResponse, Error> {
        self.execute(Request::post(RULE_RESOURCE).json(body)?).await
    }

    /// Fetch one replication rule.
    pub async fn replication_rule<S: AsRef<str>>(&self, id: S) -> Result<ReplicationRule, Error> {
        self.execute(
            Request::get(RULE_RESOURCE)
                .id(id.as_ref())
                .query(QueryParams::fields::<ReplicationRule>()),
        )
        .await
    }

    /// Delete a replication rule.
    pub async fn delete_replication_rule<S: AsRef<str>>(
        &self,
        id: S,
    ) -> Result<EmptyResponse, Error> {
        self.execute(Request::delete(RULE_RESOURCE).id(id.as_ref()))
            .await
    }

    /// Create a protection policy.
    pub async fn create_protection_policy(
        &self,
        body: &ProtectionPolicyCreate,
    ) -> Result<CreateResponse, Error> {
        self.execute(Request::post(POLICY_RESOURCE).json(body)?)
            .await
    }

    /// Fetch one protection policy.
    pub async fn protection_policy<S: AsRef<str>>(
        &self,
        id: S,
    ) -> Result<ProtectionPolicy, Error> {
        self.execute(
            Request::get(POLICY_RESOURCE)
                .id(id.as_ref())
                .query(QueryParams::fields::<ProtectionPolicy>()),
        )
        .await
    }

    /// Delete a protection policy.
    pub async fn delete_protection_policy<S: AsRef<str>>(
        &self,
        id: S,
    ) -> Result<EmptyResponse, Error> {
        self.execute(Request::delete(POLICY_RESOURCE).id(id.as_ref()))
            .await
    }

    /// Fetch the replication session protecting a local resource.
    pub async fn replication_session_by_local_resource<S: AsRef<str>>(
        &self,
        local_resource_id: S,
    ) -> Result<ReplicationSession, Error> {
        let matches: Vec<ReplicationSession> = self
            .execute(
                Request::get(SESSION_RESOURCE).query(
                    QueryParams::fields::<ReplicationSession>().raw_arg(
                        "local_resource_id",
                        format!("eq.{}", local_resource_id.as_ref()),
                    ),
                ),
            )
            .await?;
        matches.into_iter().next().ok_or_else(|| {
            Error::new(
                ErrorKind::ResourceNotFound,
                format!(
                    "no replication session for resource {}",
                    local_resource_id.as_ref()
                ),
            )
        })
    }

    /// Fail a replication session over.
    pub async fn failover_replication_session<S: AsRef<str>>(
        &self,
        id: S,
        body: &FailoverParams,
    ) -> Result<EmptyResponse, Error> {
        self.execute(
            Request::post(SESSION_RESOURCE)
                .id(id.as_ref())
                .action("failover")
                .json(body)?,
        )
        .await
    }

    /// Re-establish protection after a failover.
    pub async fn reprotect_replication_session<S: AsRef<str>>(
        &self,
        id: S,
    ) -> Result<EmptyResponse, Error> {
        self.execute(
            Request::post(SESSION_RESOURCE)
                .id(id.as_ref())
                .action("reprotect"),
        )
        .await
    }
}
