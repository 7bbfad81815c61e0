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

//! Shared response types.

use serde::Deserialize;

/// Response to a create call.
///
/// The array returns only the identifier of the new resource; fetch it
/// separately if the full object is needed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateResponse {
    /// Identifier of the created resource.
    pub id: String,
}

/// Response to a call that returns no body.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct EmptyResponse {}
