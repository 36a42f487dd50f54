use serde::{Deserialize, Serialize};

use super::lenient;

/// A catalog category. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub name: String,
}
