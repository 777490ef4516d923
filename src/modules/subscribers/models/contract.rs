use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::company::CompanyKey;

/// A provider contract billed to a company, imported by contract id
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contract {
    pub contract_id: String,

    #[sqlx(flatten)]
    #[serde(flatten)]
    pub key: CompanyKey,

    pub active: bool,
}
