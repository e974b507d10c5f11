//! References to stored credentials.
//!
//! The secret itself never passes through this crate. Reading a field yields a
//! CloudFormation dynamic reference that the provider resolves at deploy time.

use crate::token::Token;
use serde::{Deserialize, Serialize};

/// A Secrets Manager secret, by name or ARN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRef {
    secret_id: String,
}

impl SecretRef {
    pub fn new(secret_id: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
        }
    }

    pub fn secret_id(&self) -> &str {
        &self.secret_id
    }

    /// Dynamic reference to one JSON field of the secret string.
    pub fn secret_value_from_json(&self, field: &str) -> Token {
        Token::dynamic(format!(
            "{{{{resolve:secretsmanager:{}:SecretString:{}::}}}}",
            self.secret_id, field
        ))
    }
}
