//! Intrinsic values that resolve at deploy time.
//!
//! A [`Token`] is what a declared resource hands back to its callers instead
//! of a concrete value: the subnet group name, the database endpoint
//! address, and so on only exist once the provider has created them. Tokens
//! serialize into CloudFormation's intrinsic function shape.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// A string-valued property that is either known now or resolved later.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// A plain string known at definition time.
    Literal(String),
    /// `{ "Ref": <logical id> }`
    Ref(String),
    /// `{ "Fn::GetAtt": [<logical id>, <attribute>] }`
    GetAtt {
        /// Logical id of the resource
        logical_id: String,
        /// Attribute name, e.g. `Endpoint.Address`
        attribute: String,
    },
    /// A `{{resolve:...}}` dynamic reference, emitted as a plain string but
    /// only resolved by the provider during deployment.
    Dynamic(String),
}

impl Token {
    /// Reference to a resource's primary identifier.
    pub fn reference(logical_id: impl Into<String>) -> Self {
        Token::Ref(logical_id.into())
    }

    /// Reference to one attribute of a resource.
    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Token::GetAtt {
            logical_id: logical_id.into(),
            attribute: attribute.into(),
        }
    }

    /// Returns the string if this token is known at definition time.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Token::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// Dynamic reference to an external store, e.g.
    /// `{{resolve:secretsmanager:<id>:SecretString:<field>::}}`.
    pub fn dynamic(reference: impl Into<String>) -> Self {
        Token::Dynamic(reference.into())
    }

    /// Returns true if the value is only known after deployment.
    pub fn is_unresolved(&self) -> bool {
        !matches!(self, Token::Literal(_))
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Token::Literal(s.to_string())
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Token::Literal(s)
    }
}

impl From<&String> for Token {
    fn from(s: &String) -> Self {
        Token::Literal(s.clone())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal(s) | Token::Dynamic(s) => write!(f, "{}", s),
            Token::Ref(id) => write!(f, "${{Token[{}.Ref]}}", id),
            Token::GetAtt {
                logical_id,
                attribute,
            } => write!(f, "${{Token[{}.{}]}}", logical_id, attribute),
        }
    }
}

impl Serialize for Token {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Token::Literal(s) | Token::Dynamic(s) => serializer.serialize_str(s),
            Token::Ref(id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Ref", id)?;
                map.end()
            }
            Token::GetAtt {
                logical_id,
                attribute,
            } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::GetAtt", &[logical_id, attribute])?;
                map.end()
            }
        }
    }
}
