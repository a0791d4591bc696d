//! Bucket access policy documents

use serde::{Deserialize, Serialize};

pub const POLICY_VERSION: &str = "2012-10-17";

/// IAM-style bucket policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub effect: String,
    pub principal: Principal,
    pub action: Vec<String>,
    pub resource: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(rename = "AWS")]
    pub aws: String,
}

impl PolicyDocument {
    /// Anonymous `s3:GetObject` on every object in `bucket`
    pub fn public_read(bucket: &str) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement: vec![Statement {
                effect: "Allow".to_string(),
                principal: Principal {
                    aws: "*".to_string(),
                },
                action: vec!["s3:GetObject".to_string()],
                resource: vec![format!("arn:aws:s3:::{}/*", bucket)],
            }],
        }
    }

    /// Compact JSON as submitted to the server
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_read_document() {
        let json = PolicyDocument::public_read("documents").to_json().unwrap();

        assert_eq!(
            json,
            r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Principal":{"AWS":"*"},"Action":["s3:GetObject"],"Resource":["arn:aws:s3:::documents/*"]}]}"#
        );
    }

    #[test]
    fn test_policy_is_scoped_to_bucket() {
        let policy = PolicyDocument::public_read("backups");
        assert_eq!(policy.statement.len(), 1);
        assert_eq!(policy.statement[0].resource, vec!["arn:aws:s3:::backups/*"]);

        let parsed: PolicyDocument = serde_json::from_str(&policy.to_json().unwrap()).unwrap();
        assert_eq!(parsed, policy);
    }
}
