//! GraphQL-over-HTTP request and response bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// GraphQL request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    /// Query or mutation document.
    pub query: String,

    /// Variables object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,

    /// Operation to run when the document holds several.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl GraphQlRequest {
    /// Create a request without variables.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: None,
            operation_name: None,
        }
    }

    /// Set the variables object.
    #[must_use]
    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Set the operation name.
    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Label used in logs and metrics.
    #[must_use]
    pub fn operation_label(&self) -> &str {
        self.operation_name.as_deref().unwrap_or("anonymous")
    }
}

/// GraphQL response body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphQlResponse<T> {
    /// Result data, absent when the request failed as a whole.
    pub data: Option<T>,

    /// Errors reported by the server.
    #[serde(default)]
    pub errors: Vec<GraphQlErrorEntry>,
}

/// One entry of a response's `errors` array.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlErrorEntry {
    /// Human-readable message.
    pub message: String,

    /// Server-specific details; Hasura puts its error code here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<ErrorExtensions>,

    /// Path of the field that failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
}

/// `extensions` object of an error entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorExtensions {
    /// Machine-readable error code, e.g. `invalid-jwt`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Path of the offending input (Hasura).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl GraphQlErrorEntry {
    /// Entry with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extensions: None,
            path: None,
        }
    }

    /// Set `extensions.code`.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.extensions.get_or_insert_with(ErrorExtensions::default).code = Some(code.into());
        self
    }

    /// The `extensions.code` value, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.extensions.as_ref().and_then(|e| e.code.as_deref())
    }
}

// Messages can echo query input, so they are redacted from debug output.
impl fmt::Debug for GraphQlErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphQlErrorEntry")
            .field("code", &self.code())
            .field("message_len", &self.message.len())
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_omits_empty_fields() {
        let body = serde_json::to_value(GraphQlRequest::new("{ users { id } }")).unwrap();
        assert_eq!(body, json!({ "query": "{ users { id } }" }));
    }

    #[test]
    fn test_request_uses_camel_case() {
        let request = GraphQlRequest::new("query GetUser($id: uuid!) { users_by_pk(id: $id) { id } }")
            .with_variables(json!({ "id": "42" }))
            .with_operation_name("GetUser");

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["operationName"], "GetUser");
        assert_eq!(body["variables"]["id"], "42");
        assert_eq!(request.operation_label(), "GetUser");
    }

    #[test]
    fn test_hasura_error_response_parses() {
        let response: GraphQlResponse<Value> = serde_json::from_value(json!({
            "errors": [{
                "message": "Could not verify JWT: JWTExpired",
                "extensions": { "path": "$", "code": "invalid-jwt" }
            }]
        }))
        .unwrap();

        assert!(response.data.is_none());
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].code(), Some("invalid-jwt"));
    }

    #[test]
    fn test_data_response_parses() {
        let response: GraphQlResponse<Value> =
            serde_json::from_value(json!({ "data": { "users": [] } })).unwrap();

        assert_eq!(response.data, Some(json!({ "users": [] })));
        assert!(response.errors.is_empty());
    }
}
