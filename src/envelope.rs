use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ArchicadError;

pub(crate) const COMMAND_NAMESPACE: &str = "API";

pub(crate) fn qualified_command(name: &str) -> String {
    format!("{COMMAND_NAMESPACE}.{name}")
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    command: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<&'a Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse {
    pub(crate) succeeded: bool,
    #[serde(default)]
    pub(crate) result: Option<Value>,
    #[serde(default)]
    pub(crate) error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub(crate) code: i64,
    #[serde(default)]
    pub(crate) message: String,
}

pub(crate) fn encode_request(
    command: &str,
    parameters: Option<&Value>,
) -> Result<Vec<u8>, ArchicadError> {
    serde_json::to_vec(&ApiRequest {
        command,
        parameters,
    })
    .map_err(|err| ArchicadError::JsonDecode(err.to_string()))
}

pub(crate) fn decode_response(bytes: &[u8]) -> Result<ApiResponse, ArchicadError> {
    serde_json::from_slice(bytes).map_err(|err| ArchicadError::JsonDecode(err.to_string()))
}

pub(crate) fn status_error(command: &str, response: &ApiResponse) -> Option<ArchicadError> {
    if response.succeeded {
        return None;
    }

    let (code, message) = response
        .error
        .as_ref()
        .map(|error| (error.code, error.message.clone()))
        .unwrap_or((-1, "command failed without an error body".to_string()));

    Some(ArchicadError::ApiStatus {
        command: command.to_string(),
        code,
        message,
    })
}

/// Pulls `field` out of the `result` object and deserializes it.
pub(crate) fn result_field<T: DeserializeOwned>(
    command: &str,
    response: &ApiResponse,
    field: &str,
) -> Result<T, ArchicadError> {
    let value = response
        .result
        .as_ref()
        .and_then(|result| result.get(field))
        .ok_or_else(|| ArchicadError::MissingPayload {
            command: command.to_string(),
            field: field.to_string(),
        })?;

    T::deserialize(value).map_err(|err| ArchicadError::JsonDecode(format!("{command}.{field}: {err}")))
}

/// Same as [`result_field`] but hands back the raw JSON.
pub(crate) fn result_value<'a>(
    command: &str,
    response: &'a ApiResponse,
    field: &str,
) -> Result<&'a Value, ArchicadError> {
    response
        .result
        .as_ref()
        .and_then(|result| result.get(field))
        .ok_or_else(|| ArchicadError::MissingPayload {
            command: command.to_string(),
            field: field.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        decode_response, encode_request, qualified_command, result_field, status_error,
    };
    use crate::error::ArchicadError;

    #[test]
    fn encode_request_omits_missing_parameters() {
        let bytes = encode_request(&qualified_command("IsAlive"), None)
            .expect("request should encode");
        let value: serde_json::Value =
            serde_json::from_slice(&bytes).expect("request should be JSON");
        assert_eq!(value, json!({ "command": "API.IsAlive" }));

        let parameters = json!({ "elementType": "Wall" });
        let bytes = encode_request(&qualified_command("GetElementsByType"), Some(&parameters))
            .expect("request should encode");
        let value: serde_json::Value =
            serde_json::from_slice(&bytes).expect("request should be JSON");
        assert_eq!(value["parameters"]["elementType"], "Wall");
    }

    #[test]
    fn status_error_returns_none_for_success() {
        let response = decode_response(br#"{"succeeded":true,"result":{"isAlive":true}}"#)
            .expect("response should decode");
        assert!(status_error("API.IsAlive", &response).is_none());

        let alive: bool =
            result_field("API.IsAlive", &response, "isAlive").expect("field should decode");
        assert!(alive);
    }

    #[test]
    fn status_error_returns_error_for_failure() {
        let response = decode_response(
            br#"{"succeeded":false,"error":{"code":4001,"message":"Invalid parameters"}}"#,
        )
        .expect("response should decode");

        let err = status_error("API.GetPropertyIds", &response)
            .expect("failed command should map to ArchicadError::ApiStatus");
        assert!(matches!(err, ArchicadError::ApiStatus { code: 4001, .. }));
        assert!(err.to_string().contains("Invalid parameters"));
    }

    #[test]
    fn result_field_reports_missing_payload() {
        let response =
            decode_response(br#"{"succeeded":true,"result":{}}"#).expect("response should decode");
        let result: Result<Vec<String>, _> =
            result_field("API.GetElementsByType", &response, "elements");
        assert!(matches!(
            result,
            Err(ArchicadError::MissingPayload { ref field, .. }) if field == "elements"
        ));
    }

    #[test]
    fn decode_response_rejects_non_json() {
        assert!(matches!(
            decode_response(b"<html>busy</html>"),
            Err(ArchicadError::JsonDecode(_))
        ));
    }
}
