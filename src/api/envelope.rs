//! The JSON envelope around every portal response:
//! `{"status": "success", "success": true, "<collection>": [...], "error": "..."}`.
//!
//! The portal is not consistent about which of `status` and `success` it sends, so a response is
//! taken as successful unless one of them says otherwise or `error` is set.

use crate::api::RawResponse;
use crate::error::LoadError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

type Envelope = Map<String, Value>;

const UNKNOWN_FAILURE: &str = "Unbekannter Fehler vom Server";

/// Checks the HTTP status and the envelope's own success markers and returns the envelope.
pub(super) fn open(response: &RawResponse) -> Result<Envelope, LoadError> {
    let parsed = serde_json::from_str::<Value>(&response.body);
    if !response.is_success() {
        let message = parsed
            .ok()
            .and_then(|v| error_message(&v))
            .unwrap_or_default();
        return Err(LoadError::status(response.status, message));
    }
    let value = parsed.map_err(|e| LoadError::Parse(e.to_string()))?;
    let Value::Object(envelope) = value else {
        return Err(LoadError::Parse("expected a JSON object".to_string()));
    };
    check(&envelope)?;
    Ok(envelope)
}

fn error_message(value: &Value) -> Option<String> {
    value
        .get("error")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn check(envelope: &Envelope) -> Result<(), LoadError> {
    let status_failed = match envelope.get("status") {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => s != "success",
        Some(_) => true,
    };
    let success_failed = matches!(envelope.get("success"), Some(Value::Bool(false)));
    let error = error_message(&Value::Object(envelope.clone()));
    if status_failed || success_failed || error.is_some() {
        return Err(LoadError::Application(
            error.unwrap_or_else(|| UNKNOWN_FAILURE.to_string()),
        ));
    }
    Ok(())
}

/// Takes the list under `key`. A missing or null list is empty.
pub(super) fn collection<R>(mut envelope: Envelope, key: &str) -> Result<Vec<R>, LoadError>
where
    R: DeserializeOwned,
{
    match envelope.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value(item)
                    .map_err(|e| LoadError::Parse(format!("{key}[{i}]: {e}")))
            })
            .collect(),
        Some(_) => Err(LoadError::Parse(format!("'{key}' is not a list"))),
    }
}

/// Takes the object under `key`. A missing or null object is `T::default()`.
pub(super) fn object<T>(mut envelope: Envelope, key: &str) -> Result<T, LoadError>
where
    T: DeserializeOwned + Default,
{
    match envelope.remove(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => {
            serde_json::from_value(value).map_err(|e| LoadError::Parse(format!("{key}: {e}")))
        }
    }
}

/// Reads the envelope's own fields, besides the collection, as `T`.
pub(super) fn context<T>(envelope: &Envelope) -> Result<T, LoadError>
where
    T: DeserializeOwned,
{
    serde_json::from_value(Value::Object(envelope.clone()))
        .map_err(|e| LoadError::Parse(format!("context: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Transaction;

    fn ok(body: &str) -> RawResponse {
        RawResponse::new(200, body)
    }

    #[test]
    fn test_status_success() {
        let env = open(&ok(r#"{"status": "success", "data": []}"#)).unwrap();
        assert!(env.contains_key("data"));
    }

    #[test]
    fn test_no_markers_is_success() {
        assert!(open(&ok(r#"{"konten": []}"#)).is_ok());
    }

    #[test]
    fn test_status_error_is_application_error() {
        let err = open(&ok(r#"{"status": "error", "error": "Keine Berechtigung"}"#)).unwrap_err();
        assert_eq!(err, LoadError::Application("Keine Berechtigung".into()));
        let err = open(&ok(r#"{"success": false}"#)).unwrap_err();
        assert_eq!(err, LoadError::Application(UNKNOWN_FAILURE.into()));
        let err = open(&ok(r#"{"transaktionen": [], "error": "DB down"}"#)).unwrap_err();
        assert_eq!(err.to_string(), "DB down");
    }

    #[test]
    fn test_http_error_carries_envelope_message() {
        let err = open(&RawResponse::new(404, r#"{"error": "Antrag nicht gefunden"}"#)).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 404: Antrag nicht gefunden");
        let err = open(&RawResponse::new(500, "<html>Internal Server Error</html>")).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 500");
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        assert!(matches!(open(&ok("not json")), Err(LoadError::Parse(_))));
        assert!(matches!(open(&ok("[1, 2]")), Err(LoadError::Parse(_))));
    }

    #[test]
    fn test_collection_missing_is_empty() {
        let env = open(&ok(r#"{"status": "success"}"#)).unwrap();
        let rows: Vec<Transaction> = collection(env, "transaktionen").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_collection_bad_row_is_parse_error() {
        let env = open(&ok(r#"{"transaktionen": [{"betrag": 1}, {"betrag": "x"}]}"#)).unwrap();
        let err = collection::<Transaction>(env, "transaktionen").unwrap_err();
        assert!(err.to_string().contains("transaktionen[1]"));
    }

    #[test]
    fn test_collection_not_a_list() {
        let env = open(&ok(r#"{"konten": {"a": 1}}"#)).unwrap();
        assert!(collection::<Transaction>(env, "konten").is_err());
    }
}
