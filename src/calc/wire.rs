use crate::session::vars::VariableTable;
use serde::{Deserialize, Serialize};

/// JSON body posted to the calculation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculateRequest {
    /// PNG data URL of the whole canvas.
    pub image: String,
    pub dict_of_vars: VariableTable,
}

/// One recognized expression group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResult {
    #[serde(deserialize_with = "string_or_scalar")]
    pub expr: String,
    #[serde(deserialize_with = "string_or_scalar")]
    pub result: String,
    #[serde(default)]
    pub assign: bool,
}

impl RecognitionResult {
    pub fn new(expr: impl Into<String>, result: impl Into<String>, assign: bool) -> Self {
        Self {
            expr: expr.into(),
            result: result.into(),
            assign,
        }
    }
}

/// The service sometimes answers with bare numbers or booleans where a
/// string is expected.
fn string_or_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, found {other}"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub data: Vec<RecognitionResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_uses_service_field_names() {
        let mut vars = VariableTable::default();
        vars.assign("x", "5");
        let request = CalculateRequest {
            image: "data:image/png;base64,AAAA".into(),
            dict_of_vars: vars,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "image": "data:image/png;base64,AAAA",
                "dict_of_vars": { "x": "5" },
            })
        );
    }

    #[test]
    fn response_parses_tuples_in_order() {
        let body = r#"{"data":[
            {"expr":"x","result":"5","assign":true},
            {"expr":"2 + 3","result":"5","assign":false}
        ]}"#;
        let response: CalculateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.data,
            vec![
                RecognitionResult::new("x", "5", true),
                RecognitionResult::new("2 + 3", "5", false),
            ]
        );
    }

    #[test]
    fn missing_assign_flag_defaults_to_false() {
        let response: CalculateResponse =
            serde_json::from_str(r#"{"data":[{"expr":"1+1","result":"2"}]}"#).unwrap();
        assert!(!response.data[0].assign);
    }

    #[test]
    fn numeric_results_are_stringified() {
        let response: CalculateResponse =
            serde_json::from_str(r#"{"data":[{"expr":"y","result":2.5,"assign":true}]}"#)
                .unwrap();
        assert_eq!(response.data[0], RecognitionResult::new("y", "2.5", true));
    }

    #[test]
    fn response_without_data_is_rejected() {
        assert!(serde_json::from_str::<CalculateResponse>(r#"{"message":"ok"}"#).is_err());
    }
}
