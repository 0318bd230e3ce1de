//! Serde helpers that strip surrounding whitespace while deserializing, so
//! `length(min = 1)` rules reject blank input.

use serde::{Deserialize, Deserializer};

pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

pub fn option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|v| v.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Payload {
        #[serde(deserialize_with = "super::string")]
        name: String,
        #[serde(default, deserialize_with = "super::option")]
        city: Option<String>,
    }

    #[test]
    fn test_strips_whitespace() {
        let payload: Payload = serde_json::from_str(r#"{"name":"  Ada \n","city":" Lagos "}"#).unwrap();
        assert_eq!(payload.name, "Ada");
        assert_eq!(payload.city.as_deref(), Some("Lagos"));
    }

    #[test]
    fn test_missing_optional_stays_none() {
        let payload: Payload = serde_json::from_str(r#"{"name":"Ada"}"#).unwrap();
        assert_eq!(payload.city, None);
    }
}
