//! Common serde helpers for lenient wire formats
//!
//! Clients round-trip GET bodies back into PUT requests, and some of them
//! send numeric fields as strings. These helpers keep the wire format
//! tolerant without loosening the domain types.

use serde::{Deserialize, Deserializer, de};

/// Deserialize an optional non-negative integer that may arrive as a JSON
/// number or a string (`10` and `"10"` are both accepted, `""` is absent).
pub fn capacity_flexible<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u32),
        Text(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<u32>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid capacity: {s:?}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Payload {
        #[serde(default, deserialize_with = "super::capacity_flexible")]
        capacity: Option<u32>,
    }

    #[test]
    fn accepts_number_and_string() {
        let p: Payload = serde_json::from_str(r#"{"capacity": 10}"#).unwrap();
        assert_eq!(p.capacity, Some(10));

        let p: Payload = serde_json::from_str(r#"{"capacity": "10"}"#).unwrap();
        assert_eq!(p.capacity, Some(10));

        let p: Payload = serde_json::from_str(r#"{"capacity": ""}"#).unwrap();
        assert_eq!(p.capacity, None);

        let p: Payload = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(p.capacity, None);
    }

    #[test]
    fn rejects_negative_and_garbage() {
        assert!(serde_json::from_str::<Payload>(r#"{"capacity": -1}"#).is_err());
        assert!(serde_json::from_str::<Payload>(r#"{"capacity": "lots"}"#).is_err());
    }
}
