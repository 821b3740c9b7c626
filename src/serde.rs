use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Items stored in a keyed map but persisted as a plain list.
pub trait GetKey {
    fn get_key(&self) -> &str;
}

pub fn serialize_map_values<S: Serializer, K, V: Clone + Serialize>(
    map: &IndexMap<K, V>,
    s: S,
) -> Result<S::Ok, S::Error> {
    map.iter()
        .map(|(_, v)| v.clone())
        .collect::<Vec<_>>()
        .serialize(s)
}

pub fn deserialize_map_values<'de, D, T: GetKey>(
    d: D,
) -> Result<IndexMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let data = <Vec<T>>::deserialize(d)?;

    let mapped = data
        .into_iter()
        .map(|elem| (elem.get_key().to_string(), elem))
        .collect();

    Ok(mapped)
}

pub fn serialize_utc<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&value.to_rfc3339())
}

/// Accepts RFC 3339 strings, offset-less ISO timestamps (read as UTC) and
/// unix milliseconds. The backend is not consistent about which it emits.
pub fn deserialize_utc<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    struct UtcTimestamp;

    impl<'de> Visitor<'de> for UtcTimestamp {
        type Value = DateTime<Utc>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an ISO 8601 timestamp or unix milliseconds")
        }

        fn visit_str<E>(self, value: &str) -> Result<DateTime<Utc>, E>
        where
            E: de::Error,
        {
            if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
                return Ok(dt.with_timezone(&Utc));
            }
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc())
                .map_err(|_| E::custom(format!("unrecognised timestamp: {}", value)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            DateTime::from_timestamp_millis(v)
                .ok_or_else(|| E::custom(format!("timestamp out of range: {}", v)))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let v = i64::try_from(v).map_err(|_| E::custom("timestamp out of range"))?;
            self.visit_i64(v)
        }
    }

    deserializer.deserialize_any(UtcTimestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Deserialize)]
    struct Stamped {
        #[serde(deserialize_with = "deserialize_utc")]
        at: DateTime<Utc>,
    }

    fn parse(json: &str) -> DateTime<Utc> {
        serde_json::from_str::<Stamped>(json).unwrap().at
    }

    #[test]
    fn test_accepts_backend_timestamp_shapes() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 15, 14, 0, 0).unwrap();
        assert_eq!(parse(r#"{"at": "2024-03-15T14:00:00Z"}"#), expected);
        assert_eq!(parse(r#"{"at": "2024-03-15T10:00:00-04:00"}"#), expected);
        assert_eq!(parse(r#"{"at": "2024-03-15T14:00:00.000000"}"#), expected);
        assert_eq!(parse(r#"{"at": 1710511200000}"#), expected);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(serde_json::from_str::<Stamped>(r#"{"at": "yesterday"}"#).is_err());
    }
}
