pub mod daily;
pub mod feature;
pub mod usage;

/// Lenient deserializers for backend fields that are sometimes null or
/// carry naive timestamps.
pub(crate) mod de {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    /// `null` reads as the type's default.
    pub fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Accepts RFC 3339 timestamps as well as naive ISO timestamps, which are
    /// taken as UTC. Unparseable values read as `None`.
    pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_timestamp))
    }

    pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
        None
    }

    /// Bucket dates are `YYYY-MM-DD`; a full timestamp is cut to its date.
    pub fn bucket_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let day = raw.get(..10).unwrap_or(&raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(serde::de::Error::custom)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn parse_rfc3339_and_naive() {
            assert!(parse_timestamp("2025-01-05T10:30:00Z").is_some());
            assert!(parse_timestamp("2025-01-05T10:30:00+00:00").is_some());
            assert!(parse_timestamp("2025-01-05T10:30:00.123456").is_some());
            assert!(parse_timestamp("yesterday").is_none());
        }

        #[test]
        fn naive_timestamp_is_utc() {
            let a = parse_timestamp("2025-01-05T10:30:00").unwrap();
            let b = parse_timestamp("2025-01-05T10:30:00Z").unwrap();
            assert_eq!(a, b);
        }
    }
}
