//! Serde helpers rendering bytes as base64, as the proto3 JSON mapping does.

pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD as B64_ENGINE;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&B64_ENGINE.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        B64_ENGINE
            .decode(encoded)
            .map_err(|e| serde::de::Error::custom(format!("Invalid base64 encoding: {e}")))
    }
}

pub mod base64_bytes_vec {
    use base64::engine::general_purpose::STANDARD as B64_ENGINE;
    use base64::Engine;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(&B64_ENGINE.encode(item))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        let encoded = Vec::<String>::deserialize(deserializer)?;
        encoded
            .into_iter()
            .map(|item| {
                B64_ENGINE
                    .decode(item)
                    .map_err(|e| serde::de::Error::custom(format!("Invalid base64 encoding: {e}")))
            })
            .collect()
    }
}
