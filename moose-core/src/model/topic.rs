use crate::error::{CoreError, CoreResult};

/// A broker topic descriptor.
///
/// Invariant: if `namespace` is set, `name` begins with `namespace + "."`;
/// if `version` is set, `name` ends with `"_" + version_with_dots_as_underscores`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDescriptor {
    pub name: String,
    pub partitions: u32,
    pub retention_ms: i64,
    pub max_message_bytes: usize,
    pub namespace: Option<String>,
    pub version: Option<String>,
}

impl TopicDescriptor {
    /// Derive the base stream name by stripping the namespace prefix and
    /// version suffix affixes, validating both invariants. This is the Rust
    /// equivalent of `topicNameToStreamName`.
    pub fn base_stream_name(&self) -> CoreResult<String> {
        let mut name = self.name.as_str();

        if let Some(ns) = &self.namespace {
            let prefix = format!("{ns}.");
            match name.strip_prefix(prefix.as_str()) {
                Some(rest) => name = rest,
                None => {
                    return Err(CoreError::Validation(format!(
                        "topic name {:?} does not start with namespace prefix {:?}",
                        self.name, prefix
                    )));
                }
            }
        }

        let owned;
        if let Some(version) = &self.version {
            let suffix = format!("_{}", version.replace('.', "_"));
            match name.strip_suffix(suffix.as_str()) {
                Some(rest) => {
                    owned = rest.to_string();
                    name = owned.as_str();
                }
                None => {
                    return Err(CoreError::Validation(format!(
                        "topic name {:?} does not end with version suffix {:?}",
                        self.name, suffix
                    )));
                }
            }
        }

        Ok(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_namespace_and_version() {
        let topic = TopicDescriptor {
            name: "prod.Orders_1_2".to_string(),
            partitions: 3,
            retention_ms: 604_800_000,
            max_message_bytes: 1_048_576,
            namespace: Some("prod".to_string()),
            version: Some("1.2".to_string()),
        };
        assert_eq!(topic.base_stream_name().unwrap(), "Orders");
    }

    #[test]
    fn mismatched_namespace_is_an_error() {
        let topic = TopicDescriptor {
            name: "dev.Orders_1_2".to_string(),
            partitions: 3,
            retention_ms: 0,
            max_message_bytes: 1,
            namespace: Some("prod".to_string()),
            version: Some("1.2".to_string()),
        };
        assert!(topic.base_stream_name().is_err());
    }

    #[test]
    fn no_affixes_is_identity() {
        let topic = TopicDescriptor {
            name: "Orders".to_string(),
            partitions: 1,
            retention_ms: 0,
            max_message_bytes: 1,
            namespace: None,
            version: None,
        };
        assert_eq!(topic.base_stream_name().unwrap(), "Orders");
    }
}
