use crate::error::DiagError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Origin of a diagnostic conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Context {
    /// Diagnostic manager
    Dm,
    /// Diagnostics over IP
    DoIp,
    Fault,
}

/// Metadata accompanying a request. The router hands it to the resolved
/// service untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaInfo {
    context: Context,
    entries: BTreeMap<String, String>,
}

impl MetaInfo {
    pub fn new(context: Context) -> Self {
        MetaInfo { context, entries: BTreeMap::new() }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_value(key, value);
        self
    }

    pub fn context(&self) -> Context {
        self.context
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Like [`MetaInfo::get`], but an absent key is an error.
    pub fn value(&self, key: &str) -> Result<&str, DiagError> {
        self.get(key).ok_or_else(|| DiagError::ValueAbsent { key: key.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_access() {
        let meta = MetaInfo::new(Context::DoIp).with_value("source_address", "0x0E80");

        assert_eq!(meta.context(), Context::DoIp);
        assert_eq!(meta.get("source_address"), Some("0x0E80"));
        assert_eq!(meta.value("source_address"), Ok("0x0E80"));
        assert_eq!(meta.get("target_address"), None);
        assert_eq!(
            meta.value("target_address"),
            Err(DiagError::ValueAbsent { key: "target_address".into() })
        );
    }

    #[test]
    fn test_json_shape() {
        let meta = MetaInfo::new(Context::Dm).with_value("k", "v");
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, r#"{"context":"Dm","entries":{"k":"v"}}"#);
        assert_eq!(serde_json::from_str::<MetaInfo>(&json).unwrap(), meta);
    }
}
