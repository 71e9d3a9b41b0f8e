//! 元数据：编辑中的键值行容器，以及提交/加载时使用的有序键值对象

use super::rows::{RowId, RowList};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 每个容器最多的元数据行数
pub const MAX_METADATA_FIELDS: usize = 20;

/// 一行元数据
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

impl MetadataEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// 元数据编辑容器，计数显示即行数
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataContainer {
    rows: RowList<MetadataEntry>,
}

impl Default for MetadataContainer {
    fn default() -> Self {
        Self {
            rows: RowList::with_max(MAX_METADATA_FIELDS),
        }
    }
}

impl MetadataContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 计数显示
    pub fn counter(&self) -> usize {
        self.rows.len()
    }

    pub fn is_full(&self) -> bool {
        self.rows.is_full()
    }

    /// 追加空行
    pub fn add_field(&mut self) -> Option<RowId> {
        self.rows.push(MetadataEntry::default())
    }

    /// 追加带内容的行
    pub fn add_entry(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<RowId> {
        self.rows.push(MetadataEntry::new(key, value))
    }

    pub fn remove_field(&mut self, id: RowId) -> bool {
        self.rows.remove(id).is_some()
    }

    pub fn remove_last_field(&mut self) -> bool {
        self.rows.pop().is_some()
    }

    /// 增减到指定行数；超过上限时返回 false 且不做改动
    pub fn set_count(&mut self, count: usize) -> bool {
        if count > MAX_METADATA_FIELDS {
            return false;
        }
        while self.rows.len() < count {
            self.rows.push(MetadataEntry::default());
        }
        while self.rows.len() > count {
            self.rows.pop();
        }
        true
    }

    pub fn set_key(&mut self, id: RowId, key: impl Into<String>) -> bool {
        match self.rows.get_mut(id) {
            Some(entry) => {
                entry.key = key.into();
                true
            }
            None => false,
        }
    }

    pub fn set_value(&mut self, id: RowId, value: impl Into<String>) -> bool {
        match self.rows.get_mut(id) {
            Some(entry) => {
                entry.value = value.into();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: RowId) -> Option<&MetadataEntry> {
        self.rows.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = RowId> + '_ {
        self.rows.ids()
    }

    pub fn entries(&self) -> impl Iterator<Item = (RowId, &MetadataEntry)> {
        self.rows.iter().map(|r| (r.id, &r.value))
    }

    /// 只保留键和值（去空白后）都非空的行
    pub fn to_metadata(&self) -> Metadata {
        let mut metadata = Metadata::default();
        for entry in self.rows.values() {
            let key = entry.key.trim();
            let value = entry.value.trim();
            if !key.is_empty() && !value.is_empty() {
                metadata.insert(key, value);
            }
        }
        metadata
    }

    /// 用加载到的数据重建；超出上限的部分被丢弃并返回 false
    pub fn replace_with(&mut self, metadata: &Metadata) -> bool {
        self.rows.clear();
        let mut complete = true;
        for (key, value) in metadata.iter() {
            if self.rows.push(MetadataEntry::new(key, value)).is_none() {
                complete = false;
                break;
            }
        }
        complete
    }
}

/// 有序键值对象，键唯一，后写入的同名键覆盖前值
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Metadata::default();
        for (k, v) in iter {
            metadata.insert(k, v);
        }
        metadata
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// 按出现顺序读取对象；数字和布尔值转成字符串，null 视为空值
impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MetadataVisitor;

        impl<'de> Visitor<'de> for MetadataVisitor {
            type Value = Metadata;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object of metadata keys and values")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Metadata::default())
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut metadata = Metadata::default();
                while let Some((key, value)) = access.next_entry::<String, ScalarText>()? {
                    metadata.insert(key, value.0);
                }
                Ok(metadata)
            }
        }

        deserializer.deserialize_any(MetadataVisitor)
    }
}

/// 标量值的文本形式
struct ScalarText(String);

impl<'de> Deserialize<'de> for ScalarText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScalarVisitor;

        impl<'de> Visitor<'de> for ScalarVisitor {
            type Value = ScalarText;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string, number, boolean or null")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ScalarText(value.to_string()))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ScalarText(value.to_string()))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ScalarText(value.to_string()))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ScalarText(value.to_string()))
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ScalarText(value.to_string()))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ScalarText(String::new()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_tracks_rows() {
        let mut container = MetadataContainer::new();
        let a = container.add_field().unwrap();
        container.add_field().unwrap();
        assert_eq!(container.counter(), 2);

        assert!(container.remove_field(a));
        assert!(!container.remove_field(a));
        assert_eq!(container.counter(), 1);

        assert!(container.remove_last_field());
        assert!(!container.remove_last_field());
        assert_eq!(container.counter(), 0);
    }

    #[test]
    fn test_set_count_refuses_over_max() {
        let mut container = MetadataContainer::new();
        assert!(container.set_count(5));
        assert_eq!(container.counter(), 5);
        assert!(!container.set_count(21));
        assert_eq!(container.counter(), 5);
        assert!(container.set_count(2));
        assert_eq!(container.counter(), 2);
    }

    #[test]
    fn test_to_metadata_skips_incomplete_rows() {
        let mut container = MetadataContainer::new();
        container.add_entry(" region ", " north ");
        container.add_entry("empty_value", "  ");
        container.add_entry("", "orphan");
        let metadata = container.to_metadata();
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata.get("region"), Some("north"));
    }

    #[test]
    fn test_deserialize_keeps_order_and_stringifies() {
        let metadata: Metadata =
            serde_json::from_str(r#"{"z": "last?", "a": 3, "flag": true, "none": null}"#).unwrap();
        let keys: Vec<&str> = metadata.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "flag", "none"]);
        assert_eq!(metadata.get("a"), Some("3"));
        assert_eq!(metadata.get("flag"), Some("true"));
        assert_eq!(metadata.get("none"), Some(""));
    }

    #[test]
    fn test_serialize_keeps_insertion_order() {
        let metadata: Metadata = vec![("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(serde_json::to_string(&metadata).unwrap(), r#"{"b":"2","a":"1"}"#);
    }

    #[test]
    fn test_replace_with_truncates_at_max() {
        let metadata: Metadata = (0..25).map(|i| (format!("k{i}"), "v")).collect();
        let mut container = MetadataContainer::new();
        assert!(!container.replace_with(&metadata));
        assert_eq!(container.counter(), MAX_METADATA_FIELDS);
    }
}
