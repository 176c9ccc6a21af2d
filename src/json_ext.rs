//! Defensive accessors over `serde_json::Value`.
//!
//! LSP payloads are duck-typed: fields are sometimes missing, sometimes the
//! wrong shape. These helpers treat "missing" and "wrong type" identically
//! (both become `None`) so translators never need to match on `Value`
//! variants by hand.

use serde_json::{Map, Value};

pub trait ValueExt {
    fn get_str(&self, key: &str) -> Option<&str>;
    fn get_array(&self, key: &str) -> Option<&Vec<Value>>;
    fn get_obj(&self, key: &str) -> Option<&Map<String, Value>>;
    fn get_obj_mut(&mut self, key: &str) -> Option<&mut Map<String, Value>>;
    fn get_i64_loose(&self, key: &str) -> Option<i64>;
}

impl ValueExt for Value {
    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    fn get_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key)?.as_array()
    }

    fn get_obj(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key)?.as_object()
    }

    fn get_obj_mut(&mut self, key: &str) -> Option<&mut Map<String, Value>> {
        self.get_mut(key)?.as_object_mut()
    }

    fn get_i64_loose(&self, key: &str) -> Option<i64> {
        self.get(key)?.as_i64()
    }
}

/// Ensures `value[key]` is an object, inserting `{}` if absent or the wrong
/// type, and returns a mutable reference to it.
pub fn ensure_object<'a>(value: &'a mut Value, key: &str) -> &'a mut Map<String, Value> {
    if !matches!(value.get(key), Some(Value::Object(_))) {
        if let Some(obj) = value.as_object_mut() {
            obj.insert(key.to_string(), Value::Object(Map::new()));
        }
    }
    value
        .get_mut(key)
        .and_then(|v| v.as_object_mut())
        .expect("ensure_object: value must be an object to hold key")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_str_returns_none_for_wrong_type() {
        let v = json!({"x": 42});
        assert_eq!(v.get_str("x"), None);
    }

    #[test]
    fn get_str_returns_some_for_string() {
        let v = json!({"x": "hi"});
        assert_eq!(v.get_str("x"), Some("hi"));
    }

    #[test]
    fn ensure_object_creates_missing_key() {
        let mut v = json!({});
        let obj = ensure_object(&mut v, "result");
        obj.insert("a".into(), json!(1));
        assert_eq!(v["result"]["a"], 1);
    }

    #[test]
    fn ensure_object_replaces_wrong_type() {
        let mut v = json!({"result": 5});
        let obj = ensure_object(&mut v, "result");
        obj.insert("a".into(), json!(1));
        assert_eq!(v["result"], json!({"a": 1}));
    }

    #[test]
    fn ensure_object_keeps_existing_object() {
        let mut v = json!({"result": {"a": 1}});
        let obj = ensure_object(&mut v, "result");
        obj.insert("b".into(), json!(2));
        assert_eq!(v["result"], json!({"a": 1, "b": 2}));
    }
}
