//! 일별 시세(EOD) 레코드.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// 종목 하나의 하루치 시세.
///
/// 업스트림이 돌려준 JSON 객체를 그대로 보관합니다. 숫자 표기, 누락 필드, 알 수 없는
/// 필드 모두 변형 없이 파일에 다시 기록됩니다. 검증하는 필드는 파일 이름에 쓰이는
/// `symbol` 하나뿐입니다.
#[derive(Debug, Clone, PartialEq)]
pub struct EodRecord {
    fields: Map<String, Value>,
}

impl EodRecord {
    /// 업스트림 레코드를 검증합니다. 객체가 아니거나 `symbol`이 비어 있으면 실패합니다.
    pub fn from_value(value: Value) -> Result<Self> {
        let fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(CoreError::InvalidRecord(format!(
                    "객체가 아닌 레코드: {}",
                    other
                )))
            }
        };

        let has_symbol = matches!(
            fields.get("symbol"),
            Some(Value::String(symbol)) if !symbol.trim().is_empty()
        );
        if !has_symbol {
            return Err(CoreError::InvalidRecord(format!(
                "symbol 없음: {}",
                Value::Object(fields)
            )));
        }

        Ok(Self { fields })
    }

    pub fn symbol(&self) -> &str {
        self.fields
            .get("symbol")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// 필드 값 조회
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// 레코드 파일 이름 (`{symbol}.json`).
    ///
    /// `%`, `/`, `\`는 퍼센트 인코딩하므로 서로 다른 심볼이 같은 파일 이름이 되지 않습니다.
    pub fn file_name(&self) -> String {
        let mut name = String::with_capacity(self.symbol().len() + 5);
        for c in self.symbol().chars() {
            match c {
                '%' => name.push_str("%25"),
                '/' => name.push_str("%2F"),
                '\\' => name.push_str("%5C"),
                _ => name.push(c),
            }
        }
        name.push_str(".json");
        name
    }
}

impl TryFrom<Value> for EodRecord {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

impl Serialize for EodRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EodRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upstream_record_written_verbatim() {
        let raw = json!({
            "symbol": "AAPL",
            "date": "2024-01-02T00:00:00+0000",
            "open": 187.15,
            "close": "n/a",
            "volume": 82488700,
            "adj_close": 185.4,
            "split_factor": 1.0
        });

        let record = EodRecord::from_value(raw.clone()).unwrap();
        assert_eq!(record.symbol(), "AAPL");
        assert_eq!(record.get("adj_close"), Some(&json!(185.4)));

        let written = serde_json::to_string(&record).unwrap();
        assert!(written.contains("\"volume\":82488700"));
        assert!(!written.contains("null"));
        assert_eq!(serde_json::from_str::<Value>(&written).unwrap(), raw);
    }

    #[test]
    fn test_record_without_symbol_is_rejected() {
        for raw in [
            json!({ "close": 1.0 }),
            json!({ "symbol": null, "close": 1.0 }),
            json!({ "symbol": "  " }),
            json!({ "symbol": 42 }),
            json!(["AAPL"]),
        ] {
            let result = EodRecord::from_value(raw.clone());
            assert!(matches!(result, Err(CoreError::InvalidRecord(_))), "{raw}");
        }
        assert!(serde_json::from_value::<EodRecord>(json!({ "close": 1.0 })).is_err());
    }

    #[test]
    fn test_file_name_escapes_separators() {
        let name = |symbol: &str| {
            EodRecord::from_value(json!({ "symbol": symbol }))
                .unwrap()
                .file_name()
        };

        assert_eq!(name("AAPL"), "AAPL.json");
        assert_eq!(name("BRK/B"), "BRK%2FB.json");
        assert_eq!(name("BRK_B"), "BRK_B.json");
        assert_eq!(name("A\\B"), "A%5CB.json");
        assert_eq!(name("A%2FB"), "A%252FB.json");
    }

    proptest::proptest! {
        #[test]
        fn prop_file_name_is_single_component(symbol in "[A-Za-z0-9._%/\\\\-]{1,12}") {
            let record = EodRecord::from_value(json!({ "symbol": symbol })).unwrap();
            let name = record.file_name();
            proptest::prop_assert!(name.ends_with(".json"));
            proptest::prop_assert!(!name.contains('/') && !name.contains('\\'));
        }

        #[test]
        fn prop_distinct_symbols_get_distinct_file_names(
            a in "[A-Z_%/\\\\]{1,6}",
            b in "[A-Z_%/\\\\]{1,6}",
        ) {
            proptest::prop_assume!(a != b);
            let a = EodRecord::from_value(json!({ "symbol": a })).unwrap();
            let b = EodRecord::from_value(json!({ "symbol": b })).unwrap();
            proptest::prop_assert_ne!(a.file_name(), b.file_name());
        }
    }
}
