//! 거래소 단위 EOD 수집 job 디스크립터.
//!
//! controller가 만들고 큐를 거쳐 worker가 소비합니다. 큐에는
//! JSON 직렬화 후 base64 인코딩한 텍스트(envelope)가 실립니다.

use base64::Engine;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};

/// 날짜가 없는 job이 사용하는 "최신" 표기.
pub const LATEST: &str = "latest";

/// Job 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JobType {
    /// 일별 시세 수집
    #[default]
    #[serde(rename = "EOD")]
    Eod,
}

/// 거래소 하나에 대한 자기완결적 수집 작업.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// 거래소 이름
    pub exchange: String,
    /// 거래소 MIC
    pub exchange_mic: String,
    /// 대상 날짜 (`None`이면 최신 EOD)
    #[serde(default, with = "date_or_latest")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "type", default)]
    pub job_type: JobType,
    pub eod_datastore_id: String,
    pub eod_datastore_name: String,
    pub eod_datastore_container: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eod_datastore_subscription_id: Option<String>,
    /// true면 `{date}/{mic}`, false면 `{mic}/{date}` 경로 사용
    #[serde(with = "flexible_bool")]
    pub partition_by_date: bool,
    /// 쉼표로 구분된 심볼 목록
    pub tickers: String,
}

impl JobDescriptor {
    /// 쉼표로 구분된 심볼 목록을 분리합니다 (공백/빈 항목 제거).
    pub fn ticker_symbols(&self) -> Vec<&str> {
        self.tickers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// 경로와 엔드포인트에 쓰이는 날짜 표기.
    pub fn date_label(&self) -> String {
        match self.date {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => LATEST.to_string(),
        }
    }

    /// 업스트림 EOD 엔드포인트 (`eod/{date}` 또는 `eod/latest`).
    pub fn eod_endpoint(&self) -> String {
        format!("eod/{}", self.date_label())
    }

    /// 결과 파일 경로 prefix.
    pub fn file_prefix(&self) -> String {
        if self.partition_by_date {
            format!("{}/{}", self.date_label(), self.exchange_mic)
        } else {
            format!("{}/{}", self.exchange_mic, self.date_label())
        }
    }

    /// 큐 envelope로 인코딩합니다 (JSON → base64).
    pub fn to_envelope(&self) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        Ok(base64::engine::general_purpose::STANDARD
            .encode(json)
            .into_bytes())
    }

    /// 큐 envelope를 디코딩합니다.
    pub fn from_envelope(content: &[u8]) -> Result<Self> {
        let text = String::from_utf8(content.to_vec())?;
        let json = base64::engine::general_purpose::STANDARD.decode(text.trim())?;
        let job: Self = serde_json::from_slice(&json)?;
        if job.exchange_mic.trim().is_empty() {
            return Err(CoreError::InvalidJob("exchange_mic is empty".to_string()));
        }
        Ok(job)
    }
}

/// `"2024-01-02"`, `"latest"`, `null` 모두 허용.
mod date_or_latest {
    use super::*;

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> std::result::Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(v) if v.eq_ignore_ascii_case(LATEST) => Ok(None),
            Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// 기존 worker와 호환되도록 `"true"` 문자열로 쓰고, bool/문자열 모두 읽습니다.
mod flexible_bool {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &bool, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(if *value { "true" } else { "false" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<bool, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Bool(b) => Ok(b),
            Raw::Text(t) => match t.trim().to_lowercase().as_str() {
                "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
                "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
                other => Err(serde::de::Error::custom(format!(
                    "invalid truth value: {}",
                    other
                ))),
            },
        }
    }
}
