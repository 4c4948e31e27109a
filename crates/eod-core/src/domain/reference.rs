//! 참조 데이터 (거래소, 종목, 타임존, 통화, 국가, 도시, 데이터스토어).
//!
//! seed 단계에서 한 번 적재되고 이후 controller는 읽기만 합니다.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// 거래소.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Exchange {
    pub id: i64,
    /// 거래소 이름 (예: "NASDAQ Stock Exchange")
    pub name: String,
    /// 약칭 (예: "NASDAQ")
    pub acronym: Option<String>,
    /// Market Identifier Code (예: "XNAS")
    pub mic: String,
    pub country_id: Option<i64>,
    pub city_id: Option<i64>,
    pub timezone_id: Option<i64>,
}

/// 추적 대상 종목.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Ticker {
    pub id: i64,
    /// 심볼 (예: "AAPL")
    pub ticker: String,
    /// 표시 이름
    pub name: String,
    pub exchange_id: i64,
}

/// 타임존.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Timezone {
    pub id: i64,
    /// IANA 이름 (예: "America/New_York")
    pub name: String,
    pub abbr: Option<String>,
    pub dst: Option<String>,
}

impl Timezone {
    /// IANA 타임존으로 파싱합니다.
    pub fn tz(&self) -> Result<Tz> {
        self.name
            .parse::<Tz>()
            .map_err(|_| CoreError::InvalidTimezone(self.name.clone()))
    }

    /// 주어진 UTC 시각을 이 타임존의 현지 날짜로 변환합니다.
    pub fn local_date(&self, now: DateTime<Utc>) -> Result<NaiveDate> {
        Ok(now.with_timezone(&self.tz()?).date_naive())
    }
}

/// 통화.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Currency {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub symbol: Option<String>,
}

/// 국가.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
}

/// 도시.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct City {
    pub id: i64,
    pub name: String,
    pub country_id: i64,
}

/// EOD 결과를 기록할 데이터 레이크.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct EodDatastore {
    pub id: i64,
    /// 스토리지 계정 이름
    pub name: String,
    pub url: Option<String>,
    /// 파일 시스템(컨테이너) 이름
    pub container: String,
    pub subscription_id: Option<String>,
}
