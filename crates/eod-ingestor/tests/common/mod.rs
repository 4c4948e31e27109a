//! 통합 테스트용 인메모리 협력자.

#![allow(dead_code)]

use async_trait::async_trait;
use eod_core::{City, Country, EodDatastore, Exchange, Ticker, Timezone};
use eod_data::storage::reference::{
    NewCurrency, NewDatastore, NewExchange, NewTicker, NewTimezone,
};
use eod_data::{
    DataError, FileStore, FileStoreProvider, JobQueue, Page, PageSource, QueueMessage,
    ReferenceStore, Result,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ==================== 참조 데이터 ====================

#[derive(Default)]
pub struct ReferenceState {
    pub exchanges: Vec<Exchange>,
    pub tickers: Vec<Ticker>,
    pub timezones: Vec<Timezone>,
    pub countries: Vec<Country>,
    pub cities: Vec<City>,
    pub currencies: Vec<NewCurrency>,
    pub datastores: Vec<EodDatastore>,
    /// 종목 조회가 실패하는 거래소 ID
    pub failing_ticker_lookups: Vec<i64>,
}

#[derive(Default)]
pub struct MemoryReferenceStore {
    pub state: Mutex<ReferenceState>,
}

impl MemoryReferenceStore {
    pub fn add_timezone(&self, name: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.timezones.len() as i64 + 1;
        state.timezones.push(Timezone {
            id,
            name: name.to_string(),
            abbr: None,
            dst: None,
        });
        id
    }

    pub fn add_exchange(&self, name: &str, mic: &str, timezone_id: Option<i64>) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.exchanges.len() as i64 + 1;
        state.exchanges.push(Exchange {
            id,
            name: name.to_string(),
            acronym: None,
            mic: mic.to_string(),
            country_id: None,
            city_id: None,
            timezone_id,
        });
        id
    }

    pub fn add_ticker(&self, symbol: &str, exchange_id: i64) {
        let mut state = self.state.lock().unwrap();
        let id = state.tickers.len() as i64 + 1;
        state.tickers.push(Ticker {
            id,
            ticker: symbol.to_string(),
            name: symbol.to_string(),
            exchange_id,
        });
    }

    pub fn add_datastore(&self, name: &str, container: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.datastores.len() as i64 + 1;
        state.datastores.push(EodDatastore {
            id,
            name: name.to_string(),
            url: None,
            container: container.to_string(),
            subscription_id: None,
        });
        id
    }

    pub fn exchanges(&self) -> Vec<Exchange> {
        self.state.lock().unwrap().exchanges.clone()
    }
}

#[async_trait]
impl ReferenceStore for MemoryReferenceStore {
    async fn get_exchanges(&self) -> Result<Vec<Exchange>> {
        Ok(self.state.lock().unwrap().exchanges.clone())
    }

    async fn get_exchange_by_name(&self, name: &str) -> Result<Option<Exchange>> {
        let state = self.state.lock().unwrap();
        Ok(state.exchanges.iter().find(|e| e.name == name).cloned())
    }

    async fn get_tickers_by_exchange(&self, exchange_id: i64) -> Result<Vec<Ticker>> {
        let state = self.state.lock().unwrap();
        if state.failing_ticker_lookups.contains(&exchange_id) {
            return Err(DataError::QueryError("connection reset".to_string()));
        }
        Ok(state
            .tickers
            .iter()
            .filter(|t| t.exchange_id == exchange_id)
            .cloned()
            .collect())
    }

    async fn get_timezone(&self, id: i64) -> Result<Option<Timezone>> {
        let state = self.state.lock().unwrap();
        Ok(state.timezones.iter().find(|t| t.id == id).cloned())
    }

    async fn get_timezone_by_name(&self, name: &str) -> Result<Option<Timezone>> {
        let state = self.state.lock().unwrap();
        Ok(state.timezones.iter().find(|t| t.name == name).cloned())
    }

    async fn get_country_by_name(&self, name: &str) -> Result<Option<Country>> {
        let state = self.state.lock().unwrap();
        Ok(state.countries.iter().find(|c| c.name == name).cloned())
    }

    async fn get_city(&self, name: &str, country_id: i64) -> Result<Option<City>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .cities
            .iter()
            .find(|c| c.name == name && c.country_id == country_id)
            .cloned())
    }

    async fn get_datastore(&self, id: i64) -> Result<Option<EodDatastore>> {
        let state = self.state.lock().unwrap();
        Ok(state.datastores.iter().find(|d| d.id == id).cloned())
    }

    async fn set_timezone(&self, timezone: &NewTimezone) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.timezones.iter_mut().find(|t| t.name == timezone.name) {
            existing.abbr = timezone.abbr.clone();
            existing.dst = timezone.dst.clone();
            return Ok(existing.id);
        }
        let id = state.timezones.len() as i64 + 1;
        state.timezones.push(Timezone {
            id,
            name: timezone.name.clone(),
            abbr: timezone.abbr.clone(),
            dst: timezone.dst.clone(),
        });
        Ok(id)
    }

    async fn set_currency(&self, currency: &NewCurrency) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        if let Some(pos) = state.currencies.iter().position(|c| c.code == currency.code) {
            state.currencies[pos] = currency.clone();
            return Ok(pos as i64 + 1);
        }
        state.currencies.push(currency.clone());
        Ok(state.currencies.len() as i64)
    }

    async fn set_country(&self, name: &str, code: Option<&str>) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.countries.iter_mut().find(|c| c.name == name) {
            existing.code = code.map(str::to_string);
            return Ok(existing.id);
        }
        let id = state.countries.len() as i64 + 1;
        state.countries.push(Country {
            id,
            name: name.to_string(),
            code: code.map(str::to_string),
        });
        Ok(id)
    }

    async fn set_city(&self, name: &str, country_id: i64) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .cities
            .iter()
            .find(|c| c.name == name && c.country_id == country_id)
        {
            return Ok(existing.id);
        }
        let id = state.cities.len() as i64 + 1;
        state.cities.push(City {
            id,
            name: name.to_string(),
            country_id,
        });
        Ok(id)
    }

    async fn set_exchange(&self, exchange: &NewExchange) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        let id = match state.exchanges.iter().find(|e| e.mic == exchange.mic) {
            Some(existing) => existing.id,
            None => state.exchanges.len() as i64 + 1,
        };
        let row = Exchange {
            id,
            name: exchange.name.clone(),
            acronym: exchange.acronym.clone(),
            mic: exchange.mic.clone(),
            country_id: exchange.country_id,
            city_id: exchange.city_id,
            timezone_id: exchange.timezone_id,
        };
        match state.exchanges.iter_mut().find(|e| e.id == id) {
            Some(existing) => *existing = row,
            None => state.exchanges.push(row),
        }
        Ok(id)
    }

    async fn set_ticker(&self, ticker: &NewTicker) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .tickers
            .iter_mut()
            .find(|t| t.ticker == ticker.ticker && t.exchange_id == ticker.exchange_id)
        {
            existing.name = ticker.name.clone();
            return Ok(existing.id);
        }
        let id = state.tickers.len() as i64 + 1;
        state.tickers.push(Ticker {
            id,
            ticker: ticker.ticker.clone(),
            name: ticker.name.clone(),
            exchange_id: ticker.exchange_id,
        });
        Ok(id)
    }

    async fn set_datastore(&self, datastore: &NewDatastore) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .datastores
            .iter_mut()
            .find(|d| d.name == datastore.name && d.container == datastore.container)
        {
            existing.url = datastore.url.clone();
            existing.subscription_id = datastore.subscription_id.clone();
            return Ok(existing.id);
        }
        let id = state.datastores.len() as i64 + 1;
        state.datastores.push(EodDatastore {
            id,
            name: datastore.name.clone(),
            url: datastore.url.clone(),
            container: datastore.container.clone(),
            subscription_id: datastore.subscription_id.clone(),
        });
        Ok(id)
    }
}

// ==================== 큐 ====================

#[derive(Default)]
struct QueueState {
    next_id: u64,
    pending: VecDeque<String>,
    bodies: HashMap<String, Vec<u8>>,
    receipts: HashMap<String, String>,
    dequeues: HashMap<String, u32>,
    deleted: Vec<String>,
}

/// 임대가 만료되지 않는 인메모리 큐 (테스트 한 번 안에서는 재전달 없음).
#[derive(Default)]
pub struct MemoryQueue {
    state: Mutex<QueueState>,
    /// true면 send_message가 실패
    pub fail_send: Mutex<bool>,
}

impl MemoryQueue {
    /// 지금까지 등록된 모든 메시지 본문 (삭제 여부 무관, 등록 순서)
    pub fn sent(&self) -> Vec<Vec<u8>> {
        let state = self.state.lock().unwrap();
        let mut ids: Vec<&String> = state.bodies.keys().collect();
        ids.sort_by_key(|id| id.parse::<u64>().unwrap_or_default());
        ids.into_iter().map(|id| state.bodies[id].clone()).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }

    pub fn deleted_count(&self) -> usize {
        self.state.lock().unwrap().deleted.len()
    }

    /// 임대 중(삭제되지 않은) 메시지 수
    pub fn leased_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.receipts.len()
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn approximate_message_count(&self) -> Result<u64> {
        Ok(self.state.lock().unwrap().pending.len() as u64)
    }

    async fn send_message(&self, content: &[u8]) -> Result<String> {
        if *self.fail_send.lock().unwrap() {
            return Err(DataError::QueueError("queue unavailable".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id.to_string();
        state.bodies.insert(id.clone(), content.to_vec());
        state.pending.push_back(id.clone());
        Ok(id)
    }

    async fn receive_messages(
        &self,
        max_messages: usize,
        _visibility_timeout: Duration,
    ) -> Result<Vec<QueueMessage>> {
        let mut state = self.state.lock().unwrap();
        let mut messages = Vec::new();
        while messages.len() < max_messages {
            let Some(id) = state.pending.pop_front() else {
                break;
            };
            let receipt = format!("receipt-{}", id);
            state.receipts.insert(id.clone(), receipt.clone());
            let count = state.dequeues.entry(id.clone()).or_insert(0);
            *count += 1;
            let dequeue_count = *count;
            messages.push(QueueMessage {
                content: state.bodies[&id].clone(),
                id,
                pop_receipt: receipt,
                dequeue_count,
            });
        }
        Ok(messages)
    }

    async fn delete_message(&self, message: &QueueMessage) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.receipts.get(&message.id) != Some(&message.pop_receipt) {
            return Err(DataError::QueueError("pop receipt mismatch".to_string()));
        }
        state.receipts.remove(&message.id);
        state.deleted.push(message.id.clone());
        Ok(())
    }
}

// ==================== 파일 스토어 ====================

#[derive(Default)]
pub struct MemoryFileStore {
    pub objects: Mutex<BTreeMap<String, Vec<u8>>>,
    /// 경로에 이 문자열이 포함되면 쓰기 실패
    pub fail_on: Mutex<Option<String>>,
}

impl MemoryFileStore {
    pub fn paths(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn json(&self, path: &str) -> Option<Value> {
        self.objects
            .lock()
            .unwrap()
            .get(path)
            .map(|bytes| serde_json::from_slice(bytes).unwrap())
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        if let Some(pattern) = self.fail_on.lock().unwrap().as_deref() {
            if path.contains(pattern) {
                return Err(DataError::StorageError(format!("write failed: {}", path)));
            }
        }
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_vec());
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.objects.lock().unwrap().get(path).cloned())
    }
}

/// 데이터스토어 이름/컨테이너와 무관하게 같은 스토어를 돌려주고 요청을 기록합니다.
pub struct MemoryStoreProvider {
    pub store: Arc<MemoryFileStore>,
    pub opened: Mutex<Vec<(String, String)>>,
}

impl MemoryStoreProvider {
    pub fn new(store: Arc<MemoryFileStore>) -> Self {
        Self {
            store,
            opened: Mutex::new(Vec::new()),
        }
    }
}

impl FileStoreProvider for MemoryStoreProvider {
    fn file_store(&self, datastore_name: &str, container: &str) -> Result<Arc<dyn FileStore>> {
        self.opened
            .lock()
            .unwrap()
            .push((datastore_name.to_string(), container.to_string()));
        let store: Arc<dyn FileStore> = self.store.clone();
        Ok(store)
    }
}

// ==================== 업스트림 ====================

/// 요청된 심볼마다 레코드 하나를 돌려주는 EOD 업스트림.
///
/// `fail_symbol`이 요청에 포함되면 에러를 돌려줍니다.
/// `records`에 등록된 심볼은 기본 레코드 대신 등록된 값을 돌려줍니다.
#[derive(Default)]
pub struct EodSource {
    pub calls: Mutex<Vec<(String, Vec<String>)>>,
    pub fail_symbol: Option<String>,
    pub records: HashMap<String, Value>,
}

impl EodSource {
    pub fn failing_on(symbol: &str) -> Self {
        Self {
            fail_symbol: Some(symbol.to_string()),
            ..Default::default()
        }
    }

    pub fn with_record(mut self, symbol: &str, record: Value) -> Self {
        self.records.insert(symbol.to_string(), record);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PageSource for EodSource {
    async fn get_page(
        &self,
        endpoint: &str,
        _limit: u64,
        _offset: u64,
        extra_params: &[(String, String)],
    ) -> Result<Page> {
        let symbols: Vec<String> = extra_params
            .iter()
            .find(|(k, _)| k == "symbols")
            .map(|(_, v)| v.split(',').map(str::to_string).collect())
            .unwrap_or_default();
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), symbols.clone()));

        if let Some(fail) = &self.fail_symbol {
            if symbols.contains(fail) {
                return Err(DataError::FetchError("503 Service Unavailable".to_string()));
            }
        }

        let date = endpoint.trim_start_matches("eod/");
        let data: Vec<Value> = symbols
            .iter()
            .map(|s| match self.records.get(s) {
                Some(record) => record.clone(),
                None => serde_json::json!({ "symbol": s, "date": date, "close": 100.0 }),
            })
            .collect();
        Ok(serde_json::from_value(serde_json::json!({ "data": data })).unwrap())
    }
}

/// 엔드포인트별로 고정된 레코드 배열을 돌려주는 업스트림 (pagination 없음).
#[derive(Default)]
pub struct FixtureSource {
    pub fixtures: HashMap<String, Value>,
    pub failing: Vec<String>,
}

impl FixtureSource {
    pub fn with(mut self, endpoint: &str, data: Value) -> Self {
        self.fixtures.insert(endpoint.to_string(), data);
        self
    }

    pub fn failing(mut self, endpoint: &str) -> Self {
        self.failing.push(endpoint.to_string());
        self
    }
}

#[async_trait]
impl PageSource for FixtureSource {
    async fn get_page(
        &self,
        endpoint: &str,
        _limit: u64,
        _offset: u64,
        _extra_params: &[(String, String)],
    ) -> Result<Page> {
        if self.failing.iter().any(|e| e == endpoint) {
            return Err(DataError::FetchError(format!("{} unavailable", endpoint)));
        }
        let data = self
            .fixtures
            .get(endpoint)
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        Ok(serde_json::from_value(serde_json::json!({ "data": data })).unwrap())
    }
}
