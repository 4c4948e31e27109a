//! 파일 기반 데이터 레이크.
//!
//! 계층형 경로(`2024-01-02/XNAS/AAPL.json`)로 객체를 주소 지정합니다.
//! 쓰기는 항상 생성 또는 덮어쓰기라 재전달된 job이 같은 경로에 다시 써도 안전합니다.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{DataError, Result};

/// 계층형 객체 저장소.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// `path`에 `content` 전체를 기록합니다 (생성 또는 덮어쓰기).
    async fn write(&self, path: &str, content: &[u8]) -> Result<()>;

    /// `path`의 내용을 읽습니다. 없으면 `None`.
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>>;
}

/// job에 담긴 데이터스토어 이름/컨테이너로 [`FileStore`]를 엽니다.
pub trait FileStoreProvider: Send + Sync {
    fn file_store(&self, datastore_name: &str, container: &str) -> Result<Arc<dyn FileStore>>;
}

/// 로컬 파일 시스템 데이터 레이크.
#[derive(Debug, Clone)]
pub struct LocalDataLake {
    root: PathBuf,
}

impl LocalDataLake {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 상대 경로를 루트 아래 절대 경로로 변환합니다.
    ///
    /// 루트 밖을 가리키는 경로(`..`, 절대 경로)는 거부합니다.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if path.is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(DataError::StorageError(format!("invalid object path: {path:?}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStore for LocalDataLake {
    async fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // 임시 파일에 쓴 뒤 rename: 읽는 쪽이 반쯤 쓰인 파일을 보지 않음.
        // 임시 파일 이름은 쓰기마다 달라야 같은 경로에 동시에 써도 서로 덮어쓰지 않음
        let mut tmp = target.clone().into_os_string();
        tmp.push(format!(".{}.tmp", Uuid::new_v4().simple()));
        let tmp = PathBuf::from(tmp);

        let written = match tokio::fs::write(&tmp, content).await {
            Ok(()) => tokio::fs::rename(&tmp, &target).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::trace!(path = path, bytes = content.len(), "객체 기록");
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// `{root}/{datastore_name}/{container}`에 데이터 레이크를 엽니다.
#[derive(Debug, Clone)]
pub struct LocalDataLakeProvider {
    root: PathBuf,
}

impl LocalDataLakeProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileStoreProvider for LocalDataLakeProvider {
    fn file_store(&self, datastore_name: &str, container: &str) -> Result<Arc<dyn FileStore>> {
        for segment in [datastore_name, container] {
            let mut components = Path::new(segment).components();
            if !matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            ) {
                return Err(DataError::ConfigError(format!(
                    "invalid datastore segment: {segment:?}"
                )));
            }
        }

        Ok(Arc::new(LocalDataLake::new(
            self.root.join(datastore_name).join(container),
        )))
    }
}
