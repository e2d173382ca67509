//! 설정 관리.
//!
//! 트래커 인스턴스 하나가 소유하는 설정 저장소. 생성 시 검증하고,
//! 런타임 부분 변경(`ConfigPatch`)을 원자적으로 반영한다.
//! JSON 설정 파일에서 로드할 수도 있다.

use crate::config::{ConfigPatch, TrackerConfig};
use crate::error::CoreError;
use parking_lot::RwLock;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// 설정 관리자
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// 현재 설정 (스레드 안전)
    config: Arc<RwLock<TrackerConfig>>,
}

impl ConfigManager {
    /// 검증된 설정으로 관리자 생성
    pub fn new(config: TrackerConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// JSON 설정 파일에서 로드
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let config = Self::load_from_file(path)?;
        info!("설정 파일 로드: {}", path.display());
        Self::new(config)
    }

    /// 현재 설정 반환 (복제본)
    pub fn get(&self) -> TrackerConfig {
        self.config.read().clone()
    }

    /// 부분 설정 변경
    ///
    /// 병합 결과가 유효하지 않으면 기존 설정을 유지하고 에러를 반환한다.
    pub fn apply(&self, patch: &ConfigPatch) -> Result<TrackerConfig, CoreError> {
        let mut current = self.config.write();
        let next = patch.merged_into(&current);
        next.validate()?;
        *current = next.clone();
        debug!("설정 변경 반영");
        Ok(next)
    }

    /// 특정 필드만 직접 변경 (검증 포함)
    pub fn update_with<F>(&self, updater: F) -> Result<TrackerConfig, CoreError>
    where
        F: FnOnce(&mut TrackerConfig),
    {
        let mut current = self.config.write();
        let mut next = current.clone();
        updater(&mut next);
        next.validate()?;
        *current = next.clone();
        Ok(next)
    }

    /// 현재 설정을 파일로 저장
    pub fn save_to_file(&self, path: &Path) -> Result<(), CoreError> {
        let content = serde_json::to_string_pretty(&self.get())
            .map_err(|e| CoreError::Config(format!("설정 직렬화 실패: {}", e)))?;

        fs::write(path, content).map_err(|e| {
            CoreError::Config(format!("설정 파일 저장 실패: {}: {}", path.display(), e))
        })?;
        debug!("설정 저장 완료: {}", path.display());
        Ok(())
    }

    /// 파일에서 설정 로드
    fn load_from_file(path: &Path) -> Result<TrackerConfig, CoreError> {
        let content = fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("설정 파일 읽기 실패: {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            CoreError::Config(format!("설정 파일 파싱 실패: {}: {}", path.display(), e))
        })
    }
}
