use crate::error::{Result, ShellError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// fsh 사용자 설정
///
/// 설정 파일은 ~/.fsh/config.toml에 저장됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 히스토리 파일 경로
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,

    /// 삭제 전 백업이 저장되는 디렉토리
    #[serde(default = "default_trash_dir")]
    pub trash_dir: PathBuf,

    /// 명령 저널 파일 경로
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
}

/// 설정 디렉토리 (~/.fsh)
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".fsh")
}

fn default_history_path() -> PathBuf {
    data_dir().join("history")
}

fn default_trash_dir() -> PathBuf {
    data_dir().join("trash")
}

fn default_log_path() -> PathBuf {
    data_dir().join("shell.log")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_path: default_history_path(),
            trash_dir: default_trash_dir(),
            log_path: default_log_path(),
        }
    }
}

impl Config {
    /// 기본 설정 파일 경로
    pub fn config_path() -> PathBuf {
        data_dir().join("config.toml")
    }

    /// 기본 경로에서 로드 (없으면 기본값 사용)
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// 지정한 경로에서 로드
    ///
    /// 파일이 없으면 기본값, 형식이 잘못되었으면 `ShellError::Config`를 반환합니다.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ShellError::io(format!("Cannot read {}", path.display()), e))?;

        toml::from_str(&content)
            .map_err(|e| ShellError::Config(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.history_path.ends_with(".fsh/history"));
        assert!(config.trash_dir.ends_with(".fsh/trash"));
        assert!(config.log_path.ends_with(".fsh/shell.log"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            history_path = "/tmp/fsh/history"
            trash_dir = "/tmp/fsh/trash"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.history_path, PathBuf::from("/tmp/fsh/history"));
        assert_eq!(config.trash_dir, PathBuf::from("/tmp/fsh/trash"));
        // 빠진 필드는 기본값
        assert!(config.log_path.ends_with("shell.log"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert!(config.trash_dir.ends_with("trash"));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "history_path = [1, 2").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ShellError::Config(_)));
    }
}
