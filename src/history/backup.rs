use crate::error::{Result, ShellError};
use crate::executor::fs_ops::{
    absolute_path, copy_file, copy_symlink, copy_tree, exists, move_path, resolve,
};
use crate::logging::Reporter;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// 백업 한 건 - 원래 위치와 휴지통 내 위치
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    pub original_path: PathBuf,
    pub trash_path: PathBuf,
}

/// 삭제 전에 파일/디렉토리 사본을 보관하는 휴지통
///
/// 보관된 항목은 복원될 때 휴지통에서 빠져나가며, 그 외에는 정리하지 않습니다.
pub struct BackupStore {
    dir: PathBuf,
    reporter: Rc<Reporter>,
}

impl BackupStore {
    /// 휴지통 디렉토리를 (없으면) 만들고 저장소를 엽니다.
    ///
    /// 상대 경로는 절대 경로로 바꿔 보관합니다.
    pub fn open(dir: impl Into<PathBuf>, reporter: Rc<Reporter>) -> Result<Self> {
        let dir = dir.into();
        let dir = absolute_path(&dir)
            .map_err(|e| ShellError::io(format!("Cannot resolve trash {}", dir.display()), e))?;
        fs::create_dir_all(&dir)
            .map_err(|e| ShellError::io(format!("Cannot create trash {}", dir.display()), e))?;
        Ok(Self { dir, reporter })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 삭제 대상들의 백업 생성
    ///
    /// 존재하지 않는 대상, `recursive` 없이 지정된 디렉토리는 조용히 건너뜁니다.
    /// 심볼릭 링크는 가리키는 대상이 아니라 링크 자체를 보관합니다.
    /// 개별 복사 실패는 보고만 하고 결과에서 제외합니다.
    pub fn create_backup(
        &self,
        cwd: &Path,
        targets: &[String],
        recursive: bool,
    ) -> Vec<BackupRecord> {
        let mut records = Vec::new();

        for target in targets {
            let original_path = resolve(cwd, target);
            let Ok(metadata) = fs::symlink_metadata(&original_path) else {
                continue;
            };
            if metadata.is_dir() && !recursive {
                continue;
            }
            let Some(name) = original_path.file_name() else {
                continue;
            };

            let trash_path = self.unique_path(name);
            let copied = if metadata.is_dir() {
                copy_tree(&original_path, &trash_path)
            } else if metadata.file_type().is_symlink() {
                copy_symlink(&original_path, &trash_path)
            } else {
                copy_file(&original_path, &trash_path)
            };

            match copied {
                Ok(()) => {
                    tracing::debug!(
                        original = %original_path.display(),
                        trash = %trash_path.display(),
                        "backup created"
                    );
                    records.push(BackupRecord {
                        original_path,
                        trash_path,
                    });
                }
                Err(e) => {
                    self.reporter
                        .say(&format!("Error creating backup: {}", e));
                    // 복사 도중 남은 잔여물 정리 (이름은 새로 할당된 것이므로 안전)
                    if exists(&trash_path) {
                        let _ = if metadata.is_dir() {
                            fs::remove_dir_all(&trash_path)
                        } else {
                            fs::remove_file(&trash_path)
                        };
                    }
                }
            }
        }

        records
    }

    /// 휴지통 항목을 원래 위치로 이동
    pub fn restore(&self, record: &BackupRecord) -> bool {
        if !exists(&record.trash_path) {
            self.reporter
                .say(&format!("Backup not found: {}", record.trash_path.display()));
            return false;
        }

        match move_path(&record.trash_path, &record.original_path) {
            Ok(()) => {
                tracing::debug!(original = %record.original_path.display(), "backup restored");
                true
            }
            Err(e) => {
                self.reporter.say(&format!(
                    "Error restoring {}: {}",
                    record.trash_path.display(),
                    e
                ));
                false
            }
        }
    }

    /// 쓰이지 않게 된 백업 삭제 (삭제가 거절된 대상 등)
    pub fn discard(&self, record: &BackupRecord) {
        let removed = match fs::symlink_metadata(&record.trash_path) {
            Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(&record.trash_path),
            Ok(_) => fs::remove_file(&record.trash_path),
            Err(_) => return,
        };
        if let Err(e) = removed {
            tracing::warn!(trash = %record.trash_path.display(), "cannot discard backup: {}", e);
        }
    }

    /// `name`, `name(1)`, `name(2)`, ... 중 비어 있는 첫 이름
    fn unique_path(&self, name: &OsStr) -> PathBuf {
        let candidate = self.dir.join(name);
        if !exists(&candidate) {
            return candidate;
        }

        let base = name.to_string_lossy();
        (1u64..)
            .map(|counter| self.dir.join(format!("{}({})", base, counter)))
            .find(|path| !exists(path))
            .unwrap_or(candidate)
    }
}
