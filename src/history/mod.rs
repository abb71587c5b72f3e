pub mod backup;
pub mod log;
pub mod undo;

pub use backup::{BackupRecord, BackupStore};
pub use log::{HistoryEntry, HistoryLog};
pub use undo::{CommandKind, UndoOutcome, UndoRecord, UndoStack};

use crate::error::Result;
use crate::executor::validator::{ParsedArgs, RECURSIVE_FLAG};
use crate::logging::Reporter;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// 명령 히스토리, 휴지통, 되돌리기 스택을 묶은 관리자
pub struct HistoryManager {
    log: HistoryLog,
    backups: BackupStore,
    undo_stack: UndoStack,
}

impl HistoryManager {
    /// 히스토리 파일을 읽고 휴지통 디렉토리를 준비합니다.
    pub fn open(
        history_path: impl Into<PathBuf>,
        trash_dir: impl Into<PathBuf>,
        reporter: Rc<Reporter>,
    ) -> Result<Self> {
        Ok(Self {
            log: HistoryLog::open(history_path, reporter.clone()),
            backups: BackupStore::open(trash_dir, reporter.clone())?,
            undo_stack: UndoStack::new(reporter),
        })
    }

    pub fn add_command(&mut self, name: &str, args: &[String]) {
        self.log.add_command(name, args);
    }

    pub fn show_history(&self, args: &[String]) -> Result<()> {
        self.log.show_history(args)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        self.log.entries()
    }

    pub fn trash_dir(&self) -> &Path {
        self.backups.dir()
    }

    /// rm 인자 그대로 받아 삭제 전 백업 생성 (`-r` 여부는 인자에서 판단)
    pub fn create_backup(&self, cwd: &Path, args: &[String]) -> Vec<BackupRecord> {
        let parsed = ParsedArgs::parse(args, &[RECURSIVE_FLAG]);
        self.backups
            .create_backup(cwd, &parsed.positionals, parsed.has(RECURSIVE_FLAG))
    }

    pub fn discard_backups(&self, records: &[BackupRecord]) {
        for record in records {
            self.backups.discard(record);
        }
    }

    /// 성공한 cp/mv/rm 을 되돌리기 스택에 기록
    pub fn record_for_undo(&mut self, record: UndoRecord) {
        self.undo_stack.push(record);
    }

    pub fn undo(&mut self) -> UndoOutcome {
        self.undo_stack.undo(&self.backups)
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo_stack
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_remove_round_trip_with_recursion() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let (reporter, capture) = Reporter::capture();
        let mut history = HistoryManager::open(
            root.join("state/history"),
            root.join("state/trash"),
            Rc::new(reporter),
        )
        .unwrap();

        fs::create_dir_all(root.join("docs/a/b")).unwrap();
        fs::write(root.join("docs/top.txt"), "top").unwrap();
        fs::write(root.join("docs/a/b/deep.bin"), [0u8, 1, 2, 255]).unwrap();

        let rm_args = args(&["-r", "docs"]);
        history.add_command("rm", &rm_args);
        let backups = history.create_backup(root, &rm_args);
        assert_eq!(backups.len(), 1);
        fs::remove_dir_all(root.join("docs")).unwrap();
        history.record_for_undo(
            UndoRecord::new(CommandKind::Remove, &rm_args, root).with_backups(backups),
        );

        assert!(matches!(history.undo(), UndoOutcome::Reverted(_)));
        assert_eq!(fs::read_to_string(root.join("docs/top.txt")).unwrap(), "top");
        assert_eq!(fs::read(root.join("docs/a/b/deep.bin")).unwrap(), vec![0u8, 1, 2, 255]);
        assert!(capture.console().contains("Undo: rm -r docs"));
        assert!(history.undo_stack().is_empty());

        assert_eq!(history.undo(), UndoOutcome::Empty);
        assert_eq!(history.entries().len(), 1);
    }

    #[test]
    fn test_create_backup_ignores_flag_token() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let (reporter, _) = Reporter::capture();
        let history =
            HistoryManager::open(root.join("history"), root.join("trash"), Rc::new(reporter))
                .unwrap();

        fs::write(root.join("a.txt"), "a").unwrap();
        let backups = history.create_backup(root, &args(&["a.txt", "-r"]));
        assert_eq!(backups.len(), 1);
        assert!(backups[0].trash_path.starts_with(history.trash_dir()));

        history.discard_backups(&backups);
        assert!(!backups[0].trash_path.exists());
    }
}
