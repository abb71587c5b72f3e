//! 되돌리기 스택
//!
//! cp, mv, rm 이 성공할 때마다 되돌리는 데 필요한 정보를 기록하고,
//! `undo` 가 호출되면 가장 최근 기록(LIFO)을 꺼내 반대 작업을 실행합니다.
//!
//! ```text
//! ┌─────────────┐   push    ┌─────────────┐   pop    ┌──────────────┐
//! │ cp / mv / rm│ ────────▶ │  UndoStack  │ ───────▶ │ reverse_*()  │
//! └─────────────┘           └─────────────┘          └──────┬───────┘
//!                                  ▲      실패 시 다시 push │
//!                                  └────────────────────────┘
//! ```
//!
//! 기록에는 명령 당시의 작업 디렉토리가 저장되며, 상대 경로 인자는
//! 현재 디렉토리가 아니라 그 디렉토리를 기준으로 해석됩니다.

use crate::executor::fs_ops::{exists, landing_path, move_path, resolve};
use crate::executor::validator::{ParsedArgs, RECURSIVE_FLAG};
use crate::history::backup::{BackupRecord, BackupStore};
use crate::logging::Reporter;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// 되돌릴 수 있는 명령 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Copy,
    Move,
    Remove,
}

impl CommandKind {
    /// 셸 명령 이름
    pub fn name(&self) -> &'static str {
        match self {
            Self::Copy => "cp",
            Self::Move => "mv",
            Self::Remove => "rm",
        }
    }
}

/// 되돌리기 기록
#[derive(Debug, Clone, PartialEq)]
pub struct UndoRecord {
    pub kind: CommandKind,
    /// 명령에 전달된 인자 그대로
    pub args: Vec<String>,
    /// 명령 실행 당시 작업 디렉토리
    pub working_dir: PathBuf,
    /// rm 전에 만든 백업
    pub backups: Option<Vec<BackupRecord>>,
    /// cp/mv 가 실제로 만든 경로 (실행 시점에 확인된 값)
    pub target: Option<PathBuf>,
}

impl UndoRecord {
    pub fn new(kind: CommandKind, args: &[String], working_dir: &Path) -> Self {
        Self {
            kind,
            args: args.to_vec(),
            working_dir: working_dir.to_path_buf(),
            backups: None,
            target: None,
        }
    }

    pub fn with_backups(mut self, backups: Vec<BackupRecord>) -> Self {
        self.backups = Some(backups);
        self
    }

    pub fn with_target(mut self, target: PathBuf) -> Self {
        self.target = Some(target);
        self
    }

    /// `cp a.txt docs` 형태의 설명
    pub fn describe(&self) -> String {
        format!("{} {}", self.kind.name(), self.args.join(" "))
            .trim_end()
            .to_string()
    }
}

/// `undo` 호출 결과
#[derive(Debug, Clone, PartialEq)]
pub enum UndoOutcome {
    /// 되돌릴 기록이 없음
    Empty,
    /// 되돌리기에 성공해 기록이 소멸됨
    Reverted(UndoRecord),
    /// 실패 - 기록은 다시 스택 맨 위에 있음
    Failed,
}

/// 되돌리기 스택 (메모리 전용, 재시작 시 비워짐)
pub struct UndoStack {
    records: Vec<UndoRecord>,
    reporter: Rc<Reporter>,
}

impl UndoStack {
    pub fn new(reporter: Rc<Reporter>) -> Self {
        Self {
            records: Vec::new(),
            reporter,
        }
    }

    pub fn push(&mut self, record: UndoRecord) {
        tracing::debug!(command = %record.describe(), "recorded for undo");
        self.records.push(record);
    }

    pub fn peek(&self) -> Option<&UndoRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 가장 최근 기록을 되돌립니다.
    ///
    /// 실패하면 기록을 다시 넣어 두므로 같은 `undo`를 재시도할 수 있습니다.
    pub fn undo(&mut self, store: &BackupStore) -> UndoOutcome {
        let Some(record) = self.records.pop() else {
            self.reporter.say("No operations to undo");
            return UndoOutcome::Empty;
        };

        let kind = record.kind.name();
        let result = match record.kind {
            CommandKind::Copy => reverse_copy(&record),
            CommandKind::Move => reverse_move(&record),
            CommandKind::Remove => self.reverse_remove(&record, store),
        };

        match result {
            Ok(true) => {
                self.reporter.say(&format!("Undo: {}", record.describe()));
                UndoOutcome::Reverted(record)
            }
            Ok(false) => {
                self.reporter.say(&format!("Failed to undo {}", kind));
                self.records.push(record);
                UndoOutcome::Failed
            }
            Err(e) => {
                self.reporter.say(&format!("Failed to undo {}: {}", kind, e));
                self.records.push(record);
                UndoOutcome::Failed
            }
        }
    }

    fn reverse_remove(&self, record: &UndoRecord, store: &BackupStore) -> io::Result<bool> {
        let backups = record.backups.as_deref().unwrap_or_default();
        if backups.is_empty() {
            self.reporter.say("No files to restore from trash");
            return Ok(false);
        }

        let restored = backups.iter().filter(|backup| store.restore(backup)).count();
        tracing::debug!(restored, total = backups.len(), "rm reverted");
        Ok(restored > 0)
    }
}

/// cp 되돌리기: 복사로 생긴 경로를 삭제
///
/// 실행 시점에 기록된 경로가 있으면 그것만 지웁니다. 없으면
/// `destination/<source 이름>`을, 그 경로가 없을 때는 `destination`을 지웁니다.
fn reverse_copy(record: &UndoRecord) -> io::Result<bool> {
    let parsed = ParsedArgs::parse(&record.args, &[RECURSIVE_FLAG]);
    let recursive = parsed.has(RECURSIVE_FLAG);

    let created = match &record.target {
        Some(target) => target.clone(),
        None => {
            let [source, .., destination] = parsed.positionals.as_slice() else {
                return Ok(false);
            };
            let source_path = resolve(&record.working_dir, source);
            let destination_path = resolve(&record.working_dir, destination);
            let computed = landing_path(&source_path, &destination_path);
            if exists(&computed) {
                computed
            } else {
                destination_path
            }
        }
    };

    let Ok(metadata) = fs::symlink_metadata(&created) else {
        return Ok(false);
    };

    if metadata.is_dir() {
        if !recursive {
            return Ok(false);
        }
        fs::remove_dir_all(&created)?;
    } else {
        fs::remove_file(&created)?;
    }

    tracing::debug!(path = %created.display(), "copy removed");
    Ok(true)
}

/// mv 되돌리기: 옮겨진 항목을 원래 위치로 다시 이동
fn reverse_move(record: &UndoRecord) -> io::Result<bool> {
    let [source, destination] = record.args.as_slice() else {
        return Ok(false);
    };

    let source_path = resolve(&record.working_dir, source);
    let landed = match &record.target {
        Some(target) => target.clone(),
        None => landing_path(&source_path, &resolve(&record.working_dir, destination)),
    };

    if !exists(&landed) {
        return Ok(false);
    }

    if let Some(parent) = source_path.parent() {
        fs::create_dir_all(parent)?;
    }
    move_path(&landed, &source_path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Capture;
    use tempfile::TempDir;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    struct Fixture {
        dir: TempDir,
        stack: UndoStack,
        store: BackupStore,
        capture: Capture,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let (reporter, capture) = Reporter::capture();
        let reporter = Rc::new(reporter);
        let store = BackupStore::open(dir.path().join(".trash"), reporter.clone()).unwrap();
        let stack = UndoStack::new(reporter);
        fs::write(dir.path().join("a.txt"), "X").unwrap();
        fs::create_dir(dir.path().join("d")).unwrap();
        Fixture {
            dir,
            stack,
            store,
            capture,
        }
    }

    #[test]
    fn test_empty_stack() {
        let mut f = fixture();
        assert_eq!(f.stack.undo(&f.store), UndoOutcome::Empty);
        assert_eq!(f.capture.console(), "No operations to undo\n");
    }

    #[test]
    fn test_reverse_copy_computed_path() {
        let mut f = fixture();
        let root = f.dir.path();
        fs::copy(root.join("a.txt"), root.join("d/a.txt")).unwrap();

        f.stack
            .push(UndoRecord::new(CommandKind::Copy, &args(&["a.txt", "d"]), root));
        let outcome = f.stack.undo(&f.store);

        assert!(matches!(outcome, UndoOutcome::Reverted(_)));
        assert!(!root.join("d/a.txt").exists());
        assert!(root.join("d").is_dir());
        assert_eq!(fs::read_to_string(root.join("a.txt")).unwrap(), "X");
        assert!(f.capture.console().contains("Undo: cp a.txt d"));
    }

    #[test]
    fn test_reverse_copy_falls_back_to_destination() {
        let mut f = fixture();
        let root = f.dir.path();
        // cp -r d copied  (copied 는 원래 없던 디렉토리)
        fs::create_dir(root.join("copied")).unwrap();
        fs::write(root.join("copied/inner.txt"), "i").unwrap();

        f.stack.push(UndoRecord::new(
            CommandKind::Copy,
            &args(&["-r", "d", "copied"]),
            root,
        ));

        assert!(matches!(f.stack.undo(&f.store), UndoOutcome::Reverted(_)));
        assert!(!root.join("copied").exists());
        assert!(root.join("d").is_dir());
    }

    #[test]
    fn test_reverse_copy_without_recursive_keeps_dirs() {
        let mut f = fixture();
        let root = f.dir.path();
        fs::create_dir(root.join("d/a.txt")).unwrap();

        f.stack
            .push(UndoRecord::new(CommandKind::Copy, &args(&["a.txt", "d"]), root));

        assert_eq!(f.stack.undo(&f.store), UndoOutcome::Failed);
        assert!(root.join("d/a.txt").is_dir());
        assert_eq!(f.stack.len(), 1);
        assert!(f.capture.console().contains("Failed to undo cp"));
    }

    #[test]
    fn test_reverse_move_uses_recorded_working_dir() {
        let mut f = fixture();
        let root = f.dir.path();
        fs::rename(root.join("a.txt"), root.join("d/a.txt")).unwrap();

        f.stack
            .push(UndoRecord::new(CommandKind::Move, &args(&["a.txt", "d"]), root));
        // 현재 디렉토리와 무관하게 기록된 디렉토리 기준으로 해석
        assert!(matches!(f.stack.undo(&f.store), UndoOutcome::Reverted(_)));
        assert_eq!(fs::read_to_string(root.join("a.txt")).unwrap(), "X");
        assert!(!root.join("d/a.txt").exists());
        assert!(f.stack.is_empty());
    }

    #[test]
    fn test_reverse_move_directory_rename_with_target() {
        let mut f = fixture();
        let root = f.dir.path();
        fs::rename(root.join("d"), root.join("renamed")).unwrap();

        let record = UndoRecord::new(CommandKind::Move, &args(&["d", "renamed"]), root)
            .with_target(root.join("renamed"));
        f.stack.push(record);

        assert!(matches!(f.stack.undo(&f.store), UndoOutcome::Reverted(_)));
        assert!(root.join("d").is_dir());
        assert!(!root.join("renamed").exists());
    }

    #[test]
    fn test_failed_move_undo_is_retryable() {
        let mut f = fixture();
        let root = f.dir.path();
        fs::create_dir(root.join("blocker")).unwrap();
        fs::write(root.join("blocker/b.txt"), "B").unwrap();
        fs::rename(root.join("blocker/b.txt"), root.join("d/b.txt")).unwrap();

        // 원래 부모 디렉토리 자리에 파일을 두어 부모 생성이 실패하도록 함
        fs::remove_dir(root.join("blocker")).unwrap();
        fs::write(root.join("blocker"), "not a dir").unwrap();

        f.stack.push(UndoRecord::new(
            CommandKind::Move,
            &args(&["blocker/b.txt", "d"]),
            root,
        ));
        let pushed = f.stack.peek().cloned();

        assert_eq!(f.stack.undo(&f.store), UndoOutcome::Failed);
        assert_eq!(f.stack.len(), 1);
        assert_eq!(f.stack.peek().cloned(), pushed);
        assert!(root.join("d/b.txt").exists());
        assert!(f.capture.console().contains("Failed to undo mv:"));

        // 같은 undo 재시도
        fs::remove_file(root.join("blocker")).unwrap();
        assert!(matches!(f.stack.undo(&f.store), UndoOutcome::Reverted(_)));
        assert_eq!(fs::read_to_string(root.join("blocker/b.txt")).unwrap(), "B");
        assert!(f.stack.is_empty());
    }

    #[test]
    fn test_reverse_move_wrong_arity_fails() {
        let mut f = fixture();
        let root = f.dir.path();
        f.stack
            .push(UndoRecord::new(CommandKind::Move, &args(&["a.txt"]), root));
        assert_eq!(f.stack.undo(&f.store), UndoOutcome::Failed);
    }

    #[test]
    fn test_remove_without_backups_fails_without_losing_record() {
        let mut f = fixture();
        let root = f.dir.path();

        let backups = f.store.create_backup(root, &args(&["ghost.txt"]), false);
        assert!(backups.is_empty());
        f.stack.push(
            UndoRecord::new(CommandKind::Remove, &args(&["ghost.txt"]), root)
                .with_backups(backups),
        );

        assert_eq!(f.stack.undo(&f.store), UndoOutcome::Failed);
        assert!(f.capture.console().contains("No files to restore from trash"));
        assert_eq!(f.stack.len(), 1);

        assert_eq!(f.stack.undo(&f.store), UndoOutcome::Failed);
        assert_eq!(f.stack.len(), 1);
    }

    #[test]
    fn test_remove_partial_restore_counts_as_success() {
        let mut f = fixture();
        let root = f.dir.path();
        fs::write(root.join("b.txt"), "Y").unwrap();

        let targets = args(&["a.txt", "b.txt"]);
        let backups = f.store.create_backup(root, &targets, false);
        assert_eq!(backups.len(), 2);
        fs::remove_file(root.join("a.txt")).unwrap();
        fs::remove_file(root.join("b.txt")).unwrap();
        // 한쪽 백업을 미리 소모
        fs::remove_file(&backups[1].trash_path).unwrap();

        f.stack
            .push(UndoRecord::new(CommandKind::Remove, &targets, root).with_backups(backups));

        assert!(matches!(f.stack.undo(&f.store), UndoOutcome::Reverted(_)));
        assert_eq!(fs::read_to_string(root.join("a.txt")).unwrap(), "X");
        assert!(!root.join("b.txt").exists());
        assert!(f.capture.console().contains("Backup not found"));
    }

    #[test]
    fn test_lifo_order() {
        let mut f = fixture();
        let root = f.dir.path();
        fs::copy(root.join("a.txt"), root.join("first.txt")).unwrap();
        fs::copy(root.join("a.txt"), root.join("second.txt")).unwrap();

        f.stack.push(UndoRecord::new(
            CommandKind::Copy,
            &args(&["a.txt", "first.txt"]),
            root,
        ));
        f.stack.push(UndoRecord::new(
            CommandKind::Copy,
            &args(&["a.txt", "second.txt"]),
            root,
        ));

        f.stack.undo(&f.store);
        assert!(root.join("first.txt").exists());
        assert!(!root.join("second.txt").exists());

        f.stack.undo(&f.store);
        assert!(!root.join("first.txt").exists());
    }
}
