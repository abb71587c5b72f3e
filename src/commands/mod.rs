pub mod parser;

pub use parser::tokenize;

use crate::error::{Result, ShellError};
use crate::executor::{ArchiveCommands, CommandValidator, FsCommands, SearchCommands};
use crate::history::{CommandKind, HistoryManager, UndoRecord};
use crate::logging::{logged, Reporter};
use crate::ui::Confirmation;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// 셸이 인식하는 명령 목록
pub const COMMANDS: &[&str] = &[
    "ls", "cd", "cat", "cp", "mv", "rm", "zip", "unzip", "tar", "untar", "grep", "history",
    "undo", "exit",
];

/// 명령 실행 후 입력 루프의 다음 동작
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// 명령 한 줄을 해석해 각 구현으로 전달하는 셸
///
/// 작업 디렉토리는 프로세스 전역 상태가 아니라 `cwd` 필드로 관리합니다.
pub struct Shell {
    cwd: PathBuf,
    fs: FsCommands,
    archive: ArchiveCommands,
    search: SearchCommands,
    history: HistoryManager,
    reporter: Rc<Reporter>,
}

impl Shell {
    pub fn new(
        cwd: PathBuf,
        history: HistoryManager,
        confirm: Rc<dyn Confirmation>,
        reporter: Rc<Reporter>,
    ) -> Self {
        // 휴지통은 rm 대상이 될 수 없음
        let validator = CommandValidator::new(vec![history.trash_dir().to_path_buf()]);

        Self {
            cwd,
            fs: FsCommands::new(reporter.clone(), confirm, validator),
            archive: ArchiveCommands::new(reporter.clone()),
            search: SearchCommands::new(reporter.clone()),
            history,
            reporter,
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// `~/projects $ ` 형태의 프롬프트
    pub fn prompt(&self) -> String {
        format!(
            "{} $ ",
            abbreviate_home(&self.cwd, dirs::home_dir().as_deref())
        )
    }

    /// 입력 한 줄 실행
    ///
    /// 에러는 출력만 하고 삼키므로 입력 루프는 항상 계속됩니다.
    pub fn execute(&mut self, line: &str) -> Flow {
        let words = tokenize(line.trim());
        let Some((name, args)) = words.split_first() else {
            return Flow::Continue;
        };

        if !COMMANDS.contains(&name.as_str()) {
            let text = format!("{} {}", name, args.join(" "));
            let error = ShellError::UnknownCommand(text.trim_end().to_string());
            self.reporter.error(&format!("ERROR: {}", error.rendered()));
            self.reporter.fail(&error.rendered());
            return Flow::Continue;
        }

        self.history.add_command(name, args);
        if name == "exit" {
            return Flow::Exit;
        }

        let reporter = self.reporter.clone();
        if let Err(e) = logged(&reporter, name, args, || self.dispatch(name, args)) {
            reporter.fail(&e.rendered());
        }

        Flow::Continue
    }

    fn dispatch(&mut self, name: &str, args: &[String]) -> Result<()> {
        match name {
            "ls" => self.fs.ls(&self.cwd, args),
            "cd" => {
                self.cwd = self.fs.cd(&self.cwd, args)?;
                Ok(())
            }
            "cat" => self.fs.cat(&self.cwd, args),
            "cp" => {
                let created = self.fs.cp(&self.cwd, args)?;
                self.history.record_for_undo(
                    UndoRecord::new(CommandKind::Copy, args, &self.cwd).with_target(created),
                );
                Ok(())
            }
            "mv" => {
                if let Some(landed) = self.fs.mv(&self.cwd, args)? {
                    self.history.record_for_undo(
                        UndoRecord::new(CommandKind::Move, args, &self.cwd).with_target(landed),
                    );
                }
                Ok(())
            }
            "rm" => self.remove(args),
            "zip" => self.archive.zip(&self.cwd, args),
            "unzip" => self.archive.unzip(&self.cwd, args),
            "tar" => self.archive.tar(&self.cwd, args),
            "untar" => self.archive.untar(&self.cwd, args),
            "grep" => self.search.grep(&self.cwd, args),
            "history" => self.history.show_history(args),
            "undo" => {
                self.history.undo();
                Ok(())
            }
            other => Err(ShellError::UnknownCommand(other.to_string())),
        }
    }

    /// 검증 → 백업 → 삭제 → 되돌리기 기록
    fn remove(&mut self, args: &[String]) -> Result<()> {
        let plan = self.fs.plan_remove(&self.cwd, args)?;
        let backups = self.history.create_backup(&self.cwd, args);
        let removal = self.fs.remove(&plan);

        let (kept, unused): (Vec<_>, Vec<_>) = backups
            .into_iter()
            .partition(|backup| removal.removed.contains(&backup.original_path));
        self.history.discard_backups(&unused);

        if !removal.removed.is_empty() {
            self.history.record_for_undo(
                UndoRecord::new(CommandKind::Remove, args, &self.cwd).with_backups(kept),
            );
        }

        match removal.failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// 홈 디렉토리 아래 경로를 `~` 로 축약
pub fn abbreviate_home(path: &Path, home: Option<&Path>) -> String {
    match home.map(|home| path.strip_prefix(home)) {
        Some(Ok(rest)) if rest.as_os_str().is_empty() => "~".to_string(),
        Some(Ok(rest)) => format!("~/{}", rest.display()),
        _ => path.display().to_string(),
    }
}
