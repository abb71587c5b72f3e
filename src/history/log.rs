use crate::error::{Result, ShellError};
use crate::logging::Reporter;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

/// 명령어 히스토리 항목
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// 명령어 이름과 인자를 공백으로 이은 텍스트
    pub command: String,
}

/// 명령어 히스토리 저장소
///
/// 한 줄에 명령 하나씩 평문으로 저장하며, 추가할 때마다 파일 전체를 다시 씁니다.
pub struct HistoryLog {
    file_path: PathBuf,
    entries: Vec<HistoryEntry>,
    reporter: Rc<Reporter>,
}

impl HistoryLog {
    /// 히스토리 파일을 읽어 저장소 생성 (읽기 실패 시 빈 히스토리)
    pub fn open(file_path: impl Into<PathBuf>, reporter: Rc<Reporter>) -> Self {
        let mut log = Self {
            file_path: file_path.into(),
            entries: Vec::new(),
            reporter,
        };
        log.load();
        log
    }

    fn load(&mut self) {
        self.entries = match fs::read(&self.file_path) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(content) => content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(|line| HistoryEntry {
                        command: line.to_string(),
                    })
                    .collect(),
                Err(e) => {
                    tracing::warn!("ignoring unreadable history file: {}", e);
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
    }

    fn save(&self) {
        let mut content = String::new();
        for entry in &self.entries {
            content.push_str(&entry.command);
            content.push('\n');
        }

        if let Some(parent) = self.file_path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Err(e) = fs::write(&self.file_path, content) {
            tracing::warn!(path = %self.file_path.display(), "failed to save history: {}", e);
        }
    }

    /// 명령 추가 후 즉시 파일에 저장
    pub fn add_command(&mut self, name: &str, args: &[String]) {
        let command = format!("{} {}", name, args.join(" ")).trim().to_string();
        self.entries.push(HistoryEntry { command });
        self.save();
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `history [n]` - 전체 또는 마지막 n개를 절대 번호와 함께 출력
    pub fn show_history(&self, args: &[String]) -> Result<()> {
        if self.is_empty() {
            self.reporter.say("No commands in history");
            return Ok(());
        }

        let shown = match args.first() {
            Some(arg) => match arg.parse::<usize>() {
                Ok(n) if n > 0 => n.min(self.entries.len()),
                _ => {
                    return Err(ShellError::usage(
                        "History requires a positive number argument",
                    ))
                }
            },
            None => self.entries.len(),
        };

        let start = self.entries.len() - shown;
        for (index, entry) in self.entries.iter().enumerate().skip(start) {
            self.reporter
                .say(&format!("{:>4}  {}", index + 1, entry.command));
        }

        Ok(())
    }
}
