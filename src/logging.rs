use crate::error::Result;
use chrono::Local;
use colored::*;
use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

/// 콘솔 출력과 명령 저널(shell.log)을 한곳에서 관리하는 리포터
///
/// 전역 로거 대신 `Rc<Reporter>`로 각 컴포넌트 생성자에 전달됩니다.
pub struct Reporter {
    console: RefCell<Box<dyn Write>>,
    journal: Option<RefCell<Box<dyn Write>>>,
}

impl Reporter {
    /// 표준 출력 + 저널 파일(append) 리포터 생성
    pub fn new(log_path: Option<&Path>) -> Result<Self> {
        let journal = match log_path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Some(RefCell::new(Box::new(file) as Box<dyn Write>))
            }
            None => None,
        };

        Ok(Self {
            console: RefCell::new(Box::new(io::stdout())),
            journal,
        })
    }

    /// 출력 내용을 메모리에 모으는 리포터 (테스트용)
    pub fn capture() -> (Self, Capture) {
        let capture = Capture::default();
        let reporter = Self {
            console: RefCell::new(Box::new(SharedBuffer(capture.console.clone()))),
            journal: Some(RefCell::new(Box::new(SharedBuffer(capture.journal.clone())))),
        };
        (reporter, capture)
    }

    /// 콘솔에 한 줄 출력
    pub fn say(&self, line: &str) {
        let mut console = self.console.borrow_mut();
        let _ = writeln!(console, "{}", line);
    }

    /// 줄바꿈 없이 그대로 출력 (cat 등)
    pub fn print(&self, text: &str) {
        let mut console = self.console.borrow_mut();
        let _ = console.write_all(text.as_bytes());
        let _ = console.flush();
    }

    /// 콘솔에 에러 출력
    pub fn fail(&self, message: &str) {
        self.say(&format!("ERROR: {}", message).red().to_string());
    }

    /// 저널 기록
    pub fn info(&self, message: &str) {
        tracing::debug!("{}", message);
        self.write_journal(message);
    }

    /// 저널에 에러 기록
    pub fn error(&self, message: &str) {
        tracing::warn!("{}", message);
        self.write_journal(message);
    }

    fn write_journal(&self, message: &str) {
        if let Some(journal) = &self.journal {
            let mut journal = journal.borrow_mut();
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
            let _ = writeln!(journal, "[{}] {}", timestamp, message);
            let _ = journal.flush();
        }
    }
}

/// `Reporter::capture`가 기록한 내용
#[derive(Clone, Default)]
pub struct Capture {
    console: Rc<RefCell<Vec<u8>>>,
    journal: Rc<RefCell<Vec<u8>>>,
}

impl Capture {
    pub fn console(&self) -> String {
        String::from_utf8_lossy(&self.console.borrow()).into_owned()
    }

    pub fn journal(&self) -> String {
        String::from_utf8_lossy(&self.journal.borrow()).into_owned()
    }

    /// 콘솔 버퍼 비우기
    pub fn clear(&self) {
        self.console.borrow_mut().clear();
    }
}

struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// 명령 핸들러를 감싸 실행 기록을 남기는 미들웨어
///
/// 호출 내용을 기록한 뒤 성공 시 `SUCCESS`, 실패 시 `ERROR: <message>`를
/// 저널에 남기고 결과를 그대로 돌려줍니다.
pub fn logged<T>(
    reporter: &Reporter,
    name: &str,
    args: &[String],
    handler: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let invocation = format!("{} {}", name, args.join(" "));
    reporter.info(invocation.trim_end());

    match handler() {
        Ok(value) => {
            reporter.info("SUCCESS");
            Ok(value)
        }
        Err(e) => {
            reporter.error(&format!("ERROR: {}", e.rendered()));
            Err(e)
        }
    }
}

/// stderr로 출력되는 진단용 tracing 구독자 설정
///
/// `--debug`가 없으면 `RUST_LOG`를 따르고, 그것도 없으면 warn 이상만 출력합니다.
pub fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("fileshell=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
