use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fsh")]
#[command(version)]
#[command(about = "File shell with history and undo", long_about = None)]
pub struct Cli {
    /// 실행할 명령 (여러 번 지정 가능, 지정하면 대화형 모드 없이 종료)
    #[arg(short = 'c', long = "command", value_name = "COMMAND")]
    pub commands: Vec<String>,

    /// 설정 파일 경로 (기본: ~/.fsh/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// 히스토리 파일 경로
    #[arg(long, value_name = "PATH")]
    pub history_file: Option<PathBuf>,

    /// 백업(휴지통) 디렉토리
    #[arg(long, value_name = "PATH")]
    pub trash_dir: Option<PathBuf>,

    /// 명령 저널 파일 경로
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// 덮어쓰기/재귀 삭제 확인에 모두 yes로 응답
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// 디버그 모드
    #[arg(short = 'd', long)]
    pub debug: bool,
}

impl Cli {
    pub fn is_interactive(&self) -> bool {
        self.commands.is_empty()
    }
}
