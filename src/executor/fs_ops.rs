use crate::error::{Result, ShellError};
use crate::executor::validator::{CommandValidator, ParsedArgs, RECURSIVE_FLAG};
use crate::logging::Reporter;
use crate::ui::Confirmation;
use chrono::{DateTime, Local};
use filetime::FileTime;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;
use walkdir::WalkDir;

const DETAILED_FLAG: &str = "-l";
const DEFAULT_WIDTH: usize = 100;

/// `~`, `~/...` 를 홈 디렉토리로 확장
pub fn expand_tilde(arg: &str) -> PathBuf {
    if arg == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = arg.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(arg)
}

/// 인자를 `cwd` 기준 절대 경로로 변환 (`.`/`..` 는 어휘적으로 정리)
pub fn resolve(cwd: &Path, arg: &str) -> PathBuf {
    let expanded = expand_tilde(arg);
    let joined = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };
    normalize(&joined)
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// 상대 경로를 프로세스 작업 디렉토리 기준 절대 경로로 변환
pub fn absolute_path(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    Ok(normalize(&std::env::current_dir()?.join(path)))
}

/// 심볼릭 링크(깨진 링크 포함)까지 존재로 취급
pub fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// 목적지가 디렉토리면 `destination/<source 이름>`, 아니면 `destination`
pub fn landing_path(source: &Path, destination: &Path) -> PathBuf {
    match source.file_name() {
        Some(name) if destination.is_dir() => destination.join(name),
        _ => destination.to_path_buf(),
    }
}

/// 권한과 접근/수정 시간을 유지하며 파일 복사
pub fn copy_file(source: &Path, destination: &Path) -> io::Result<()> {
    fs::copy(source, destination)?;
    let metadata = fs::metadata(source)?;
    filetime::set_file_times(
        destination,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
}

/// 디렉토리 트리 전체 복사
pub fn copy_tree(source: &Path, destination: &Path) -> io::Result<()> {
    fs::create_dir_all(destination)?;

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = destination.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }

    let metadata = fs::metadata(source)?;
    fs::set_permissions(destination, metadata.permissions())?;
    Ok(())
}

#[cfg(unix)]
pub(crate) fn copy_symlink(source: &Path, destination: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(source)?, destination)
}

#[cfg(not(unix))]
pub(crate) fn copy_symlink(source: &Path, destination: &Path) -> io::Result<()> {
    copy_file(source, destination)
}

/// 이름 변경으로 이동하고, 파일 시스템이 다르면 복사 후 원본 삭제
pub fn move_path(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            tracing::debug!(
                source = %source.display(),
                destination = %destination.display(),
                "rename crosses devices, falling back to copy"
            );
            let file_type = fs::symlink_metadata(source)?.file_type();
            if file_type.is_dir() {
                copy_tree(source, destination)?;
                fs::remove_dir_all(source)
            } else if file_type.is_symlink() {
                copy_symlink(source, destination)?;
                fs::remove_file(source)
            } else {
                copy_file(source, destination)?;
                fs::remove_file(source)
            }
        }
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn is_cross_device(e: &io::Error) -> bool {
    // EXDEV
    e.raw_os_error() == Some(18)
}

#[cfg(not(unix))]
fn is_cross_device(e: &io::Error) -> bool {
    // ERROR_NOT_SAME_DEVICE
    e.raw_os_error() == Some(17)
}

/// 검증을 통과한 삭제 대상
#[derive(Debug, Clone)]
pub struct RemovalTarget {
    /// 사용자가 입력한 그대로의 인자
    pub display: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// 삭제 계획 - 아무것도 지우기 전에 모든 대상을 검증한 결과
#[derive(Debug, Clone)]
pub struct RemovalPlan {
    pub recursive: bool,
    pub targets: Vec<RemovalTarget>,
}

/// 삭제 실행 결과
///
/// 중간에 실패해도 이미 지워진 경로는 `removed`에 남습니다.
#[derive(Debug)]
pub struct Removal {
    pub removed: Vec<PathBuf>,
    pub failure: Option<ShellError>,
}

/// ls, cd, cat, cp, mv, rm 구현
pub struct FsCommands {
    reporter: Rc<Reporter>,
    confirm: Rc<dyn Confirmation>,
    validator: CommandValidator,
}

impl FsCommands {
    pub fn new(
        reporter: Rc<Reporter>,
        confirm: Rc<dyn Confirmation>,
        validator: CommandValidator,
    ) -> Self {
        Self {
            reporter,
            confirm,
            validator,
        }
    }

    /// 디렉토리 내용 출력 (`-l` 이면 상세 형식)
    pub fn ls(&self, cwd: &Path, args: &[String]) -> Result<()> {
        let mut detailed = false;
        let mut target: Option<&str> = None;

        for arg in args {
            if arg == DETAILED_FLAG {
                detailed = true;
            } else {
                target = Some(arg.as_str());
            }
        }

        if args.len() > 2 || (args.len() == 2 && !detailed) {
            return Err(ShellError::usage("Too many arguments"));
        }

        let display = target.unwrap_or(".");
        let path = resolve(cwd, display);
        if !path.exists() {
            return Err(ShellError::NotFound(display.to_string()));
        }
        if !path.is_dir() {
            return Err(ShellError::usage(format!("Not a directory: {}", display)));
        }

        let mut names: Vec<String> = fs::read_dir(&path)
            .map_err(|e| ShellError::io(format!("Cannot list {}", display), e))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();

        if names.is_empty() {
            return Ok(());
        }

        if detailed {
            self.print_detailed(&path, &names)
        } else {
            self.print_columns(&names);
            Ok(())
        }
    }

    fn print_detailed(&self, dir: &Path, names: &[String]) -> Result<()> {
        let mut rows = Vec::with_capacity(names.len());
        for name in names {
            let metadata = fs::metadata(dir.join(name))
                .map_err(|e| ShellError::io(format!("Cannot stat {}", name), e))?;
            rows.push((name, metadata));
        }

        let size_width = rows
            .iter()
            .map(|(_, m)| m.len().to_string().len())
            .max()
            .unwrap_or(1);

        for (name, metadata) in rows {
            let modified = metadata
                .modified()
                .map(|t| DateTime::<Local>::from(t).format("%b %d %H:%M").to_string())
                .unwrap_or_else(|_| "?".repeat(12));
            self.reporter.say(&format!(
                "{} {:>width$} {} {}",
                file_mode(&metadata),
                metadata.len(),
                modified,
                name,
                width = size_width
            ));
        }

        Ok(())
    }

    fn print_columns(&self, names: &[String]) {
        let width = console::Term::stdout()
            .size_checked()
            .map(|(_, cols)| cols as usize)
            .unwrap_or(DEFAULT_WIDTH);

        let formatted: Vec<String> = names.iter().map(|n| quote_name(n)).collect();
        let column_width = formatted.iter().map(|n| n.chars().count()).max().unwrap_or(0) + 3;
        let columns = (width / column_width).max(1);
        let rows = (formatted.len() + columns - 1) / columns;

        for row in 0..rows {
            let mut line = String::new();
            for col in 0..columns {
                if let Some(name) = formatted.get(row + col * rows) {
                    line.push_str(&format!("{:<width$}", name, width = column_width));
                }
            }
            self.reporter.say(line.trim_end());
        }
    }

    /// 작업 디렉토리 변경 - 새 작업 디렉토리를 반환
    pub fn cd(&self, cwd: &Path, args: &[String]) -> Result<PathBuf> {
        let new_path = match args {
            [] => home_dir()?,
            [path] if path == "~" => home_dir()?,
            [path] if path == ".." => cwd.parent().unwrap_or(cwd).to_path_buf(),
            [path] => resolve(cwd, path),
            _ => return Err(ShellError::usage("Too many arguments")),
        };

        let display = args.first().map(String::as_str).unwrap_or("~");
        if !new_path.exists() {
            return Err(ShellError::NotFound(display.to_string()));
        }
        if !new_path.is_dir() {
            return Err(ShellError::usage(format!("Not a directory: {}", display)));
        }

        Ok(new_path)
    }

    /// 파일 내용 출력
    pub fn cat(&self, cwd: &Path, args: &[String]) -> Result<()> {
        let [filename] = args else {
            return Err(ShellError::usage("cat requires exactly one argument"));
        };

        let path = resolve(cwd, filename);
        if !path.exists() {
            return Err(ShellError::NotFound(filename.clone()));
        }
        if path.is_dir() {
            return Err(ShellError::usage(format!("Is a directory: {}", filename)));
        }

        let content = fs::read(&path)
            .map_err(|e| ShellError::io(format!("Cannot read {}", filename), e))?;
        self.reporter.print(&String::from_utf8_lossy(&content));
        Ok(())
    }

    /// 파일/디렉토리 복사 - 새로 만들어진 경로를 반환
    pub fn cp(&self, cwd: &Path, args: &[String]) -> Result<PathBuf> {
        let usage = || ShellError::usage("cp requires source and destination arguments");
        if args.len() < 2 || args.len() > 3 {
            return Err(usage());
        }

        let parsed = ParsedArgs::parse(args, &[RECURSIVE_FLAG]);
        let [source_arg, destination_arg] = parsed.positionals.as_slice() else {
            return Err(usage());
        };
        let recursive = parsed.has(RECURSIVE_FLAG);

        let source = resolve(cwd, source_arg);
        let destination = resolve(cwd, destination_arg);
        if !source.exists() {
            return Err(ShellError::NotFound(source_arg.clone()));
        }

        let context = format!("Cannot copy {} to {}", source_arg, destination_arg);
        let target = landing_path(&source, &destination);
        if is_same_file(&source, &target) {
            return Err(ShellError::usage(format!(
                "'{}' and '{}' are the same file",
                source_arg, destination_arg
            )));
        }

        if source.is_file() {
            copy_file(&source, &target).map_err(|e| ShellError::io(&context, e))?;
        } else if source.is_dir() {
            if !recursive {
                return Err(ShellError::usage(format!(
                    "Is a directory (use -r for recursive): {}",
                    source_arg
                )));
            }
            if target.starts_with(&source) {
                return Err(ShellError::usage(format!(
                    "Cannot copy a directory into itself: {}",
                    source_arg
                )));
            }
            if exists(&target) {
                return Err(ShellError::io(
                    &context,
                    io::Error::new(io::ErrorKind::AlreadyExists, "destination already exists"),
                ));
            }
            copy_tree(&source, &target).map_err(|e| ShellError::io(&context, e))?;
        } else {
            return Err(ShellError::usage(format!("Unknown file type: {}", source_arg)));
        }

        tracing::debug!(path = %target.display(), "copied");
        Ok(target)
    }

    /// 이동/이름 변경 - 옮겨진 경로를 반환 (덮어쓰기를 거절하면 `None`)
    pub fn mv(&self, cwd: &Path, args: &[String]) -> Result<Option<PathBuf>> {
        let [source_arg, destination_arg] = args else {
            return Err(ShellError::usage(
                "mv requires source and destination arguments",
            ));
        };

        let source = resolve(cwd, source_arg);
        if !exists(&source) {
            return Err(ShellError::NotFound(source_arg.clone()));
        }

        let target = landing_path(&source, &resolve(cwd, destination_arg));
        if exists(&target)
            && !self
                .confirm
                .confirm(&format!("Overwrite '{}'?", target.display()))
        {
            return Ok(None);
        }

        move_path(&source, &target).map_err(|e| {
            ShellError::io(format!("Cannot move {} to {}", source_arg, destination_arg), e)
        })?;

        tracing::debug!(path = %target.display(), "moved");
        Ok(Some(target))
    }

    /// rm 인자 검증 - 파일 시스템은 건드리지 않음
    pub fn plan_remove(&self, cwd: &Path, args: &[String]) -> Result<RemovalPlan> {
        if args.is_empty() {
            return Err(ShellError::usage("rm requires at least one argument"));
        }

        let parsed = ParsedArgs::parse(args, &[RECURSIVE_FLAG]);
        if parsed.positionals.is_empty() {
            return Err(ShellError::usage("rm requires at least one target"));
        }
        let recursive = parsed.has(RECURSIVE_FLAG);

        let mut targets = Vec::with_capacity(parsed.positionals.len());
        for display in parsed.positionals {
            let path = resolve(cwd, &display);
            let metadata = fs::symlink_metadata(&path)
                .map_err(|_| ShellError::NotFound(display.clone()))?;

            self.validator.check_removal(cwd, &path, &display)?;

            let is_dir = metadata.is_dir();
            if is_dir && !recursive {
                return Err(ShellError::usage(format!(
                    "Is a directory (use -r for recursive): {}",
                    display
                )));
            }

            targets.push(RemovalTarget {
                display,
                path,
                is_dir,
            });
        }

        Ok(RemovalPlan { recursive, targets })
    }

    /// 계획된 대상 삭제 - 디렉토리는 확인을 거칩니다
    pub fn remove(&self, plan: &RemovalPlan) -> Removal {
        let mut removed = Vec::new();

        for target in &plan.targets {
            let result = if target.is_dir {
                let question = format!("Remove directory '{}' recursively?", target.display);
                if !self.confirm.confirm(&question) {
                    continue;
                }
                fs::remove_dir_all(&target.path).map_err(|e| {
                    ShellError::io(format!("Cannot remove directory '{}'", target.display), e)
                })
            } else {
                fs::remove_file(&target.path)
                    .map_err(|e| ShellError::io(format!("Cannot remove '{}'", target.display), e))
            };

            match result {
                Ok(()) => removed.push(target.path.clone()),
                Err(e) => {
                    return Removal {
                        removed,
                        failure: Some(e),
                    }
                }
            }
        }

        Removal {
            removed,
            failure: None,
        }
    }
}

/// 같은 경로이거나 (링크 등을 풀었을 때) 같은 파일을 가리키는지
fn is_same_file(source: &Path, target: &Path) -> bool {
    if source == target {
        return true;
    }
    match (fs::canonicalize(source), fs::canonicalize(target)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| ShellError::NotFound("~".to_string()))
}

/// 공백이나 따옴표가 포함된 이름은 따옴표로 감싸서 표시
fn quote_name(name: &str) -> String {
    if name.contains(' ') || name.contains('\'') || name.contains('"') {
        if name.contains('\'') {
            format!("\"{}\"", name)
        } else {
            format!("'{}'", name)
        }
    } else {
        name.to_string()
    }
}

/// `drwxr-xr-x` 형식의 권한 문자열
#[cfg(unix)]
fn file_mode(metadata: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;

    let mode = metadata.permissions().mode();
    let kind = if metadata.is_dir() {
        'd'
    } else if metadata.file_type().is_symlink() {
        'l'
    } else {
        '-'
    };

    let mut out = String::with_capacity(10);
    out.push(kind);
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

#[cfg(not(unix))]
fn file_mode(metadata: &Metadata) -> String {
    let kind = if metadata.is_dir() { 'd' } else { '-' };
    let write = if metadata.permissions().readonly() { '-' } else { 'w' };
    format!("{}r{}-r{}-r{}-", kind, write, write, write)
}
