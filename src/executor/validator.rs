use crate::error::{Result, ShellError};
use std::path::{Path, PathBuf};

/// 재귀 플래그 토큰 (cp, rm, grep)
pub const RECURSIVE_FLAG: &str = "-r";

/// 플래그와 위치 인자를 분리한 결과
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    pub flags: Vec<String>,
    pub positionals: Vec<String>,
}

impl ParsedArgs {
    /// `known_flags`에 포함된 토큰은 위치와 관계없이 플래그로 취급
    pub fn parse(args: &[String], known_flags: &[&str]) -> Self {
        let mut parsed = Self::default();
        for arg in args {
            if known_flags.contains(&arg.as_str()) {
                parsed.flags.push(arg.clone());
            } else {
                parsed.positionals.push(arg.clone());
            }
        }
        parsed
    }

    pub fn has(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

/// 삭제 대상 보호 규칙 검사기
///
/// 파일 시스템 루트, 현재 작업 디렉토리와 그 상위 디렉토리,
/// 그리고 백업 저장소(및 그 상위)는 삭제할 수 없습니다.
pub struct CommandValidator {
    protected: Vec<PathBuf>,
}

impl CommandValidator {
    pub fn new(protected: Vec<PathBuf>) -> Self {
        Self { protected }
    }

    pub fn check_removal(&self, cwd: &Path, target: &Path, display: &str) -> Result<()> {
        let is_root = target.parent().is_none();
        let is_cwd_or_ancestor = cwd.starts_with(target);
        let holds_protected = self.protected.iter().any(|p| p.starts_with(target));

        if is_root || is_cwd_or_ancestor || holds_protected {
            return Err(ShellError::Protection(display.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_flags_anywhere() {
        let parsed = ParsedArgs::parse(&args(&["a.txt", "-r", "dir"]), &[RECURSIVE_FLAG]);
        assert!(parsed.has("-r"));
        assert_eq!(parsed.positionals, args(&["a.txt", "dir"]));

        let parsed = ParsedArgs::parse(&args(&["a.txt"]), &[RECURSIVE_FLAG]);
        assert!(!parsed.has("-r"));
    }

    #[test]
    fn test_protected_paths() {
        let validator = CommandValidator::new(vec![PathBuf::from("/data/.fsh/trash")]);
        let cwd = Path::new("/home/user/work");

        assert!(validator.check_removal(cwd, Path::new("/"), "/").is_err());
        assert!(validator.check_removal(cwd, Path::new("/home/user"), "..").is_err());
        assert!(validator.check_removal(cwd, cwd, ".").is_err());
        assert!(validator.check_removal(cwd, Path::new("/data/.fsh"), "/data/.fsh").is_err());

        assert!(validator
            .check_removal(cwd, Path::new("/home/user/work/file.txt"), "file.txt")
            .is_ok());
        assert!(validator
            .check_removal(cwd, Path::new("/home/user/other"), "../other")
            .is_ok());
    }

    #[test]
    fn test_protection_message() {
        let validator = CommandValidator::new(Vec::new());
        let err = validator
            .check_removal(Path::new("/tmp"), Path::new("/"), "/")
            .unwrap_err();
        assert_eq!(err.to_string(), "Refusing to remove '/' - system protection");
    }
}
