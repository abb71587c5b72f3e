use crate::error::{Result, ShellError};
use crate::executor::fs_ops::resolve;
use crate::executor::validator::{ParsedArgs, RECURSIVE_FLAG};
use crate::logging::Reporter;
use regex::{Regex, RegexBuilder};
use std::fs;
use std::path::Path;
use std::rc::Rc;
use walkdir::WalkDir;

const IGNORE_CASE_FLAG: &str = "-i";
const USAGE: &str = "Usage: grep <pattern> <path> [-r] [-i]";

/// 파일 내용 정규식 검색
pub struct SearchCommands {
    reporter: Rc<Reporter>,
}

impl SearchCommands {
    pub fn new(reporter: Rc<Reporter>) -> Self {
        Self { reporter }
    }

    /// `grep <pattern> <path> [-r] [-i]`
    ///
    /// 일치하는 줄마다 `<path>:<line>: <text>` 형식으로 출력합니다.
    pub fn grep(&self, cwd: &Path, args: &[String]) -> Result<()> {
        let parsed = ParsedArgs::parse(args, &[RECURSIVE_FLAG, IGNORE_CASE_FLAG]);
        let [pattern, path_arg, ..] = parsed.positionals.as_slice() else {
            return Err(ShellError::usage(USAGE));
        };

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(parsed.has(IGNORE_CASE_FLAG))
            .build()
            .map_err(|e| ShellError::usage(format!("Invalid pattern: {}", e)))?;

        let path = resolve(cwd, path_arg);
        if path.is_file() {
            self.search_file(&path, &regex);
        } else if path.is_dir() {
            let max_depth = if parsed.has(RECURSIVE_FLAG) { usize::MAX } else { 1 };
            let walker = WalkDir::new(&path)
                .min_depth(1)
                .max_depth(max_depth)
                .sort_by_file_name();

            for entry in walker.into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() {
                    self.search_file(entry.path(), &regex);
                }
            }
        } else {
            return Err(ShellError::NotFound(path_arg.clone()));
        }

        Ok(())
    }

    fn search_file(&self, path: &Path, regex: &Regex) {
        // 읽을 수 없는 파일은 건너뜀
        let Ok(bytes) = fs::read(path) else {
            return;
        };
        let content = String::from_utf8_lossy(&bytes);

        for (index, line) in content.lines().enumerate() {
            if regex.is_match(line) {
                self.reporter
                    .say(&format!("{}:{}: {}", path.display(), index + 1, line.trim_end()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test1.txt"), "content1").unwrap();
        fs::create_dir(dir.path().join("documents")).unwrap();
        fs::write(dir.path().join("documents/doc1.txt"), "content").unwrap();
        fs::write(dir.path().join("documents/test3.txt"), "CONTENT").unwrap();
        dir
    }

    #[test]
    fn test_grep_recursive() {
        let dir = fixture();
        let (reporter, capture) = Reporter::capture();
        let search = SearchCommands::new(Rc::new(reporter));

        search.grep(dir.path(), &args(&[r"\w+", ".", "-r"])).unwrap();
        let output = capture.console();
        assert!(output.contains("test1.txt:1: content1"));
        assert!(output.contains("doc1.txt:1: content"));
    }

    #[test]
    fn test_grep_non_recursive_skips_subdirs() {
        let dir = fixture();
        let (reporter, capture) = Reporter::capture();
        let search = SearchCommands::new(Rc::new(reporter));

        search.grep(dir.path(), &args(&["content", "."])).unwrap();
        let output = capture.console();
        assert!(output.contains("test1.txt:1: content1"));
        assert!(!output.contains("doc1.txt"));
    }

    #[test]
    fn test_grep_ignore_case() {
        let dir = fixture();
        let (reporter, capture) = Reporter::capture();
        let search = SearchCommands::new(Rc::new(reporter));

        search.grep(dir.path(), &args(&["content", "documents"])).unwrap();
        assert!(!capture.console().contains("CONTENT"));

        capture.clear();
        search
            .grep(dir.path(), &args(&["content", "documents", "-i"]))
            .unwrap();
        assert!(capture.console().contains("CONTENT"));
    }

    #[test]
    fn test_grep_errors() {
        let dir = fixture();
        let (reporter, _) = Reporter::capture();
        let search = SearchCommands::new(Rc::new(reporter));

        let err = search.grep(dir.path(), &args(&["abc"])).unwrap_err();
        assert_eq!(err.to_string(), USAGE);

        let err = search.grep(dir.path(), &args(&["(", "."])).unwrap_err();
        assert!(err.to_string().starts_with("Invalid pattern"));

        let err = search.grep(dir.path(), &args(&["a", "missing"])).unwrap_err();
        assert!(matches!(err, ShellError::NotFound(_)));
    }
}
