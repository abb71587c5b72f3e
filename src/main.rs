use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use fileshell::cli::Cli;
use fileshell::commands::{Flow, Shell};
use fileshell::config::Config;
use fileshell::history::HistoryManager;
use fileshell::logging::{init_tracing, Reporter};
use fileshell::ui::{AutoConfirm, ConfirmPrompt, Confirmation};
use std::env;
use std::rc::Rc;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = load_config(&cli)?;
    if cli.debug {
        eprintln!("{} {:?}", "DEBUG:".yellow(), config);
    }

    let reporter = Rc::new(
        Reporter::new(Some(config.log_path.as_path()))
            .with_context(|| format!("Cannot open log file {}", config.log_path.display()))?,
    );
    let history = HistoryManager::open(
        config.history_path.clone(),
        config.trash_dir.clone(),
        reporter.clone(),
    )?;

    let confirm: Rc<dyn Confirmation> = if cli.yes {
        Rc::new(AutoConfirm(true))
    } else {
        Rc::new(ConfirmPrompt::new())
    };

    let cwd = env::current_dir().context("Cannot determine current directory")?;
    let mut shell = Shell::new(cwd, history, confirm, reporter);

    if cli.is_interactive() {
        return run_repl(&mut shell);
    }

    for line in &cli.commands {
        if shell.execute(line) == Flow::Exit {
            break;
        }
    }

    Ok(())
}

/// 설정 파일을 읽고 명령행 옵션으로 덮어씀
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(path) = &cli.history_file {
        config.history_path = path.clone();
    }
    if let Some(path) = &cli.trash_dir {
        config.trash_dir = path.clone();
    }
    if let Some(path) = &cli.log_file {
        config.log_path = path.clone();
    }

    Ok(config)
}

fn run_repl(shell: &mut Shell) -> Result<()> {
    use rustyline::error::ReadlineError;
    use rustyline::{Config as EditorConfig, DefaultEditor};

    let editor_config = EditorConfig::builder()
        .history_ignore_space(true)
        .auto_add_history(false)
        .build();
    let mut rl = DefaultEditor::with_config(editor_config)?;

    // 이전 세션의 명령을 위/아래 화살표로 불러올 수 있도록
    for entry in shell.history().entries() {
        let _ = rl.add_history_entry(entry.command.as_str());
    }

    loop {
        match rl.readline(&shell.prompt()) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);
                if shell.execute(line) == Flow::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{} {}", "Error:".red(), err);
                break;
            }
        }
    }

    Ok(())
}
