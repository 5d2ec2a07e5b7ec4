//! Interactive REPL.

use crate::commands::Session;
use colored::Colorize;
use pcf7931_core::report;
use pcf7931_core::OperationKind;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::path::PathBuf;

const HISTORY_FILE: &str = ".pcf7931_history";

/// What the REPL should do after a line.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Print(String),
    Run(OperationKind, Vec<String>),
    Quit,
}

pub async fn run(mut session: Session) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "PCF7931 command shell".bold().cyan());
    if session.is_dry_run() {
        println!("{}", "Dry run: packets are printed, not sent.".dimmed());
    }

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    let history_path = home::home_dir()
        .map(|h| h.join(HISTORY_FILE))
        .unwrap_or_else(|| PathBuf::from(HISTORY_FILE));
    let _ = rl.load_history(&history_path);

    println!("Type 'help' for available commands.\n");

    loop {
        let prompt = format!("{} ", "pcf7931>".cyan());
        match rl.readline(&prompt) {
            Ok(line) => match parse_line(&line) {
                None => continue,
                Some(Step::Quit) => break,
                Some(Step::Print(text)) => println!("{}\n", text),
                Some(Step::Run(kind, args)) => {
                    let args: Vec<&str> = args.iter().map(String::as_str).collect();
                    match session.run(kind, &args).await {
                        Ok(lines) => {
                            for line in lines {
                                println!("{}", line);
                            }
                            println!();
                        }
                        Err(e) => println!("{}: {}\n", "Error".red(), e),
                    }
                }
            },
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);

    if let Err(e) = session.persist() {
        println!("{}: {}", "Error".red(), e);
    }
    session.close().await;
    println!("{}", "Bye.".dimmed());

    Ok(())
}

fn parse_line(line: &str) -> Option<Step> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let (cmd, args) = parts.split_first()?;
    let cmd = cmd.to_lowercase();

    let step = match cmd.as_str() {
        "help" | "?" => Step::Print(help_text()),
        "quit" | "exit" | "q" => Step::Quit,
        _ => match OperationKind::from_name(&cmd) {
            Some(kind) if args.first().is_some_and(|a| a.eq_ignore_ascii_case("h")) => {
                Step::Print(report::usage(kind).to_string())
            }
            Some(kind) => Step::Run(kind, args.iter().map(|a| a.to_string()).collect()),
            None => Step::Print(format!("Unknown command: {}. Type 'help' for help.", cmd)),
        },
    };
    Some(step)
}

fn help_text() -> String {
    let mut text = String::from("Available commands:\n");
    text.push_str(&format!("  {:<12}{}\n", "help", "Show this help"));
    for kind in OperationKind::ALL {
        text.push_str(&format!("  {:<12}{}\n", kind.name(), report::summary(kind)));
    }
    text.push_str(&format!("  {:<12}{}\n", "quit", "Exit the shell"));
    text.push_str("\nType '<command> h' for the options of a command.");
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("quit"), Some(Step::Quit));
        assert_eq!(
            parse_line("write 2 1 FF"),
            Some(Step::Run(
                OperationKind::Write,
                vec!["2".into(), "1".into(), "FF".into()]
            ))
        );
        assert_eq!(
            parse_line("CONFIG 11223344556677 17500 -10 30"),
            Some(Step::Run(
                OperationKind::Config,
                vec!["11223344556677".into(), "17500".into(), "-10".into(), "30".into()]
            ))
        );
    }

    #[test]
    fn test_parse_line_usage() {
        let Some(Step::Print(text)) = parse_line("bruteforce h") else {
            panic!("expected usage text");
        };
        assert!(text.starts_with("Usage: bruteforce"));

        let Some(Step::Print(text)) = parse_line("erase") else {
            panic!("expected unknown-command text");
        };
        assert!(text.contains("Unknown command: erase"));
    }

    #[test]
    fn test_help_lists_every_command() {
        let text = help_text();
        for kind in OperationKind::ALL {
            assert!(text.contains(kind.name()));
        }
    }
}
