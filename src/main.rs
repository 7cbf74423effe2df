//! Liberty-Drill: a liberty-reading trainer for Go.
//!
//! ## Usage
//!
//! - `liberty-drill quiz <FILE>` - Interactive quiz over an SGF record
//! - `liberty-drill replay <FILE> --history 1011` - Rebuild a session from its history
//! - `liberty-drill demo` - Run a built-in record, answering everything correctly

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use liberty_drill::config::{QuestionGate, QuizConfig, QuizMode};
use liberty_drill::constants::{DEFAULT_COMPARISON_THRESHOLD, DEFAULT_MAX_QUESTIONS};
use liberty_drill::coord::str_coord;
use liberty_drill::engine::{Question, QuizEngine};
use liberty_drill::session::{Session, render};

/// A short capture fight on 9x9.
const DEMO_RECORD: &str = "(;GM[1]SZ[9];B[ee];W[fe];B[fd];W[ge];B[ed];W[ff];B[gd];W[he];B[ef])";

/// Liberty-Drill: a liberty-reading trainer for Go
#[derive(Parser)]
#[command(name = "liberty-drill")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log scheduling decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Quiz yourself on an SGF record, reading answers from stdin
    Quiz {
        file: PathBuf,
        #[command(flatten)]
        quiz: QuizArgs,
    },
    /// Rebuild a session from its first-try history and print its state
    Replay {
        file: PathBuf,
        /// First-try results, one character per question: 1 = correct, 0 = failed
        #[arg(long, default_value = "")]
        history: String,
        #[command(flatten)]
        quiz: QuizArgs,
    },
    /// Run a built-in record, answering every question correctly
    Demo {
        #[command(flatten)]
        quiz: QuizArgs,
    },
}

#[derive(Args)]
struct QuizArgs {
    /// Question kinds to ask
    #[arg(long, value_enum, default_value = "count")]
    mode: QuizMode,
    /// Questions per move of each kind (0 plays the record back without questions)
    #[arg(long, default_value_t = DEFAULT_MAX_QUESTIONS)]
    max_questions: usize,
    /// Only ask about the final position
    #[arg(long)]
    final_only: bool,
    /// Also ask about groups with 5 or more liberties
    #[arg(long)]
    keep_saturated: bool,
    /// Largest liberty difference for comparison pairs
    #[arg(long, default_value_t = DEFAULT_COMPARISON_THRESHOLD)]
    threshold: usize,
}

impl QuizArgs {
    fn config(&self) -> QuizConfig {
        QuizConfig {
            mode: self.mode,
            max_questions: self.max_questions,
            gate: if self.final_only {
                QuestionGate::FinalMove
            } else {
                QuestionGate::EveryMove
            },
            skip_saturated: !self.keep_saturated,
            comparison_threshold: self.threshold,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Some(Commands::Quiz { file, quiz }) => {
            let text = read_record(&file)?;
            let engine = QuizEngine::new(&text, quiz.config())
                .with_context(|| format!("cannot start a quiz on {}", file.display()))?;
            let mut session = Session::new(engine);
            session.run(io::stdin().lock(), io::stdout())?;
        }
        Some(Commands::Replay { file, history, quiz }) => {
            let text = read_record(&file)?;
            let history = parse_history(&history)?;
            let engine = QuizEngine::from_replay(&text, &history, quiz.config())
                .with_context(|| format!("cannot replay {}", file.display()))?;
            print_summary(&engine);
        }
        Some(Commands::Demo { quiz }) => run_demo(quiz.config())?,
        None => run_demo(QuizConfig::default())?,
    }
    Ok(())
}

fn read_record(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

fn parse_history(s: &str) -> Result<Vec<bool>> {
    s.chars()
        .map(|c| match c {
            '1' => Ok(true),
            '0' => Ok(false),
            other => bail!("history must only contain 1 and 0, found {other:?}"),
        })
        .collect()
}

fn print_summary(engine: &QuizEngine) {
    println!(
        "move {}/{}, {} correct, {} wrong, {} of {} questions asked",
        engine.move_index(),
        engine.total_moves(),
        engine.correct(),
        engine.wrong(),
        engine.results().len(),
        engine.total_questions()
    );
    print!("{}", render(&engine.display_sign_map(), None));
}

fn run_demo(config: QuizConfig) -> Result<()> {
    println!("Liberty-Drill demo\n");
    let mut engine = QuizEngine::new(DEMO_RECORD, config).context("demo record")?;
    let size = engine.board_size();

    while let Some(snap) = engine.advance() {
        println!(
            "move {}/{} at {}",
            snap.move_index,
            snap.total_moves,
            str_coord(snap.current_move.vertex, size)
        );
        if !engine.activate_questions() {
            continue;
        }
        while let Some(question) = engine.question().cloned() {
            match question {
                Question::Liberties { vertex, liberties } => {
                    println!("  liberties of {}: {liberties}", str_coord(vertex, size));
                    engine.answer(liberties);
                }
                Question::Mark { vertex, liberties } => {
                    let marks: Vec<String> = liberties.iter().map(|&v| str_coord(v, size)).collect();
                    println!("  liberties of {}: {}", str_coord(vertex, size), marks.join(" "));
                    engine.answer_mark(&liberties);
                }
                Question::Compare(pair) => {
                    println!(
                        "  {} vs {}: {:?}",
                        str_coord(pair.first, size),
                        str_coord(pair.second, size),
                        pair.answer()
                    );
                    engine.answer_comparison(pair.answer());
                }
            }
        }
    }

    println!();
    print_summary(&engine);
    Ok(())
}
