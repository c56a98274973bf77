//! The `quizvault take` command: run an exam in the terminal.
//!
//! The countdown and the student's input share one current-thread loop. Each
//! line of input is one command:
//!
//! - `1`, `2 4`: choose answers by their displayed number
//! - `n` / `next`, `b` / `back`, `g 3` / `goto 3`: move between questions
//! - `s` / `submit`: finish (asks again while questions are unanswered)
//! - `q` / `quit`: abandon the exam, nothing is saved
//! - empty line: show the current question again

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;

use quizvault_core::config::QuizvaultConfig;
use quizvault_core::model::{QuestionMode, StudentInfo};
use quizvault_core::session::{Page, Session, SessionState, Tick};
use quizvault_core::statistics::{OutcomeShares, PieSlices};
use quizvault_core::store::RecordStore;

/// What the loop should do after a command.
enum Flow {
    Continue,
    Done,
    Quit,
}

pub async fn execute(
    config: &QuizvaultConfig,
    test_name: String,
    student: StudentInfo,
    retake: bool,
    no_shuffle: bool,
) -> Result<()> {
    let store = config.store();
    let (tests, _) = store
        .load_bank_with_degrees()
        .context("failed to load the question bank")?;
    let test = tests
        .iter()
        .find(|t| t.name == test_name)
        .with_context(|| format!("no test named '{test_name}' (see `quizvault list`)"))?;

    let student = student.normalized(&config.phone_prefix);
    student.validate()?;
    if test.has_attempt(&student.name, &student.grade) && !retake {
        bail!(
            "{} ({}) already took '{}'; pass --retake to take it again",
            student.name,
            student.grade,
            test.name
        );
    }

    let mut session = if no_shuffle {
        Session::in_authoring_order(test, student)?
    } else {
        Session::new(test, student, &mut rand::rng())?
    };

    println!(
        "{}: {} question(s), {} to answer, out of {}.",
        test.name,
        session.question_count(),
        session.clock(),
        test.max_degree
    );
    if !test.description.is_empty() {
        println!("{}", test.description);
    }
    println!("Type answer numbers to choose, `n`/`b` to move, `s` to submit, `q` to quit.\n");
    render(&session);

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.tick().await;
    let mut lines = spawn_line_reader();
    let mut confirm_pending = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => on_tick(&session.tick()),
            line = lines.recv() => {
                let Some(line) = line.transpose().context("failed to read input")? else {
                    session.abort();
                    bail!("input closed before the exam was submitted; nothing was saved");
                };
                match handle(&mut session, &store, line.trim(), &mut confirm_pending) {
                    Flow::Continue => {}
                    Flow::Done => return Ok(()),
                    Flow::Quit => {
                        session.abort();
                        println!("Exam abandoned, nothing was saved.");
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Read stdin lines on their own thread. A blocking read cannot be
/// cancelled, and the runtime must not wait on one when the exam ends.
fn spawn_line_reader() -> mpsc::UnboundedReceiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let failed = line.is_err();
            if tx.send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

fn on_tick(tick: &Tick) {
    match tick {
        Tick::TimedOut => {
            println!("\nTime is up! Your answers are final.");
            println!("You can review the questions you saw, then type `s` to see your result.");
        }
        Tick::Remaining {
            seconds,
            display: Some(clock),
        } if seconds % 60 == 0 || *seconds <= 10 => println!("[{clock} left]"),
        _ => {}
    }
}

fn handle(session: &mut Session, store: &RecordStore, line: &str, confirm_pending: &mut bool) -> Flow {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or("");
    if !matches!(command, "s" | "submit") {
        *confirm_pending = false;
    }

    match command {
        "" => render(session),
        "n" | "next" => match session.advance() {
            Ok(Page::Question(_)) => render(session),
            Ok(Page::Results) => println!("That was the last question. Type `s` to submit."),
            Err(e) => println!("{e}"),
        },
        "b" | "back" => match session.back() {
            Ok(_) => render(session),
            Err(e) => println!("{e}"),
        },
        "g" | "goto" => match words.next().and_then(|w| w.parse::<usize>().ok()) {
            Some(n) if n > 0 => match session.goto(n - 1) {
                Ok(_) => render(session),
                Err(e) => println!("{e}"),
            },
            _ => println!("usage: goto <question number>"),
        },
        "s" | "submit" => return submit(session, store, confirm_pending),
        "q" | "quit" => return Flow::Quit,
        "h" | "help" | "?" => {
            println!("answer numbers: choose | n: next | b: back | g N: go to question N");
            println!("s: submit | q: quit | empty line: show the question again");
        }
        _ => choose_all(session, line),
    }
    Flow::Continue
}

fn choose_all(session: &mut Session, line: &str) {
    let Page::Question(q) = session.page() else {
        return;
    };
    for word in line.split_whitespace() {
        let Some(position) = word.parse::<usize>().ok().filter(|&n| n > 0) else {
            println!("unknown command `{word}`, type `help` for commands");
            return;
        };
        let Some(answer) = session
            .display_order(q)
            .and_then(|order| order.get(position - 1).copied())
        else {
            println!("there is no answer {position}");
            return;
        };
        if let Err(e) = session.choose(q, answer) {
            println!("{e}");
            return;
        }
    }
    render(session);
}

fn submit(session: &mut Session, store: &RecordStore, confirm_pending: &mut bool) -> Flow {
    if session.needs_confirmation() && !*confirm_pending {
        let unanswered: Vec<String> = session
            .unanswered()
            .iter()
            .map(|i| (i + 1).to_string())
            .collect();
        println!(
            "You did not answer question(s) {}. Type `s` again to submit anyway.",
            unanswered.join(", ")
        );
        *confirm_pending = true;
        return Flow::Continue;
    }

    let question_count = session.question_count();
    match session.finish(store) {
        Ok(record) => {
            println!("\nName:   {}", record.name);
            println!("School: {}", record.school);
            println!("Grade:  {}", record.grade);
            println!("Phone:  {}", record.phone);
            println!("\nDegree: {} / {}", record.degree, record.out_of);
            if let (Some(shares), Some(pie)) = (
                OutcomeShares::from_degree(record, question_count),
                PieSlices::from_degree(record, question_count),
            ) {
                println!(
                    "Correct {:.1}% | Failed {:.1}% | Left {:.1}%",
                    shares.credited_pct, shares.failed_pct, shares.left_pct
                );
                println!("Degrees lost: {} failed, {} left", pie.failed, pie.left);
            }
            Flow::Done
        }
        Err(e) => {
            println!("Error: {e}");
            println!("Your answers are kept. Type `s` to try saving again or `q` to quit.");
            *confirm_pending = true;
            Flow::Continue
        }
    }
}

fn render(session: &Session) {
    let Page::Question(q) = session.page() else {
        return;
    };
    let (Some(sheet), Some(order)) = (session.sheet(q), session.display_order(q)) else {
        return;
    };
    let question = sheet.question();

    let status = match session.state() {
        SessionState::Running => format!("{} left", session.clock()),
        SessionState::TimedOut => "time is up".to_string(),
        SessionState::Finished => "finished".to_string(),
    };
    println!("\nQuestion {}/{}  [{status}]", q + 1, session.question_count());
    println!("{}", question.prompt);
    if let Some(image) = &question.image_ref {
        println!("(image: {image})");
    }
    if sheet.mode() == QuestionMode::Multi {
        println!("(choose {} answers)", question.correct_count());
    }

    for (position, &answer) in order.iter().enumerate() {
        let marker = match (sheet.mode(), sheet.is_selected(answer)) {
            (QuestionMode::Single, true) => "(*)",
            (QuestionMode::Single, false) => "( )",
            (QuestionMode::Multi, true) => "[x]",
            (QuestionMode::Multi, false)
                if session.accepts_input() && !session.is_enabled(q, answer) =>
            {
                "[-]"
            }
            (QuestionMode::Multi, false) => "[ ]",
        };
        println!("  {}) {marker} {}", position + 1, question.answers[answer].text);
    }
}
