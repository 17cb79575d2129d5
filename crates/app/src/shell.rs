use std::error::Error;

use exam_core::{ExamSnapshot, TimerEvent, Urgency};
use services::ExamDriver;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::commands::{Command, HELP};

pub fn print_current(driver: &ExamDriver) {
    let snapshot = driver.snapshot();
    driver.with_session(|session| {
        let question = session.current_question();
        println!();
        println!(
            "[{}] Question {}/{}",
            snapshot.time_string,
            snapshot.current_index + 1,
            snapshot.total_questions
        );
        println!("{}", question.text());
        for (i, option) in question.options().iter().enumerate() {
            let marker = if question.selected() == Some(i) { "(*)" } else { "( )" };
            println!("  {marker} {}. {option}", i + 1);
        }
    });
}

fn print_palette(driver: &ExamDriver) {
    let palette = driver.with_session(|session| session.palette());
    for entry in palette {
        let cursor = if entry.is_current { ">" } else { " " };
        println!("{cursor} Q{:<3} {}", entry.number(), entry.status.label());
    }
}

/// Applies one command. Returns `false` once the loop should end.
fn apply(driver: &ExamDriver, command: Command) -> Result<bool, Box<dyn Error>> {
    debug!(?command, "command received");
    match command {
        Command::Select(index) => {
            if !driver.select_option(index) {
                println!("no such option");
            }
            print_current(driver);
        }
        Command::Mark => {
            if driver.mark_for_review() {
                println!("marked for review");
            } else {
                println!("exam already submitted");
            }
        }
        Command::Next => {
            if !driver.next_question() {
                println!("already at the last question");
            }
            print_current(driver);
        }
        Command::GoTo(index) => {
            if !driver.go_to_question(index) {
                println!("no such question");
            }
            print_current(driver);
        }
        Command::Palette => print_palette(driver),
        Command::Suspend => {
            driver.suspend();
            info!(remaining = driver.snapshot().remaining_secs, "host in background");
            println!("app in background; type fg to return");
        }
        Command::Resume => {
            let event = driver.resume()?;
            info!(?event, "host in foreground");
            if event == TimerEvent::Expired {
                println!("time ran out while in background");
            }
            print_current(driver);
        }
        Command::Submit => {
            if !driver.submit() {
                debug!("submit ignored, exam already over");
            }
        }
        Command::Quit => {
            if driver.submit() {
                info!("quit before the end, exam submitted");
            }
            return Ok(false);
        }
        Command::Help => println!("{HELP}"),
    }
    Ok(!driver.snapshot().is_submitted())
}

fn announce_urgency(snapshot: &ExamSnapshot, last: &mut Urgency) {
    if snapshot.urgency == *last {
        return;
    }
    *last = snapshot.urgency;
    info!(urgency = ?snapshot.urgency, remaining = snapshot.remaining_secs, "urgency changed");
    match snapshot.urgency {
        Urgency::Warning => println!("[{}] less than five minutes left", snapshot.time_string),
        Urgency::Critical => println!("[{}] less than a minute left", snapshot.time_string),
        Urgency::Normal => {}
    }
}

/// Starts the countdown and feeds input lines to the exam until it is
/// submitted.
///
/// Ends on whichever comes first: a command that submits, the input channel
/// closing (treated as a submit), or the countdown expiring. Expiry does not
/// wait for another line of input.
///
/// # Errors
///
/// Returns an error if the countdown cannot be started or resumed outside a
/// tokio runtime.
pub async fn run_exam(
    driver: &ExamDriver,
    mut input: mpsc::Receiver<String>,
) -> Result<(), Box<dyn Error>> {
    let mut updates = driver.subscribe();
    let mut urgency = updates.borrow().urgency;

    driver.start()?;
    info!(
        questions = driver.snapshot().total_questions,
        remaining = driver.snapshot().remaining_secs,
        "exam started"
    );
    print_current(driver);

    loop {
        tokio::select! {
            line = input.recv() => {
                let Some(line) = line else {
                    info!("input closed, submitting");
                    driver.submit();
                    break;
                };
                match Command::parse(&line) {
                    Ok(command) => {
                        if !apply(driver, command)? {
                            break;
                        }
                    }
                    Err(err) => println!("{err}"),
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    warn!("snapshot channel closed");
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if snapshot.is_submitted() {
                    break;
                }
                announce_urgency(&snapshot, &mut urgency);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use exam_core::model::Question;
    use exam_core::{ExamSettingsDraft, SubmitReason};
    use services::ExamSetup;
    use tokio::time::timeout;

    use super::*;

    fn driver(secs: u32) -> ExamDriver {
        let questions = (0..3)
            .map(|i| Question::new(format!("Q{i}"), ["A", "B", "C"], 0))
            .collect();
        ExamSetup::from_draft(ExamSettingsDraft {
            duration_secs: Some(secs),
            ..ExamSettingsDraft::default()
        })
        .unwrap()
        .build_driver(questions)
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_ends_the_loop_while_input_is_idle() {
        let driver = driver(2);
        let (_tx, rx) = mpsc::channel(8);

        timeout(Duration::from_secs(10), run_exam(&driver, rx))
            .await
            .expect("loop returned after expiry")
            .unwrap();

        let report = driver.report().expect("submitted");
        assert_eq!(report.reason, SubmitReason::TimeExpired);
        assert_eq!(report.time_used_secs, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_input_submits() {
        let driver = driver(600);
        let (tx, rx) = mpsc::channel(8);
        drop(tx);

        run_exam(&driver, rx).await.unwrap();
        assert_eq!(driver.report().unwrap().reason, SubmitReason::Manual);
    }

    #[tokio::test(start_paused = true)]
    async fn commands_are_applied_until_submit() {
        let driver = driver(600);
        let (tx, rx) = mpsc::channel(8);
        for line in ["1", "bogus", "m", "s"] {
            tx.send(line.to_string()).await.unwrap();
        }

        timeout(Duration::from_secs(10), run_exam(&driver, rx))
            .await
            .expect("loop returned after submit")
            .unwrap();

        let report = driver.report().unwrap();
        assert_eq!(report.reason, SubmitReason::Manual);
        assert_eq!(report.counts.marked_for_review, 1);
        assert_eq!(report.counts.attempted, 0);
        assert_eq!(report.questions[0].selected, Some(0));
    }
}
