//! Terminal front end for each subcommand.

use std::error::Error;

use practice_core::model::{LearningStyle, ProfilePatch, TopicId, User, UserId};
use practice_core::progress::Route;
use practice_core::session::{CompletionReason, Recall, Selection};
use services::{AppServices, Navigation, OnboardingError, PracticeError, QuizReport, StartedQuiz};
use storage::repository::ContentCatalog;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::Instant;

type CommandResult = Result<(), Box<dyn Error>>;

struct Input {
    lines: Lines<BufReader<Stdin>>,
}

impl Input {
    fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Next trimmed line, or `None` at end of input.
    async fn line(&mut self) -> std::io::Result<Option<String>> {
        Ok(self.lines.next_line().await?.map(|l| l.trim().to_string()))
    }
}

pub async fn topics(catalog: &dyn ContentCatalog) -> CommandResult {
    for topic in catalog.topics().await? {
        let questions = catalog.questions_for(&topic.id).await?.len();
        let cards = catalog.flashcards_for(&topic.id).await?.len();
        println!(
            "{:<16} {:<28} {:?}/{:?}  {questions} questions, {cards} flashcards",
            topic.id, topic.name, topic.subject, topic.difficulty
        );
    }
    Ok(())
}

pub fn status(app: &AppServices) -> CommandResult {
    let state = app.progress().snapshot();
    match state.user() {
        Some(user) if state.is_authenticated() => println!("Signed in as {} <{}>", user.name, user.email),
        _ => println!("Not signed in."),
    }

    let stats = state.game_stats();
    println!(
        "Level {}  ({} XP, {} to next level)",
        stats.level(),
        stats.xp(),
        stats.xp_to_next_level()
    );
    println!(
        "Quizzes: {}  Accuracy: {}%  Study time: {} min  Streak: {}",
        stats.total_quizzes(),
        stats.accuracy(),
        stats.total_study_time(),
        stats.streak()
    );

    println!("Onboarding:");
    for step in state.onboarding_steps() {
        let marker = if step.completed { "x" } else { " " };
        let pointer = if step.id == state.onboarding_step() { ">" } else { " " };
        println!("{pointer} [{marker}] {}. {}", step.id, step.title);
    }

    let next = match state.landing_route() {
        Route::SignIn => "practice signin --name <name> --email <email>".to_string(),
        Route::Onboarding(stage) => format!("practice onboarding  (step {})", stage.number()),
        Route::Dashboard => "practice quiz --topic <id>  or  practice flashcards --topic <id>".into(),
    };
    println!("Next: {next}");
    Ok(())
}

pub async fn sign_in(app: &AppServices, name: &str, email: &str) -> CommandResult {
    let user = User::new(UserId::generate(), name, email)?;
    let state = app.progress().sign_in(user).await?;
    println!("Welcome, {name}!");
    if let Route::Onboarding(stage) = state.landing_route() {
        println!("Continue onboarding at step {}: {}", stage.number(), stage.title());
    }
    Ok(())
}

pub async fn onboarding(app: &AppServices) -> CommandResult {
    let flow = app.onboarding();
    let progress = app.progress();
    let mut input = Input::stdin();

    if progress.landing_route() == Route::SignIn {
        println!("Sign in first: practice signin --name <name> --email <email>");
        return Ok(());
    }

    println!("Commands: name <text>, exam <text>, subjects <a, b>, style <video|text|mixed>,");
    println!("          minutes <n>, next, back, quit");
    loop {
        let view = flow.current();
        let done = if view.completed { " (done)" } else { "" };
        println!();
        println!("Step {}/{}: {}{done}", view.number, view.total, view.title);
        println!("  {}", view.prompt);

        let Some(line) = input.line().await? else {
            return Ok(());
        };
        let (command, rest) = line
            .split_once(' ')
            .map_or((line.as_str(), ""), |(c, r)| (c, r.trim()));

        let patch = match command {
            "quit" | "q" => return Ok(()),
            "next" | "n" => {
                match flow.next().await {
                    Ok(Navigation::Dashboard) => {
                        println!("Onboarding complete. Time to practice!");
                        return Ok(());
                    }
                    Ok(Navigation::SignIn) => {
                        println!("Your session ended; sign in again.");
                        return Ok(());
                    }
                    Ok(Navigation::GoToStep(_) | Navigation::Stay) => {}
                    Err(OnboardingError::Incomplete { reason, .. }) => println!("  ! {reason}"),
                    Err(err) => return Err(err.into()),
                }
                continue;
            }
            "back" | "b" => {
                flow.back().await?;
                continue;
            }
            "name" => ProfilePatch {
                name: Some(rest.to_string()),
                ..ProfilePatch::default()
            },
            "exam" => ProfilePatch {
                target_exam: Some(rest.to_string()),
                ..ProfilePatch::default()
            },
            "subjects" => ProfilePatch {
                subjects: Some(
                    rest.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(ToString::to_string)
                        .collect(),
                ),
                ..ProfilePatch::default()
            },
            "style" => {
                let style = match rest {
                    "video" => LearningStyle::Video,
                    "text" => LearningStyle::Text,
                    "mixed" => LearningStyle::Mixed,
                    _ => {
                        println!("  ! style must be video, text or mixed");
                        continue;
                    }
                };
                ProfilePatch {
                    learning_style: Some(style),
                    ..ProfilePatch::default()
                }
            }
            "minutes" => match rest.parse() {
                Ok(minutes) => ProfilePatch {
                    daily_minutes: Some(minutes),
                    ..ProfilePatch::default()
                },
                Err(_) => {
                    println!("  ! minutes must be a whole number");
                    continue;
                }
            },
            _ => {
                println!("  ? unknown command: {command}");
                continue;
            }
        };

        if let Err(err) = progress.update_profile(patch).await {
            println!("  ! {err}");
        }
    }
}

pub async fn quiz(app: &AppServices, topic: &str) -> CommandResult {
    let practice = app.practice();
    let topic = practice.topic(&TopicId::new(topic)).await?;
    let StartedQuiz {
        mut run,
        mut completion,
    } = practice.start_quiz(&topic.id).await?;
    let mut input = Input::stdin();

    println!("{}: {} questions, {} time units.", topic.name, run.progress().total, run.remaining_time());
    println!("Answer with the option number. Enter skips, p goes back, f finishes, q quits.");

    let report = loop {
        if let Some(report) = run.report() {
            break report;
        }
        print_question(&run);

        tokio::select! {
            report = &mut completion => {
                println!();
                println!("Time is up!");
                break report.map_err(|_| PracticeError::Abandoned)?;
            }
            line = input.line() => {
                let Some(line) = line? else {
                    run.cancel();
                    return Ok(());
                };
                let step = match line.as_str() {
                    "" | "n" => run.advance(),
                    "p" => {
                        run.previous();
                        None
                    }
                    "f" => run.finish(),
                    "q" => {
                        run.cancel();
                        println!("Quiz abandoned; nothing was recorded.");
                        return Ok(());
                    }
                    raw => match raw.parse::<usize>() {
                        Ok(choice) if choice >= 1 => match run.select(choice - 1) {
                            Ok(()) => run.advance(),
                            Err(err) => {
                                println!("  ! {err}");
                                None
                            }
                        },
                        _ => {
                            println!("  ? enter an option number");
                            None
                        }
                    },
                };
                if let Some(report) = step {
                    break report;
                }
            }
        }
    };

    print_report(&run.questions(), &report);
    let reward = practice.complete_quiz(&report).await?;
    println!(
        "+{} XP  (level {}, {} XP){}",
        reward.xp_awarded,
        reward.stats.level(),
        reward.stats.xp(),
        if reward.leveled_up { "  Level up!" } else { "" }
    );
    Ok(())
}

fn print_question(run: &services::QuizRun) {
    let progress = run.progress();
    let question = run.current_question();
    println!();
    println!(
        "Question {}/{}  [{} left]",
        progress.current + 1,
        progress.total,
        progress.remaining_time
    );
    println!("{}", question.prompt());
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}. {option}", i + 1);
    }
}

fn print_report(questions: &[practice_core::model::Question], report: &QuizReport) {
    let outcome = &report.outcome;
    println!();
    let reason = match outcome.reason {
        CompletionReason::Finished => "finished",
        CompletionReason::TimeExpired => "time expired",
    };
    println!(
        "Score: {}% ({}/{} correct, {reason}){}",
        outcome.score,
        outcome.correct,
        outcome.total,
        if outcome.passed() { "  Passed" } else { "" }
    );

    for mistake in &outcome.mistakes {
        let Some(question) = questions.iter().find(|q| *q.id() == mistake.question_id) else {
            continue;
        };
        let picked = match mistake.selected {
            Selection::Chosen(option) => question.option(option).unwrap_or("?"),
            Selection::Unanswered => "no answer",
        };
        println!();
        println!("  {}", question.prompt());
        println!("    you: {picked}");
        println!("    correct: {}", question.option(mistake.correct).unwrap_or("?"));
        if !question.explanation().is_empty() {
            println!("    {}", question.explanation());
        }
    }
}

pub async fn flashcards(app: &AppServices, topic: &str) -> CommandResult {
    let practice = app.practice();
    let mut review = practice.start_flashcards(&TopicId::new(topic)).await?;
    let mut input = Input::stdin();
    let started = Instant::now();

    println!("Enter flips the card, e = easy, h = hard, p = previous, s = skip, q = quit.");
    let completion = loop {
        let card = review.current_card();
        println!();
        println!("Card {}/{}", review.current_index() + 1, review.total_cards());
        if review.is_flipped() {
            println!("  {}  ->  {}", card.front, card.back);
        } else {
            println!("  {}", card.front);
        }

        let Some(line) = input.line().await? else {
            return Ok(());
        };
        let rated = match line.as_str() {
            "" | "f" => {
                review.flip();
                None
            }
            "e" => review.rate(Recall::Easy),
            "h" => review.rate(Recall::Hard),
            "p" => {
                review.previous();
                None
            }
            "s" => {
                review.next();
                None
            }
            "q" => {
                println!("Review stopped after {} cards; nothing was recorded.", review.reviewed_count());
                return Ok(());
            }
            other => {
                println!("  ? unknown command: {other}");
                None
            }
        };
        if let Some(completion) = rated {
            break completion;
        }
    };

    let reward = practice
        .complete_flashcards(&completion, started.elapsed())
        .await?;
    println!();
    println!(
        "Reviewed {} cards ({} easy, {} hard). +{} XP, level {}.",
        completion.reviewed_count,
        completion.easy,
        completion.hard,
        reward.xp_awarded,
        reward.stats.level()
    );
    Ok(())
}
