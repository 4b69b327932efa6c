use quiz_core::{AttemptPhase, SubmitOutcome};
use quiz_types::{
    AttemptMode, CredentialChange, Destination, ErrorSurface, QuizError, Registration, SettingsPatch, Theme,
};
use std::time::Instant;
use tracing::{debug, error};

use crate::platform::{QuizPage, QuizPlatform};

pub const HELP: &str = "\
Commands:
  register <email> <password> <display name>
  login <email> <password>
  logout
  quizzes
  start <quiz-id>
  answer <question> <option>
  submit
  result
  review
  history
  profile
  theme <light|dark>
  password <current> <new>
  delete-account
  quit";

const NO_QUIZ_OPEN: &str = "No quiz is open. Type 'start <quiz-id>'.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Register {
        email: String,
        credential: String,
        display_name: String,
    },
    Login {
        email: String,
        credential: String,
    },
    Logout,
    Quizzes,
    Start {
        quiz_id: String,
    },
    Answer {
        question_id: String,
        option_id: String,
    },
    Submit,
    Result,
    Review,
    History,
    Profile,
    Theme(Theme),
    Password {
        current: String,
        new: String,
    },
    DeleteAccount,
    Quit,
}

impl Command {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (name.to_lowercase().as_str(), args.as_slice()) {
            ("help" | "?", []) => Command::Help,
            ("register", [email, credential, display_name @ ..]) if !display_name.is_empty() => {
                Command::Register {
                    email: email.to_string(),
                    credential: credential.to_string(),
                    display_name: display_name.join(" "),
                }
            }
            ("login", [email, credential]) => Command::Login {
                email: email.to_string(),
                credential: credential.to_string(),
            },
            ("logout", []) => Command::Logout,
            ("quizzes", []) => Command::Quizzes,
            ("start", [quiz_id]) => Command::Start {
                quiz_id: quiz_id.to_string(),
            },
            ("answer", [question_id, option_id]) => Command::Answer {
                question_id: question_id.to_string(),
                option_id: option_id.to_lowercase(),
            },
            ("submit", []) => Command::Submit,
            ("result", []) => Command::Result,
            ("review", []) => Command::Review,
            ("history", []) => Command::History,
            ("profile", []) => Command::Profile,
            ("theme", [theme]) => Command::Theme(
                Theme::parse(theme).ok_or_else(|| format!("Unknown theme '{}'", theme))?,
            ),
            ("password", [current, new]) => Command::Password {
                current: current.to_string(),
                new: new.to_string(),
            },
            ("delete-account", []) => Command::DeleteAccount,
            ("quit" | "exit", []) => Command::Quit,
            _ => return Err(format!("Unrecognized command '{}'. Type 'help'.", line.trim())),
        };

        Ok(Some(command))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Line-oriented stand-in for the quiz pages.
pub struct Terminal {
    platform: QuizPlatform,
    page: Option<QuizPage>,
}

impl Terminal {
    pub fn new(platform: QuizPlatform) -> Self {
        Self {
            platform,
            page: None,
        }
    }

    pub fn platform(&self) -> &QuizPlatform {
        &self.platform
    }

    /// When the open page's countdown runs out, if one is running.
    pub fn timer_deadline(&self) -> Option<Instant> {
        let page = self.page.as_ref()?;
        if page.engine.phase() != AttemptPhase::InProgress {
            return None;
        }
        page.engine
            .countdown()
            .filter(|countdown| !countdown.has_fired())
            .map(|countdown| countdown.deadline())
    }

    pub async fn handle_line(&mut self, line: &str) -> Flow {
        match Command::parse(line) {
            Ok(Some(command)) => match self.execute(command).await {
                Ok(flow) => flow,
                Err(err) => {
                    self.report(&err);
                    Flow::Continue
                }
            },
            Ok(None) => Flow::Continue,
            Err(message) => {
                println!("{}", message);
                Flow::Continue
            }
        }
    }

    pub async fn on_timer(&mut self) {
        let Some(page) = self.page.as_mut() else {
            return;
        };

        match self.platform.poll_timer(page).await {
            Ok(Some(outcome)) => {
                println!("Time's up! Your answers were submitted.");
                print_outcome(&outcome);
            }
            Ok(None) => {}
            Err(err) => self.report(&err),
        }
    }

    pub async fn execute(&mut self, command: Command) -> Result<Flow, QuizError> {
        match command {
            Command::Help => println!("{}", HELP),
            Command::Register {
                email,
                credential,
                display_name,
            } => {
                let registration = Registration::new(&email, &credential, &display_name);
                let account = self.platform.register(registration).await?;
                println!(
                    "Account created for {}. Log in to continue.",
                    account.email
                );
            }
            Command::Login { email, credential } => {
                let destination = self.platform.login(&email, &credential).await?;
                println!("Welcome back!");
                self.navigate(destination);
            }
            Command::Logout => {
                self.page = None;
                let destination = self.platform.logout();
                self.navigate(destination);
            }
            Command::Quizzes => {
                for quiz in self.platform.catalog().quizzes() {
                    let timer = if quiz.config.has_timer {
                        format!("{} min", quiz.config.time_limit.as_secs() / 60)
                    } else {
                        "untimed".to_string()
                    };
                    println!(
                        "  {:<22} {} ({} questions, {})",
                        quiz.id,
                        quiz.name,
                        quiz.answer_key.len(),
                        timer
                    );
                }
            }
            Command::Start { quiz_id } => {
                let page = self.platform.load_quiz_page(&quiz_id)?;
                print_page(&page);
                self.page = Some(page);
            }
            Command::Answer {
                question_id,
                option_id,
            } => {
                let Some(page) = self.page.as_mut() else {
                    println!("{}", NO_QUIZ_OPEN);
                    return Ok(Flow::Continue);
                };
                if !page.engine.quiz().answer_key.contains(&question_id) {
                    println!("Unknown question '{}'", question_id);
                } else if page.engine.select_option(&question_id, &option_id)? {
                    println!(
                        "{} -> {} ({}/{} answered)",
                        question_id,
                        option_id,
                        page.engine.answered_count(),
                        page.engine.quiz().answer_key.len()
                    );
                }
            }
            Command::Submit => {
                let Some(page) = self.page.as_mut() else {
                    println!("{}", NO_QUIZ_OPEN);
                    return Ok(Flow::Continue);
                };
                let outcome = self.platform.submit(page).await?;
                print_outcome(&outcome);
                self.navigate(outcome.destination);
            }
            Command::Result => match self.platform.latest_result() {
                Some(result) => println!(
                    "{}: {}/{} ({}%) {}",
                    result.quiz_name,
                    result.score,
                    result.total,
                    result.percentage,
                    result.grade().message()
                ),
                None => println!("No result yet."),
            },
            Command::Review => match self.platform.open_review() {
                Some(Destination::Quiz { quiz_id }) => {
                    let page = self.platform.load_quiz_page(&quiz_id)?;
                    print_page(&page);
                    self.page = Some(page);
                }
                Some(other) => self.navigate(other),
                None => println!("Nothing to review yet."),
            },
            Command::History => {
                let history = self.platform.history().await?;
                if history.is_empty() {
                    println!("No quizzes taken yet.");
                }
                for record in history {
                    println!(
                        "  #{:<4} {:<24} {:>3}%  {}/{}  {}s  {}",
                        record.id,
                        record.quiz_name,
                        record.score,
                        record.correct_answers,
                        record.total_questions,
                        record.time_spent_seconds,
                        record.date
                    );
                }
            }
            Command::Profile => {
                let profile = self.platform.profile().await?;
                let json = serde_json::to_string_pretty(&profile).map_err(|err| {
                    QuizError::TransactionFailed {
                        message: err.to_string(),
                    }
                })?;
                println!("{}", json);
            }
            Command::Theme(theme) => {
                let patch = SettingsPatch {
                    theme: Some(theme),
                    ..Default::default()
                };
                let settings = self.platform.update_settings(patch).await?;
                println!("Theme set to {}", settings.theme.as_str());
            }
            Command::Password { current, new } => {
                self.platform
                    .change_credential(CredentialChange { current, new })
                    .await?;
                println!("Password updated.");
            }
            Command::DeleteAccount => {
                let destination = self.platform.delete_account().await?;
                self.page = None;
                println!("Account deleted.");
                self.navigate(destination);
            }
            Command::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    fn navigate(&self, destination: Destination) {
        debug!("Navigating to {:?}", destination);
        match destination {
            Destination::Home => println!("[home] Type 'quizzes' to pick a quiz."),
            Destination::Login => println!("[login] Please log in."),
            Destination::Profile => println!("[profile]"),
            Destination::Quiz { quiz_id } => println!("[quiz] {}", quiz_id),
            Destination::Results => println!("[results] Type 'review' to go over your answers."),
        }
    }

    fn report(&self, err: &QuizError) {
        match err.surface() {
            ErrorSurface::Silent => debug!("Ignored: {}", err),
            ErrorSurface::Field { field } => println!("{}: {}", field, err.user_message()),
            ErrorSurface::Page => {
                error!("{}", err);
                println!("{}", err.user_message());
            }
        }
        if let Some(destination) = err.destination() {
            self.navigate(destination);
        }
    }
}

fn print_page(page: &QuizPage) {
    let quiz = page.engine.quiz();
    match page.engine.result() {
        Some(result) if page.engine.mode() == AttemptMode::Review => {
            println!("Reviewing {} ({}%)", quiz.name, result.percentage);
            for question in page.engine.review() {
                println!(
                    "  {:<4} yours: {:<2} correct: {:<2} {}",
                    question.question_id,
                    question.selected.as_deref().unwrap_or("-"),
                    question.correct.as_deref().unwrap_or("-"),
                    if question.is_correct { "✓" } else { "✗" }
                );
            }
        }
        _ => {
            let questions: Vec<&str> = quiz.answer_key.iter().map(|(q, _)| q.as_str()).collect();
            println!("{}: questions {}", quiz.name, questions.join(", "));
            if let Some(countdown) = page.engine.countdown() {
                println!("Time left: {}", countdown.display());
            }
        }
    }
}

fn print_outcome(outcome: &SubmitOutcome) {
    let result = &outcome.result;
    println!(
        "{}/{} correct ({}%). {}",
        result.score,
        result.total,
        result.percentage,
        result.grade().message()
    );
    if let Some(recorded) = &outcome.recorded {
        println!(
            "Saved. Average {}%, {} quizzes taken, rank #{}",
            recorded.account.stats.average_score,
            recorded.account.stats.total_quizzes,
            recorded.account.stats.rank
        );
    }
}
