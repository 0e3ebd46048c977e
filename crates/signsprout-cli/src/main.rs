use std::io::{self, BufRead, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use signsprout_contracts::chat::{parse_command, ChatCommand, CHAT_HELP_COMMANDS};
use signsprout_contracts::domain::{
    AppView, LessonPlan, Mood, ProficiencyLevel, RecognitionResult, StorySegment, UserProfile,
};
use signsprout_contracts::models::ModelRegistry;
use signsprout_contracts::outcome::Outcome;
use signsprout_engine::session::{DEFAULT_STORY_ACTION, DEFAULT_STORY_DIFFICULTY};
use signsprout_engine::{
    CapturedImage, ContentService, PracticeRound, ServiceConfig, StorySession, CAPTURE_MAX_DIM,
};
use tracing_subscriber::EnvFilter;

/// Exit status of `verify` when the sign was judged incorrect.
const EXIT_SIGN_INCORRECT: i32 = 2;

#[derive(Debug, Parser)]
#[command(name = "signsprout", version, about = "Sign language practice companion")]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Default, Args)]
struct ServiceArgs {
    #[arg(long, global = true)]
    model: Option<String>,
    #[arg(long, global = true)]
    events: Option<PathBuf>,
    /// Serve built-in content even when a credential is configured.
    #[arg(long, global = true)]
    offline: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    Plan(PlanArgs),
    Verify(VerifyArgs),
    Story(StoryArgs),
    Chat(ChatArgs),
    /// List known models and their capabilities.
    Models,
}

#[derive(Debug, Default, Args)]
struct ProfileArgs {
    /// Profile JSON file; the demo learner is used when omitted.
    #[arg(long)]
    profile: Option<PathBuf>,
    #[arg(long)]
    level: Option<ProficiencyLevel>,
    #[arg(long)]
    mood: Option<Mood>,
}

impl ProfileArgs {
    fn resolve(&self) -> Result<UserProfile> {
        let mut profile = match self.profile.as_deref() {
            Some(path) => UserProfile::load(path)?,
            None => UserProfile::demo(),
        };
        if let Some(level) = self.level {
            profile.level = level;
        }
        if let Some(mood) = self.mood {
            profile.mood = mood;
        }
        Ok(profile)
    }
}

#[derive(Debug, Parser)]
struct PlanArgs {
    #[command(flatten)]
    profile: ProfileArgs,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct VerifyArgs {
    /// Image file or `data:` URL of the captured frame.
    #[arg(long)]
    image: String,
    #[arg(long, default_value = "APPLE")]
    target: String,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct StoryArgs {
    #[arg(long, default_value_t = 1)]
    turns: usize,
    #[arg(long, default_value = DEFAULT_STORY_ACTION)]
    action: String,
    #[arg(long, default_value = DEFAULT_STORY_DIFFICULTY)]
    difficulty: String,
}

#[derive(Debug, Parser)]
struct ChatArgs {
    #[command(flatten)]
    profile: ProfileArgs,
}

fn main() {
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("signsprout error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let service = ContentService::from_config(&apply_service_args(
        ServiceConfig::from_env(),
        &cli.service,
    ));
    let mut out = io::stdout().lock();
    match cli.command {
        Command::Plan(args) => run_plan(&service, args, &mut out),
        Command::Verify(args) => run_verify(&service, args, &mut out),
        Command::Story(args) => {
            run_story(&service, args, &mut out)?;
            Ok(0)
        }
        Command::Chat(args) => {
            let profile = args.profile.resolve()?;
            let mut shell = ChatShell::new(service, profile);
            shell.run(io::stdin().lock(), &mut out)?;
            Ok(0)
        }
        Command::Models => {
            print_models(&ModelRegistry::default(), &mut out)?;
            Ok(0)
        }
    }
}

/// Flags win over the environment; `--offline` drops any credential.
fn apply_service_args(mut config: ServiceConfig, args: &ServiceArgs) -> ServiceConfig {
    if let Some(model) = args.model.as_deref() {
        config = config.with_model(model);
    }
    if let Some(path) = args.events.as_ref() {
        config = config.with_events_path(path);
    }
    if args.offline {
        config = config.offline();
    }
    if !config.has_credential() {
        tracing::info!("no API credential; serving built-in content");
    }
    tracing::debug!(config = ?config, "resolved service configuration");
    config
}

fn load_image(source: &str) -> Result<CapturedImage> {
    if source.starts_with("data:") {
        return CapturedImage::from_data_url(source);
    }
    CapturedImage::from_path(Path::new(source), CAPTURE_MAX_DIM)
        .with_context(|| format!("failed to read captured frame {source}"))
}

fn verify_exit_code(result: &RecognitionResult) -> i32 {
    if result.is_correct {
        0
    } else {
        EXIT_SIGN_INCORRECT
    }
}

fn source_note<T>(outcome: &Outcome<T>) -> String {
    match outcome.cause() {
        None => String::new(),
        Some(cause) => format!(" [fallback: {cause}]"),
    }
}

fn run_plan(service: &ContentService, args: PlanArgs, out: &mut impl Write) -> Result<i32> {
    let profile = args.profile.resolve()?;
    let outcome = service.generate_session_plan(&profile);
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(outcome.value())?)?;
        return Ok(0);
    }
    print_profile_header(&profile, out)?;
    writeln!(out, "Today's plan{}:", source_note(&outcome))?;
    print_plans(outcome.value(), out)?;
    Ok(0)
}

fn print_profile_header(profile: &UserProfile, out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "Hi {}! Level {} ({}), {}-day streak, {} XP.",
        profile.name,
        profile.rank(),
        profile.level,
        profile.streak,
        profile.xp
    )
}

fn print_plans(plans: &[LessonPlan], out: &mut impl Write) -> io::Result<()> {
    for (index, plan) in plans.iter().enumerate() {
        let opens = plan
            .target_view()
            .map(|view| view.title())
            .unwrap_or("not available yet");
        let done = if plan.completed { " (done)" } else { "" };
        writeln!(
            out,
            "{}. [{}] {} - {} min, difficulty {}{done}",
            index + 1,
            plan.activity.as_str(),
            plan.title,
            plan.estimated_duration,
            plan.difficulty
        )?;
        writeln!(out, "   {} Opens: {opens}", plan.description)?;
    }
    Ok(())
}

fn print_models(registry: &ModelRegistry, out: &mut impl Write) -> io::Result<()> {
    for model in registry.list() {
        let capabilities = model
            .capabilities
            .iter()
            .map(|capability| capability.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        match model.context_window {
            Some(tokens) => writeln!(out, "{} ({capabilities}; {tokens} tokens)", model.name)?,
            None => writeln!(out, "{} ({capabilities})", model.name)?,
        }
    }
    Ok(())
}

fn run_verify(service: &ContentService, args: VerifyArgs, out: &mut impl Write) -> Result<i32> {
    let image = load_image(&args.image)?;
    let target = args.target.trim().to_ascii_uppercase();
    let outcome = service.verify_sign(&image, &target);
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(outcome.value())?)?;
    } else {
        print_recognition(&target, &outcome, out)?;
    }
    Ok(verify_exit_code(outcome.value()))
}

fn print_recognition(
    target: &str,
    outcome: &Outcome<RecognitionResult>,
    out: &mut impl Write,
) -> io::Result<()> {
    let result = outcome.value();
    let verdict = if result.is_correct { "Correct" } else { "Not yet" };
    writeln!(
        out,
        "{verdict}: {target} ({:.0}% confidence){}",
        result.confidence * 100.0,
        source_note(outcome)
    )?;
    if let Some(detected) = result.detected_sign.as_deref() {
        writeln!(out, "Detected: {detected}")?;
    }
    writeln!(out, "{}", result.feedback)
}

fn run_story(service: &ContentService, args: StoryArgs, out: &mut impl Write) -> Result<()> {
    let mut session = StorySession::new(args.difficulty);
    print_segment(session.current(), "", out)?;
    for _ in 0..args.turns {
        writeln!(out, "> {}", args.action)?;
        let outcome = session.advance(service, &args.action);
        print_segment(outcome.value(), &source_note(&outcome), out)?;
    }
    Ok(())
}

fn print_segment(segment: &StorySegment, note: &str, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}{note}", segment.text)?;
    writeln!(out, "  ASL: {}", segment.gloss)?;
    writeln!(out, "  {}", segment.next_prompt)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChatFlow {
    Continue,
    Quit,
}

/// Interactive shell state: the view on screen, the running story, the
/// practice round and the most recent plan (for `/open`).
struct ChatShell {
    service: ContentService,
    profile: UserProfile,
    view: AppView,
    story: StorySession,
    round: PracticeRound,
    plans: Vec<LessonPlan>,
}

impl ChatShell {
    fn new(service: ContentService, profile: UserProfile) -> Self {
        let story = StorySession::new(profile.level.as_str());
        Self {
            service,
            profile,
            view: AppView::Dashboard,
            story,
            round: PracticeRound::new(),
            plans: Vec::new(),
        }
    }

    fn run(&mut self, mut input: impl BufRead, out: &mut impl Write) -> Result<()> {
        let mode = if self.service.is_configured() {
            format!("model {}", self.service.model())
        } else {
            "offline content".to_string()
        };
        writeln!(
            out,
            "SignSprout chat started for {} ({mode}). Type /help for commands.",
            self.profile.name
        )?;
        if let Some(events) = self.service.events() {
            writeln!(out, "Recording events to {}", events.path().display())?;
        }

        let mut line = String::new();
        loop {
            write!(out, "{}> ", self.view.as_str())?;
            out.flush()?;

            line.clear();
            let read = match input.read_line(&mut line) {
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            if read == 0 {
                break;
            }

            let command = parse_command(line.trim_end_matches(['\n', '\r']));
            if self.handle(command, out)? == ChatFlow::Quit {
                break;
            }
        }
        Ok(())
    }

    fn handle(&mut self, command: ChatCommand, out: &mut impl Write) -> Result<ChatFlow> {
        match command {
            ChatCommand::Noop => {}
            ChatCommand::Help => {
                writeln!(out, "Commands: {}", CHAT_HELP_COMMANDS.join(" "))?;
            }
            ChatCommand::Quit => return Ok(ChatFlow::Quit),
            ChatCommand::Plan => {
                self.view = AppView::Dashboard;
                let outcome = self.service.generate_session_plan(&self.profile);
                print_profile_header(&self.profile, out)?;
                writeln!(out, "Today's plan{}:", source_note(&outcome))?;
                print_plans(outcome.value(), out)?;
                self.plans = outcome.into_value();
            }
            ChatCommand::Open { entry } => self.open_plan_entry(&entry, out)?,
            ChatCommand::Verify { path } => {
                self.view = AppView::PracticeMode;
                let image = match load_image(&path) {
                    Ok(image) => image,
                    Err(err) => {
                        writeln!(out, "Verify failed: {err:#}")?;
                        return Ok(ChatFlow::Continue);
                    }
                };
                let target = self.round.target().to_string();
                let outcome = self.round.attempt(&self.service, &image);
                print_recognition(&target, &outcome, out)?;
                if self.round.can_advance() {
                    writeln!(out, "Type /next for a new word.")?;
                }
            }
            ChatCommand::Target { word } => {
                self.view = AppView::PracticeMode;
                self.round.set_target(&word);
                writeln!(out, "Target sign: {}", self.round.target())?;
            }
            ChatCommand::NextWord => match self.round.next_word() {
                Some(word) => writeln!(out, "Next sign: {word}")?,
                None => writeln!(out, "Sign {} correctly first.", self.round.target())?,
            },
            ChatCommand::Story { action } => {
                let action = action.unwrap_or_else(|| DEFAULT_STORY_ACTION.to_string());
                self.advance_story(&action, out)?;
            }
            ChatCommand::StoryAction { text } => self.advance_story(&text, out)?,
            ChatCommand::View { name } => match name.parse::<AppView>() {
                Ok(view) => self.show_view(view, out)?,
                Err(err) => writeln!(out, "{err}")?,
            },
            ChatCommand::Model { name } => match self.service.select_model(&name) {
                Some(reason) => writeln!(out, "{reason} Model set to {}", self.service.model())?,
                None => writeln!(out, "Model set to {}", self.service.model())?,
            },
            ChatCommand::Models => print_models(&ModelRegistry::default(), out)?,
            ChatCommand::MissingArgument { command } => {
                writeln!(out, "/{command} requires an argument")?;
            }
            ChatCommand::Unknown { command } => {
                writeln!(out, "Unknown command /{command}. Type /help for commands.")?;
            }
        }
        Ok(ChatFlow::Continue)
    }

    fn advance_story(&mut self, action: &str, out: &mut impl Write) -> Result<()> {
        self.view = AppView::StoryMode;
        let outcome = self.story.advance(&self.service, action);
        print_segment(outcome.value(), &source_note(&outcome), out)?;
        Ok(())
    }

    fn show_view(&mut self, view: AppView, out: &mut impl Write) -> Result<()> {
        self.view = view;
        writeln!(out, "{}", view.title())?;
        match view {
            AppView::StoryMode => print_segment(self.story.current(), "", out)?,
            AppView::PracticeMode => writeln!(out, "Target sign: {}", self.round.target())?,
            _ => {}
        }
        Ok(())
    }

    fn open_plan_entry(&mut self, entry: &str, out: &mut impl Write) -> Result<()> {
        if self.plans.is_empty() {
            writeln!(out, "No plan yet. Type /plan first.")?;
            return Ok(());
        }
        let count = self.plans.len();
        let Some(plan) = entry
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|number| number.checked_sub(1))
            .and_then(|index| self.plans.get(index))
        else {
            writeln!(out, "Choose an activity between 1 and {count}.")?;
            return Ok(());
        };
        match plan.target_view() {
            Some(view) => {
                writeln!(out, "Opening {}.", plan.title)?;
                self.show_view(view, out)?;
            }
            None => writeln!(out, "{} is not available yet.", plan.title)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;

    use signsprout_contracts::fallback;
    use signsprout_contracts::models::DEFAULT_MODEL;

    use super::*;

    fn shell() -> ChatShell {
        ChatShell::new(ContentService::unconfigured(), UserProfile::demo())
    }

    fn drive(shell: &mut ChatShell, script: &str) -> Result<String> {
        let mut out = Vec::new();
        shell.run(Cursor::new(script.as_bytes()), &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    fn configured() -> ServiceConfig {
        ServiceConfig {
            api_key: Some("secret".to_string()),
            ..ServiceConfig::default()
        }
    }

    #[test]
    fn offline_flag_drops_configured_credential() {
        let args = ServiceArgs {
            offline: true,
            ..ServiceArgs::default()
        };
        let config = apply_service_args(configured(), &args);
        assert!(!config.has_credential());
        assert!(!ContentService::from_config(&config).is_configured());
    }

    #[test]
    fn service_flags_override_environment() {
        let args = ServiceArgs {
            model: Some("gemini-2.5-pro".to_string()),
            events: Some(PathBuf::from("logs/events.jsonl")),
            offline: false,
        };
        let config = apply_service_args(configured(), &args);
        assert!(config.has_credential());
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(
            config.events_path.as_deref(),
            Some(Path::new("logs/events.jsonl"))
        );
    }

    #[test]
    fn incorrect_sign_exits_with_dedicated_code() {
        assert_eq!(verify_exit_code(&fallback::failed_recognition()), 2);
        assert_eq!(verify_exit_code(&fallback::mock_recognition("CAT")), 0);
    }

    #[test]
    fn verify_command_reports_fallback_result() -> Result<()> {
        let args = VerifyArgs {
            image: "data:image/png;base64,aGVsbG8=".to_string(),
            target: " apple ".to_string(),
            json: false,
        };
        let mut out = Vec::new();
        let code = run_verify(&ContentService::unconfigured(), args, &mut out)?;
        let text = String::from_utf8(out)?;
        assert_eq!(code, 0);
        assert!(text.starts_with("Correct: APPLE (85% confidence) [fallback:"));
        assert!(text.contains("Detected: APPLE"));
        Ok(())
    }

    #[test]
    fn images_load_from_data_urls_and_files() -> Result<()> {
        let image = load_image("data:image/png;base64,aGVsbG8=")?;
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, b"hello");

        let temp = tempfile::tempdir()?;
        let path = temp.path().join("frame.webp");
        fs::write(&path, b"not really webp")?;
        let image = load_image(path.to_str().unwrap_or_default())?;
        assert_eq!(image.mime_type, "image/webp");
        assert_eq!(image.bytes, b"not really webp");

        let missing = temp.path().join("missing.jpg");
        let err = load_image(missing.to_str().unwrap_or_default()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read captured frame"));
        Ok(())
    }

    #[test]
    fn profile_flags_override_loaded_profile() -> Result<()> {
        let args = ProfileArgs {
            profile: None,
            level: Some(ProficiencyLevel::Advanced),
            mood: Some(Mood::Tired),
        };
        let profile = args.resolve()?;
        assert_eq!(profile.name, "Alex");
        assert_eq!(profile.level, ProficiencyLevel::Advanced);
        assert_eq!(profile.mood, Mood::Tired);
        assert_eq!(profile.rank(), 2);
        Ok(())
    }

    #[test]
    fn level_and_mood_flags_parse_from_names() -> Result<()> {
        let cli = Cli::try_parse_from([
            "signsprout",
            "plan",
            "--level",
            "Intermediate",
            "--mood",
            "frustrated",
            "--offline",
        ])?;
        assert!(cli.service.offline);
        let Command::Plan(args) = cli.command else {
            panic!("expected plan command");
        };
        assert_eq!(args.profile.level, Some(ProficiencyLevel::Intermediate));
        assert_eq!(args.profile.mood, Some(Mood::Frustrated));
        assert!(Cli::try_parse_from(["signsprout", "plan", "--mood", "grumpy"]).is_err());
        Ok(())
    }

    #[test]
    fn plan_header_shows_rank() -> Result<()> {
        let args = PlanArgs {
            profile: ProfileArgs::default(),
            json: false,
        };
        let mut out = Vec::new();
        run_plan(&ContentService::unconfigured(), args, &mut out)?;
        let text = String::from_utf8(out)?;
        assert!(text.starts_with("Hi Alex! Level 1 (beginner), 12-day streak, 1240 XP."));
        assert!(text.contains("1. [story] Morning Adventure"));
        assert!(text.contains("3. [game] Emotion Check"));
        Ok(())
    }

    #[test]
    fn models_listing_shows_capabilities_and_context() -> Result<()> {
        let mut out = Vec::new();
        print_models(&ModelRegistry::default(), &mut out)?;
        let text = String::from_utf8(out)?;
        let first = text.lines().next().unwrap_or_default();
        assert_eq!(first, format!("{DEFAULT_MODEL} (text, vision; 1048576 tokens)"));
        Ok(())
    }

    #[test]
    fn plain_text_starts_the_story_from_any_view() -> Result<()> {
        let mut shell = shell();
        let text = drive(&mut shell, "the rabbit hops\n")?;
        assert!(text.contains(&fallback::opening_story_segment().text));
        assert!(!text.contains("Not in a story"));
        assert_eq!(shell.view, AppView::StoryMode);
        assert_eq!(shell.story.history().len(), 1);
        Ok(())
    }

    #[test]
    fn story_command_and_plain_text_share_one_session() -> Result<()> {
        let mut shell = shell();
        drive(&mut shell, "/story\nI wave back\n")?;
        assert_eq!(shell.story.history().len(), 2);
        Ok(())
    }

    #[test]
    fn practice_commands_drive_the_round() -> Result<()> {
        let mut shell = shell();
        let text = drive(
            &mut shell,
            "/next\n/verify data:image/png;base64,aGVsbG8=\n/next\n/target friend\n",
        )?;
        assert!(text.contains("Sign APPLE correctly first."));
        assert!(text.contains("Correct: APPLE"));
        assert!(text.contains("Next sign: CAT"));
        assert!(text.contains("Target sign: FRIEND"));
        assert_eq!(shell.view, AppView::PracticeMode);
        Ok(())
    }

    #[test]
    fn unreadable_frame_is_reported_not_fatal() -> Result<()> {
        let mut shell = shell();
        let text = drive(&mut shell, "/verify /nonexistent/frame.jpg\n/help\n")?;
        assert!(text.contains("Verify failed: failed to read captured frame"));
        assert!(text.contains("Commands: /plan"));
        Ok(())
    }

    #[test]
    fn open_navigates_to_the_plan_entry_view() -> Result<()> {
        let mut shell = shell();
        let text = drive(&mut shell, "/open 1\n/plan\n/open 2\n")?;
        assert!(text.contains("No plan yet. Type /plan first."));
        assert!(text.contains("Opening Finger Spelling Dash."));
        assert_eq!(shell.view, AppView::PracticeMode);

        let text = drive(&mut shell, "/open 3\n/open 9\n/open 1\n")?;
        assert!(text.contains("Emotion Check is not available yet."));
        assert!(text.contains("Choose an activity between 1 and 3."));
        assert_eq!(shell.view, AppView::StoryMode);
        Ok(())
    }

    #[test]
    fn views_models_and_errors_are_routed() -> Result<()> {
        let mut shell = shell();
        let text = drive(
            &mut shell,
            "/view parent\n/view attic\n/model not-a-model\n/models\n/model\n/dance\n",
        )?;
        assert!(text.contains("Parent Portal"));
        assert!(text.contains("unknown view 'attic'"));
        assert!(text.contains(&format!("Model set to {DEFAULT_MODEL}")));
        assert!(text.contains("gemini-2.5-pro (text, vision;"));
        assert!(text.contains("/model requires an argument"));
        assert!(text.contains("Unknown command /dance."));
        assert_eq!(shell.view, AppView::ParentDashboard);
        Ok(())
    }

    #[test]
    fn quit_stops_reading_input() -> Result<()> {
        let mut shell = shell();
        let text = drive(&mut shell, "/quit\n/plan\n")?;
        assert!(!text.contains("Today's plan"));
        Ok(())
    }
}
