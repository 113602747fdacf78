mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use kickr::{
    app_dirs::AppDirs,
    audio::{CueSink, SilentCue, TerminalBell},
    capture::{BlankCapture, FrameSource},
    config::{clamp_duration, Config, ConfigStore, Difficulty, FileConfigStore, Posture, SessionConfig},
    error::Result as KickrResult,
    game::{GameLoop, LoopStep},
    history::{HistoryDb, SessionRecord},
    pose::PoseEstimator,
    render::CapturingRenderer,
    replay::Recording,
    runtime::{
        AppEvent, AppEventSource, Clock, CrosstermEventSource, FixedTicker, ManualClock, Runner,
        SystemClock, Ticker, TICK_RATE_MS,
    },
    session::{SessionController, SessionResult},
    simulate::SimulatedPlayer,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, File, OpenOptions},
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Mutex,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::ui::{
    history_table::HistoryView,
    screen::{HistoryScreen, ScorecardScreen},
    Scorecard, TerminalRenderer,
};

/// Frame size used by the simulated player.
const DEMO_WIDTH: u32 = 640;
const DEMO_HEIGHT: u32 = 480;

/// Sessions loaded into the history screen and `--history` listing
const HISTORY_LIMIT: usize = 100;

/// kick counting trainer for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Kick a virtual ball with your knees: hold a knee inside the ball's hit zone to score, then switch legs. Plays back recorded keypoints or a simulated player, keeps your session history and personal bests."
)]
pub struct Cli {
    /// posture the ball placement is tuned for
    #[clap(short = 'p', long, value_enum)]
    posture: Option<Posture>,

    /// difficulty 1-3; higher levels raise the ball (out-of-range values are clamped)
    #[clap(short = 'd', long, allow_negative_numbers = true)]
    difficulty: Option<i64>,

    /// session length in seconds, 10-120 in 5s steps (other values are clamped and rounded)
    #[clap(short = 's', long)]
    duration: Option<i64>,

    /// play back recorded keypoints from a JSON Lines file instead of the simulated player
    #[clap(short = 'r', long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// run one session without the terminal UI and print the scorecard
    #[clap(long)]
    headless: bool,

    /// do not mirror frames horizontally
    #[clap(long)]
    no_mirror: bool,

    /// seed for the simulated player's jitter and dropouts
    #[clap(long, default_value_t = 1)]
    seed: u64,

    /// store the effective posture, difficulty, duration and mirroring as defaults
    #[clap(long)]
    save_config: bool,

    /// list recent sessions and exit
    #[clap(long)]
    history: bool,

    /// write the full session history as CSV and exit
    #[clap(long, value_name = "FILE")]
    export_history: Option<PathBuf>,
}

impl Cli {
    /// Command-line flags override stored settings.
    fn merge_into(&self, mut cfg: Config) -> Config {
        if let Some(posture) = self.posture {
            cfg.posture = posture;
        }
        if let Some(level) = self.difficulty {
            cfg.difficulty = Difficulty::from_level_clamped(level);
        }
        if let Some(secs) = self.duration {
            cfg.duration_secs = clamp_duration(secs);
        }
        if self.no_mirror {
            cfg.mirror = false;
        }
        cfg
    }
}

/// Where frames and skeletons come from
#[derive(Debug, Clone)]
pub enum SourceSpec {
    Replay(Recording),
    Demo { seed: u64 },
}

impl SourceSpec {
    fn from_cli(cli: &Cli) -> KickrResult<Self> {
        match &cli.replay {
            Some(path) => Ok(SourceSpec::Replay(Recording::open(path)?)),
            None => Ok(SourceSpec::Demo { seed: cli.seed }),
        }
    }

    /// Fresh sources positioned at the start of play.
    fn open(&self, session: &SessionConfig) -> (Box<dyn FrameSource>, Box<dyn PoseEstimator>) {
        match self {
            SourceSpec::Replay(recording) => {
                let (capture, estimator) = recording.clone().split();
                (Box::new(capture), Box::new(estimator))
            }
            SourceSpec::Demo { seed } => (
                Box::new(BlankCapture::new(DEMO_WIDTH, DEMO_HEIGHT)),
                Box::new(SimulatedPlayer::new(*session, *seed)),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Playing,
    Scorecard,
    History,
}

type TuiGame<B> =
    GameLoop<Box<dyn FrameSource>, Box<dyn PoseEstimator>, Box<dyn CueSink>, TerminalRenderer<B>>;

pub struct App<B: Backend> {
    pub state: AppState,
    pub game: TuiGame<B>,
    pub source: SourceSpec,
    pub history: Option<HistoryDb>,
    pub scorecard: Option<Scorecard>,
    pub history_view: HistoryView,
}

impl<B: Backend> App<B> {
    pub fn new(
        config: &Config,
        source: SourceSpec,
        cue: Box<dyn CueSink>,
        renderer: TerminalRenderer<B>,
        history: Option<HistoryDb>,
        now: f64,
    ) -> Self {
        let session_config = config.session_config();
        let (capture, estimator) = source.open(&session_config);
        let mut session = SessionController::new(session_config);
        session.start(session_config, now);

        Self {
            state: AppState::Playing,
            game: GameLoop::new(session, capture, estimator, cue, renderer, config.mirror),
            source,
            history,
            scorecard: None,
            history_view: HistoryView::default(),
        }
    }

    /// Starts a new session with the same settings. A session still in
    /// progress is stopped and recorded first.
    pub fn retry(&mut self, now: f64) {
        if self.state == AppState::Playing {
            let result = self.game.stop();
            let config = *self.game.session.config();
            save_session(self.history.as_ref(), &config, &result);
        }
        let (capture, estimator) = self.source.open(self.game.session.config());
        self.game.replace_sources(capture, estimator);
        self.game.session.restart(now);
        self.scorecard = None;
        self.state = AppState::Playing;
    }

    pub fn on_tick(&mut self, now: f64) -> KickrResult<()> {
        if self.state != AppState::Playing {
            return Ok(());
        }
        if let LoopStep::Ended(result) = self.game.tick(now)? {
            self.finish(result);
            self.draw()?;
        }
        Ok(())
    }

    fn finish(&mut self, result: SessionResult) {
        let config = *self.game.session.config();
        self.scorecard = Some(Scorecard {
            personal_best: save_session(self.history.as_ref(), &config, &result),
            config,
            result,
        });
        self.state = AppState::Scorecard;
    }

    pub fn show_history(&mut self) {
        let records = match &self.history {
            Some(db) => db.recent(HISTORY_LIMIT).unwrap_or_else(|e| {
                warn!(error = %e, "could not load history");
                Vec::new()
            }),
            None => Vec::new(),
        };
        self.history_view = HistoryView::new(records);
        self.state = AppState::History;
    }

    pub fn back(&mut self) {
        if self.state == AppState::History && self.scorecard.is_some() {
            self.state = AppState::Scorecard;
        }
    }

    /// Redraws the current non-game screen. The game screen is drawn by each tick.
    pub fn draw(&mut self) -> KickrResult<()> {
        match self.state {
            AppState::Playing => Ok(()),
            AppState::Scorecard => match &self.scorecard {
                Some(card) => self
                    .game
                    .renderer_mut()
                    .draw_screen(&mut ScorecardScreen { card }),
                None => Ok(()),
            },
            AppState::History => self.game.renderer_mut().draw_screen(&mut HistoryScreen {
                view: &mut self.history_view,
            }),
        }
    }

    /// Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent, now: f64) -> KickrResult<bool> {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Ok(true);
        }

        match (self.state, key.code) {
            (_, KeyCode::Char('r')) => self.retry(now),
            (AppState::Scorecard, KeyCode::Char('h')) => self.show_history(),
            (AppState::History, KeyCode::Char('b') | KeyCode::Backspace) => self.back(),
            (AppState::History, KeyCode::Up) => self.history_view.scroll_up(1),
            (AppState::History, KeyCode::Down) => self.history_view.scroll_down(1),
            (AppState::History, KeyCode::PageUp) => self.history_view.scroll_up(10),
            (AppState::History, KeyCode::PageDown) => self.history_view.scroll_down(10),
            _ => return Ok(false),
        }
        self.draw()?;
        Ok(false)
    }
}

/// Stores a finished session and returns the personal best it had to beat.
fn save_session(
    history: Option<&HistoryDb>,
    config: &SessionConfig,
    result: &SessionResult,
) -> Option<u32> {
    let db = history?;
    let personal_best = db.personal_best(config).unwrap_or_else(|e| {
        warn!(error = %e, "could not read personal best");
        None
    });
    let record = SessionRecord::new(config, result, chrono::Local::now());
    if let Err(e) = db.record(&record) {
        warn!(error = %e, "could not save session");
    }
    personal_best
}

fn open_history() -> Option<HistoryDb> {
    HistoryDb::new()
        .map_err(|e| warn!(error = %e, "history unavailable"))
        .ok()
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter =
        EnvFilter::try_from_env("KICKR_LOG").unwrap_or_else(|_| EnvFilter::new("kickr=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let store = FileConfigStore::new();
    let config = cli.merge_into(store.load());
    if cli.save_config {
        store.save(&config)?;
        info!(path = %store.path().display(), "settings saved");
    }

    if let Some(path) = &cli.export_history {
        let exported = HistoryDb::new()?.export_csv(File::create(path)?)?;
        println!("exported {exported} sessions to {}", path.display());
        return Ok(());
    }

    if cli.history {
        print_history(&HistoryDb::new()?, &mut io::stdout())?;
        return Ok(());
    }

    let source = SourceSpec::from_cli(&cli).inspect_err(|e| error!(error = %e, "startup failed"))?;

    if cli.headless {
        let history = open_history();
        let session_config = config.session_config();
        let result = run_headless(&session_config, &source, config.mirror)?;
        let card = Scorecard {
            personal_best: save_session(history.as_ref(), &session_config, &result),
            config: session_config,
            result,
        };
        print_scorecard(&card, &mut io::stdout())?;
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;

    let clock = SystemClock::new();
    let mut app = App::new(
        &config,
        source,
        Box::new(TerminalBell),
        TerminalRenderer::new(terminal),
        open_history(),
        clock.now(),
    );
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let outcome = start_tui(&mut app, &runner, &clock);

    disable_raw_mode()?;
    let terminal = app.game.renderer_mut().terminal_mut();
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend, E: AppEventSource, T: Ticker>(
    app: &mut App<B>,
    runner: &Runner<E, T>,
    clock: &impl Clock,
) -> Result<(), Box<dyn Error>> {
    loop {
        match runner.step() {
            AppEvent::Tick => app.on_tick(clock.now())?,
            AppEvent::Resize => app.draw()?,
            AppEvent::Key(key) => {
                if app.handle_key(key, clock.now())? {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Plays one session without a terminal. Replays run on their recorded
/// timestamps and stop early when the recording runs out; the simulated
/// player runs on a manual clock at the tick rate.
fn run_headless(
    session_config: &SessionConfig,
    source: &SourceSpec,
    mirror: bool,
) -> KickrResult<SessionResult> {
    let mut session = SessionController::new(*session_config);

    match source {
        SourceSpec::Replay(recording) => {
            let (capture, estimator) = recording.clone().split();
            session.start(*session_config, capture.next_timestamp().unwrap_or(0.0));
            let mut game = GameLoop::new(
                session,
                capture,
                estimator,
                SilentCue,
                CapturingRenderer::default(),
                mirror,
            );
            loop {
                let Some(now) = game.capture().next_timestamp() else {
                    return Ok(game.stop());
                };
                match game.tick(now)? {
                    LoopStep::Ended(result) => return Ok(result),
                    LoopStep::Idle => return Ok(game.stop()),
                    _ => {}
                }
            }
        }
        SourceSpec::Demo { seed } => {
            let dt = TICK_RATE_MS as f64 / 1000.0;
            let clock = ManualClock::new(0.0);
            session.start(*session_config, clock.now());
            let mut game = GameLoop::new(
                session,
                BlankCapture::new(DEMO_WIDTH, DEMO_HEIGHT),
                SimulatedPlayer::new(*session_config, *seed).with_frame_period(dt),
                SilentCue,
                CapturingRenderer::default(),
                mirror,
            );
            loop {
                match game.tick(clock.now())? {
                    LoopStep::Ended(result) => return Ok(result),
                    LoopStep::Idle => return Ok(game.stop()),
                    _ => clock.advance(dt),
                }
            }
        }
    }
}

fn print_scorecard(card: &Scorecard, out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "{} · difficulty {} · {}s",
        card.config.posture, card.config.difficulty, card.config.duration_secs
    )?;
    writeln!(out, "kicks: {}", card.result.total_kicks)?;
    writeln!(out, "average kick time: {:.2}s", card.result.average_kick_time())?;
    writeln!(out, "best kick time: {:.2}s", card.result.best_kick_time())?;
    writeln!(out, "time played: {}s", card.result.duration)?;
    writeln!(out, "{}", card.best_line())
}

fn print_history(db: &HistoryDb, out: &mut impl Write) -> KickrResult<()> {
    let records = db.recent(HISTORY_LIMIT)?;
    if records.is_empty() {
        writeln!(out, "no sessions recorded yet")?;
        return Ok(());
    }
    for r in records {
        writeln!(
            out,
            "{}  {:<8}  level {}  {:>3}s  {:>3} kicks  avg {:.2}s  best {:.2}s",
            r.played_at.format("%Y-%m-%d %H:%M"),
            r.posture,
            r.difficulty,
            r.duration,
            r.total_kicks,
            r.average_kick_time,
            r.best_kick_time
        )?;
    }
    Ok(())
}
