use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use secrecy::{ExposeSecret, SecretString};
use tracing_subscriber::EnvFilter;

use parley_gateway::history::ConversationHistory;
use parley_gateway::speech::{MicTranscriber, StdinTranscriber};
use parley_gateway::voice::{SpeechToText, list_input_devices};
use parley_gateway::{
    Completer, Config, ConsoleRobot, Controller, FrontEnd, HttpRobot, IdleScheduler,
    OpenAiCompleter, Robot, RobotBackend, SharedState, Transcriber, Turn, run_reactor,
};

/// Parley - turn coordination between a robot and a speech front-end
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (defaults to ~/.config/parley/config.toml)
    #[arg(long, env = "PARLEY_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Directory holding the shared state files
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the robot-side controller
    Controller {
        /// Robot backend
        #[arg(long, value_enum)]
        robot: Option<RobotBackend>,
        /// Engage immediately instead of waiting for the wake word
        #[arg(long)]
        no_wake_word: bool,
    },
    /// Run the speech/LLM front-end
    Frontend {
        /// Where utterances come from
        #[arg(long, value_enum, default_value = "mic")]
        input: InputSource,
        /// Continue the saved conversation instead of starting fresh
        #[arg(long)]
        keep_history: bool,
        /// Input device index (see `list-mics`)
        #[arg(long)]
        device: Option<usize>,
    },
    /// Show the shared turn state
    Status,
    /// Reset shared state to listen with an empty payload
    Reset,
    /// List audio input devices
    ListMics,
}

#[derive(Clone, Copy, ValueEnum)]
enum InputSource {
    Mic,
    Stdin,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,parley_gateway=info",
        1 => "info,parley_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.state_dir {
        config.state.dir = dir;
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Command::Controller {
            robot,
            no_wake_word,
        } => run_controller(config, robot, no_wake_word).await,
        Command::Frontend {
            input,
            keep_history,
            device,
        } => run_frontend(config, input, keep_history, device).await,
        Command::Status => cmd_status(&config),
        Command::Reset => cmd_reset(&config),
        Command::ListMics => cmd_list_mics(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn run_controller(
    mut config: Config,
    backend: Option<RobotBackend>,
    no_wake_word: bool,
) -> anyhow::Result<()> {
    if no_wake_word {
        config.robot.controller.require_wake_word = false;
    }
    let settings = config.robot.controller.clone();

    let robot: Arc<dyn Robot> = match backend.unwrap_or(config.robot.backend) {
        RobotBackend::Console => Arc::new(ConsoleRobot::new(&settings.wake_word, true)),
        RobotBackend::Http => {
            let url = config
                .robot
                .bridge_url
                .as_deref()
                .ok_or_else(|| {
                    anyhow::anyhow!("http robot requires PARLEY_ROBOT_URL or robot.bridge_url")
                })?;
            Arc::new(HttpRobot::new(url)?)
        }
    };

    let store: Arc<dyn SharedState> = Arc::new(config.state.open_store()?);
    tracing::info!(
        robot = robot.name(),
        state_dir = %config.state.dir.display(),
        wake_word = settings.require_wake_word,
        "starting controller"
    );

    let mut controller = Controller::new(
        store,
        robot,
        IdleScheduler::new(config.idle.clone()),
        settings,
    );
    controller.prepare().await?;

    run_reactor(&mut controller, config.poll, shutdown_signal()).await;
    tracing::info!(delivered = controller.delivered(), "controller stopped");
    Ok(())
}

async fn run_frontend(
    mut config: Config,
    input: InputSource,
    keep_history: bool,
    device: Option<usize>,
) -> anyhow::Result<()> {
    let api_key = config
        .llm
        .api_key
        .take()
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY is required for the front-end"))?;

    let store: Arc<dyn SharedState> = Arc::new(config.state.open_store()?);
    let completer = OpenAiCompleter::new(
        SecretString::from(api_key.expose_secret().to_owned()),
        &config.llm.base_url,
        &config.llm.model,
    )?;

    let history_path = config.state.history_path();
    let history = if config.reset_history_on_start && !keep_history {
        ConversationHistory::reset(&history_path, &config.llm.system_prompt)?
    } else {
        ConversationHistory::load(&history_path, &config.llm.system_prompt)
    };

    tracing::info!(
        model = completer.model(),
        history = history.len(),
        state_dir = %config.state.dir.display(),
        "starting front-end"
    );

    match input {
        InputSource::Stdin => {
            println!("Type a line and press enter to speak. Ctrl-C quits.");
            drive_frontend(store, StdinTranscriber::new(), completer, history, &config).await;
        }
        InputSource::Mic => {
            if device.is_some() {
                config.speech.mic.device_index = device;
            }
            let stt = SpeechToText::new(api_key, &config.llm.base_url, &config.speech.stt_model)?;
            let transcriber = MicTranscriber::new(config.speech.mic.clone(), stt)?;
            drive_frontend(store, transcriber, completer, history, &config).await;
        }
    }

    Ok(())
}

async fn drive_frontend<T: Transcriber, C: Completer>(
    store: Arc<dyn SharedState>,
    transcriber: T,
    completer: C,
    history: ConversationHistory,
    config: &Config,
) {
    let mut frontend = FrontEnd::new(store, transcriber, completer, history);
    run_reactor(&mut frontend, config.poll, shutdown_signal()).await;
    tracing::info!(messages = frontend.history().len(), "front-end stopped");
}

fn cmd_status(config: &Config) -> anyhow::Result<()> {
    let store = config.state.open_store()?;
    let response = store.get_response()?;

    println!("State dir: {}", config.state.dir.display());
    println!("Turn:      {}", store.get_turn());
    if response.is_empty() {
        println!("Response:  (empty)");
    } else {
        println!("Response:  {response}");
    }
    Ok(())
}

fn cmd_reset(config: &Config) -> anyhow::Result<()> {
    let store = config.state.open_store()?;
    store.clear_response()?;
    store.set_turn(Turn::Listen)?;
    println!("Shared state reset to {}", Turn::Listen);
    Ok(())
}

fn cmd_list_mics() -> anyhow::Result<()> {
    let devices = list_input_devices()?;
    if devices.is_empty() {
        println!("No input devices found");
    }
    for (index, name) in devices.iter().enumerate() {
        println!("{index}: {name}");
    }
    Ok(())
}
