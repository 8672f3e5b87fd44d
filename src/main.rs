use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use cctv_assistant::presentation::{self, ChatInput, TerminalView};
use cctv_assistant::voice::{AudioCapture, calculate_energy};
use cctv_assistant::{
    ChatHistoryStore, Config, InputMode, KnowledgeBase, ReplyGenerator, ReplySource,
    SessionController, SessionDeps, SpeechOutput,
};

/// CCTV Assistant - voice-enabled information assistant for CCTV services
#[derive(Parser)]
#[command(name = "cctv-assistant", version, about)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, env = "CCTV_ASSISTANT_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Do not speak replies
    #[arg(long)]
    mute: bool,

    /// Answer from the built-in knowledge store instead of the language model
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat (default)
    Chat {
        /// Starting input mode
        #[arg(long, value_enum, default_value_t = ModeArg::Text)]
        mode: ModeArg,
    },
    /// Answer one question from the knowledge store
    Ask {
        /// Question text
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Speak text through the configured speech output
    Speak {
        /// Text to speak
        #[arg(default_value = "Halo! Ini adalah tes suara asisten CCTV.")]
        text: String,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Probe the language model connection
    TestConnection,
    /// Inspect or manage stored chat history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Text,
    Voice,
    Continuous,
}

impl From<ModeArg> for InputMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Text => Self::Text,
            ModeArg::Voice => Self::Voice,
            ModeArg::Continuous => Self::Continuous,
        }
    }
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Print the stored conversation
    Show,
    /// Delete the stored conversation
    Clear,
    /// Export the stored conversation as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity; RUST_LOG wins when set
    let filter = match cli.verbose {
        0 => "warn,cctv_assistant=info",
        1 => "info,cctv_assistant=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if cli.mute {
        config.voice.enabled = false;
    }
    tracing::debug!(data_dir = %config.data_dir.display(), "loaded configuration");

    match cli.command.unwrap_or(Command::Chat {
        mode: ModeArg::Text,
    }) {
        Command::Chat { mode } => chat(&config, cli.offline, mode.into()).await,
        Command::Ask { question } => {
            let kb = KnowledgeBase::new(config.widget.features);
            println!("{}", kb.respond(&question.join(" ")));
            Ok(())
        }
        Command::Speak { text } => speak(&config, &text).await,
        Command::TestMic { duration } => test_mic(duration).await,
        Command::TestConnection => test_connection(&config).await,
        Command::History { action } => history(&config, action),
    }
}

/// Interactive terminal chat over a session
async fn chat(config: &Config, offline: bool, mode: InputMode) -> anyhow::Result<()> {
    let replies: Arc<dyn ReplySource> = if offline {
        Arc::new(KnowledgeBase::new(config.widget.features))
    } else {
        Arc::new(ReplyGenerator::from_config(config))
    };

    let mut deps = SessionDeps::from_config(config, replies);
    deps.mode = mode;

    let (session, task) = SessionController::spawn(deps);
    let printer = tokio::spawn(print_updates(session.subscribe()));

    println!("Asisten CCTV siap. Ketik pertanyaan, atau /help untuk perintah.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match presentation::parse_input(&line) {
            ChatInput::Text(text) => session.submit(text).await?,
            ChatInput::Mode(mode) => {
                session.set_mode(mode).await?;
                if mode == InputMode::Voice {
                    session.listen().await?;
                }
            }
            ChatInput::Listen => session.listen().await?,
            ChatInput::Audio(on) => session.set_audio(on).await?,
            ChatInput::Clear => session.clear_history().await?,
            ChatInput::Open => session.open().await?,
            ChatInput::Close => session.close().await?,
            ChatInput::Help => println!("{}", presentation::HELP),
            ChatInput::Quit => break,
            ChatInput::Unknown(command) => println!("Perintah tidak dikenal: {command}"),
        }
    }

    session.shutdown().await?;
    task.await?;
    printer.abort();
    Ok(())
}

async fn print_updates(mut updates: broadcast::Receiver<cctv_assistant::SessionUpdate>) {
    let mut view = TerminalView::new();
    loop {
        match updates.recv().await {
            Ok(update) => {
                if let Some(line) = view.render(&update) {
                    println!("{line}");
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "terminal view lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Speak text through the configured engines
async fn speak(config: &Config, text: &str) -> anyhow::Result<()> {
    let output = SpeechOutput::from_config(config);
    if !output.check_availability().await {
        anyhow::bail!("no speech engine is available");
    }
    println!("Speaking: \"{text}\"");
    output.speak(text).await?;
    Ok(())
}

/// Test microphone input
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = calculate_energy(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!("[{:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]", i + 1);
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check your default input device and levels.");

    Ok(())
}

/// Probe the language model once
async fn test_connection(config: &Config) -> anyhow::Result<()> {
    let generator = ReplyGenerator::from_config(config);
    let result = generator.test_connection().await;
    println!("{}", result.message);
    if !result.success {
        anyhow::bail!("language model is unreachable");
    }
    Ok(())
}

fn history(config: &Config, action: HistoryAction) -> anyhow::Result<()> {
    let store = ChatHistoryStore::in_dir(config.data_dir.clone());
    match action {
        HistoryAction::Show => {
            let messages = store.load();
            if messages.is_empty() {
                println!("(riwayat kosong)");
            } else {
                print!("{}", presentation::render_history(&messages));
            }
        }
        HistoryAction::Clear => {
            store.clear()?;
            println!("Riwayat dihapus.");
        }
        HistoryAction::Export { output } => {
            let json = store.export()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
    }
    Ok(())
}
