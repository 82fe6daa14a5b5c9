use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use vaani::Config;
use vaani::sign::device::PlaybackOptions;
use vaani::sign::device::headless::HeadlessDevice;
use vaani::sign::simplifier::{IdentitySimplifier, Simplifier, create_simplifier};
use vaani::sign::{CaptionController, ClipResolver, PlaybackSignal, PlayerRuntime, Tokenizer};

#[derive(Parser, Debug)]
#[command(name = "vaani", version, about = "Render live captions as sign language clips")]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory).
    #[arg(long, global = true, env = "VAANI_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the lookup keys and clip locators for some text.
    Tokenize { text: String },

    /// Simplify text and play it once.
    Play {
        /// Skip simplification.
        #[arg(long)]
        raw: bool,
        /// Print signals as JSON lines.
        #[arg(long)]
        json: bool,
        text: String,
    },

    /// Treat each line on stdin as a final transcript.
    Listen {
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration.
    Config,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "vaani=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(&path)?,
        None => match Config::default_path() {
            Some(path) => Config::load_or_default(&path)?,
            None => Config::default(),
        },
    };
    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    let config = load_config(cli.config)?;

    match cli.command {
        Command::Tokenize { text } => {
            tokenize(&config, &text);
            Ok(())
        }
        Command::Play { raw, json, text } => play(config, raw, json, &text).await,
        Command::Listen { json } => listen(config, json).await,
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn tokenize(config: &Config, text: &str) {
    let tokenizer = Tokenizer::new(config.sign.punctuation);
    let resolver = ClipResolver::from_config(&config.sign);
    for token in tokenizer.tokenize(text) {
        println!("{token}\t{}", resolver.locator(&token));
    }
}

fn build_controller(
    config: &Config,
    simplifier: std::sync::Arc<dyn Simplifier>,
) -> Result<(CaptionController, mpsc::UnboundedReceiver<PlaybackSignal>)> {
    let device = HeadlessDevice::from_config(&config.sign).context("failed to set up player")?;
    let options = PlaybackOptions {
        muted: config.sign.mute_playback,
    };
    let (handle, signals) = PlayerRuntime::spawn(device, options);
    let controller = CaptionController::new(
        &config.sign,
        simplifier,
        handle,
        config.simplifier.language.clone(),
    );
    Ok((controller, signals))
}

fn print_signals(
    mut signals: mpsc::UnboundedReceiver<PlaybackSignal>,
    json: bool,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(signal) = signals.recv().await {
            if json {
                match serde_json::to_string(&signal) {
                    Ok(line) => println!("{line}"),
                    Err(e) => error!("Failed to encode signal: {}", e),
                }
                continue;
            }
            match &signal {
                PlaybackSignal::Playing { token, index } => println!("  [{index}] {token}"),
                PlaybackSignal::ClipMissing { token, index, .. } => {
                    println!("  [{index}] {token} (no clip)")
                }
                PlaybackSignal::Idle => println!("  done"),
                other => {
                    if let Some(status) = other.status_text() {
                        println!("  {status}");
                    }
                }
            }
        }
    })
}

async fn play(config: Config, raw: bool, json: bool, text: &str) -> Result<()> {
    let simplifier: std::sync::Arc<dyn Simplifier> = if raw {
        std::sync::Arc::new(IdentitySimplifier)
    } else {
        create_simplifier(&config.simplifier)?
    };
    let (mut controller, signals) = build_controller(&config, simplifier)?;
    let printer = print_signals(signals, json);

    match controller.resimplify(text).await? {
        Some(caption) => {
            if !json {
                println!("{}", caption.simple);
            }
        }
        None => info!("Nothing to play"),
    }

    controller.player().wait_idle().await;
    drop(controller);
    let _ = printer.await;
    Ok(())
}

async fn listen(config: Config, json: bool) -> Result<()> {
    let simplifier = create_simplifier(&config.simplifier)?;
    let (mut controller, signals) = build_controller(&config, simplifier)?;
    let printer = print_signals(signals, json);

    let shutdown = CancellationToken::new();
    let on_ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted");
            on_ctrl_c.cancel();
        }
    });

    controller.start_listening();
    let stdin = BufReader::new(tokio::io::stdin());
    if transcribe_lines(&mut controller, stdin, &shutdown, json).await? {
        controller.player().stop();
    }
    controller.stop_listening();

    controller.player().wait_idle().await;
    drop(controller);
    let _ = printer.await;
    Ok(())
}

/// Feed each line to the controller as a final transcript until EOF or
/// until `shutdown` fires.  Returns `true` when interrupted.
async fn transcribe_lines<R>(
    controller: &mut CaptionController,
    reader: R,
    shutdown: &CancellationToken,
    json: bool,
) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => return Ok(true),
            line = lines.next_line() => line.context("failed to read stdin")?,
        };
        let Some(line) = line else {
            return Ok(false);
        };
        // Simplification can take up to the simplifier timeout.
        let caption = tokio::select! {
            _ = shutdown.cancelled() => return Ok(true),
            caption = controller.on_final_transcript(&line) => caption?,
        };
        if let Some(caption) = caption {
            if !json {
                println!("{}", caption.simple);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use vaani::config::SignConfig;
    use vaani::sign::device::mock::ScriptedDevice;
    use vaani::sign::simplifier::mock::{ScriptedSimplifier, Unscripted};

    fn controller(simplifier: ScriptedSimplifier) -> CaptionController {
        let (handle, _signals) =
            PlayerRuntime::spawn(ScriptedDevice::instant(), PlaybackOptions::default());
        CaptionController::new(&SignConfig::default(), Arc::new(simplifier), handle, "English")
    }

    #[tokio::test]
    async fn transcribes_until_eof() {
        let mut controller = controller(ScriptedSimplifier::new(Unscripted::Echo));
        let shutdown = CancellationToken::new();

        let input = &b"hello\nthank you\n"[..];
        let interrupted = transcribe_lines(&mut controller, input, &shutdown, true)
            .await
            .unwrap();

        assert!(!interrupted);
        assert_eq!(controller.session().raw_display().trim_end(), "hello thank you");
    }

    #[tokio::test]
    async fn shutdown_interrupts_slow_simplification() {
        let simplifier =
            ScriptedSimplifier::new(Unscripted::Echo).with_latency(Duration::from_secs(30));
        let mut controller = controller(simplifier);
        let shutdown = CancellationToken::new();
        let cancel = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let interrupted = tokio::time::timeout(
            Duration::from_secs(5),
            transcribe_lines(&mut controller, &b"hello\n"[..], &shutdown, true),
        )
        .await
        .expect("shutdown should not wait for the simplifier")
        .unwrap();

        assert!(interrupted);
    }
}
