use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use arca_gateway::api::ApiServer;
use arca_gateway::conversation::spawn_sweeper;
use arca_gateway::llm::LmStudioClient;
use arca_gateway::pipeline::StageTimeouts;
use arca_gateway::voice::{TextToSpeech, WhisperStt};
use arca_gateway::{Config, SessionRegistry, VoiceAssistant};

#[derive(Parser)]
#[command(name = "arca", version, about = "Voice conversation gateway")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "ARCA_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Probe the configured backends and exit
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli).await
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info,arca_gateway=info",
        1 => "info,arca_gateway=debug",
        _ => "debug,arca_gateway=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config =
        Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let assistant = Arc::new(build_assistant(&config).context("failed to build pipeline")?);

    if let Some(Command::Check) = cli.command {
        return check_backends(&assistant).await;
    }

    let report = assistant.health_check().await;
    if !report.overall {
        tracing::warn!(
            stt = report.stt,
            llm = report.llm,
            tts = report.tts,
            "starting with unhealthy backends; turns will fail until they recover"
        );
    }

    let sweeper = spawn_sweeper(
        Arc::clone(assistant.sessions()),
        Duration::from_secs(config.conversation.sweep_interval_secs),
    );

    let server = ApiServer::new(Arc::clone(&assistant), config.stt.language.clone());
    let result = server.run(&config.server.host, config.server.port).await;
    sweeper.abort();
    result.context("server error")
}

fn build_assistant(config: &Config) -> arca_gateway::Result<VoiceAssistant> {
    let stt = Arc::new(WhisperStt::new(&config.stt)?);
    let llm = Arc::new(LmStudioClient::new(&config.llm)?);
    let tts = Arc::new(TextToSpeech::from_config(&config.tts)?);
    let sessions = Arc::new(SessionRegistry::new(config.conversation.max_messages));

    Ok(
        VoiceAssistant::new(stt, llm, tts, sessions, StageTimeouts::from_config(config))
            .with_system_prompt(config.conversation.system_prompt.clone()),
    )
}

async fn check_backends(assistant: &VoiceAssistant) -> anyhow::Result<()> {
    let report = assistant.health_check().await;
    let mark = |ok: bool| if ok { "ok" } else { "FAILED" };
    println!("stt: {}", mark(report.stt));
    println!("llm: {}", mark(report.llm));
    println!("tts: {}", mark(report.tts));

    if report.overall {
        println!("all critical backends reachable");
        Ok(())
    } else {
        anyhow::bail!("one or more critical backends are unreachable")
    }
}
