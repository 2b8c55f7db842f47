use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use sim_timeline::client::{Control, HttpJobClient, JobClient};
use sim_timeline::config::{self, AppConfig, Command, FormatArg};
use sim_timeline::error::{Error, Result};
use sim_timeline::logging;
use sim_timeline::models::StartParams;
use sim_timeline::output::{
    self, Formatter, HumanFormatter, JsonFormatter, SummaryFormatter, TimelineReport,
};
use sim_timeline::polling::{LogSink, SessionSlot};
use sim_timeline::state::Phase;

const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {}", err);
            match err {
                Error::JobFailed(_) => ExitCode::from(2),
                _ => ExitCode::from(1),
            }
        }
    }
}

async fn run() -> Result<u8> {
    let args = config::parse_args()?;
    logging::init(args.verbose);
    let config = config::build_config(&args)?;
    debug!(base_url = %config.base_url, "configuration loaded");

    match &args.command {
        Command::Layout(layout) => {
            let payload = output::load_result(&layout.input)?;
            let report = TimelineReport::build(&payload, &config.layout);
            print!("{}", formatter_for(layout.format).write(&report));
            Ok(0)
        }
        Command::ShowConfig => {
            print!("{}", config::render_config(&config)?);
            Ok(0)
        }
        Command::Status => {
            let status = http_client(&config)?.status().await?;
            print!("{}", output::format_status(&status));
            Ok(0)
        }
        Command::Pause => control(&config, Control::Pause).await,
        Command::Resume => control(&config, Control::Resume).await,
        Command::Stop => control(&config, Control::Stop).await,
        Command::Restore => control(&config, Control::Restore).await,
        Command::Run(run) => watch(&config, Some(run.start_params()), run.format).await,
        Command::Watch(watch_args) => watch(&config, None, watch_args.format).await,
    }
}

async fn watch(config: &AppConfig, params: Option<StartParams>, format: FormatArg) -> Result<u8> {
    let client: Arc<dyn JobClient> = Arc::new(http_client(config)?);
    let mut slot = SessionSlot::new(client, config.poll.clone());
    let mut session = slot.begin();

    let cancel = session.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, cancelling polling");
            cancel.cancel();
        }
    });

    let mut sink = LogSink::default();
    let phase = match &params {
        Some(params) => session.start_and_wait(params, &mut sink).await?,
        None => session.wait(&mut sink).await,
    };

    let state = session.into_state();
    match phase {
        Phase::Finished => {
            let payload = state.result.unwrap_or_default();
            let report = TimelineReport::build(&payload, &config.layout);
            print!("{}", formatter_for(format).write(&report));
            Ok(0)
        }
        Phase::Cancelled => {
            eprintln!("Cancelled.");
            Ok(EXIT_CANCELLED)
        }
        _ => Err(Error::JobFailed(
            state.error.unwrap_or_else(|| "unknown error".to_string()),
        )),
    }
}

async fn control(config: &AppConfig, control: Control) -> Result<u8> {
    http_client(config)?.control(control).await?;
    println!("{} acknowledged", control);
    Ok(0)
}

fn http_client(config: &AppConfig) -> Result<HttpJobClient> {
    HttpJobClient::new(
        &config.base_url,
        Duration::from_millis(config.request_timeout_ms),
    )
}

fn formatter_for(format: FormatArg) -> Box<dyn Formatter> {
    match format {
        FormatArg::Human => Box::new(HumanFormatter),
        FormatArg::Summary => Box::new(SummaryFormatter),
        FormatArg::Json => Box::new(JsonFormatter),
    }
}
