use std::process::ExitCode;

use calbatch::{dispatch, Cli, Command, DispatchSettings, Invocation, Session};
use calbatch_auth::Authenticator;
use calbatch_calendar::CalendarClient;
use calbatch_core::{AppError, Config};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = calbatch_core::init(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<(), AppError> {
    let mut config = Config::load_validated(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    let invocation = Invocation::from_args(&cli.args, config.selectors.list_is_wildcard);
    tracing::debug!("{:?}", invocation);

    if invocation.command == Command::Usage {
        // No credentials are needed to print help.
        print!("{}", calbatch::usage());
        return Ok(());
    }

    let token = Authenticator::new(&config.auth).access_token().await?;
    let client = CalendarClient::with_base_url(&token, &config.api.base_url)
        .page_size(config.api.page_size);

    let settings = DispatchSettings::from(&config);
    let mut session = Session::new(client);
    let mut out = std::io::stdout().lock();
    dispatch::run(&invocation, &mut session, &settings, &mut out).await
}
