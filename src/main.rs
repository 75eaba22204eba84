use clap::Parser;
use fragment_index::config::IndexConfig;
use fragment_index::{EnvironmentRegistry, Error, UpsertRequest};
use std::process::ExitCode;

mod args;
use args::{Args, Command, EnvCommand, PutArgs};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ::log::error!("{}", e);
            ExitCode::from(exit_code(e.as_ref()))
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => IndexConfig::from_file(path)?,
        None => IndexConfig::default(),
    }
    .with_env_overrides();
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }

    let environment = args
        .env
        .unwrap_or_else(|| config.default_environment.clone());
    let service = fragment_index::open(&config).await?;

    match args.command {
        Command::Env(EnvCommand::Add { name }) => {
            let registered = service.registry().register(&name).await?;
            println!("{}", serde_json::to_string_pretty(&registered)?);
        }
        Command::Put(PutArgs {
            path,
            content,
            content_file,
        }) => {
            let content = match (content, content_file) {
                (Some(content), _) => content,
                (None, Some(file)) => std::fs::read_to_string(file)?,
                (None, None) => {
                    return Err(Error::Validation("no content given".to_string()).into());
                }
            };
            let page = service.upsert(&environment, &path, &content).await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        Command::Post { body } => {
            let request = UpsertRequest::from_slice(&std::fs::read(body)?)?;
            let outcome = service.execute(&environment, request).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Get { path, url } => {
            let raw = match url {
                Some(url) => fragment_index::path::lookup_path_from_url(&url)?,
                None => path.unwrap_or_default(),
            };
            let content = service.lookup(&environment, &raw).await?;
            print!("{}", content);
        }
        Command::Delete { path, pattern } => {
            let removed = service.delete(&environment, &path, pattern).await?;
            println!("{}", serde_json::json!({ "removed": removed }));
        }
        Command::Ping => {
            println!("{}", serde_json::to_string_pretty(&service.ping())?);
        }
    }

    Ok(())
}

/// Exit status for a failed command
fn exit_code(error: &(dyn std::error::Error + 'static)) -> u8 {
    match error.downcast_ref::<Error>() {
        Some(Error::NotFound) => 1,
        Some(Error::Validation(_)) | Some(Error::Unauthorized(_)) => 2,
        Some(Error::Persistence { .. }) | Some(Error::InvariantViolation(_)) => 3,
        None => 2,
    }
}
