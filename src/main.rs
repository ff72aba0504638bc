use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use spacetraveling::build::{self, build_site};
use spacetraveling::config::{self, Config};
use spacetraveling::hooks::Preview;
use spacetraveling::prismic::PrismicClient;
use spacetraveling::telemetry;
use std::path::{Path, PathBuf};
use std::process;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        tracing::error!(error = %error, "build failed");
        if !tracing::dispatcher::has_been_set() {
            eprintln!("Error: {}", error);
        }
        process::exit(1);
    }
}

async fn run() -> Result<(), Error> {
    let matches = App::new("spacetraveling")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds the spacetraveling blog from its CMS content")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Fetches every post and writes the static site")
                .arg(
                    Arg::with_name("project")
                        .long("project")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Directory to search upward from for spacetraveling.yaml"),
                )
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Directory the site is written to [default: _output]"),
                )
                .arg(
                    Arg::with_name("preview-ref")
                        .long("preview-ref")
                        .takes_value(true)
                        .value_name("REF")
                        .help("Builds staged content from this preview ref"),
                ),
        )
        .get_matches();

    telemetry::init()?;

    match matches.subcommand() {
        ("build", Some(matches)) => build(matches).await,
        _ => Ok(()),
    }
}

async fn build(matches: &ArgMatches<'_>) -> Result<(), Error> {
    let cwd = std::env::current_dir()?;
    let project = matches
        .value_of("project")
        .map(PathBuf::from)
        .unwrap_or_else(|| cwd.clone());
    let output = matches
        .value_of("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| cwd.join("_output"));
    let preview = Preview::new(matches.value_of("preview-ref").map(str::to_owned));

    let config = Config::from_directory(&project, &absolute(&cwd, &output))?;
    let client = PrismicClient::new(
        config.prismic.endpoint.clone(),
        config.prismic.access_token.clone(),
        config.prismic.timeout(),
    );
    tracing::info!(
        endpoint = %config.prismic.endpoint,
        output = %config.root_output_directory.display(),
        preview = preview.is_active(),
        "building site"
    );
    build_site(&config, &client, &preview).await?;
    tracing::info!("done");
    Ok(())
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    match path.is_absolute() {
        true => path.to_owned(),
        false => cwd.join(path),
    }
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error(transparent)]
    Config(#[from] config::Error),

    #[error(transparent)]
    Build(#[from] build::Error),

    #[error("installing tracing subscriber: {0}")]
    Telemetry(#[from] telemetry::TryInitError),

    #[error("resolving working directory: {0}")]
    Io(#[from] std::io::Error),
}
