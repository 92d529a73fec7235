use std::path::PathBuf;

use clap::{value_parser, Arg, Command};

use fern::colors::ColoredLevelConfig;

use log::LevelFilter;

use quill::{Config, Error, Result};

fn init_logging(config: &Config) -> Result<()> {
    let colors = ColoredLevelConfig::new();

    let mut dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                chrono::Local::now().format("%F %T"),
                colors.color(record.level()),
                message
            ))
        })
        .level(LevelFilter::Warn)
        .level_for("quill", LevelFilter::Trace)
        .chain(std::io::stdout());

    if let Some(ref log_file) = config.log_file {
        let msg = format!("Couldn't open log file at {}", log_file.display());
        let file = fern::log_file(log_file)
            .map_err(|err| Error::from_io_error(err, msg))?;

        dispatch = dispatch.chain(file);
    }

    dispatch.apply()?;

    Ok(())
}

#[rocket::main]
async fn main_res() -> Result<()> {
    let matches = Command::new("quill")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Serve a quill journal site")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .help("Config file to use"),
        )
        .get_matches();

    let conf_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(Config::default_path);

    let config = Config::open(&conf_path)?;

    init_logging(&config)?;

    log::info!("quill {} starting up", env!("CARGO_PKG_VERSION"));
    log::info!("Using config file {}", conf_path.display());
    config.debug_log();

    quill::new_instance(config)?.launch().await?;

    Ok(())
}

fn main() {
    if let Err(e) = main_res() {
        eprintln!("{}", e);
        std::process::exit(-1);
    }
}
