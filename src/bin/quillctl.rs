use std::path::{Path, PathBuf};

use chrono::offset::Utc;

use clap::{value_parser, Arg, Command};

use rand::{thread_rng, Rng};

use quill::models::{Database, NewGroup, NewUser};
use quill::{Config, Error, Result};

fn check_config(config: &Config, path: &Path) -> Result<()> {
    let dirs = [
        ("static dir", &config.static_dir),
        ("template dir", &config.template_dir),
    ];

    for (name, dir) in dirs {
        if !dir.is_dir() {
            return Err(Error::ConfigPathNotFound {
                name: name.into(),
                path: dir.display().to_string(),
            });
        }
    }

    println!("Configuration: {}", path.display());
    println!("\nThe config file is good.");

    Ok(())
}

fn main_res() -> Result<()> {
    let matches = Command::new("quillctl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Control a quill server")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .help("Config file to use"),
        )
        .arg(
            Arg::new("database-url")
                .short('u')
                .long("database-url")
                .value_name("URL")
                .num_args(1)
                .help("Path of the SQLite database to open"),
        )
        .subcommand(
            Command::new("add-user")
                .about("Add a new user")
                .arg(
                    Arg::new("username")
                        .short('n')
                        .long("username")
                        .help("The login name of the user")
                        .required(true)
                        .num_args(1),
                )
                .arg(
                    Arg::new("display-name")
                        .short('d')
                        .long("display-name")
                        .help("The name shown on the user's posts")
                        .num_args(1),
                )
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .help("The password for the user")
                        .required(true)
                        .num_args(1),
                ),
        )
        .subcommand(
            Command::new("remove-user")
                .about("Remove a user and everything they wrote")
                .arg(
                    Arg::new("username")
                        .short('n')
                        .long("username")
                        .help("The login name of the user")
                        .required(true)
                        .num_args(1),
                ),
        )
        .subcommand(
            Command::new("add-group")
                .about("Add a new group")
                .arg(
                    Arg::new("slug")
                        .short('s')
                        .long("slug")
                        .help("The short name used in the group's URL")
                        .required(true)
                        .num_args(1),
                )
                .arg(
                    Arg::new("title")
                        .short('t')
                        .long("title")
                        .help("The title shown on the group's page")
                        .required(true)
                        .num_args(1),
                )
                .arg(
                    Arg::new("description")
                        .short('d')
                        .long("description")
                        .help("A short description of the group")
                        .num_args(1),
                ),
        )
        .subcommand(
            Command::new("remove-group")
                .about("Remove a group; posts tagged with it lose the tag")
                .arg(
                    Arg::new("slug")
                        .short('s')
                        .long("slug")
                        .help("The short name used in the group's URL")
                        .required(true)
                        .num_args(1),
                ),
        )
        .subcommand(
            Command::new("gen-config")
                .about("Print a default config file to stdout"),
        )
        .subcommand(
            Command::new("check-config")
                .about("Check the configuration file for errors"),
        )
        .get_matches();

    if matches.subcommand_matches("gen-config").is_some() {
        return Config::generate(std::io::stdout());
    }

    let conf_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(Config::default_path);

    let mut config = Config::open(&conf_path)?;

    if let Some(url) = matches.get_one::<String>("database-url") {
        config.database_url = url.to_owned();
    }

    if matches.subcommand_matches("check-config").is_some() {
        return check_config(&config, &conf_path);
    }

    let db = Database::open(&config.database_url)?;

    if let Some(matches) = matches.subcommand_matches("add-user") {
        let username = matches.get_one::<String>("username").unwrap();
        let display_name = matches
            .get_one::<String>("display-name")
            .unwrap_or(username);
        let password = matches.get_one::<String>("password").unwrap();

        let salt: [u8; 16] = thread_rng().gen();
        let argon_config = argon2::Config::default();
        let password_hash =
            argon2::hash_encoded(password.as_bytes(), &salt, &argon_config)?;

        let user = db.insert_user(NewUser {
            username: username.to_owned(),
            display_name: display_name.to_owned(),
            password_hash,
            joined: Utc::now(),
        })?;

        println!("Added user '{}'", user.username);
    }

    if let Some(matches) = matches.subcommand_matches("remove-user") {
        let username = matches.get_one::<String>("username").unwrap();

        db.delete_user(username)?;

        println!("Removed user '{}'", username);
    }

    if let Some(matches) = matches.subcommand_matches("add-group") {
        let group = db.insert_group(NewGroup {
            slug: matches.get_one::<String>("slug").unwrap().to_owned(),
            title: matches.get_one::<String>("title").unwrap().to_owned(),
            description: matches.get_one::<String>("description").cloned(),
        })?;

        println!("Added group '{}'", group.slug);
    }

    if let Some(matches) = matches.subcommand_matches("remove-group") {
        let slug = matches.get_one::<String>("slug").unwrap();

        db.delete_group(slug)?;

        println!("Removed group '{}'", slug);
    }

    Ok(())
}

fn main() {
    if let Err(e) = main_res() {
        eprintln!("{}", e);
        std::process::exit(-1);
    }
}
