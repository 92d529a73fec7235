//! A small journal site: short posts, groups, comments and follows.

use rocket::fs::FileServer;
use rocket::{Build, Rocket};

use rocket_dyn_templates::Template;

pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod media;
pub mod models;
pub mod pagination;
pub mod profile;
pub mod routes;
pub mod schema;
pub mod views;

pub use crate::cache::ListingCache;
pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::models::Database;

/// Create a rocket instance from a config file's worth of settings.
pub fn new_instance(config: Config) -> Result<Rocket<Build>> {
    let db = Database::open(&config.database_url)?;
    let cache = ListingCache::new(config.feed_cache_ttl);

    instance(config, db, cache)
}

/// Create a rocket instance serving the given database and listing cache.
pub fn instance(
    config: Config,
    db: Database,
    cache: ListingCache,
) -> Result<Rocket<Build>> {
    std::fs::create_dir_all(&config.upload_dir).map_err(|err| {
        let msg = format!(
            "Couldn't create upload dir at {}",
            config.upload_dir.display()
        );
        Error::from_io_error(err, msg)
    })?;

    let figment = rocket::Config::figment()
        .merge(("address", config.address.clone()))
        .merge(("port", config.port))
        .merge(("template_dir", config.template_dir.clone()));

    let rocket = rocket::custom(figment)
        .mount("/", routes::routes())
        .mount("/static", FileServer::from(&config.static_dir))
        .mount("/media", FileServer::from(&config.upload_dir))
        .register("/", routes::catchers())
        .manage(db)
        .manage(cache)
        .manage(config)
        .attach(Template::fairing());

    Ok(rocket)
}
