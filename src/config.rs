use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// Configuration for a quill instance.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Address to bind to
    pub address: String,
    /// Port to bind to
    pub port: u16,
    /// Where the static files are.
    pub static_dir: PathBuf,
    /// Where the user-uploaded images are.
    pub upload_dir: PathBuf,
    /// Where the templates to be rendered are.
    pub template_dir: PathBuf,
    /// Path of the SQLite database.
    pub database_url: String,
    /// File to log to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// How long a rendered home page stays cached, e.g. "20 seconds".
    ///
    /// New posts don't show up on the home page until the cached copy
    /// expires.
    #[serde(
        deserialize_with = "ttl_deserialize_helper",
        serialize_with = "ttl_serialize_helper"
    )]
    pub feed_cache_ttl: Duration,
}

impl Config {
    /// Open a config file at the given path.
    pub fn open<P>(path: P) -> Result<Config>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let msg = format!("Couldn't open config file at {}", path.display());

        let reader = File::open(path).map_err(|err| Error::from_io_error(err, msg))?;

        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Generate a new config file from default values.
    pub fn generate<W>(mut out: W) -> Result<()>
    where
        W: std::io::Write,
    {
        writeln!(&mut out, "# Configuration for quill")?;
        serde_yaml::to_writer(&mut out, &Config::default())?;
        writeln!(&mut out)?;
        Ok(())
    }

    /// Get the default location of the config file.
    pub fn default_path() -> PathBuf {
        if cfg!(debug_assertions) {
            PathBuf::from("contrib/dev-config.yaml")
        } else {
            PathBuf::from("/etc/quill/config.yaml")
        }
    }

    /// Dump configuration info to the log.
    pub fn debug_log(&self) {
        use log::debug;

        debug!("  address {}", self.address);
        debug!("  port {}", self.port);
        debug!("  database url {}", self.database_url);
        debug!("  static dir {}", self.static_dir.display());
        debug!("  template dir {}", self.template_dir.display());
        debug!("  upload dir {}", self.upload_dir.display());
        debug!("  feed cache ttl {}s", self.feed_cache_ttl.as_secs());
        if let Some(ref log_file) = self.log_file {
            debug!("  log file {}", log_file.display());
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        if cfg!(debug_assertions) {
            Config {
                static_dir: PathBuf::from("static/"),
                template_dir: PathBuf::from("templates/"),
                upload_dir: PathBuf::from("uploads"),
                address: "0.0.0.0".into(),
                port: 8000,
                database_url: "quill.sqlite3".into(),
                log_file: None,
                feed_cache_ttl: Duration::from_secs(20),
            }
        } else {
            Config {
                static_dir: PathBuf::from("/usr/share/quill/static/"),
                template_dir: PathBuf::from("/usr/share/quill/templates/"),
                upload_dir: PathBuf::from("/var/lib/quill/uploads/"),
                address: "0.0.0.0".into(),
                port: 8000,
                database_url: "/var/lib/quill/quill.sqlite3".into(),
                log_file: Some(PathBuf::from("/var/log/quill/quill.log")),
                feed_cache_ttl: Duration::from_secs(20),
            }
        }
    }
}

fn ttl_deserialize_helper<'de, D>(de: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(de)?;
    parse_duration::parse(&s).map_err(serde::de::Error::custom)
}

fn ttl_serialize_helper<S>(ttl: &Duration, ser: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    ser.serialize_str(&format!("{}s", ttl.as_secs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_config() {
        let yaml = "\
address: 127.0.0.1
port: 8080
static_dir: /srv/quill/static
upload_dir: /srv/quill/uploads
template_dir: /srv/quill/templates
database_url: /srv/quill/quill.sqlite3
feed_cache_ttl: 45 seconds
";

        let config: Config = serde_yaml::from_str(yaml).expect("parse config");

        assert_eq!(config.port, 8080);
        assert_eq!(config.feed_cache_ttl, Duration::from_secs(45));
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn rejects_a_bad_ttl() {
        let yaml = "\
address: 127.0.0.1
port: 8080
static_dir: static
upload_dir: uploads
template_dir: templates
database_url: quill.sqlite3
feed_cache_ttl: sometimes
";

        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }
}
