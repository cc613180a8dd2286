use crate::error::Kind;
use crate::Error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

// graft config file used by graft_cli, migrations can be run on a Config instead of a connection
// Config can either be instanced with [`Config::new`] or retrieved from a config file with [`Config::from_file_location`]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    main: Main,
}

#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub enum ConfigDbType {
    Sqlite,
}

impl Config {
    /// create a new config instance
    pub fn new(db_type: ConfigDbType) -> Config {
        Config {
            main: Main {
                db_type,
                db_path: None,
            },
        }
    }

    /// create a new Config instance from an environment variable that contains a database URL,
    /// i.e. `sqlite:///var/lib/app.db` or `sqlite://app.db`
    pub fn from_env_var(name: &str) -> Result<Config, Error> {
        let value = std::env::var(name).map_err(|_| {
            Error::new(
                Kind::ConfigError(format!("Couldn't find {} environment variable", name)),
                None,
            )
        })?;

        let url = Url::parse(&value).map_err(|err| {
            Error::new(
                Kind::ConfigError(format!("Couldn't parse the contents of {} as an URL, {}", name, err)),
                None,
            )
        })?;

        Config::from_url(&url)
    }

    fn from_url(url: &Url) -> Result<Config, Error> {
        match url.scheme() {
            "sqlite" => {
                let path = format!("{}{}", url.host_str().unwrap_or_default(), url.path());
                if path.is_empty() {
                    return Err(Error::new(
                        Kind::ConfigError("sqlite URL must contain a database path".into()),
                        None,
                    ));
                }
                Ok(Config::new(ConfigDbType::Sqlite).set_db_path(&path))
            }
            other => Err(Error::new(
                Kind::ConfigError(format!("unsupported database scheme {}", other)),
                None,
            )),
        }
    }

    /// create a new Config instance from a config file located on the file system
    pub fn from_file_location<T: AsRef<Path>>(location: T) -> Result<Config, Error> {
        let file = std::fs::read_to_string(&location).map_err(|err| {
            Error::new(
                Kind::ConfigError(format!("could not open config file, {}", err)),
                None,
            )
        })?;

        let mut config: Config = toml::from_str(&file).map_err(|err| {
            Error::new(
                Kind::ConfigError(format!("could not parse config file, {}", err)),
                None,
            )
        })?;

        //replace relative path with canonical path in case of Sqlite db
        if config.main.db_type == ConfigDbType::Sqlite {
            let mut config_db_path = config.main.db_path.ok_or_else(|| {
                Error::new(
                    Kind::ConfigError("field path must be present for Sqlite database type".into()),
                    None,
                )
            })?;

            if config_db_path.is_relative() {
                let config_db_dir = match location.as_ref().parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                    _ => PathBuf::from("."),
                };
                let config_db_dir = config_db_dir.canonicalize().map_err(|err| {
                    Error::new(
                        Kind::ConfigError(format!("invalid config file directory, {}", err)),
                        None,
                    )
                })?;
                config_db_path = config_db_dir.join(&config_db_path)
            }

            let config_db_path = config_db_path.canonicalize().map_err(|err| {
                Error::new(
                    Kind::ConfigError(format!("invalid sqlite db path, {}", err)),
                    None,
                )
            })?;

            config.main.db_path = Some(config_db_path);
        }

        Ok(config)
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.main.db_path.as_deref()
    }

    pub fn db_type(&self) -> ConfigDbType {
        self.main.db_type
    }

    pub fn set_db_path(self, db_path: &str) -> Config {
        Config {
            main: Main {
                db_path: Some(db_path.into()),
                ..self.main
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Main {
    db_type: ConfigDbType,
    db_path: Option<PathBuf>,
}
