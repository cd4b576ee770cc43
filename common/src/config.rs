//! This is the `ConfigFile` struct.
//!
//! This is for finding the right default locations for the various configuration files for
//! `buswatch`.  This is a configuration file/struct neutral loading engine, storing only the
//! base directory and with `load()` read the proper file or the default one.
//!
//! This encapsulates the configuration file, available with `.inner()` or `.inner_mut()`.
//!

use crate::makepath;
use crate::position::DEFAULT_SPEED_KMH;

use directories::BaseDirs;
use eyre::{eyre, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::PathBuf;
use std::{env, fs};
use tracing::{debug, trace};

/// Config filename
const CONFIG: &str = "config.hcl";

/// Main name for the directory base
const TAG: &str = "buswatch";

/// Current version of the tracker config file
pub const TRACKER_CONFIG_VER: usize = 1;

/// A configuration struct that carries its on-disk format version.
///
pub trait Versioned {
    /// On-disk format version the running code expects.
    const CURRENT: usize;

    fn version(&self) -> usize;
}

/// Parameters for a tracking session, loaded from `config.hcl`.
///
/// `speed_km_h` is the assumed average vehicle speed used for the linear ETA
/// estimate.  The session constructor rejects anything that is not strictly
/// positive, so a zero speed can never reach the ETA math.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TrackerConfig {
    /// Version number for safety
    pub version: usize,
    /// Assumed average vehicle speed in km/h
    pub speed_km_h: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            version: TRACKER_CONFIG_VER,
            speed_km_h: DEFAULT_SPEED_KMH,
        }
    }
}

impl Versioned for TrackerConfig {
    const CURRENT: usize = TRACKER_CONFIG_VER;

    fn version(&self) -> usize {
        self.version
    }
}

/// Generic loader for versioned HCL configuration files.
///
#[derive(Debug)]
pub struct ConfigFile<T: Debug + DeserializeOwned + Versioned> {
    /// Tag is the project name.
    tag: String,
    /// This is the base directory for all files.
    basedir: PathBuf,
    inner: Option<T>,
}

impl<T> ConfigFile<T>
where
    T: Debug + DeserializeOwned + Versioned,
{
    #[tracing::instrument]
    fn new(tag: &str) -> Self {
        let base = BaseDirs::new();

        let basedir: PathBuf = match base {
            Some(base) => {
                #[cfg(unix)]
                let base = base.home_dir().join(".config").to_string_lossy().to_string();

                #[cfg(windows)]
                let base = base.data_local_dir().to_string_lossy().to_string();

                debug!("base = {base}");
                let base: PathBuf = makepath!(base, tag);
                base
            }
            None => {
                #[cfg(unix)]
                let homedir = env::var("HOME").unwrap_or_else(|_| ".".into());

                #[cfg(windows)]
                let homedir = env::var("LOCALAPPDATA").unwrap_or_else(|_| ".".into());

                debug!("base = {homedir}");

                #[cfg(unix)]
                let base: PathBuf = makepath!(homedir, ".config", tag);

                #[cfg(windows)]
                let base: PathBuf = makepath!(homedir, tag);

                base
            }
        };
        ConfigFile {
            tag: String::from(tag),
            basedir,
            inner: None,
        }
    }

    /// Returns the path of the default config directory
    ///
    pub fn config_path(&self) -> PathBuf {
        self.basedir.clone()
    }

    /// Returns the path of the default config file
    ///
    pub fn default_file(&self) -> PathBuf {
        let cfg = self.config_path().join(CONFIG);
        debug!("default = {cfg:?}");
        cfg
    }

    /// Load the file and return a struct T in the right format.
    ///
    /// Use the following search path:
    /// - default basedir (based on $HOME or $LOCALAPPDATA)
    /// - file specified on the caller's side
    ///
    #[tracing::instrument]
    pub fn load(fname: Option<&str>) -> Result<ConfigFile<T>> {
        let mut cfg = ConfigFile::<T>::new(TAG);

        let fname = match fname {
            Some(fname) => PathBuf::from(fname),
            None => cfg.default_file(),
        };

        // Use a full path
        //
        let fname = if fname.exists() {
            fname.canonicalize()?
        } else {
            return Err(eyre!(
                "Unknown config file {:?} and no default in {:?}",
                fname,
                cfg.default_file()
            ));
        };

        trace!("Loading config file {fname:?} from {:?}", cfg.config_path());

        let data = fs::read_to_string(fname)?;
        debug!("string data = {data}");

        let data: T = hcl::from_str(&data)?;
        debug!("struct data = {data:?}");

        if data.version() != T::CURRENT {
            return Err(eyre!(
                "Bad config file version {} (expected {}), aborting…",
                data.version(),
                T::CURRENT
            ));
        }

        cfg.inner = Some(data);
        Ok(cfg)
    }

    /// Return the inner configuration struct
    ///
    pub fn inner(&self) -> Option<&T> {
        self.inner.as_ref()
    }

    /// Return the inner configuration struct as mutable
    ///
    pub fn inner_mut(&mut self) -> Option<&mut T> {
        self.inner.as_mut()
    }

    /// Project tag, used for the config directory name.
    ///
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_config_default() {
        let cfg = TrackerConfig::default();
        assert_eq!(TRACKER_CONFIG_VER, cfg.version());
        assert_eq!(DEFAULT_SPEED_KMH, cfg.speed_km_h);
    }

    #[test]
    fn test_tracker_config_from_hcl() -> Result<()> {
        let data = r##"
version = 1
speed_km_h = 25.0
"##;
        let cfg: TrackerConfig = hcl::from_str(data)?;
        assert_eq!(1, cfg.version());
        assert_eq!(25.0, cfg.speed_km_h);
        Ok(())
    }

    #[test]
    fn test_config_file_missing() {
        let cfg = ConfigFile::<TrackerConfig>::load(Some("/nonexistent/config.hcl"));
        assert!(cfg.is_err());
    }

    /// Write `data` to a throwaway HCL file and return its path.
    ///
    fn write_config(name: &str, data: &str) -> PathBuf {
        let path = env::temp_dir().join(name);
        fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn test_config_file_load_ok() -> Result<()> {
        let path = write_config(
            "buswatch-config-ok.hcl",
            "version = 1\nspeed_km_h = 25.0\n",
        );

        let cfg = ConfigFile::<TrackerConfig>::load(path.to_str())?;
        let inner = cfg.inner().unwrap();
        assert_eq!(TRACKER_CONFIG_VER, inner.version());
        assert_eq!(25.0, inner.speed_km_h);

        fs::remove_file(path)?;
        Ok(())
    }

    #[test]
    fn test_config_file_bad_version_rejected() {
        let path = write_config(
            "buswatch-config-badver.hcl",
            "version = 999\nspeed_km_h = 25.0\n",
        );

        let cfg = ConfigFile::<TrackerConfig>::load(path.to_str());
        assert!(cfg.is_err());
        assert!(cfg.unwrap_err().to_string().contains("version"));

        let _ = fs::remove_file(path);
    }
}
