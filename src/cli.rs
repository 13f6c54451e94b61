use crate::config::AppConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliOverrides {
    config: Option<PathBuf>,
    year: Option<i32>,
    frames: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if !flag.starts_with("--") {
                bail!("Unexpected argument '{flag}'. Use --config/--year/--frames/--width/--height with values.");
            }
            let key = &flag[2..];
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "config" => overrides.config = Some(PathBuf::from(value)),
                "year" => {
                    overrides.year = Some(value.parse::<i32>().with_context(|| format!("Invalid year '{value}'"))?);
                }
                "frames" => {
                    overrides.frames =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid frame count '{value}'"))?);
                }
                "width" => {
                    overrides.width =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid width '{value}'"))?);
                }
                "height" => {
                    overrides.height =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid height '{value}'"))?);
                }
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --config, --year, --frames, --width, --height."
                ),
            }
        }
        Ok(overrides)
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config.as_ref()
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn frames(&self) -> Option<u32> {
        self.frames
    }

    pub fn config_overrides(&self) -> AppConfigOverrides {
        AppConfigOverrides { width: self.width, height: self.height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_year_frames_and_viewport() {
        let args = ["app", "--year", "2028", "--frames", "120", "--width", "1600", "--height", "900"];
        let overrides = CliOverrides::parse(args).expect("parse overrides");
        assert_eq!(overrides.year(), Some(2028));
        assert_eq!(overrides.frames(), Some(120));
        let cfg = overrides.config_overrides();
        assert_eq!((cfg.width, cfg.height), (Some(1600), Some(900)));
    }

    #[test]
    fn latest_flag_wins() {
        let args = ["app", "--year", "2020", "--year", "2045", "--config", "a.json", "--config", "b.json"];
        let overrides = CliOverrides::parse(args).expect("parse overrides");
        assert_eq!(overrides.year(), Some(2045));
        assert_eq!(overrides.config_path(), Some(&PathBuf::from("b.json")));
    }

    #[test]
    fn missing_value_errors() {
        let err = CliOverrides::parse(["app", "--year"]).unwrap_err();
        assert!(err.to_string().contains("Expected a value"), "error should mention missing value");
    }

    #[test]
    fn rejects_unknown_flags_and_bad_numbers() {
        let err = CliOverrides::parse(["app", "--vsync", "on"]).unwrap_err();
        assert!(err.to_string().contains("Unknown flag"), "unknown flags should error");
        let err = CliOverrides::parse(["app", "--frames", "many"]).unwrap_err();
        assert!(err.to_string().contains("Invalid frame count"));
    }
}
