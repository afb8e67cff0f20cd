use anyhow::{Context, Result};
use chrono_tz::Tz;
use clap::Subcommand;
use fieldday_core::{Settings, SlotRules};
use fieldday_ingest::CandidateDefaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::ensure_fieldday_home;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a default config.toml (no-op if one exists)
    Init,
    /// Print the effective configuration
    Show,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub settings: Settings,
    pub profile: ProfileSection,
    pub import: CandidateDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSection {
    /// IANA timezone name used for "today" and the end-of-day alert.
    pub timezone: String,
}

impl Default for ProfileSection {
    fn default() -> Self {
        Self {
            timezone: "America/Chicago".to_string(),
        }
    }
}

impl Config {
    pub fn tz(&self) -> Result<Tz> {
        self.profile
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("invalid timezone '{}': {e}", self.profile.timezone))
    }

    pub fn slot_rules(&self) -> SlotRules {
        SlotRules::from_settings(&self.settings)
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_fieldday_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", p.display()))
}

fn parse_config(s: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(s)?;
    cfg.tz()?;
    Ok(cfg)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn run(cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Init => init_config(),
        ConfigCommand::Show => {
            let cfg = load_config()?;
            println!("# {}", config_path()?.display());
            print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            Ok(())
        }
    }
}

fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn test_empty_file_is_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.settings.max_daily_services, 4);
        assert_eq!(cfg.tz().unwrap(), chrono_tz::America::Chicago);
        assert_eq!(cfg.import.recurring[0].weekday, Weekday::Wed);
    }

    #[test]
    fn test_partial_sections() {
        let cfg = parse_config(
            r#"
            [settings]
            max_daily_services = 5
            work_end = "17:00"

            [profile]
            timezone = "America/Denver"

            [import]
            duration_minutes = 90
            "#,
        )
        .unwrap();
        assert_eq!(cfg.settings.max_daily_services, 5);
        assert_eq!(cfg.slot_rules().day_skip_threshold, 6);
        assert_eq!(cfg.slot_rules().work_end, 17 * 60);
        assert_eq!(cfg.import.duration_minutes, 90);
        assert_eq!(cfg.import.dishwasher_model, "Hobart CXL");
    }

    #[test]
    fn test_bad_timezone_rejected() {
        assert!(parse_config("[profile]\ntimezone = \"Mars/Olympus\"\n").is_err());
    }

    #[test]
    fn test_defaults_survive_round_trip() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back = parse_config(&text).unwrap();
        assert_eq!(back.settings, Settings::default());
        assert_eq!(back.import, CandidateDefaults::default());
    }
}
