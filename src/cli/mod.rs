// FILE: src/cli/mod.rs

mod config;
mod handlers;

use crate::error::{Result, ValidatorError};
use crate::{ValidationProfile, ValidatorOptions};
use clap::{Arg, ArgAction, Command, ValueEnum};
use std::time::Instant;

#[derive(Debug, Clone, ValueEnum)]
pub enum Profile {
    Amp4ads,
    Keyframes,
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub struct EnhancedCli {
    config: config::ConfigFile,
    start_time: Instant,
}

impl Default for EnhancedCli {
    fn default() -> Self {
        Self::new()
    }
}

impl EnhancedCli {
    pub fn new() -> Self {
        Self {
            config: config::ConfigFile::default(),
            start_time: Instant::now(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        self.start_time = Instant::now();
        let matches = self.build_cli().get_matches();

        if let Some(config_path) = matches.get_one::<String>("config") {
            self.config = config::load(config_path)?;
        }

        self.setup_logging(matches.get_count("verbose"))?;

        let result = match matches.subcommand() {
            Some(("check", sub_matches)) => handlers::handle_check_command(self, sub_matches),
            Some(("tokenize", sub_matches)) => handlers::handle_tokenize_command(self, sub_matches),
            Some(("parse", sub_matches)) => handlers::handle_parse_command(self, sub_matches),
            _ => {
                println!("No subcommand specified. Use --help for usage information.");
                Ok(())
            }
        };

        log::debug!("Finished in {}ms", self.start_time.elapsed().as_millis());
        result
    }

    fn build_cli(&self) -> Command {
        let profile_arg = Arg::new("profile")
            .short('p')
            .long("profile")
            .value_parser(clap::value_parser!(Profile))
            .help("Validation profile (defaults to amp4ads)");

        Command::new(crate::NAME)
            .version(crate::VERSION)
            .about(crate::DESCRIPTION)
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Increase verbosity (can be used multiple times)")
                    .action(ArgAction::Count),
            )
            .subcommand(
                Command::new("check")
                    .about("Validate CSS files against the AMP rules")
                    .arg(Arg::new("input").help("Input CSS file or directory").required(true).index(1))
                    .arg(Arg::new("recursive").short('r').long("recursive").help("Check all CSS files in directory recursively").action(ArgAction::SetTrue))
                    .arg(profile_arg.clone())
                    .arg(Arg::new("format").short('f').long("format").value_parser(clap::value_parser!(OutputFormat)).default_value("text").help("Report format"))
                    .arg(Arg::new("tag-name").long("tag-name").value_name("NAME").help("Tag name used in error messages"))
                    .arg(Arg::new("max-bytes").long("max-bytes").value_name("N").value_parser(clap::value_parser!(usize)).help("Maximum stylesheet size in bytes (0 disables the check)"))
                    .arg(Arg::new("debug").short('d').long("debug").help("Log every validation phase").action(ArgAction::SetTrue))
                    .arg(Arg::new("stats").long("stats").help("Show validation statistics").action(ArgAction::SetTrue))
                    .arg(Arg::new("watch").short('w').long("watch").help("Watch for file changes and revalidate").action(ArgAction::SetTrue)),
            )
            .subcommand(
                Command::new("tokenize")
                    .about("Print the token stream of a CSS file as JSON")
                    .arg(Arg::new("input").help("Input CSS file").required(true).index(1))
                    .arg(Arg::new("output").short('o').long("output").value_name("FILE").help("Write the JSON to a file")),
            )
            .subcommand(
                Command::new("parse")
                    .about("Print the parsed stylesheet of a CSS file as JSON")
                    .arg(Arg::new("input").help("Input CSS file").required(true).index(1))
                    .arg(profile_arg)
                    .arg(Arg::new("output").short('o').long("output").value_name("FILE").help("Write the JSON to a file")),
            )
    }

    fn setup_logging(&self, verbose_count: u8) -> Result<()> {
        let log_level = match verbose_count {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        env_logger::Builder::from_default_env()
            .filter_level(log_level)
            .format_timestamp_secs()
            .try_init()
            .map_err(|e| ValidatorError::invalid_argument(format!("Logger already initialized: {}", e)))
    }

    /// Command-line flags win over the configuration file, which wins over
    /// the profile defaults.
    pub fn build_validator_options(&self, matches: &clap::ArgMatches) -> Result<ValidatorOptions> {
        let profile = match matches.try_get_one::<Profile>("profile").ok().flatten() {
            Some(Profile::Amp4ads) => ValidationProfile::Amp4ads,
            Some(Profile::Keyframes) => ValidationProfile::Keyframes,
            Some(Profile::Plain) => ValidationProfile::Plain,
            None => self.config.profile.unwrap_or(ValidationProfile::Amp4ads),
        };
        let mut options = ValidatorOptions::for_profile(profile);

        if let Some(tag_name) = self.config.tag_name.as_ref() {
            options.tag_name = tag_name.clone();
        }
        if let Some(max_bytes) = self.config.max_bytes {
            options.max_bytes = max_bytes;
        }
        options.check_selectors = self.config.check_selectors.unwrap_or(options.check_selectors);
        options.check_media_queries = self
            .config
            .check_media_queries
            .unwrap_or(options.check_media_queries);
        options.check_unknown_at_rules = self
            .config
            .check_unknown_at_rules
            .unwrap_or(options.check_unknown_at_rules);
        options.extract_urls = self.config.extract_urls.unwrap_or(options.extract_urls);

        // Not every subcommand defines these flags.
        if let Ok(Some(tag_name)) = matches.try_get_one::<String>("tag-name") {
            if tag_name.trim().is_empty() {
                return Err(ValidatorError::invalid_argument("tag name must not be empty"));
            }
            options.tag_name = tag_name.clone();
        }
        if let Ok(Some(max_bytes)) = matches.try_get_one::<usize>("max-bytes") {
            options.max_bytes = *max_bytes;
        }
        if let Ok(Some(debug)) = matches.try_get_one::<bool>("debug") {
            options.debug_mode = *debug;
        }

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_matches(cli: &EnhancedCli, args: &[&str]) -> clap::ArgMatches {
        let matches = cli.build_cli().try_get_matches_from(args).unwrap();
        let (_, sub_matches) = matches.subcommand().unwrap();
        sub_matches.clone()
    }

    #[test]
    fn test_flags_override_config() {
        let mut cli = EnhancedCli::new();
        cli.config.profile = Some(ValidationProfile::Plain);
        cli.config.tag_name = Some("style amp-custom".to_string());
        cli.config.max_bytes = Some(10);

        let matches = check_matches(&cli, &["ampcss", "check", "a.css", "--max-bytes", "0"]);
        let options = cli.build_validator_options(&matches).unwrap();
        assert_eq!(options.profile, ValidationProfile::Plain);
        assert_eq!(options.tag_name, "style amp-custom");
        assert_eq!(options.max_bytes, 0);

        let matches = check_matches(&cli, &["ampcss", "check", "a.css", "-p", "keyframes", "-d"]);
        let options = cli.build_validator_options(&matches).unwrap();
        assert_eq!(options.profile, ValidationProfile::Keyframes);
        assert!(options.at_rule_spec.contains_key("keyframes"));
        assert!(!options.at_rule_spec.contains_key("font-face"));
        assert!(options.debug_mode);
    }

    #[test]
    fn test_parse_subcommand_options() {
        let cli = EnhancedCli::new();
        let matches = check_matches(&cli, &["ampcss", "parse", "a.css"]);
        let options = cli.build_validator_options(&matches).unwrap();
        assert_eq!(options.profile, ValidationProfile::Amp4ads);
        assert_eq!(options.tag_name, "style");
    }

    #[test]
    fn test_empty_tag_name_rejected() {
        let cli = EnhancedCli::new();
        let matches = check_matches(&cli, &["ampcss", "check", "a.css", "--tag-name", " "]);
        assert!(cli.build_validator_options(&matches).is_err());
    }
}
