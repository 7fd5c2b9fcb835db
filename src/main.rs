use clap::Parser;
use page_model::ScanSettings;
use page_model::cli::commands::{cmd_diff, cmd_scan};
use page_model::cli::config::{Cli, Commands, load_config};
use page_model::cli::logging::init_tracing;
use page_model::screen::classifier::ClassifierRules;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Scan {
            url,
            visible_only,
            validate,
            format,
        } => {
            // Resolve settings: CLI > config > defaults
            let mut webdriver = config.webdriver.clone();
            if let Some(endpoint) = cli.webdriver {
                webdriver.endpoint = endpoint;
            }
            let mut options = config.scan.to_options();
            options.visible_only |= visible_only;
            options.validate_selectors |= validate;

            let settings = ScanSettings {
                webdriver,
                timeouts: config.timeouts.to_timeouts(),
                rules: ClassifierRules::default().with_max_text_len(config.scan.max_text_len),
                options,
            };

            if !cmd_scan(&url, &settings, &format)? {
                std::process::exit(1);
            }
        }
        Commands::Diff {
            previous,
            current,
            old_methods,
            new_methods,
        } => {
            if !cmd_diff(&previous, &current, &old_methods, &new_methods)? {
                std::process::exit(2);
            }
        }
    }

    Ok(())
}
