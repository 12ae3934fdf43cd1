use crate::cli::{Cli, ConfigAction, OutputFormat};
use crate::commands::{settings_store, Result};
use crate::output::{format_output, OutputData};
use owo_colors::{OwoColorize, Stream::Stdout};
use trawl_core::{SearchSettings, SettingsStore};

pub fn run(cli: &Cli, action: &ConfigAction) -> Result<()> {
    let store = settings_store(cli);
    match action {
        ConfigAction::Show => show_config(cli, &store),
        ConfigAction::Path => {
            println!("{}", store.path().display());
            Ok(())
        }
        ConfigAction::Init { force } => init_config(&store, *force),
    }
}

fn show_config(cli: &Cli, store: &SettingsStore) -> Result<()> {
    let settings = store.load()?;
    let exists = store.exists();

    match cli.output {
        OutputFormat::Pretty => {
            println!();
            println!("{}", "Search Settings".if_supports_color(Stdout, |t| t.cyan()));
            println!("{}", "===============".if_supports_color(Stdout, |t| t.cyan()));
            println!();
            let origin = if exists {
                store.path().display().to_string()
            } else {
                format!("{} (not created, showing defaults)", store.path().display())
            };
            println!(
                "Settings file: {}",
                origin.if_supports_color(Stdout, |t| t.dimmed())
            );
            println!();
            print!("{}", serde_yaml::to_string(&settings)?);

            let key_set = ["SERPAPI_API_KEY", "SERPAPI_KEY"]
                .iter()
                .any(|k| std::env::var(k).map(|v| !v.trim().is_empty()).unwrap_or(false));
            println!();
            if key_set {
                println!(
                    "SerpApi key: {}",
                    "set".if_supports_color(Stdout, |t| t.green())
                );
            } else {
                println!(
                    "SerpApi key: {} (naver and baidu will fail)",
                    "missing".if_supports_color(Stdout, |t| t.yellow())
                );
            }
        }
        _ => {
            let data = OutputData::Settings {
                path: store.path().display().to_string(),
                exists,
                settings,
            };
            format_output(&data, &cli.output)?;
        }
    }
    Ok(())
}

fn init_config(store: &SettingsStore, force: bool) -> Result<()> {
    if store.exists() && !force {
        println!(
            "{} {} already exists (use --force to overwrite)",
            "Skipped:".if_supports_color(Stdout, |t| t.yellow()),
            store.path().display()
        );
        return Ok(());
    }

    store.save(&SearchSettings::default())?;
    println!(
        "{} {}",
        "Wrote".if_supports_color(Stdout, |t| t.green()),
        store.path().display()
    );
    Ok(())
}
