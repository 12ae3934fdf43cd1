use crate::cli::{Cli, OutputFormat};
use crate::commands::Result;
use crate::output::{format_output, OutputData};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::{OwoColorize, Stream::Stdout};
use trawl_core::SourceRegistry;

/// Get the terminal width, defaulting to 80 if detection fails
fn get_terminal_width() -> u16 {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0)
        .unwrap_or(80)
}

pub fn run(cli: &Cli) -> Result<()> {
    let sources = SourceRegistry::builtin().list_sources();

    if sources.is_empty() {
        println!(
            "{}",
            "No sources compiled in (enable the source features)"
                .if_supports_color(Stdout, |t| t.yellow())
        );
        return Ok(());
    }

    match cli.output {
        OutputFormat::Pretty => {
            println!(
                "{}",
                "Available Sources".if_supports_color(Stdout, |t| t.cyan())
            );
            println!();

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_width(get_terminal_width())
                .set_header(vec!["Name", "Description"]);

            for source in &sources {
                table.add_row(vec![source.name.clone(), source.description.clone()]);
            }

            println!("{}", table);
            println!();
            println!(
                "{} Use {} to query a subset",
                "Tip:".if_supports_color(Stdout, |t| t.green()),
                "trawl search <username> -s google,bing".if_supports_color(Stdout, |t| t.cyan())
            );
        }
        _ => format_output(&OutputData::SourceList(sources), &cli.output)?,
    }

    Ok(())
}
