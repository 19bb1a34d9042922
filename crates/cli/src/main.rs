use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

mod commands;
mod context;
mod player;

use context::AppContext;

fn build_cli() -> Command {
    Command::new("fabletime")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Fabletime Team")
        .about("Bedtime stories read aloud, in a synthesized voice or your own")
        .arg(
            Arg::new("config-dir")
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Directory for the user library and recordings")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(
            Command::new("list")
                .about("List stories in the catalog")
                .arg(
                    Arg::new("favorites")
                        .short('f')
                        .long("favorites")
                        .help("Show only favorite stories")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("category")
                        .short('c')
                        .long("category")
                        .value_name("CATEGORY")
                        .help("Show only one category (\"All\" shows every story)"),
                ),
        )
        .subcommand(Command::new("categories").about("List story categories"))
        .subcommand(
            Command::new("search")
                .about("Search titles, authors and categories")
                .arg(Arg::new("query").required(true).value_name("QUERY")),
        )
        .subcommand(
            Command::new("info")
                .about("Show details about a story")
                .arg(Arg::new("id").required(true).value_name("STORY_ID")),
        )
        .subcommand(
            Command::new("favorite")
                .about("Mark a story as favorite or remove it from favorites")
                .arg(Arg::new("id").required(true).value_name("STORY_ID"))
                .arg(
                    Arg::new("remove")
                        .short('r')
                        .long("remove")
                        .help("Remove from favorites")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("voice")
                .about("Show or change the narration voice")
                .arg(
                    Arg::new("use")
                        .long("use")
                        .value_name("VOICE")
                        .help("Narrate with the AI voice or your own recordings")
                        .value_parser(["ai", "custom"]),
                )
                .arg(
                    Arg::new("gender")
                        .long("gender")
                        .value_name("GENDER")
                        .help("AI voice gender")
                        .value_parser(["female", "male"]),
                ),
        )
        .subcommand(
            Command::new("play")
                .about("Narrate a story")
                .arg(Arg::new("id").required(true).value_name("STORY_ID"))
                .arg(
                    Arg::new("auto")
                        .short('a')
                        .long("auto")
                        .value_name("MODE")
                        .help("What to play when the story ends")
                        .value_parser(["off", "sequential", "shuffle"]),
                )
                .arg(
                    Arg::new("sleep")
                        .short('s')
                        .long("sleep")
                        .value_name("MINUTES")
                        .help("Stop narrating after this many minutes of playback")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_name("N")
                        .help("Seed for the shuffle order")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .subcommand(
            Command::new("record")
                .about("Record your own narration of a story")
                .arg(Arg::new("id").required(true).value_name("STORY_ID")),
        )
        .subcommand(Command::new("recordings").about("List saved recordings"))
        .subcommand(
            Command::new("delete-recording")
                .about("Delete the saved recording of a story")
                .arg(Arg::new("id").required(true).value_name("STORY_ID")),
        )
        .subcommand(
            Command::new("config")
                .about("Manage the configuration file")
                .subcommand_required(true)
                .subcommand(Command::new("init").about("Write a default config if none exists"))
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("reset").about("Overwrite the config with defaults")),
        )
}

/// A global directory option, whether given before or after the subcommand
fn global_path(matches: &ArgMatches, name: &str) -> Option<PathBuf> {
    matches
        .get_one::<PathBuf>(name)
        .or_else(|| {
            matches
                .subcommand()
                .and_then(|(_, sub)| sub.get_one::<PathBuf>(name))
        })
        .cloned()
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let manager = context::config_manager(global_path(&matches, "config-dir"))?;
    let (config, load_error) = context::load_config(&manager);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.app.log_level.to_string()),
    )
    .init();
    if let Some(e) = load_error {
        log::warn!("Failed to load config: {}, using defaults", e);
    }

    let ctx = AppContext::open(manager, config, global_path(&matches, "data-dir"))?;

    match matches.subcommand() {
        Some(("list", sub_matches)) => commands::list_stories(&ctx, sub_matches),
        Some(("categories", _)) => commands::list_categories(&ctx),
        Some(("search", sub_matches)) => commands::search_stories(&ctx, sub_matches),
        Some(("info", sub_matches)) => commands::show_story_info(&ctx, sub_matches),
        Some(("favorite", sub_matches)) => commands::set_favorite(&ctx, sub_matches),
        Some(("voice", sub_matches)) => commands::voice_settings(&ctx, sub_matches),
        Some(("play", sub_matches)) => player::play_story(&ctx, sub_matches).await,
        Some(("record", sub_matches)) => player::record_story(&ctx, sub_matches).await,
        Some(("recordings", _)) => commands::list_recordings(&ctx),
        Some(("delete-recording", sub_matches)) => commands::delete_recording(&ctx, sub_matches),
        Some(("config", sub_matches)) => commands::manage_config(&ctx, sub_matches),
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
