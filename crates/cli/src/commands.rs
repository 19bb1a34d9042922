use crate::context::AppContext;
use anyhow::{Context, Result};
use clap::ArgMatches;
use console::style;
use fabletime_core::{Catalog, Story, StoryId, VoiceGender, VoicePreference, ALL_CATEGORIES};
use fabletime_store::UserLibrary;
use narration_engine::{segment, AudioFocus, VoiceRecorder};

/// List stories, optionally only favorites or one category
pub fn list_stories(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let favorites_only = matches.get_flag("favorites");
    let category = matches.get_one::<String>("category").map(|s| s.as_str());

    let stories = select_stories(ctx.catalog.as_ref(), &ctx.library, favorites_only, category);

    if stories.is_empty() {
        if favorites_only {
            println!("No favorite stories yet. Use 'favorite <id>' to add one.");
        } else {
            println!("No stories found.");
        }
        return Ok(());
    }

    let heading = match (favorites_only, category) {
        (true, _) => "Favorite Stories",
        (false, Some(c)) if c != ALL_CATEGORIES => c,
        _ => "Stories",
    };
    println!("\n{} {}", style(stories.len()).bold().cyan(), heading);
    println!("{}", "=".repeat(80));

    for story in stories {
        print_story_summary(ctx, story);
    }

    Ok(())
}

pub fn list_categories(ctx: &AppContext) -> Result<()> {
    println!("\n{}", style("Categories").bold().cyan());
    println!("{}", "=".repeat(80));

    for category in ctx.catalog.categories() {
        let count = ctx.catalog.by_category(&category).len();
        println!("  {} ({})", style(&category).bold(), count);
    }

    Ok(())
}

pub fn search_stories(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let query = matches
        .get_one::<String>("query")
        .ok_or_else(|| anyhow::anyhow!("Search query is required"))?;

    let results = ctx.catalog.search(query);
    if results.is_empty() {
        println!("No stories found matching '{}'", query);
        return Ok(());
    }

    println!(
        "\n{} Search Results for '{}'",
        style(results.len()).bold().cyan(),
        query
    );
    println!("{}", "=".repeat(80));

    for story in results {
        print_story_summary(ctx, story);
    }

    Ok(())
}

/// Show detailed information about a story
pub fn show_story_info(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let story = ctx.story(required_id(matches)?)?;

    println!("\n{}", style("Story Information").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("ID: {}", story.id);
    println!("Title: {}", style(&story.title).bold());
    println!("Author: {}", story.author);
    println!("Category: {}", story.category);
    if !story.duration_label.is_empty() {
        println!("Length: {}", story.duration_label);
    }
    println!("Sentences: {}", segment(&story.content).len());

    if !story.summary.is_empty() {
        println!("\nSummary:\n{}", story.summary);
    }

    println!("\nYour Library:");
    println!(
        "  Favorite: {}",
        if ctx.library.is_favorite(&story.id) { "Yes" } else { "No" }
    );
    match ctx.library.recording(&story.id) {
        Some(recording) => println!(
            "  Recording: {} ({})",
            recording.duration().as_elapsed(),
            recording.location.display()
        ),
        None => println!("  Recording: none"),
    }

    Ok(())
}

/// Add a story to favorites, or remove it with `--remove`
pub fn set_favorite(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let story = ctx.story(required_id(matches)?)?;
    let remove = matches.get_flag("remove");

    let changed = apply_favorite(&ctx.library, &story.id, !remove)?;

    let verb = match (remove, changed) {
        (false, true) => "Added to favorites:",
        (false, false) => "Already a favorite:",
        (true, true) => "Removed from favorites:",
        (true, false) => "Not a favorite:",
    };
    println!("{} {} '{}'", style("✓").green().bold(), verb, story.title);

    Ok(())
}

/// Show the voice settings, changing them first when options are given
pub fn voice_settings(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let preference = matches
        .get_one::<String>("use")
        .map(|s| s.parse::<VoicePreference>())
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;
    let gender = matches
        .get_one::<String>("gender")
        .map(|s| s.parse::<VoiceGender>())
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;

    if preference.is_some() || gender.is_some() {
        apply_voice(&ctx.library, preference, gender)?;
        println!("{} Voice settings saved", style("✓").green().bold());
    }

    let gender = ctx.library.voice_gender();
    println!("\n{}", style("Voice").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("Narrate with: {}", ctx.library.voice_preference());
    println!(
        "AI voice: {} (pitch {:.2})",
        gender,
        ctx.config.narration.pitch_for(gender)
    );
    println!("Recordings: {}", ctx.library.recordings().len());

    Ok(())
}

pub fn list_recordings(ctx: &AppContext) -> Result<()> {
    let recordings = ctx.library.recordings();
    if recordings.is_empty() {
        println!("No recordings yet. Use 'record <id>' to narrate a story yourself.");
        return Ok(());
    }

    println!("\n{} Recordings", style(recordings.len()).bold().cyan());
    println!("{}", "=".repeat(80));

    for recording in recordings {
        let title = ctx
            .catalog
            .story(&recording.story_id)
            .map(|s| s.title.as_str())
            .unwrap_or("(not in catalog)");
        println!("\n{}", style(title).bold());
        println!(
            "  ID: {} | Length: {}",
            recording.story_id,
            recording.duration().as_elapsed()
        );
        println!("  File: {}", recording.location.display());
    }

    Ok(())
}

/// Remove the saved recording of a story and its file
pub fn delete_recording(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let id = StoryId::new(required_id(matches)?);

    let mut recorder = VoiceRecorder::new(
        crate::player::recorder_capability(ctx),
        std::sync::Arc::clone(&ctx.library),
        AudioFocus::new(),
    );
    let deleted = recorder
        .delete(&id)
        .context("Failed to delete recording")?;

    if deleted {
        println!("{} Recording deleted for {}", style("✓").green().bold(), id);
    } else {
        println!("No recording saved for {}", id);
    }

    Ok(())
}

pub fn manage_config(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let path = ctx.manager.config_path();

    match matches.subcommand() {
        Some(("init", _)) => {
            if ctx.manager.initialize().context("Failed to write config")? {
                println!("{} Config written to {}", style("✓").green().bold(), path.display());
            } else {
                println!("Config already exists at {}", path.display());
            }
        }
        Some(("show", _)) => {
            println!("# {}", path.display());
            println!("# data directory: {}", ctx.data_dir.display());
            let rendered =
                toml::to_string_pretty(&ctx.config).context("Failed to render config")?;
            println!("{}", rendered);
        }
        Some(("reset", _)) => {
            ctx.manager.reset().context("Failed to reset config")?;
            println!("{} Config reset at {}", style("✓").green().bold(), path.display());
        }
        _ => anyhow::bail!("Unknown config action"),
    }

    Ok(())
}

pub(crate) fn required_id(matches: &ArgMatches) -> Result<&str> {
    matches
        .get_one::<String>("id")
        .map(|s| s.as_str())
        .ok_or_else(|| anyhow::anyhow!("Story ID is required"))
}

fn select_stories<'a>(
    catalog: &'a dyn Catalog,
    library: &UserLibrary,
    favorites_only: bool,
    category: Option<&str>,
) -> Vec<&'a Story> {
    let stories = match category {
        Some(category) => catalog.by_category(category),
        None => catalog.stories().iter().collect(),
    };
    stories
        .into_iter()
        .filter(|s| !favorites_only || library.is_favorite(&s.id))
        .collect()
}

/// Returns whether the favorite state changed
fn apply_favorite(library: &UserLibrary, id: &StoryId, favorite: bool) -> Result<bool> {
    if library.is_favorite(id) == favorite {
        return Ok(false);
    }
    library
        .toggle_favorite(id)
        .context("Failed to update favorites")?;
    Ok(true)
}

fn apply_voice(
    library: &UserLibrary,
    preference: Option<VoicePreference>,
    gender: Option<VoiceGender>,
) -> Result<()> {
    if let Some(preference) = preference {
        library
            .set_voice_preference(preference)
            .context("Failed to save voice preference")?;
    }
    if let Some(gender) = gender {
        library
            .set_voice_gender(gender)
            .context("Failed to save voice gender")?;
    }
    Ok(())
}

fn print_story_summary(ctx: &AppContext, story: &Story) {
    println!("\n{}", style(&story.title).bold());
    println!("  by {}", story.author);

    let mut line = format!("  ID: {} | {}", story.id, story.category);
    if !story.duration_label.is_empty() {
        line.push_str(&format!(" | {}", story.duration_label));
    }
    println!("{}", line);

    if ctx.library.is_favorite(&story.id) {
        print!("  {}", style("★ Favorite").yellow());
    }
    if ctx.library.has_recording(&story.id) {
        print!("  {}", style("● Recorded").magenta());
    }
    println!();
}
