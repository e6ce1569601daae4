//! Profiles command handler: list the routing profiles and their rule counts.

use anyhow::{Context, Result};

use searoute_cli::input::InputOptions;
use searoute_cli::output::OutputFormat;
use searoute_lib::{render_profiles, ProfileSummary};

pub fn handle_profiles_command(input: &InputOptions, format: OutputFormat) -> Result<()> {
    let (router, rules) = input.build_router(None)?;
    let profiles = ProfileSummary::collect(&router, rules.as_ref())
        .context("failed to summarize routing profiles")?;
    let rendered = render_profiles(&profiles, format.render_mode())?;
    if format.is_text() {
        print!("{rendered}");
    } else {
        println!("{rendered}");
    }
    Ok(())
}
