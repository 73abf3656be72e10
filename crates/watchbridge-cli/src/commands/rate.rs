use color_eyre::Result;
use owo_colors::OwoColorize;
use watchbridge_models::{MediaType, ScrobbleMedia};
use watchbridge_remote::RemoteService;

use crate::commands::AppContext;
use crate::output::Output;

pub async fn run_rate(
    title: Option<String>,
    year: Option<u32>,
    rating: Option<u8>,
    remove: bool,
    list: bool,
    output: &Output,
) -> Result<()> {
    let ctx = AppContext::load()?;
    if !ctx.simkl.load_token().await {
        output.error("Not authenticated. Run `watchbridge auth` first.");
        return Err(color_eyre::eyre::eyre!("missing access token"));
    }

    if list {
        return list_ratings(&ctx, output).await;
    }

    let Some(title) = title else {
        output.error("Give a title to rate, or use --list.");
        return Err(color_eyre::eyre::eyre!("missing title"));
    };
    if !remove && rating.is_none() {
        output.error("Give --rating 1-10, or --remove.");
        return Err(color_eyre::eyre::eyre!("missing rating"));
    }
    if let Some(rating) = rating {
        if !(1..=10).contains(&rating) {
            output.error("Rating must be between 1 and 10.");
            return Err(color_eyre::eyre::eyre!("rating out of range"));
        }
    }

    let results = ctx
        .simkl
        .search(MediaType::Movie, &title, year)
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Search failed: {}", e))?;
    let Some(found) = results.into_iter().next() else {
        output.error(format!("No match for '{}'", title));
        return Err(color_eyre::eyre::eyre!("no search match"));
    };

    let display = found.title.clone().unwrap_or_else(|| title.clone());
    let media = ScrobbleMedia::Movie {
        title: display.clone(),
        year: found.year.or(year),
        ids: found,
    };

    if remove {
        ctx.simkl
            .remove_rating(&media)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Could not remove rating: {}", e))?;
        output.success(format!("Removed rating for {}", display.bold()));
    } else if let Some(rating) = rating {
        ctx.simkl
            .add_rating(&media, rating)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Could not add rating: {}", e))?;
        output.success(format!("Rated {} {}/10", display.bold(), rating));
    }

    Ok(())
}

async fn list_ratings(ctx: &AppContext, output: &Output) -> Result<()> {
    for (label, media_type) in [("Movies", MediaType::Movie), ("Shows", MediaType::Episode)] {
        let rated = ctx
            .simkl
            .ratings(media_type)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Could not fetch ratings: {}", e))?;
        if rated.is_empty() {
            continue;
        }
        output.info(format!("{}:", label));
        for (ids, rating) in rated {
            let title = ids.title.unwrap_or_else(|| "Unknown".to_string());
            match ids.year {
                Some(year) => output.info(format!("  {:>2}/10  {} ({})", rating, title, year)),
                None => output.info(format!("  {:>2}/10  {}", rating, title)),
            }
        }
    }
    Ok(())
}
