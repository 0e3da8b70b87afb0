//! cellar-review - Write, edit and delete wine reviews

use std::io::{self, BufRead, IsTerminal, Write};

use clap::{Args, Parser, Subcommand};
use libcellar::error::ApiError;
use libcellar::service::review::{ReviewDraft, ReviewModal};
use libcellar::service::events::EventReceiver;
use libcellar::service::CellarService;
use libcellar::{Aroma, CellarError, Result, Review, TasteValues};
use tokio::sync::broadcast::error::TryRecvError;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "cellar-review")]
#[command(version, about = "Write, edit and delete wine reviews")]
#[command(long_about = r#"Write, edit and delete wine reviews.

A review needs a star rating (1-5), some text and at least one aroma tag.
Taste sliders (light/bold, smooth/tannic, dry/sweet, soft/acidic) take
values 0-10 and default to 0.

EXAMPLES:
    # Review wine 7
    cellar-review add --wine 7 --rating 4 --content "Dark fruit" --aroma cherry,oak

    # With taste sliders
    cellar-review add --wine 7 --rating 4 --content "Dark fruit" --aroma cherry --taste 6,4,2,5

    # Change the rating of review 55 on wine 7, keeping everything else
    cellar-review edit 55 --wine 7 --rating 5

    # Delete without asking
    cellar-review delete 55 --force

AROMA TAGS:
    CHERRY BERRY OAK VANILLA PEPPER BAKING GRASS APPLE PEACH CITRUS
    TROPICAL MINERAL FLOWER TOBACCO EARTH CHOCOLATE SPICE CARAMEL LEATHER

EXIT CODES:
    0 - Success
    1 - Error (network, config, server)
    2 - Not signed in or token rejected
    3 - Invalid input (incomplete review, unknown aroma, out-of-range value)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    #[arg(value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging and print service events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Review a wine
    Add {
        /// Wine to review
        #[arg(long)]
        wine: u64,

        #[command(flatten)]
        draft: DraftArgs,
    },

    /// Edit one of your reviews; omitted fields keep their current values
    Edit {
        /// Review to edit
        review_id: u64,

        /// Wine the review belongs to
        #[arg(long)]
        wine: u64,

        #[command(flatten)]
        draft: DraftArgs,
    },

    /// Delete one of your reviews
    Delete {
        review_id: u64,

        /// Skip confirmation prompt
        #[arg(short = 'F', long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
struct DraftArgs {
    /// Star rating, 1-5
    #[arg(short, long)]
    rating: Option<u8>,

    /// Review text
    #[arg(short, long)]
    content: Option<String>,

    /// Aroma tags (comma-separated or repeated)
    #[arg(short, long, value_delimiter = ',')]
    aroma: Vec<String>,

    /// Taste sliders as light-bold,smooth-tannic,dry-sweet,soft-acidic (0-10 each)
    #[arg(short, long, value_name = "L,T,S,A")]
    taste: Option<String>,
}

impl DraftArgs {
    /// Copy the given fields into the draft; aromas replace the current selection
    fn apply(&self, draft: &mut ReviewDraft) -> Result<()> {
        if let Some(rating) = self.rating {
            draft.set_rating(rating)?;
        }
        if let Some(content) = &self.content {
            draft.set_content(content.as_str());
        }
        if let Some(taste) = &self.taste {
            draft.set_taste_values(taste.parse::<TasteValues>()?);
        }
        if !self.aroma.is_empty() {
            let tags = self
                .aroma
                .iter()
                .map(|tag| tag.parse::<Aroma>())
                .collect::<Result<Vec<_>>>()?;
            for selected in draft.selected_tags().clone() {
                draft.deselect_tag(selected);
            }
            for tag in tags {
                draft.select_tag(tag);
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libcellar::logging::init_from_env(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let service = CellarService::new()?;
    let json = cli.format == "json";
    let mut events = service.subscribe();

    let outcome = execute(&service, cli.command, json).await;

    if cli.verbose {
        report_events(&mut events);
    }

    outcome
}

async fn execute(service: &CellarService, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Add { wine, draft } => {
            let mut modal = ReviewModal::new();
            modal.open_add(wine);
            draft.apply(modal.draft_mut())?;

            let review = service.reviews().submit(&mut modal).await?;
            print_review("Added review", &review, json)?;
        }
        Commands::Edit {
            review_id,
            wine,
            draft,
        } => {
            let existing = find_review(service, wine, review_id).await?;

            let mut modal = ReviewModal::new();
            modal.open_edit(wine, &existing);
            draft.apply(modal.draft_mut())?;

            let review = service.reviews().submit(&mut modal).await?;
            print_review("Updated review", &review, json)?;
        }
        Commands::Delete { review_id, force } => {
            if !force && io::stdin().is_terminal() && !confirm_delete(review_id)? {
                println!("Cancelled");
                return Ok(());
            }

            service.reviews().delete(review_id).await?;
            if json {
                println!("{}", serde_json::json!({ "deleted": review_id }));
            } else {
                println!("Deleted review {}", review_id);
            }
        }
    }

    Ok(())
}

/// Print every event emitted during the command, one JSON object per line
fn report_events(events: &mut EventReceiver) {
    loop {
        match events.try_recv() {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(line) => eprintln!("event: {}", line),
                Err(e) => debug!(error = %e, "Could not encode event"),
            },
            Err(TryRecvError::Lagged(skipped)) => {
                eprintln!("event: ({} events dropped)", skipped);
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}

/// Look the review up on its wine's detail page
async fn find_review(service: &CellarService, wine_id: u64, review_id: u64) -> Result<Review> {
    let detail = service.wines().detail(wine_id).await?;
    debug!(
        wine_id,
        reviews = detail.reviews.len(),
        "Loaded wine detail for edit"
    );

    detail
        .reviews
        .into_iter()
        .chain(detail.recent_review)
        .find(|review| review.id == review_id)
        .ok_or_else(|| {
            CellarError::Api(ApiError::NotFound(format!(
                "review {} on wine {}",
                review_id, wine_id
            )))
        })
}

fn confirm_delete(review_id: u64) -> Result<bool> {
    print!("Delete review {}? [y/N]: ", review_id);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn print_review(label: &str, review: &Review, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(review)?);
        return Ok(());
    }

    println!("{} {}", label, review.id);
    println!("  Rating:  {}/5", review.rating);
    println!(
        "  Aromas:  {}",
        review.aroma.join(", ")
    );
    let taste = review.taste_values();
    for axis in libcellar::types::TasteAxis::ALL {
        println!("  {:<14} {}", format!("{}:", axis.label()), taste.get(axis));
    }
    println!("  {}", review.content);
    Ok(())
}
