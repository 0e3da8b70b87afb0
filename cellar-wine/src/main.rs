//! cellar-wine - Look up and register wines

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use libcellar::service::wine::WineForm;
use libcellar::service::CellarService;
use libcellar::types::ImageFile;
use libcellar::{Result, WineDetail, WineType};

#[derive(Parser, Debug)]
#[command(name = "cellar-wine")]
#[command(version, about = "Look up and register wines")]
#[command(long_about = r#"Look up and register wines.

EXAMPLES:
    # Show wine 7 with its reviews
    cellar-wine show 7

    # Register a wine; the label image is uploaded first
    cellar-wine add --name Sassicaia --region Bolgheri --price 250000 --type red --image bottle.png

    # JSON output for scripting
    cellar-wine show 7 --format json | jq '.reviews[].rating'

EXIT CODES:
    0 - Success
    1 - Error (network, config, server)
    2 - Authentication failed
    3 - Invalid input (missing field, unsupported image)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    #[arg(value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show a wine with its rating summary and reviews
    Show { wine_id: u64 },

    /// Register a new wine
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        region: String,

        /// Price in whole currency units
        #[arg(long)]
        price: u64,

        /// RED, WHITE or SPARKLING
        #[arg(long = "type", default_value = "RED")]
        wine_type: String,

        /// Label image (jpg, png, gif or webp)
        #[arg(long)]
        image: PathBuf,
    },
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

    match cli.command {
        Commands::Show { wine_id } => {
            let detail = service.wines().detail(wine_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                print_detail(&detail);
            }
        }
        Commands::Add {
            name,
            region,
            price,
            wine_type,
            image,
        } => {
            let mut form = WineForm::new(
                name,
                price,
                region,
                wine_type.parse::<WineType>()?,
                ImageFile::from_path(&image)?,
            );

            let wine = match service.wines().register(&mut form).await {
                Ok(wine) => wine,
                Err(e) => {
                    if let Some(message) = form.post_error() {
                        eprintln!("{}", message);
                    }
                    return Err(e);
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&wine)?);
            } else {
                println!("Registered wine {}: {}", wine.id, wine.name);
                println!("  Image: {}", wine.image);
            }
        }
    }

    Ok(())
}

fn print_detail(detail: &WineDetail) {
    println!("{} ({})", detail.name, detail.wine_type);
    println!("  Region:  {}", detail.region);
    println!("  Price:   {}", detail.price);
    println!(
        "  Rating:  {:.1} from {} reviews",
        detail.avg_rating, detail.review_count
    );

    // Star histogram, 5 down to 1
    for stars in (1..=5).rev() {
        let count = detail
            .avg_ratings
            .get(&stars.to_string())
            .copied()
            .unwrap_or(0);
        println!("  {}★ {}", stars, count);
    }

    for review in &detail.reviews {
        let author = review
            .user
            .as_ref()
            .map(|u| u.nickname.as_str())
            .unwrap_or("anonymous");
        println!();
        println!("  [{}] {}/5 by {}", review.id, review.rating, author);
        println!("  {}", review.content);
    }
}
