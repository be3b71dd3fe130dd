mod commands;
mod config;
mod store;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    FoodFields, LogRequest, ProfileFields, cmd_delete, cmd_export, cmd_food_add, cmd_food_delete,
    cmd_food_list, cmd_food_revise, cmd_goals, cmd_history, cmd_import, cmd_log,
    cmd_profile_set, cmd_profile_show, cmd_remove, cmd_summary, cmd_update, cmd_week,
    parse_utc_offset,
};
use crate::config::Config;
use crate::store::JournalStore;

#[derive(Parser)]
#[command(
    name = "nosh",
    version,
    about = "A diet tracker: log meals, compute goals, see where the day stands"
)]
struct Cli {
    /// UTC offset that decides which calendar day a meal belongs to (±HH:MM,
    /// default: this machine's current offset)
    #[arg(long, global = true, value_name = "±HH:MM", allow_hyphen_values = true)]
    utc_offset: Option<String>,
    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a food into a meal
    Log {
        /// Food name to search the catalog for
        food: Option<String>,
        /// Quantity (e.g. "200g", "500 ml", "2 pieces", or a bare number of servings)
        #[arg(short, long, default_value = "1")]
        quantity: String,
        /// Meal type: breakfast, lunch, dinner, snack, other
        #[arg(short, long, default_value = "snack")]
        meal: String,
        /// Log directly by food ID or ID prefix (skip search)
        #[arg(long)]
        food_id: Option<String>,
        /// Date to log for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change the quantity of a logged item
    Update {
        /// Meal ID or ID prefix
        meal_id: String,
        /// Item number within the meal (as shown by `summary`)
        item: usize,
        /// New quantity (e.g. "150g", "1.5 cups")
        quantity: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove one item from a meal
    Remove {
        /// Meal ID or ID prefix
        meal_id: String,
        /// Item number within the meal (as shown by `summary`)
        item: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a whole meal
    Delete {
        /// Meal ID or ID prefix
        meal_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show daily summary (defaults to today)
    Summary {
        /// Date to show (YYYY-MM-DD, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show totals for the last N days
    History {
        /// Number of days to show
        #[arg(
            short,
            long,
            default_value = "7",
            value_parser = clap::value_parser!(u32).range(1..=3650)
        )]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show seven days of totals against the goal
    Week {
        /// First day of the week (default: this week's Monday)
        #[arg(long)]
        start: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the food catalog
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Manage biometrics
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Show daily energy and macro goals
    Goals {
        /// Recompute goals with the current policy and today's age
        #[arg(long)]
        refresh: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the whole journal as JSON
    Export {
        /// File to write (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace the journal with an exported one
    Import {
        /// Path to the exported JSON file
        file: PathBuf,
        /// Validate the file without making changes
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Add a food to the catalog
    Add {
        /// Food name
        name: String,
        #[command(flatten)]
        fields: FoodFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Store an edited version of a food; meals already logged keep the old one
    Revise {
        /// Food ID or ID prefix
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: FoodFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a food no meal refers to
    Delete {
        /// Food ID or ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List/search the catalog
    List {
        /// Search query to filter foods by name or brand
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Create or update biometrics; goals are recomputed
    Set {
        #[command(flatten)]
        fields: ProfileFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show biometrics and goals
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let tz = parse_utc_offset(cli.utc_offset.as_deref())?;
    let config = Config::load()?;
    debug!(
        data_dir = %config.data_dir.display(),
        policy = %config.policy_path.display(),
        %tz,
        "loaded config"
    );
    let store = JournalStore::new(&config.journal_path);
    let mut svc = store.open(config.load_policy()?)?;

    match cli.command {
        Commands::Log {
            food,
            quantity,
            meal,
            food_id,
            date,
            json,
        } => cmd_log(
            &mut svc,
            &store,
            &tz,
            LogRequest {
                food,
                food_id,
                quantity,
                meal,
                date,
            },
            json,
        ),
        Commands::Update {
            meal_id,
            item,
            quantity,
            json,
        } => cmd_update(&mut svc, &store, &meal_id, item, &quantity, json),
        Commands::Remove {
            meal_id,
            item,
            json,
        } => cmd_remove(&mut svc, &store, &meal_id, item, json),
        Commands::Delete { meal_id, json } => cmd_delete(&mut svc, &store, &meal_id, json),
        Commands::Summary { date, json } => cmd_summary(&svc, &tz, date, json),
        Commands::History { days, json } => cmd_history(&svc, &tz, days, json),
        Commands::Week { start, json } => cmd_week(&svc, &tz, start, json),
        Commands::Food { command } => match command {
            FoodCommands::Add { name, fields, json } => {
                cmd_food_add(&mut svc, &store, &name, fields, json)
            }
            FoodCommands::Revise {
                id,
                name,
                fields,
                json,
            } => cmd_food_revise(&mut svc, &store, &id, name, fields, json),
            FoodCommands::Delete { id, json } => cmd_food_delete(&mut svc, &store, &id, json),
            FoodCommands::List { search, json } => cmd_food_list(&svc, search.as_deref(), json),
        },
        Commands::Profile { command } => match command {
            ProfileCommands::Set { fields, json } => {
                cmd_profile_set(&mut svc, &store, &tz, fields, json)
            }
            ProfileCommands::Show { json } => cmd_profile_show(&svc, &tz, json),
        },
        Commands::Goals { refresh, json } => cmd_goals(&mut svc, &store, &tz, refresh, json),
        Commands::Export { output } => cmd_export(&svc, output.as_deref()),
        Commands::Import {
            file,
            dry_run,
            json,
        } => cmd_import(&mut svc, &store, &file, dry_run, json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_log_with_negative_offset() {
        let cli = Cli::try_parse_from([
            "nosh",
            "--utc-offset",
            "-05:00",
            "log",
            "oats",
            "-q",
            "80g",
            "-m",
            "breakfast",
        ])
        .unwrap();
        assert_eq!(cli.utc_offset.as_deref(), Some("-05:00"));
        match cli.command {
            Commands::Log {
                food,
                quantity,
                meal,
                ..
            } => {
                assert_eq!(food.as_deref(), Some("oats"));
                assert_eq!(quantity, "80g");
                assert_eq!(meal, "breakfast");
            }
            _ => panic!("expected log"),
        }
    }

    #[test]
    fn test_history_days_is_bounded() {
        assert!(Cli::try_parse_from(["nosh", "history", "-d", "30"]).is_ok());
        assert!(Cli::try_parse_from(["nosh", "history", "-d", "0"]).is_err());
        assert!(Cli::try_parse_from(["nosh", "history", "-d", "200000000"]).is_err());
    }

    #[test]
    fn test_parse_food_add_with_portions() {
        let cli = Cli::try_parse_from([
            "nosh",
            "food",
            "add",
            "Bread",
            "--calories",
            "250",
            "--portion",
            "slice=30g",
            "--portion",
            "loaf=500g",
        ])
        .unwrap();
        match cli.command {
            Commands::Food {
                command: FoodCommands::Add { name, fields, .. },
            } => {
                assert_eq!(name, "Bread");
                assert_eq!(fields.calories, Some(250.0));
                assert_eq!(fields.portions, vec!["slice=30g", "loaf=500g"]);
            }
            _ => panic!("expected food add"),
        }
    }
}
