use clap::{Parser, Subcommand};
use era_identifier::PatientTag;

#[derive(Parser)]
#[command(name = "era")]
#[command(about = "ERA emergency record access CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve raw scan/paste input to a canonical patient identifier
    Resolve {
        /// Bare UUID or a /patient/<uuid> URL
        input: String,
    },
    /// Mint fresh patient identifiers for card or tag printing
    NewTag {
        /// Number of identifiers to generate
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Resolve { input }) => match PatientTag::resolve(&input) {
            Ok(tag) => println!("{tag}"),
            Err(error) => {
                eprintln!("{error}");
                std::process::exit(1);
            }
        },
        Some(Commands::NewTag { count }) => {
            for _ in 0..count {
                println!("{}", PatientTag::new());
            }
        }
        None => {
            println!("era: use --help to see available commands");
        }
    }
}
