//! # Wholesale CLI Entry Point
//!
//! Thin wrapper that drives the submission service from the command line.
//!
//! ## Usage
//!
//! ```bash
//! wholesale --config config/wholesale.toml health
//! wholesale contact --name "Rahim" --phone 01712345678 \
//!   --email rahim@example.com --requirement "500 LED bulbs, 9W" --file datasheet.pdf
//! wholesale login --email rahim@example.com --password '...'
//! wholesale whoami
//! ```
//!
//! The binary will:
//! 1. Load configuration from the TOML file (defaults if none is given)
//! 2. Open the session store (`session.path`, or `~/.wholesale/session.json`)
//! 3. Run the requested operation
//! 4. Print the outcome; failures exit non-zero

use anyhow::Context;
use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use wholesale_client::client::{
    FileSessionStore, LogNotifier, MemorySessionStore, Notifier, SessionStore,
};
use wholesale_client::common::attachment::FileAttachment;
use wholesale_client::common::config::ApiConfig;
use wholesale_client::common::messages::{
    ContactForm, ContactInfo, QuoteRequest, QuoteUrgency, ServiceQuery, UploadKind, Urgency,
};
use wholesale_client::SubmissionService;

/// Command-line arguments for the wholesale binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (TOML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the backend base URL from the configuration
    #[arg(long)]
    base_url: Option<String>,

    /// Trace every request and response
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check backend connectivity
    Health,
    /// Send the contact form
    Contact {
        #[command(flatten)]
        contact: ContactArgs,
    },
    /// Send a detailed service query
    ServiceQuery {
        #[command(flatten)]
        contact: ContactArgs,
        #[arg(long)]
        service_type: String,
        #[arg(long, value_enum, default_value_t = Urgency::Medium)]
        urgency: Urgency,
        #[arg(long)]
        budget: Option<String>,
        #[arg(long)]
        quantity: Option<String>,
    },
    /// Request a quote for a product
    Quote {
        #[arg(long)]
        product: String,
        #[arg(long)]
        quantity: u32,
        #[arg(long)]
        target_price: Option<f64>,
        #[arg(long)]
        description: String,
        #[arg(long, value_enum, default_value_t = QuoteUrgency::Standard)]
        urgency: QuoteUrgency,
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        company: Option<String>,
    },
    /// Subscribe an email address to the newsletter
    Subscribe { email: String },
    /// Upload a file and print its URL
    Upload {
        path: PathBuf,
        #[arg(long = "type", value_enum, default_value_t = UploadKind::Contact)]
        kind: UploadKind,
    },
    /// Log in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log out and forget the session token
    Logout,
    /// Show the logged-in user's profile
    Whoami,
    /// Show whether a session token is stored
    Status,
}

#[derive(clap::Args, Debug)]
struct ContactArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    requirement: String,
    /// Optional attachment (image, PDF or Word document, max 10MB)
    #[arg(long)]
    file: Option<PathBuf>,
}

impl ContactArgs {
    async fn into_form(self) -> anyhow::Result<ContactForm> {
        let file = match self.file {
            Some(path) => Some(
                FileAttachment::from_path(&path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?,
            ),
            None => None,
        };
        Ok(ContactForm {
            name: self.name,
            phone: self.phone,
            email: self.email,
            requirement: self.requirement,
            file,
        })
    }
}

/// Initialize the logging system with timestamp, level, and message formatting.
///
/// Format: `[HH:MM:SS] [LEVEL] message`
fn init_logger(verbose: bool) {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();
}

fn open_session(config: &ApiConfig) -> Arc<dyn SessionStore> {
    let path = config.session.path.clone().or_else(|| {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".wholesale").join("session.json"))
    });
    match path {
        Some(path) => Arc::new(FileSessionStore::new(path)),
        None => Arc::new(MemorySessionStore::new()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let mut config = match &args.config {
        Some(path) => ApiConfig::from_file(path).with_context(|| format!("loading {}", path))?,
        None => ApiConfig::default(),
    };
    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }
    config.api.verbose |= args.verbose;

    let session = open_session(&config);
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let service = SubmissionService::from_config(&config, session, notifier)?;

    match args.command {
        Command::Health => {
            let health = service.health_check().await?;
            println!(
                "{} (version {}, up {:.0}s, at {})",
                health.status, health.version, health.uptime, health.timestamp
            );
        }
        Command::Contact { contact } => {
            let form = contact.into_form().await?;
            service.submit_contact_form(&form).await?;
        }
        Command::ServiceQuery {
            contact,
            service_type,
            urgency,
            budget,
            quantity,
        } => {
            let query = ServiceQuery {
                contact: contact.into_form().await?,
                service_type,
                urgency,
                budget,
                quantity,
            };
            service.submit_service_query(&query).await?;
        }
        Command::Quote {
            product,
            quantity,
            target_price,
            description,
            urgency,
            name,
            phone,
            email,
            company,
        } => {
            let request = QuoteRequest {
                product_name: product,
                quantity,
                target_price,
                description,
                urgency,
                contact_info: ContactInfo {
                    name,
                    phone,
                    email,
                    company,
                },
            };
            service.submit_quote_request(&request).await?;
        }
        Command::Subscribe { email } => {
            if service.subscribe_newsletter(&email).await?.is_none() {
                println!("Nothing to do: email is empty");
            }
        }
        Command::Upload { path, kind } => {
            let file = FileAttachment::from_path(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let url = service.upload_file(&file, kind).await?;
            println!("{}", url);
        }
        Command::Login { email, password } => {
            service.login(&email, &password).await?;
        }
        Command::Logout => {
            service.logout().await?;
        }
        Command::Whoami => {
            let user = service.get_current_user().await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Command::Status => {
            if service.is_authenticated() {
                println!("Logged in");
            } else {
                println!("Not logged in");
            }
        }
    }

    Ok(())
}
