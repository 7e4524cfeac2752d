use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use log::{error, info};
use tokio::net::TcpListener;

use docqna::auth::AuthService;
use docqna::providers::GeminiClient;
use docqna::{create_api, AppState, Config, Database};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(long, default_value = "3000")]
    port: u16,

    /// SQLite database path
    #[arg(long, default_value = "data/docqna.db")]
    database: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = Config::from_env()?;

    if let Some(parent) = Path::new(&args.database).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let db = Database::new(&args.database).await?;

    let auth = AuthService::new(db.clone(), config.jwt.clone());
    match auth.seed_admin(&config.admin_password).await {
        Ok(true) => info!("Admin account created"),
        Ok(false) => info!("Admin account already exists"),
        Err(e) => error!("Failed to seed admin account: {}", e),
    }

    let model = Arc::new(GeminiClient::new(config.gemini.clone()));

    let state = AppState {
        db,
        model,
        auth: Arc::new(auth),
        upload_dir: config.upload_dir.clone().into(),
    };
    let app = create_api(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", args.port).parse()?;
    info!("Starting API server on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    info!("Ready to accept connections");

    axum::serve(listener, app).await?;

    Ok(())
}
