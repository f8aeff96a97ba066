use clap::Parser;
use dotenvy::dotenv;
use m4a_converter::client::{
    DirectorySink, HttpTransport, SelectedFile, StdinPicker, UploadWidget,
};
use m4a_converter::config::ClientConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Upload .m4a files to the converter and save the MP3s", long_about = None)]
struct Args {
    /// Files to convert. Prompts for a path when none are given.
    files: Vec<PathBuf>,

    /// Converter base URL (default: $CONVERTER_URL or http://localhost:3000)
    #[arg(short, long)]
    server: Option<String>,

    /// Directory to save MP3s into (default: $DOWNLOAD_DIR or .)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "m4a_converter=info,m4a_upload=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env();
    let server = args.server.unwrap_or(config.server_url);
    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(&config.download_dir));

    let transport = HttpTransport::new(
        &server,
        config.request_timeout_secs.map(Duration::from_secs),
    )?;
    info!("🔗 Converter endpoint: {}", transport.endpoint());

    let widget = UploadWidget::new(
        Arc::new(StdinPicker),
        Arc::new(transport),
        Arc::new(DirectorySink::new(out)),
    );

    if args.files.is_empty() {
        let receipt = widget.select_file().await?;
        println!("{}", receipt.location);
        return Ok(());
    }

    // One upload at a time, the widget rejects overlapping ones
    let mut failures = 0;
    for path in &args.files {
        let result = match SelectedFile::from_path(path).await {
            Ok(file) => widget.on_file_chosen(vec![file]).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(receipt) => println!("{}", receipt.location),
            Err(e) => {
                error!("❌ {}: {}", path.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} conversions failed", failures, args.files.len());
    }
    Ok(())
}
