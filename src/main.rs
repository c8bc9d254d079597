use metawiz::app;
use metawiz::config::{SERVER_ADDR, WizardSettings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Settings path comes from METAWIZ_SETTINGS, address from METAWIZ_ADDR
    let settings = WizardSettings::from_env()?;

    // Start the web application
    app::run(settings, SERVER_ADDR.as_str()).await?;

    Ok(())
}
