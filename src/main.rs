use anyhow::Context;
use slotbook_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load slotbook settings")?;
    slotbook_telemetry::init(&settings.telemetry)?;

    slotbook_app::run(settings).await
}
