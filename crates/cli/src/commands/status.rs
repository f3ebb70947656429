use anyhow::Result;
use sentistock_core::AppConfig;
use sentistock_pipeline::StoreStatus;

/// Prints the stored snapshot and artifact state.
///
/// # Errors
/// Returns an error if the store cannot be inspected.
pub fn run_status(config: &AppConfig) -> Result<()> {
    let status = StoreStatus::collect(config)?;
    print!("{status}");
    Ok(())
}
