use anyhow::Result;
use crpm_check::init;

pub fn handle_init(force: bool, quiet: bool) -> Result<()> {
    let result = init::generate_config(force)?;

    if !quiet {
        println!("✅ Wrote {}", result.config_path.display());
        println!("✅ Wrote {} (all rules inactive)", result.exceptions_path.display());
    }

    Ok(())
}
