use crate::cli::ConfigCommands;
use crate::config::Config;
use crate::context::Roots;
use crate::error::Result;
use crate::utils::path::display;

pub fn execute(command: &ConfigCommands, roots: &Roots) -> Result<()> {
    match command {
        ConfigCommands::Validate => validate(roots),
        ConfigCommands::Show => show(roots),
    }
}

fn validate(roots: &Roots) -> Result<()> {
    let global_config = Config::global_path(&roots.home);
    let project_config = Config::project_path(&roots.cwd);

    println!("Validating configuration files...\n");

    for (label, path) in [("Global", &global_config), ("Project", &project_config)] {
        if path.exists() {
            println!("  {} config: {}", label, display(path, &roots.home));
        } else {
            println!(
                "  {} config: {} - not found (optional)",
                label,
                display(path, &roots.home)
            );
        }
    }

    println!("\nLoading and validating configuration...");
    match Config::load(roots) {
        Ok(_) => {
            println!("✓ Configuration is valid!");
            Ok(())
        }
        Err(e) => {
            println!("✗ Configuration is invalid!");
            println!("  Error: {}", e);
            Err(e)
        }
    }
}

fn show(roots: &Roots) -> Result<()> {
    let config = Config::load(roots)?;

    println!("Effective Configuration:");
    println!("(CLI > Environment > Project config > Global config > Defaults)\n");

    println!("Install:");
    println!("  symlink: {}", config.install.symlink);

    println!("\nUpdate Check:");
    println!("  enabled: {}", config.update_check.enabled);
    println!("  interval: {} hours", config.update_check.interval_hours);

    println!("\nSearch:");
    println!("  directory_url: {}", config.search.directory_url);

    Ok(())
}
