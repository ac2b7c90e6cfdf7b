use crate::config::generate::generate_starter_config;
use std::fs;

pub fn init(stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
    let content = generate_starter_config();

    if stdout {
        print!("{}", content);
        return Ok(());
    }

    let home_dir = dirs::home_dir().ok_or("could not determine home directory")?;
    let config_path = home_dir.join(".config/chatrelay/config.yml");

    if config_path.exists() {
        return Err(format!(
            "{} already exists, refusing to overwrite",
            config_path.display()
        )
        .into());
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&config_path, content)?;

    println!("Wrote starter config to {}", config_path.display());
    println!("Edit it, export the referenced environment variables, then run 'chatrelay'.");

    Ok(())
}
