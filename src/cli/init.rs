use apem_player::config::Config;
use owo_colors::OwoColorize;
use std::error::Error;

pub fn handle_init() -> Result<(), Box<dyn Error>> {
    if Config::exists()? {
        return Err(
            "apem is already initialized. Use 'apem config set <key> <value>' to change settings."
                .into(),
        );
    }

    let config = Config::new();
    config.save()?;

    println!("{}", "apem initialized successfully!".green());
    println!(
        "Configuration saved to: {}",
        Config::config_path()?.display()
    );
    println!("Player log: {}", config.log_file);

    Ok(())
}
