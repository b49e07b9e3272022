use confbind::{Config, Format, Record};

#[derive(Debug, Default, Record)]
#[env(rename_all = "PascalCase")]
struct AppConfig {
    name: String,
    debug: bool,
    #[env(key = "APP_DATABASE")]
    database: DatabaseSection,
    #[env(key = "APP_REPLICAS")]
    replicas: Vec<DatabaseSection>,
}

#[derive(Debug, Default, Record)]
#[env(rename_all = "PascalCase")]
struct DatabaseSection {
    host: String,
    port: u16,
}

fn main() -> Result<(), confbind::ConfigError> {
    // File first, then `APP_DATABASE='{"Port":5433}'` style overrides.
    let config: AppConfig = Config::builder()
        .with_file("demos/app.yaml")
        .with_format(Format::Yaml)
        .load()?;

    println!("App: {} (debug={})", config.name, config.debug);
    println!(
        "Database: {}:{}",
        config.database.host, config.database.port
    );
    for replica in &config.replicas {
        println!("Replica: {}:{}", replica.host, replica.port);
    }

    Ok(())
}
