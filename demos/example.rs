use dragon_kv::Config;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct AppConfig {
    #[serde(rename = "app.name")]
    name: String,
    #[serde(rename = "app.debug")]
    debug: bool,
    #[serde(rename = "db.host")]
    db_host: String,
    #[serde(rename = "db.port")]
    db_port: u16,
    #[serde(rename = "db.pool")]
    db_pool: Option<u32>,
}

const DEFAULTS: &str = "
# shipped defaults
app.name = demo
app.debug = false
db.host = localhost
";

fn main() -> Result<(), dragon_kv::ConfigError> {
    let config: AppConfig = Config::builder()
        .with_default("db.port", "5432")
        .with_str(DEFAULTS)
        .with_file("demos/local.conf", false)
        .build()?;

    println!("App: {} (debug={})", config.name, config.debug);
    println!("Database: {}:{} pool={:?}", config.db_host, config.db_port, config.db_pool);

    Ok(())
}
