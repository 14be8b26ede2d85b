use config::{Config, ConfigError, Environment};
use lazy_static::lazy_static;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct Settings {
    pub base_url: String,
    pub service_name: String,
    pub listen_port: String,
    pub database_url: String,
    pub database_pool_max_connections: u32,
    //uploads
    pub upload_dir: String,
    pub poster_max_bytes: usize,
    pub max_body_bytes: usize,
    //auth
    pub token_ttl_hours: i64,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let conf = Config::builder()
            .set_default("base_url", "http://localhost:8000")?
            .set_default("service_name", "jobboard")?
            .set_default("listen_port", "8000")?
            .set_default("database_pool_max_connections", 5_i64)?
            .set_default("upload_dir", "public/uploads/posters")?
            .set_default("poster_max_bytes", 2_097_152_i64)?
            .set_default("max_body_bytes", 10_485_760_i64)?
            .set_default("token_ttl_hours", 24_i64)?
            .add_source(Environment::default())
            .build()?;
        let mut s: Settings = conf.try_deserialize()?;
        s.base_url = s.base_url.trim_end_matches('/').to_string();
        Ok(s)
    }

    /// Public prefix every stored poster reference starts with.
    pub fn poster_url_base(&self) -> String {
        format!("{}/uploads/posters", self.base_url)
    }
}

lazy_static! {
    pub static ref settings: Settings = Settings::new().expect("improperly configured");
}
