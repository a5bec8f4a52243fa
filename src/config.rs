use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Process-wide password salt. One secret for every digest, so the
    /// same password always hashes to the same value; switching to
    /// per-record salts changes every stored hash and needs a versioned
    /// migration.
    pub auth_salt: String,
    pub drug_info_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")?,
            auth_salt: std::env::var("AUTH_SALT")
                .unwrap_or_else(|_| "medi-friend-demo-salt".into()),
            drug_info_url: std::env::var("DRUG_INFO_URL")
                .unwrap_or_else(|_| "https://api.fda.gov/drug/label.json".into()),
        })
    }
}
