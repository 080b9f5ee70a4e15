use color_eyre::eyre::{Context, Result};

use crate::{config::Config, store::FirebaseSource};

pub fn new_source(config: &Config) -> Result<FirebaseSource> {
    let url = config.database_url()?;
    FirebaseSource::new(url, config.auth_token.clone(), config.timeout())
        .wrap_err("Failed to set up the database client")
}
