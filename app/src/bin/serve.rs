use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::*;
use serde::Deserialize;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "serve", about = "Serve the food menu over HTTP.")]
struct Opt {
    /// Config file
    #[structopt(parse(from_os_str))]
    config: PathBuf,
}

#[derive(Deserialize, Debug)]
struct Config {
    #[serde(flatten)]
    foodmenu: foodmenu::config::Config,
    #[serde(default)]
    env_logger: foodmenu::config::EnvLogger,
    listener: Listener,
}

#[derive(Deserialize, Debug)]
struct Listener {
    addr: std::net::SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::from_args();

    let mut config_buf = String::new();
    File::open(&opt.config)?.read_to_string(&mut config_buf)?;
    let config: Config = toml::from_str(&config_buf)?;

    config.env_logger.builder().init();
    debug!("Options: {:?}", opt);

    let fm = foodmenu::FoodMenu::new(&config.foodmenu)?;
    fm.ingredients().setup()?;

    let app = foodmenu::http::router(Arc::new(fm.catalog()));
    let listener = tokio::net::TcpListener::bind(&config.listener.addr)
        .await
        .context("bind")?;
    info!("Listening on: {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
