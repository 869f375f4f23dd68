use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;
use structopt::StructOpt;

use foodmenu::menu::{AddIngredient, ListDishes, ListIngredients};
use foodmenu::services::{Commandable, Queryable};

#[derive(Debug, StructOpt)]
#[structopt(name = "fm", about = "Food menu CLI")]
struct Opt {
    /// Config file
    #[structopt(parse(from_os_str))]
    config: PathBuf,
    #[structopt(subcommand)]
    command: Commands,
}

#[derive(Debug, StructOpt)]
enum Commands {
    #[structopt(name = "setup", about = "Initialize schema and seed the pantry")]
    Setup,
    #[structopt(name = "show-menu", about = "List dishes with their ingredients")]
    ShowMenu,
    #[structopt(name = "add-ingredient", about = "Add one ingredient")]
    AddIngredient { name: String },
    #[structopt(name = "list-ingredients", about = "List ingredients")]
    ListIngredients,
}

#[derive(Deserialize, Debug)]
struct Config {
    #[serde(flatten)]
    foodmenu: foodmenu::config::Config,
    #[serde(default)]
    env_logger: foodmenu::config::EnvLogger,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    let mut config_buf = String::new();
    File::open(&opt.config)?.read_to_string(&mut config_buf)?;
    let config: Config = toml::from_str(&config_buf)?;

    config.env_logger.builder().init();

    let fm = foodmenu::FoodMenu::new(&config.foodmenu)?;

    match opt.command {
        Commands::Setup => {
            fm.ingredients().setup()?;
        }
        Commands::ShowMenu => {
            for dish in fm.catalog().query(ListDishes)? {
                println!("{}\t{}\t{:.2}", dish.id, dish.name, dish.price);
                for ingredient in &dish.ingredients {
                    println!("\t- {}", ingredient.name);
                }
            }
        }
        Commands::AddIngredient { name } => {
            let view = fm.ingredients().execute(AddIngredient { name })?;
            println!("{}\t{}", view.id, view.name);
        }
        Commands::ListIngredients => {
            for ingredient in fm.ingredients().query(ListIngredients)? {
                println!("{}\t{}", ingredient.id, ingredient.name);
            }
        }
    }

    Ok(())
}
