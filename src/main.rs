mod models;

use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use tickform::core::config::{self, Overrides};
use tickform::{Form, FormOutcome, Model};

use crate::models::{Car, Person, Server};

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum Demo {
    #[default]
    Simple,
    Car,
    Server,
}

#[derive(Parser)]
#[command(name = "tickform", about = "Fill in a model through a terminal form")]
struct Args {
    /// Which sample model to edit
    #[arg(short, long, default_value_t, value_enum)]
    model: Demo,

    /// Start from a sample instance instead of the defaults (car only)
    #[arg(long)]
    edit: bool,

    /// Config file (default: ~/.tickform/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the form title
    #[arg(long)]
    title: Option<String>,

    /// Re-validate after every edit
    #[arg(long)]
    live: bool,

    /// Show the document pane
    #[arg(long)]
    info: bool,

    /// Log file
    #[arg(long, default_value = "tickform.log")]
    log_file: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create(&args.log_file) {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    log::info!("tickform starting up with model: {:?}", args.model);

    let file_config = match &args.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?,
    };
    let overrides = Overrides {
        title: args.title.clone(),
        live_validation: args.live.then_some(true),
        show_model_info: args.info.then_some(true),
    };
    let form_config = config::resolve(&file_config, &overrides)?;

    match args.model {
        Demo::Simple => present(Form::<Person>::new(form_config)?),
        Demo::Car if args.edit => present(Form::edit(&Car::sample(), form_config)?),
        Demo::Car => present(Form::<Car>::new(form_config)?),
        Demo::Server => present(Form::<Server>::new(form_config)?),
    }
}

fn present<T: Model>(form: Form<T>) -> Result<(), Box<dyn Error>> {
    match tickform::tui::run(form)? {
        FormOutcome::Accepted(instance) => {
            log::info!("Form accepted");
            println!("{}", serde_json::to_string_pretty(&instance)?);
        }
        FormOutcome::Aborted => {
            log::info!("Form aborted");
            println!("Aborted");
        }
    }
    Ok(())
}
