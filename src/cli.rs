use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Import(ImportArgs),
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Site configuration file, resolved against the site directory.
    #[arg(long, default_value = "_config.yml")]
    pub config: String,

    /// WXR export file (default: `import_location` from the configuration).
    #[arg(long)]
    pub export: Option<String>,

    /// Root of the Jekyll site tree to write into.
    #[arg(long, default_value = ".")]
    pub site_dir: String,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Site configuration file, resolved against the site directory.
    #[arg(long, default_value = "_config.yml")]
    pub config: String,

    /// WXR export file (default: `import_location` from the configuration).
    #[arg(long)]
    pub export: Option<String>,

    /// Root of the Jekyll site tree, used to resolve relative paths.
    #[arg(long, default_value = ".")]
    pub site_dir: String,
}
