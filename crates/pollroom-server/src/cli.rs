use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "pollroom-server", about = "Live multi-poll voting server")]
pub struct Args {
    /// Path to the TOML config file. A missing file means defaults.
    #[arg(short, long, default_value = "pollroom.toml")]
    pub config: String,

    /// Bind address, overrides `server.bind_address`.
    #[arg(long)]
    pub bind: Option<String>,

    /// Poll catalog TOML file, overrides `catalog.path`.
    #[arg(long)]
    pub catalog: Option<String>,
}
