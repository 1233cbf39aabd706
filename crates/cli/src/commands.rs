use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    Sync {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(
            long,
            help = "If specified, writes records to this file instead of stdout"
        )]
        output: Option<String>,
    },
    Validate {
        #[arg(long, help = "Config file path")]
        config: String,
    },
    /// List the default analytics field catalog
    Fields {
        #[arg(
            long,
            help = "If set, prints the catalog as JSON instead of one field per line"
        )]
        json: bool,
    },
}
