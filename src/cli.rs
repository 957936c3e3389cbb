use clap::Parser;

#[derive(Parser)]
#[command(version, about = "Convert proxy share links into a sing-box config", long_about = None)]
pub struct Args {
    #[arg(short, long, help = "File containing share links (plain or base64 list)")]
    pub input: String,

    #[arg(short, long, help = "Config output path, stdout if omitted")]
    pub output: Option<String>,

    #[arg(
        short,
        long,
        default_value = "minimal",
        help = "Comma-separated rule categories, or a bundle: minimal, balanced, comprehensive"
    )]
    pub rules: String,

    #[arg(short, long, help = "JSON file with custom rule definitions")]
    pub custom_rules: Option<String>,

    #[arg(short, long, default_value = "en", help = "Group name language (en, zh)")]
    pub lang: String,

    #[arg(short, long, help = "Emit debug log")]
    pub verbose: bool,
}
