use clap::Parser;

#[derive(Parser)]
#[command(
    name = "ytbias",
    about = "Scores YouTube videos for propaganda and bias from their transcripts",
    version
)]
pub struct Cli {
    /// Analyze a single video URL and print the result (serves HTTP if omitted)
    pub url: Option<String>,

    /// Address to bind the HTTP server to
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Chat-completion model
    #[arg(long)]
    pub model: Option<String>,

    /// Preferred caption language
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Completion API key
    #[arg(long, env = "PERPLEXITY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,
}
