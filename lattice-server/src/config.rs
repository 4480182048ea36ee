use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Tabular state-space discretization service")]
pub struct Args {
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    #[arg(short, long, default_value_t = 4)]
    pub workers: usize,

    #[arg(short, long, default_value = "0.0.0.0")]
    pub bind: String,
}
