use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};

mod cli;
mod cmd_list;
mod util;

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт — warn (stdout занят выводом записей).
    // Пример: RUST_LOG=debug mattock --keys /u2/ACCOUNT
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    let detail = cli.detail();
    cmd_list::exec(cli.account, cli.files, detail, cli.json)
}
