#![forbid(unsafe_code)]

//! Binary entrypoint for the `walfetch` CLI.

fn main() {
    std::process::exit(walfetch_cli::run());
}
