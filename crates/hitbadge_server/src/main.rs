//! `hitbadge` binary entry point.

use clap::Parser;
use hitbadge_server::{run, ServerArgs, ServerError};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    run(ServerArgs::parse()).await
}
