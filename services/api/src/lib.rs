mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use tqm_lifecycle::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
