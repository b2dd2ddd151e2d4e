//! Print the OpenAPI document as pretty JSON for external tooling.

use color_eyre::eyre::{Result, WrapErr};
use route_ledger::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<()> {
    color_eyre::install()?;
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .wrap_err("failed to serialise OpenAPI document")?;
    println!("{json}");
    Ok(())
}
