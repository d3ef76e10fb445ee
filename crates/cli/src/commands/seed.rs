//! Seed the catalog from a YAML menu file.
//!
//! The file is parsed and validated before connecting. Rows that already
//! exist by name are skipped, so the command can be re-run safely.

use std::path::Path;

use tracing::info;

use menuboard_storefront::seed::SeedMenu;

/// Load categories and items from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is invalid, or if the
/// database is unreachable.
pub async fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!(path = %path.display(), "Loading menu from file");

    let menu = SeedMenu::from_file(path).await?;
    menu.validate()?;
    info!(
        categories = menu.categories.len(),
        items = menu.items.len(),
        "Menu validated"
    );

    let store = super::store().await?;
    let result = menu.apply(&store).await?;

    info!("Seeding complete!");
    info!("  Categories created: {}", result.categories_created);
    info!("  Items created: {}", result.items_created);
    info!("  Skipped (already exist): {}", result.skipped);

    Ok(())
}
