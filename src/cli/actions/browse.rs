use crate::{
    api::types::{Property, PropertyPage},
    guard::{Decision, RouteGuard},
    Client,
};
use anyhow::{Context, Result};

fn summary(property: &Property) -> String {
    format!(
        "{}  {}  ${}  {} m²  {}bd/{}ba  {}, {}",
        property.id,
        property.title,
        property.price,
        property.area_sqm,
        property.bedrooms,
        property.bathrooms,
        property.municipality,
        property.department
    )
}

fn footer(page: &PropertyPage) -> String {
    let pagination = &page.pagination;
    format!(
        "page {}/{} ({} total)",
        pagination.page, pagination.total_pages, pagination.total
    )
}

/// # Errors
/// Returns an error if the session expired or the listing cannot be read.
pub async fn properties(client: &Client, json: bool) -> Result<()> {
    let page = client.properties().await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&page).context("failed to encode listing")?
        );
        return Ok(());
    }

    for property in &page.data {
        println!("{}", summary(property));
    }
    println!("{}", footer(&page));

    Ok(())
}

/// # Errors
/// Returns an error if `path` is not an app route.
pub async fn route(client: &Client, path: &str) -> Result<()> {
    let guard = RouteGuard::new(client.clone());
    let decision = guard
        .navigate(path)
        .await
        .with_context(|| format!("unknown route: {path}"))?;

    match decision {
        Decision::Allow => println!("allow {path}"),
        Decision::Redirect(target) => println!("redirect {target}"),
    }

    Ok(())
}
