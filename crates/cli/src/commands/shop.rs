//! Catalog, cart and order pages.

use bakery_client::{ApiError, Storefront};
use bakery_core::{CartItemId, ProductId, Quantity};
use clap::Subcommand;

use crate::error::CliError;
use crate::views;

#[derive(Subcommand, Default)]
pub enum ProductsAction {
    /// List all products
    #[default]
    List,
    /// Show one product
    Show { id: ProductId },
}

#[derive(Subcommand, Default)]
pub enum CartAction {
    /// Show the cart
    #[default]
    Show,
    /// Add one unit of a product
    Add { product_id: ProductId },
    /// Remove a cart line
    Remove { item_id: CartItemId },
    /// Set the quantity of a cart line
    Update {
        item_id: CartItemId,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove every line
    Clear,
}

pub async fn products(app: &Storefront, action: ProductsAction) -> Result<String, CliError> {
    match action {
        ProductsAction::List => Ok(views::catalog(&app.catalog().list().await?)),
        ProductsAction::Show { id } => Ok(views::product(&app.catalog().info(id).await?)),
    }
}

pub async fn cart(app: &Storefront, action: CartAction) -> Result<String, CliError> {
    let cart = app.cart();
    match action {
        CartAction::Show => {
            cart.fetch_cart().await?;
            if !app.session().is_authenticated() {
                return Err(ApiError::NotAuthenticated.into());
            }
        }
        CartAction::Add { product_id } => cart.add_item(product_id).await?,
        CartAction::Remove { item_id } => cart.remove_item(item_id).await?,
        CartAction::Update { item_id, quantity } => {
            // Rejections the store would make anyway, before the lookup below.
            if !app.session().is_authenticated() {
                return Err(ApiError::NotAuthenticated.into());
            }
            Quantity::from_target(quantity).map_err(ApiError::from)?;

            cart.fetch_cart().await?;
            let product_id = cart
                .snapshot()
                .items
                .iter()
                .find(|line| line.id() == item_id)
                .map(|line| line.item.product_id)
                .ok_or_else(|| CliError::Input(format!("No cart item {item_id}")))?;
            cart.update_quantity(item_id, product_id, quantity).await?;
        }
        CartAction::Clear => cart.clear_cart().await?,
    }
    Ok(views::cart(&cart.snapshot()))
}

pub async fn orders(app: &Storefront) -> Result<String, CliError> {
    Ok(views::orders(&app.orders().list().await?))
}
