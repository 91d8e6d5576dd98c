//! Subcommands, one per storefront page.

pub mod account;
pub mod admin;
pub mod shop;

use bakery_client::{AdminPage, ApiError, Route, Storefront};
use clap::Subcommand;

use crate::error::CliError;

#[derive(Subcommand)]
pub enum Command {
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: Option<shop::ProductsAction>,
    },
    /// Show or change your cart
    Cart {
        #[command(subcommand)]
        action: Option<shop::CartAction>,
    },
    /// Your order history
    Orders,
    /// Log in
    Login(account::LoginArgs),
    /// Create an account and log in
    Register(account::RegisterArgs),
    /// Log out
    Logout,
    /// Show or change your profile
    Profile {
        #[command(subcommand)]
        action: Option<account::ProfileAction>,
    },
    /// Admin console (staff only)
    Admin {
        #[command(subcommand)]
        section: Option<admin::AdminSection>,
    },
}

impl Command {
    /// Page the command shows.
    #[must_use]
    pub fn route(&self) -> Route {
        match self {
            Self::Products {
                action: Some(shop::ProductsAction::Show { id }),
            } => Route::Product(*id),
            Self::Products { .. } => Route::Catalog,
            Self::Cart { .. } => Route::Cart,
            Self::Orders => Route::Orders,
            Self::Login(_) | Self::Logout => Route::Login,
            Self::Register(_) => Route::Register,
            Self::Profile { .. } => Route::Profile,
            Self::Admin { section } => Route::Admin(
                section
                    .as_ref()
                    .map_or(AdminPage::Home, admin::AdminSection::page),
            ),
        }
    }
}

/// Run one command and render its page.
///
/// A store action rejected for want of a login sends the user to the login
/// page.
pub async fn run(app: &Storefront, command: Command) -> Result<String, CliError> {
    let result = match command {
        Command::Products { action } => shop::products(app, action.unwrap_or_default()).await,
        Command::Cart { action } => shop::cart(app, action.unwrap_or_default()).await,
        Command::Orders => shop::orders(app).await,
        Command::Login(args) => account::login(app, args).await,
        Command::Register(args) => account::register(app, args).await,
        Command::Logout => account::logout(app).await,
        Command::Profile { action } => account::profile(app, action.unwrap_or_default()).await,
        Command::Admin { section } => admin::run(app, section).await,
    };

    if matches!(result, Err(CliError::Api(ApiError::NotAuthenticated))) {
        app.navigator().navigate(Route::Login);
    }
    result
}
