//! Admin console pages.
//!
//! Every page first checks the role; clients and anonymous users get the
//! access denied page and no request is made.

use bakery_client::models::{
    BinInput, NewProduct, NewShipment, Registration, ShipmentStatusUpdate, StorageRuleInput,
    WarehouseInput, WmsItem,
};
use bakery_client::{AdminPage, ApiError, Storefront};
use bakery_core::{
    BinId, Email, OrderId, Price, ProductId, Quantity, ShipmentStatus, StorageRuleId, UserId,
    UserRole, WarehouseId,
};
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use crate::commands::account::PasswordArgs;
use crate::error::CliError;
use crate::views;

/// Password variable for new staff accounts.
const STAFF_PASSWORD_ENV: &str = "BAKERY_STAFF_PASSWORD";

#[derive(Subcommand)]
pub enum AdminSection {
    /// Manage products
    Products {
        #[command(subcommand)]
        action: Option<ProductsAction>,
    },
    /// Manage warehouses
    Warehouses {
        #[command(subcommand)]
        action: Option<WarehousesAction>,
    },
    /// Manage storage bins
    Bins {
        #[command(subcommand)]
        action: Option<BinsAction>,
    },
    /// Manage storage rules
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },
    /// Check or commit stock
    Wms {
        #[command(subcommand)]
        action: WmsAction,
    },
    /// Manage shipments
    Shipments {
        #[command(subcommand)]
        action: Option<ShipmentsAction>,
    },
    /// Manage staff accounts
    Staff {
        #[command(subcommand)]
        action: Option<StaffAction>,
    },
}

impl AdminSection {
    #[must_use]
    pub const fn page(&self) -> AdminPage {
        match self {
            Self::Products { .. } => AdminPage::Products,
            Self::Warehouses { .. } | Self::Bins { .. } | Self::Wms { .. } => {
                AdminPage::Warehouses
            }
            Self::Rules { .. } => AdminPage::StorageRules,
            Self::Shipments { .. } => AdminPage::Shipments,
            Self::Staff { .. } => AdminPage::Staff,
        }
    }
}

// =============================================================================
// Arguments
// =============================================================================

#[derive(Args)]
pub struct ProductArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    price: Decimal,
    /// Weight in grams
    #[arg(long)]
    weight: f64,
    #[arg(long, default_value = "")]
    short_description: String,
    #[arg(long, default_value = "")]
    full_description: String,
    #[arg(long, default_value = "")]
    composition: String,
    #[arg(long, default_value = "")]
    photo: String,
    #[arg(long)]
    storage_rule: Option<StorageRuleId>,
}

impl From<ProductArgs> for NewProduct {
    fn from(args: ProductArgs) -> Self {
        Self {
            name: args.name.trim().to_string(),
            short_description: args.short_description,
            full_description: args.full_description,
            composition: args.composition,
            weight: args.weight,
            price: Price::new(args.price),
            photo: args.photo,
            storage_rule_id: args.storage_rule,
        }
    }
}

#[derive(Subcommand, Default)]
pub enum ProductsAction {
    #[default]
    List,
    /// Add a product (names must be unique)
    Add(ProductArgs),
    /// Replace a product's fields
    Update {
        id: ProductId,
        #[command(flatten)]
        product: ProductArgs,
    },
    /// Check whether a product name is taken
    Verify { name: String },
}

#[derive(Args)]
pub struct WarehouseArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    address: String,
    /// e.g. "08:00-20:00"
    #[arg(long)]
    hours: Option<String>,
}

impl From<WarehouseArgs> for WarehouseInput {
    fn from(args: WarehouseArgs) -> Self {
        Self {
            name: args.name,
            address: args.address,
            working_hours: args.hours,
        }
    }
}

#[derive(Subcommand, Default)]
pub enum WarehousesAction {
    #[default]
    List,
    Add(WarehouseArgs),
    Update {
        id: WarehouseId,
        #[command(flatten)]
        warehouse: WarehouseArgs,
    },
    Delete {
        id: WarehouseId,
    },
}

#[derive(Args)]
pub struct BinArgs {
    #[arg(long)]
    warehouse: WarehouseId,
    #[arg(long)]
    zone: String,
    #[arg(long)]
    aisle: String,
    #[arg(long)]
    rack: String,
    #[arg(long)]
    code: String,
    #[arg(long)]
    storage_rule: Option<StorageRuleId>,
    #[arg(long)]
    product: Option<ProductId>,
    #[arg(long)]
    quantity: Option<i32>,
}

impl From<BinArgs> for BinInput {
    fn from(args: BinArgs) -> Self {
        Self {
            warehouse_id: args.warehouse,
            zone: args.zone,
            aisle: args.aisle,
            rack: args.rack,
            bin_code: args.code,
            storage_rule_id: args.storage_rule,
            product_id: args.product,
            quantity: args.quantity,
        }
    }
}

#[derive(Subcommand)]
pub enum BinsAction {
    List {
        /// Only bins of this warehouse
        #[arg(long)]
        warehouse: Option<WarehouseId>,
    },
    Add(BinArgs),
    Update {
        id: BinId,
        #[command(flatten)]
        bin: BinArgs,
    },
    Delete {
        id: BinId,
    },
}

#[derive(Subcommand, Default)]
pub enum RulesAction {
    #[default]
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        hazardous: bool,
        #[arg(long)]
        oversized: bool,
        #[arg(long, allow_negative_numbers = true)]
        temp_min: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        temp_max: Option<f64>,
    },
    Delete {
        id: StorageRuleId,
    },
}

#[derive(Subcommand)]
pub enum WmsAction {
    /// Check stock for PRODUCT:QUANTITY pairs
    Check {
        #[arg(required = true, value_parser = parse_wms_item)]
        items: Vec<WmsItem>,
    },
    /// Deduct stock for PRODUCT:QUANTITY pairs
    Commit {
        #[arg(required = true, value_parser = parse_wms_item)]
        items: Vec<WmsItem>,
    },
}

#[derive(Subcommand)]
pub enum ShipmentsAction {
    List {
        #[arg(long)]
        status: Option<ShipmentStatus>,
    },
    Create {
        #[arg(long)]
        order: OrderId,
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        address: String,
        #[arg(long)]
        courier: Option<UserId>,
        /// PRODUCT:QUANTITY pairs
        #[arg(required = true, value_parser = parse_wms_item)]
        items: Vec<WmsItem>,
    },
    /// Change status and optionally assign a courier
    Update {
        tracking_code: String,
        #[arg(long)]
        status: ShipmentStatus,
        #[arg(long)]
        courier: Option<UserId>,
    },
}

#[derive(Subcommand, Default)]
pub enum StaffAction {
    #[default]
    List,
    /// Staff with the courier role
    Couriers,
    /// Create a staff account
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        // BAKERY_STAFF_PASSWORD unless --password-stdin
        #[command(flatten)]
        password: PasswordArgs,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long)]
        role: UserRole,
    },
}

/// Parse `PRODUCT:QUANTITY`.
fn parse_wms_item(raw: &str) -> Result<WmsItem, String> {
    let (product, quantity) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected PRODUCT:QUANTITY, got '{raw}'"))?;
    let product_id = product
        .parse::<ProductId>()
        .map_err(|e| format!("invalid product id '{product}': {e}"))?;
    let quantity = quantity
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid quantity '{quantity}': {e}"))?;
    let quantity = Quantity::from_target(quantity).map_err(|e| e.to_string())?;
    Ok(WmsItem {
        product_id,
        quantity,
    })
}

// =============================================================================
// Pages
// =============================================================================

pub async fn run(app: &Storefront, section: Option<AdminSection>) -> Result<String, CliError> {
    let user = app
        .session()
        .require_staff()
        .map_err(|e| {
            CliError::AccessDenied(match e {
                ApiError::Forbidden(reason) => reason,
                other => other.user_message(),
            })
        })?;

    match section {
        None => Ok(views::admin_home(&user)),
        Some(AdminSection::Products { action }) => products(app, action.unwrap_or_default()).await,
        Some(AdminSection::Warehouses { action }) => {
            warehouses(app, action.unwrap_or_default()).await
        }
        Some(AdminSection::Bins { action }) => {
            bins(app, action.unwrap_or(BinsAction::List { warehouse: None })).await
        }
        Some(AdminSection::Rules { action }) => rules(app, action.unwrap_or_default()).await,
        Some(AdminSection::Wms { action }) => wms(app, action).await,
        Some(AdminSection::Shipments { action }) => {
            shipments(app, action.unwrap_or(ShipmentsAction::List { status: None })).await
        }
        Some(AdminSection::Staff { action }) => staff(app, action.unwrap_or_default()).await,
    }
}

async fn products(app: &Storefront, action: ProductsAction) -> Result<String, CliError> {
    let catalog = app.catalog();
    match action {
        ProductsAction::List => Ok(views::admin_products(&catalog.list().await?)),
        ProductsAction::Add(args) => {
            let product = NewProduct::from(args);
            if catalog.verify_name(&product.name).await?.exists {
                return Err(CliError::Input(format!(
                    "A product named \"{}\" already exists",
                    product.name
                )));
            }
            catalog.add(&product).await?;
            Ok(views::admin_products(&catalog.list().await?))
        }
        ProductsAction::Update { id, product } => {
            catalog.update(id, &NewProduct::from(product)).await?;
            Ok(views::admin_products(&catalog.list().await?))
        }
        ProductsAction::Verify { name } => {
            let check = catalog.verify_name(&name).await?;
            Ok(views::name_check(&name, &check))
        }
    }
}

async fn warehouses(app: &Storefront, action: WarehousesAction) -> Result<String, CliError> {
    let service = app.warehouse();
    match action {
        WarehousesAction::List => {}
        WarehousesAction::Add(args) => {
            service.create_warehouse(&args.into()).await?;
        }
        WarehousesAction::Update { id, warehouse } => {
            service.update_warehouse(id, &warehouse.into()).await?;
        }
        WarehousesAction::Delete { id } => service.delete_warehouse(id).await?,
    }
    Ok(views::warehouses(&service.warehouses().await?))
}

async fn bins(app: &Storefront, action: BinsAction) -> Result<String, CliError> {
    let service = app.warehouse();
    let warehouse = match action {
        BinsAction::List { warehouse } => warehouse,
        BinsAction::Add(args) => Some(service.create_bin(&args.into()).await?.warehouse_id),
        BinsAction::Update { id, bin } => {
            Some(service.update_bin(id, &bin.into()).await?.warehouse_id)
        }
        BinsAction::Delete { id } => {
            service.delete_bin(id).await?;
            None
        }
    };
    Ok(views::bins(&service.bins(warehouse).await?))
}

async fn rules(app: &Storefront, action: RulesAction) -> Result<String, CliError> {
    let service = app.warehouse();
    match action {
        RulesAction::List => {}
        RulesAction::Add {
            name,
            description,
            hazardous,
            oversized,
            temp_min,
            temp_max,
        } => {
            if let (Some(min), Some(max)) = (temp_min, temp_max)
                && min > max
            {
                return Err(CliError::Input(format!(
                    "--temp-min ({min}) is above --temp-max ({max})"
                )));
            }
            let input = StorageRuleInput {
                name,
                description,
                is_hazardous: hazardous,
                is_oversized: oversized,
                temp_min,
                temp_max,
            };
            service.create_storage_rule(&input).await?;
        }
        RulesAction::Delete { id } => service.delete_storage_rule(id).await?,
    }
    Ok(views::storage_rules(&service.storage_rules().await?))
}

async fn wms(app: &Storefront, action: WmsAction) -> Result<String, CliError> {
    let service = app.warehouse();
    match action {
        WmsAction::Check { items } => Ok(views::wms_check(&service.check_stock(&items).await?)),
        WmsAction::Commit { items } => Ok(views::wms_commit(&service.commit_stock(&items).await?)),
    }
}

async fn shipments(app: &Storefront, action: ShipmentsAction) -> Result<String, CliError> {
    let service = app.shipping();
    let filter = match action {
        ShipmentsAction::List { status } => status,
        ShipmentsAction::Create {
            order,
            user,
            address,
            courier,
            items,
        } => {
            let shipment = NewShipment {
                order_id: order,
                user_id: user,
                address,
                courier_id: courier,
                items,
            };
            let created = service.create(&shipment).await?;
            return Ok(views::shipments(&[created]));
        }
        ShipmentsAction::Update {
            tracking_code,
            status,
            courier,
        } => {
            if let Some(courier) = courier {
                let couriers = app.staff().couriers().await?;
                if !couriers.iter().any(|c| c.id == courier) {
                    return Err(CliError::Input(format!("User {courier} is not a courier")));
                }
            }
            let update = ShipmentStatusUpdate {
                status,
                courier_id: courier,
            };
            service.update_status(&tracking_code, &update).await?;
            None
        }
    };
    Ok(views::shipments(&service.list(filter).await?))
}

async fn staff(app: &Storefront, action: StaffAction) -> Result<String, CliError> {
    let service = app.staff();
    match action {
        StaffAction::List => Ok(views::staff(&service.list().await?)),
        StaffAction::Couriers => Ok(views::staff(&service.couriers().await?)),
        StaffAction::Add {
            username,
            email,
            password,
            first_name,
            last_name,
            role,
        } => {
            if !role.is_staff() {
                return Err(CliError::Input(format!(
                    "Staff accounts need a staff role, not {role}"
                )));
            }
            let registration = Registration {
                username,
                email: Email::parse(&email).map_err(ApiError::from)?,
                password: password.resolve(STAFF_PASSWORD_ENV)?,
                first_name,
                last_name,
                user_role: Some(role),
            };
            service.create(&registration).await?;
            Ok(views::staff(&service.list().await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wms_item() {
        let item = parse_wms_item("12:3");
        assert!(matches!(
            item,
            Ok(WmsItem { product_id, quantity })
                if product_id == ProductId::new(12) && quantity.get() == 3
        ));
        assert!(parse_wms_item("12").is_err());
        assert!(parse_wms_item("x:1").is_err());
        assert!(parse_wms_item("12:0").is_err());
    }

    #[test]
    fn test_sections_map_to_pages() {
        let wms = AdminSection::Wms {
            action: WmsAction::Check { items: Vec::new() },
        };
        assert_eq!(wms.page(), AdminPage::Warehouses);
        let rules = AdminSection::Rules { action: None };
        assert_eq!(rules.page(), AdminPage::StorageRules);
    }
}
