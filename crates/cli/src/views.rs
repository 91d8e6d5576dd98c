//! Text pages.
//!
//! Every function returns the whole page as a `String`; `main` decides where
//! it goes.

use bakery_client::models::{
    BinLocation, NameCheck, Order, Product, Shipment, Staff, StorageRule, User, Warehouse,
    WmsCheckResponse, WmsCommitResponse, WmsShortage,
};
use bakery_client::{ApiError, CartState, ErrorKind};

use crate::error::CliError;

fn line(out: &mut String, text: impl AsRef<str>) {
    out.push_str(text.as_ref());
    out.push('\n');
}

fn title(out: &mut String, text: &str) {
    line(out, text);
    line(out, "=".repeat(text.chars().count()));
}

fn or_dash(value: Option<impl ToString>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

// =============================================================================
// Storefront
// =============================================================================

pub fn catalog(products: &[Product]) -> String {
    let mut out = String::new();
    title(&mut out, "Bakery");
    if products.is_empty() {
        line(&mut out, "No products yet.");
        return out;
    }
    for product in products {
        line(
            &mut out,
            format!(
                "{:>4}  {:<28} {:>8}  {}",
                product.id, product.name, product.price, product.short_description
            ),
        );
    }
    out
}

pub fn product(product: &Product) -> String {
    let mut out = String::new();
    title(&mut out, &product.name);
    line(&mut out, format!("Price:       {}", product.price));
    line(&mut out, format!("Weight:      {} g", product.weight));
    if !product.composition.is_empty() {
        line(&mut out, format!("Composition: {}", product.composition));
    }
    if !product.full_description.is_empty() {
        line(&mut out, "");
        line(&mut out, &product.full_description);
    }
    line(&mut out, "");
    line(&mut out, format!("Add to cart: bakery cart add {}", product.id));
    out
}

pub fn cart(state: &CartState) -> String {
    let mut out = String::new();
    title(&mut out, "Your cart");
    if state.items.is_empty() {
        line(&mut out, "Your cart is empty.");
        return out;
    }
    for cart_line in &state.items {
        line(
            &mut out,
            format!(
                "[{:>4}] {:<28} x{:<3} {:>9}",
                cart_line.id(),
                cart_line.name(),
                cart_line.quantity(),
                cart_line.line_total()
            ),
        );
    }
    line(&mut out, "");
    line(
        &mut out,
        format!("{} items, total {}", state.item_count(), state.total()),
    );
    out
}

pub fn orders(orders: &[Order]) -> String {
    let mut out = String::new();
    title(&mut out, "Your orders");
    if orders.is_empty() {
        line(&mut out, "No orders yet.");
        return out;
    }
    for order in orders {
        line(
            &mut out,
            format!(
                "#{:<6} {:<12} {:<25} {:>9}",
                order.id,
                order.status,
                order.created_at,
                order.total()
            ),
        );
    }
    out
}

// =============================================================================
// Account
// =============================================================================

pub fn login_page(notice: Option<&str>) -> String {
    let mut out = String::new();
    title(&mut out, "Log in");
    if let Some(notice) = notice {
        line(&mut out, notice);
        line(&mut out, "");
    }
    line(&mut out, "BAKERY_PASSWORD=... bakery login <USERNAME>");
    line(&mut out, "  or: bakery login <USERNAME> --password-stdin");
    line(&mut out, "No account yet? bakery register --help");
    out
}

pub fn welcome(user: &User) -> String {
    let mut out = String::new();
    line(&mut out, format!("Welcome, {}!", user.display_name()));
    if user.user_role.is_staff() {
        line(&mut out, "Admin console: bakery admin");
    }
    out
}

pub fn logged_out() -> String {
    "You are logged out.\n".to_string()
}

pub fn profile(user: &User) -> String {
    let mut out = String::new();
    title(&mut out, "Profile");
    line(&mut out, format!("Username: {}", user.username));
    line(&mut out, format!("Name:     {}", user.display_name()));
    line(&mut out, format!("Email:    {}", user.email));
    line(&mut out, format!("Role:     {}", user.user_role));
    out
}

// =============================================================================
// Admin
// =============================================================================

pub fn access_denied(reason: &str) -> String {
    let mut out = String::new();
    title(&mut out, "Access denied");
    line(&mut out, reason);
    out
}

pub fn admin_home(user: &User) -> String {
    let mut out = String::new();
    title(&mut out, "Admin console");
    line(
        &mut out,
        format!("Signed in as {} ({})", user.display_name(), user.user_role),
    );
    line(&mut out, "");
    for section in [
        "products", "warehouses", "bins", "rules", "wms", "shipments", "staff",
    ] {
        line(&mut out, format!("  bakery admin {section}"));
    }
    out
}

pub fn admin_products(products: &[Product]) -> String {
    let mut out = String::new();
    title(&mut out, "Products");
    for product in products {
        line(
            &mut out,
            format!(
                "{:>4}  {:<28} {:>8}  {:>6} g  rule {}",
                product.id,
                product.name,
                product.price,
                product.weight,
                or_dash(product.storage_rule_id)
            ),
        );
    }
    out
}

pub fn name_check(name: &str, check: &NameCheck) -> String {
    match (check.exists, check.id) {
        (true, Some(id)) => format!("\"{name}\" exists (product {id}).\n"),
        (true, None) => format!("\"{name}\" exists.\n"),
        (false, _) => format!("\"{name}\" is free.\n"),
    }
}

pub fn warehouses(warehouses: &[Warehouse]) -> String {
    let mut out = String::new();
    title(&mut out, "Warehouses");
    if warehouses.is_empty() {
        line(&mut out, "No warehouses.");
    }
    for warehouse in warehouses {
        line(
            &mut out,
            format!(
                "{:>4}  {:<20} {:<36} {}",
                warehouse.id,
                warehouse.name,
                warehouse.address,
                warehouse.working_hours.as_deref().unwrap_or("-")
            ),
        );
    }
    out
}

pub fn bins(bins: &[BinLocation]) -> String {
    let mut out = String::new();
    title(&mut out, "Bins");
    if bins.is_empty() {
        line(&mut out, "No bins.");
    }
    for bin in bins {
        line(
            &mut out,
            format!(
                "{:>4}  wh {:<4} {}-{}-{} {:<10} product {:<5} qty {:<5} rule {}",
                bin.id,
                bin.warehouse_id,
                bin.zone,
                bin.aisle,
                bin.rack,
                bin.bin_code,
                or_dash(bin.product_id),
                or_dash(bin.quantity),
                or_dash(bin.storage_rule_id)
            ),
        );
    }
    out
}

pub fn storage_rules(rules: &[StorageRule]) -> String {
    let mut out = String::new();
    title(&mut out, "Storage rules");
    if rules.is_empty() {
        line(&mut out, "No storage rules.");
    }
    for rule in rules {
        let mut flags = Vec::new();
        if rule.is_hazardous {
            flags.push("hazardous");
        }
        if rule.is_oversized {
            flags.push("oversized");
        }
        let temperature = match (rule.temp_min, rule.temp_max) {
            (None, None) => "any temperature".to_string(),
            (min, max) => format!("{}..{} °C", or_dash(min), or_dash(max)),
        };
        line(
            &mut out,
            format!(
                "{:>4}  {:<20} {:<18} {}",
                rule.id,
                rule.name,
                temperature,
                flags.join(", ")
            ),
        );
    }
    out
}

fn shortages(out: &mut String, shortages: &[WmsShortage]) {
    for shortage in shortages {
        line(
            out,
            format!(
                "  product {}: requested {}, available {}",
                shortage.product_id, shortage.requested, shortage.available
            ),
        );
    }
}

pub fn wms_check(answer: &WmsCheckResponse) -> String {
    let mut out = String::new();
    if answer.ok {
        line(&mut out, "All items are in stock.");
    } else {
        line(&mut out, "Not enough stock:");
        shortages(&mut out, &answer.shortages);
    }
    out
}

pub fn wms_commit(answer: &WmsCommitResponse) -> String {
    let mut out = String::new();
    if answer.ok {
        line(&mut out, "Stock committed:");
    } else {
        line(&mut out, "Commit incomplete:");
        shortages(&mut out, &answer.shortages);
    }
    for item in &answer.items {
        line(
            &mut out,
            format!("  product {}: {} taken", item.product_id, item.deducted),
        );
        for allocation in &item.allocations {
            line(
                &mut out,
                format!(
                    "    warehouse {} bin {}: {}",
                    allocation.warehouse_id, allocation.bin_id, allocation.deducted
                ),
            );
        }
    }
    out
}

pub fn shipments(shipments: &[Shipment]) -> String {
    let mut out = String::new();
    title(&mut out, "Shipments");
    if shipments.is_empty() {
        line(&mut out, "No shipments.");
    }
    for shipment in shipments {
        line(
            &mut out,
            format!(
                "{:<14} order {:<5} {:<10} courier {:<5} {}",
                shipment.tracking_code,
                shipment.order_id,
                shipment.status,
                or_dash(shipment.courier_id),
                shipment.address
            ),
        );
    }
    out
}

pub fn staff(staff: &[Staff]) -> String {
    let mut out = String::new();
    title(&mut out, "Staff");
    if staff.is_empty() {
        line(&mut out, "No staff accounts.");
    }
    for member in staff {
        line(
            &mut out,
            format!(
                "{:>4}  {:<24} {}",
                member.id,
                format!("{} {}", member.first_name, member.last_name).trim(),
                member.user_role
            ),
        );
    }
    out
}

/// One-line confirmation.
pub fn done(message: &str) -> String {
    format!("{message}\n")
}

// =============================================================================
// Errors
// =============================================================================

pub fn error(error: &CliError) -> String {
    match error {
        CliError::AccessDenied(reason) => access_denied(reason),
        CliError::Api(api) => api_error(api),
        other => format!("Error: {other}\n"),
    }
}

fn api_error(error: &ApiError) -> String {
    match error.kind() {
        ErrorKind::Validation => format!("Rejected: {}\n", error.user_message()),
        ErrorKind::Authorization | ErrorKind::Transport | ErrorKind::Local => {
            format!("Error: {}\n", error.user_message())
        }
    }
}

#[cfg(test)]
mod tests {
    use bakery_client::CartLine;
    use bakery_client::models::CartItem;
    use bakery_core::{CartItemId, Price, ProductId, Quantity, UserId};

    use super::*;

    fn croissant() -> Product {
        Product {
            id: ProductId::new(1),
            name: "Croissant".to_string(),
            short_description: "Butter".to_string(),
            full_description: String::new(),
            price: Price::from_cents(150),
            weight: 80.0,
            composition: String::new(),
            photo: String::new(),
            storage_rule_id: None,
        }
    }

    #[test]
    fn test_cart_shows_line_totals_and_total() {
        let state = CartState {
            items: vec![CartLine {
                item: CartItem {
                    id: CartItemId::new(7),
                    user_id: UserId::new(1),
                    product_id: ProductId::new(1),
                    quantity: Quantity::from_target(3).unwrap_or(Quantity::ONE),
                },
                product: Some(croissant()),
            }],
            is_loading: false,
        };
        let page = cart(&state);
        assert!(page.contains("Croissant"));
        assert!(page.contains("4.50"));
        assert!(page.contains("3 items, total 4.50"));
    }

    #[test]
    fn test_empty_cart() {
        assert!(cart(&CartState::default()).contains("empty"));
    }

    #[test]
    fn test_catalog_lists_prices() {
        let page = catalog(&[croissant()]);
        assert!(page.contains("1.50"));
    }

    #[test]
    fn test_access_denied_page() {
        let page = error(&CliError::AccessDenied("clients cannot".to_string()));
        assert!(page.starts_with("Access denied"));
    }

    #[test]
    fn test_validation_message_verbatim() {
        let page = error(&CliError::Api(ApiError::Rejected {
            status: reqwest::StatusCode::BAD_REQUEST,
            message: "Product with this name already exists".to_string(),
        }));
        assert_eq!(page, "Rejected: Product with this name already exists\n");
    }
}
