use clap::{Args, Subcommand};
use tracing::info;

use storefront_core::deeplink::create_deep_link;
use storefront_core::money::stock_value;
use storefront_core::validation::{parse_price, parse_quantity};
use storefront_core::{Product, ProductDraft, ProductId, ProductPatch, Rupiah};

use super::Session;
use crate::error::{CliError, CliResult};

#[derive(Debug, Args)]
pub(crate) struct ProductsCommand {
    #[command(subcommand)]
    command: ProductsSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductsSubcommand {
    /// List every product
    List(ListArgs),
    /// Show one product and its share link
    Show(IdArgs),
    /// Add a product
    Add(AddArgs),
    /// Change some fields of a product
    Update(UpdateArgs),
    /// Delete a product
    Remove(IdArgs),
    /// Flip the purchased mark
    Toggle(IdArgs),
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct IdArgs {
    /// Product id
    id: ProductId,
}

#[derive(Debug, Args)]
struct AddArgs {
    #[arg(long)]
    name: String,

    /// Price as typed, e.g. "150000" or "Rp 150.000"
    #[arg(long)]
    price: String,

    #[arg(long)]
    quantity: String,

    /// Category name
    #[arg(long)]
    category: String,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    /// Product id
    id: ProductId,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    price: Option<String>,

    #[arg(long)]
    quantity: Option<String>,

    #[arg(long)]
    category: Option<String>,
}

impl UpdateArgs {
    fn patch(&self) -> CliResult<ProductPatch> {
        Ok(ProductPatch {
            name: self.name.clone(),
            price: self.price.as_deref().map(parse_price).transpose()?,
            quantity: self.quantity.as_deref().map(parse_quantity).transpose()?,
            category: self.category.clone(),
        })
    }
}

pub(crate) async fn run(command: ProductsCommand, session: &Session) -> CliResult<()> {
    let coordinator = session.context.coordinator();

    match command.command {
        ProductsSubcommand::List(args) => {
            let products = coordinator.products();
            if args.json {
                println!("{}", serde_json::to_string_pretty(&*products)?);
                return Ok(());
            }

            if products.is_empty() {
                println!("no products");
                return Ok(());
            }
            for product in products.iter() {
                print_row(product);
            }
            println!();
            println!(
                "{} products, stock value {}",
                products.len(),
                stock_value(&products).map_or_else(|| "overflow".to_string(), |v| v.to_string())
            );
        }

        ProductsSubcommand::Show(args) => {
            let product = coordinator
                .product(&args.id)
                .ok_or_else(|| CliError::not_found("Product", &args.id.to_string()))?;
            let id = product.id.to_string();

            println!("id: {}", product.id);
            println!("name: {}", product.name);
            println!("price: {}", Rupiah::new(product.price));
            println!("quantity: {}", product.quantity);
            println!("category: {}", product.category);
            println!("purchased: {}", product.purchased);
            println!("link: {}", create_deep_link("produk", &[("id", id.as_str())])?);
        }

        ProductsSubcommand::Add(args) => {
            let draft = ProductDraft::new(&args.name, &args.price, &args.quantity, &args.category);
            let product = coordinator.add(&draft).await?;
            info!(id = %product.id, "Product added");
            print_row(&product);
        }

        ProductsSubcommand::Update(args) => {
            let patch = args.patch()?;
            if patch.is_empty() {
                return Err(CliError::validation(
                    "nothing to update; pass --name, --price, --quantity or --category",
                ));
            }
            let product = coordinator.update(&args.id, &patch).await?;
            print_row(&product);
        }

        ProductsSubcommand::Remove(args) => {
            if coordinator.remove(&args.id).await? {
                println!("removed {}", args.id);
            } else {
                println!("no product {}", args.id);
            }
        }

        ProductsSubcommand::Toggle(args) => {
            let product = coordinator.toggle_purchased(&args.id).await?;
            print_row(&product);
        }
    }

    Ok(())
}

fn print_row(product: &Product) {
    let mark = if product.purchased { "x" } else { " " };
    println!(
        "[{}] {:<10} {:<30} {:>16} x{:<5} {}",
        mark,
        product.id.to_string(),
        product.name,
        Rupiah::new(product.price).to_string(),
        product.quantity,
        product.category
    );
}
