//! Barrow storefront CLI

use std::process;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use barrow::{
    context::AppContext,
    database,
    domain::{
        carts::CartsService,
        catalog::{
            ProductsService,
            models::{Category, NewProduct, ProductUpdate, StockUnit},
        },
    },
    ids::{OwnerUuid, ProductUuid},
};

#[derive(Debug, Parser)]
#[command(name = "barrow", about = "Barrow storefront CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database administration
    Db(DbCommand),
    /// Catalog product management
    Product(ProductCommand),
    /// Cart operations
    Cart(CartCommand),
}

#[derive(Debug, Args)]
struct ConnectionArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[derive(Debug, Args)]
struct DbCommand {
    #[command(subcommand)]
    command: DbSubcommand,
}

#[derive(Debug, Subcommand)]
enum DbSubcommand {
    /// Apply schema migrations
    Migrate(MigrateArgs),
}

#[derive(Debug, Args)]
struct MigrateArgs {
    #[command(flatten)]
    connection: ConnectionArgs,
}

#[derive(Debug, Args)]
struct ProductCommand {
    #[command(subcommand)]
    command: ProductSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductSubcommand {
    /// Create a catalog product
    Create(CreateProductArgs),
    /// List live catalog products
    List(ListProductsArgs),
    /// Show a single product
    Get(GetProductArgs),
    /// Replace a product's fields
    Update(UpdateProductArgs),
    /// Soft-delete a product
    Delete(DeleteProductArgs),
}

#[derive(Debug, Args)]
struct CreateProductArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Product display name
    #[arg(long)]
    name: String,

    /// Product category (e.g. seeds, fertilizers, farm_tools)
    #[arg(long)]
    category: Category,

    /// Brand name
    #[arg(long)]
    brand: String,

    /// Stock unit (e.g. kg, l, pieces)
    #[arg(long)]
    unit: StockUnit,

    /// Price in minor currency units
    #[arg(long)]
    price: u64,

    /// Units in stock
    #[arg(long)]
    stock: u64,

    /// Optional description
    #[arg(long)]
    description: Option<String>,

    /// Optional product UUID; generated when omitted
    #[arg(long)]
    uuid: Option<ProductUuid>,
}

#[derive(Debug, Args)]
struct ListProductsArgs {
    #[command(flatten)]
    connection: ConnectionArgs,
}

#[derive(Debug, Args)]
struct GetProductArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Product UUID
    #[arg(long)]
    uuid: ProductUuid,
}

#[derive(Debug, Args)]
struct UpdateProductArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Product UUID
    #[arg(long)]
    uuid: ProductUuid,

    /// Product display name
    #[arg(long)]
    name: String,

    /// Product category
    #[arg(long)]
    category: Category,

    /// Brand name
    #[arg(long)]
    brand: String,

    /// Stock unit
    #[arg(long)]
    unit: StockUnit,

    /// Price in minor currency units
    #[arg(long)]
    price: u64,

    /// Units in stock
    #[arg(long)]
    stock: u64,

    /// Optional description
    #[arg(long)]
    description: Option<String>,
}

#[derive(Debug, Args)]
struct DeleteProductArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Product UUID
    #[arg(long)]
    uuid: ProductUuid,
}

#[derive(Debug, Args)]
struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show an owner's cart, repairing drift if needed
    Show(CartOwnerArgs),
    /// Add a quantity of a product
    Add(CartItemArgs),
    /// Set the quantity of an item already in the cart (0 removes it)
    Update(CartItemArgs),
    /// Remove an item
    Remove(CartProductArgs),
    /// Empty the cart
    Clear(CartOwnerArgs),
}

#[derive(Debug, Args)]
struct CartOwnerArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Cart owner UUID
    #[arg(long)]
    owner: OwnerUuid,
}

#[derive(Debug, Args)]
struct CartProductArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Cart owner UUID
    #[arg(long)]
    owner: OwnerUuid,

    /// Product UUID
    #[arg(long)]
    product: ProductUuid,
}

#[derive(Debug, Args)]
struct CartItemArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Cart owner UUID
    #[arg(long)]
    owner: OwnerUuid,

    /// Product UUID
    #[arg(long)]
    product: ProductUuid,

    /// Quantity of the product
    #[arg(long)]
    quantity: u32,
}

#[tokio::main]
async fn main() {
    let _env = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        eprintln!("{error}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Db(DbCommand {
            command: DbSubcommand::Migrate(args),
        }) => migrate(args).await,
        Commands::Product(ProductCommand { command }) => match command {
            ProductSubcommand::Create(args) => create_product(args).await,
            ProductSubcommand::List(args) => list_products(args).await,
            ProductSubcommand::Get(args) => get_product(args).await,
            ProductSubcommand::Update(args) => update_product(args).await,
            ProductSubcommand::Delete(args) => delete_product(args).await,
        },
        Commands::Cart(CartCommand { command }) => match command {
            CartSubcommand::Show(args) => show_cart(args).await,
            CartSubcommand::Add(args) => add_cart_item(args).await,
            CartSubcommand::Update(args) => update_cart_item(args).await,
            CartSubcommand::Remove(args) => remove_cart_item(args).await,
            CartSubcommand::Clear(args) => clear_cart(args).await,
        },
    }
}

async fn context(connection: &ConnectionArgs) -> Result<AppContext, String> {
    AppContext::from_database_url(&connection.database_url)
        .await
        .map_err(|error| format!("failed to initialize application context: {error}"))
}

async fn migrate(args: MigrateArgs) -> Result<(), String> {
    let pool = database::connect(&args.connection.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    database::migrate(&pool)
        .await
        .map_err(|error| format!("failed to apply migrations: {error}"))?;

    println!("migrations applied");

    Ok(())
}

async fn create_product(args: CreateProductArgs) -> Result<(), String> {
    let ctx = context(&args.connection).await?;
    let uuid = args.uuid.unwrap_or_default();

    let product = ctx
        .products
        .create_product(NewProduct {
            uuid,
            name: args.name,
            category: args.category,
            brand: args.brand,
            unit: args.unit,
            price: args.price,
            stock: args.stock,
            description: args.description,
        })
        .await
        .map_err(|error| format!("failed to create product: {error}"))?;

    print_json(&product)
}

async fn list_products(args: ListProductsArgs) -> Result<(), String> {
    let ctx = context(&args.connection).await?;

    let products = ctx
        .products
        .list_products()
        .await
        .map_err(|error| format!("failed to list products: {error}"))?;

    print_json(&products)
}

async fn get_product(args: GetProductArgs) -> Result<(), String> {
    let ctx = context(&args.connection).await?;

    let product = ctx
        .products
        .get_product(args.uuid)
        .await
        .map_err(|error| format!("failed to fetch product: {error}"))?;

    print_json(&product)
}

async fn update_product(args: UpdateProductArgs) -> Result<(), String> {
    let ctx = context(&args.connection).await?;

    let product = ctx
        .products
        .update_product(
            args.uuid,
            ProductUpdate {
                name: args.name,
                category: args.category,
                brand: args.brand,
                unit: args.unit,
                price: args.price,
                stock: args.stock,
                description: args.description,
            },
        )
        .await
        .map_err(|error| format!("failed to update product: {error}"))?;

    print_json(&product)
}

async fn delete_product(args: DeleteProductArgs) -> Result<(), String> {
    let ctx = context(&args.connection).await?;

    ctx.products
        .delete_product(args.uuid)
        .await
        .map_err(|error| format!("failed to delete product: {error}"))?;

    println!("product deleted");

    Ok(())
}

async fn show_cart(args: CartOwnerArgs) -> Result<(), String> {
    let ctx = context(&args.connection).await?;

    let cart = ctx
        .carts
        .get_cart(args.owner)
        .await
        .map_err(|error| format!("failed to fetch cart: {error}"))?;

    print_json(&cart)
}

async fn add_cart_item(args: CartItemArgs) -> Result<(), String> {
    let ctx = context(&args.connection).await?;

    let cart = ctx
        .carts
        .add_item(args.owner, args.product, args.quantity)
        .await
        .map_err(|error| format!("failed to add item: {error}"))?;

    print_json(&cart)
}

async fn update_cart_item(args: CartItemArgs) -> Result<(), String> {
    let ctx = context(&args.connection).await?;

    let cart = ctx
        .carts
        .update_item_quantity(args.owner, args.product, args.quantity)
        .await
        .map_err(|error| format!("failed to update item: {error}"))?;

    print_json(&cart)
}

async fn remove_cart_item(args: CartProductArgs) -> Result<(), String> {
    let ctx = context(&args.connection).await?;

    let cart = ctx
        .carts
        .remove_item(args.owner, args.product)
        .await
        .map_err(|error| format!("failed to remove item: {error}"))?;

    print_json(&cart)
}

async fn clear_cart(args: CartOwnerArgs) -> Result<(), String> {
    let ctx = context(&args.connection).await?;

    let cart = ctx
        .carts
        .clear_cart(args.owner)
        .await
        .map_err(|error| format!("failed to clear cart: {error}"))?;

    print_json(&cart)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|error| format!("failed to render output: {error}"))?;

    println!("{rendered}");

    Ok(())
}
