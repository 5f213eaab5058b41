// UI layer: the interactive menu. Input is collected through the `Prompt`
// trait (dialoguer on a real terminal, scripted answers in tests), the
// request goes through `ApiClient`, and the result is printed with the
// configured `Renderer`.

use crate::api::{ApiClient, AuthRequest, NewProduct, Product};
use crate::error::{ApiError, ApiResult};
use crate::output::Console;
use crate::render::{OutputFormat, Renderer};
use anyhow::{Context, Result};
use dialoguer::{Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{info, warn};

/// Source of user input for the shell.
pub trait Prompt {
    /// Index of the chosen item.
    fn select(&mut self, prompt: &str, items: &[&str]) -> Result<usize>;
    /// Non-empty, trimmed text.
    fn text(&mut self, prompt: &str) -> Result<String>;
    /// Hidden input.
    fn password(&mut self, prompt: &str) -> Result<String>;
    fn whole_number(&mut self, prompt: &str) -> Result<i64>;
    /// Finite decimal number.
    fn price(&mut self, prompt: &str) -> Result<f64>;
}

/// `Prompt` backed by dialoguer. Invalid input re-prompts in place.
pub struct Terminal;

impl Prompt for Terminal {
    fn select(&mut self, prompt: &str, items: &[&str]) -> Result<usize> {
        // `Select` shows a keyboard-navigable list in the terminal.
        Ok(Select::new()
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact()?)
    }

    fn text(&mut self, prompt: &str) -> Result<String> {
        let value: String = Input::new()
            .with_prompt(prompt)
            .validate_with(|input: &String| -> Result<(), &'static str> {
                if input.trim().is_empty() {
                    Err("Please enter a value.")
                } else {
                    Ok(())
                }
            })
            .interact_text()?;
        Ok(value.trim().to_string())
    }

    fn password(&mut self, prompt: &str) -> Result<String> {
        Ok(Password::new().with_prompt(prompt).interact()?)
    }

    fn whole_number(&mut self, prompt: &str) -> Result<i64> {
        let value: String = Input::new()
            .with_prompt(prompt)
            .validate_with(|input: &String| -> Result<(), &'static str> {
                parse_whole_number(input)
                    .map(|_| ())
                    .ok_or("Please enter a valid whole number.")
            })
            .interact_text()?;
        parse_whole_number(&value).context("Invalid whole number")
    }

    fn price(&mut self, prompt: &str) -> Result<f64> {
        let value: String = Input::new()
            .with_prompt(prompt)
            .validate_with(|input: &String| -> Result<(), &'static str> {
                parse_price(input)
                    .map(|_| ())
                    .ok_or("Please enter a valid number (e.g., 49.99).")
            })
            .interact_text()?;
        parse_price(&value).context("Invalid number")
    }
}

pub fn parse_whole_number(input: &str) -> Option<i64> {
    input.trim().parse().ok()
}

/// Parses a decimal, rejecting NaN and infinities which JSON cannot carry.
pub fn parse_price(input: &str) -> Option<f64> {
    input.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

const LOGGED_OUT_ITEMS: [&str; 2] = ["Login", "Exit"];

pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

/// Entries of the logged-in menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    AddProduct,
    GetProduct,
    ListProducts,
    SellProduct,
    RestockProduct,
    UpdatePrice,
    DeleteProduct,
    InventoryValue,
    Logout,
}

impl Command {
    pub const ALL: [Command; 9] = [
        Command::AddProduct,
        Command::GetProduct,
        Command::ListProducts,
        Command::SellProduct,
        Command::RestockProduct,
        Command::UpdatePrice,
        Command::DeleteProduct,
        Command::InventoryValue,
        Command::Logout,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Command::AddProduct => "Add Product",
            Command::GetProduct => "Get Product by ID",
            Command::ListProducts => "List All Products",
            Command::SellProduct => "Sell Product",
            Command::RestockProduct => "Restock Product",
            Command::UpdatePrice => "Update Product Price",
            Command::DeleteProduct => "Delete Product",
            Command::InventoryValue => "Get Total Inventory Value",
            Command::Logout => "Logout",
        }
    }

    /// Banner printed before the action's prompts; logout has none.
    fn banner(self) -> Option<&'static str> {
        let banner = match self {
            Command::AddProduct => "Adding a new Product...",
            Command::GetProduct => "Getting a Product...",
            Command::ListProducts => "Listing All Products...",
            Command::SellProduct => "Selling Product...",
            Command::RestockProduct => "Restocking a Product...",
            Command::UpdatePrice => "Updating Product Price...",
            Command::DeleteProduct => "Deleting a Product...",
            Command::InventoryValue => "Getting Total Inventory Value...",
            Command::Logout => return None,
        };
        Some(banner)
    }
}

/// Whether the shell keeps running after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// A fully collected request, ready to send.
#[derive(Debug, Clone, PartialEq)]
enum Request {
    Add(NewProduct),
    Get(String),
    List,
    Sell { id: String, quantity: i64 },
    Restock { id: String, quantity: i64 },
    Price { id: String, price: f64 },
    Delete(String),
    Value,
}

enum Outcome {
    Product {
        success: Option<&'static str>,
        product: Product,
    },
    Products(Vec<Product>),
    Message(String),
    Value(f64),
}

/// Run `f` while a spinner is shown on stderr. indicatif hides the
/// spinner on its own when stderr is not a terminal.
fn with_spinner<T>(message: &str, f: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    let result = f();
    spinner.finish_and_clear();
    result
}

/// The interactive client: a two-state loop over the logged-out and
/// logged-in menus. The state is whether `ApiClient` holds a token.
pub struct Shell<P: Prompt> {
    api: ApiClient,
    prompt: P,
    renderer: Renderer,
    console: Console,
}

impl<P: Prompt> Shell<P> {
    pub fn new(api: ApiClient, prompt: P, format: OutputFormat) -> Self {
        Self::with_console(api, prompt, format, Console::stdio())
    }

    pub fn with_console(api: ApiClient, prompt: P, format: OutputFormat, console: Console) -> Self {
        Self {
            api,
            prompt,
            renderer: Renderer::new(format),
            console,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Run until the user picks Exit from the logged-out menu.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let flow = if self.api.has_token() {
                self.logged_in_turn()?
            } else {
                self.logged_out_turn()?
            };
            if flow == Flow::Exit {
                return Ok(());
            }
        }
    }

    pub fn logged_out_turn(&mut self) -> Result<Flow> {
        self.console.line("")?;
        self.console.separator()?;
        self.console.info("You are not logged in.")?;
        match self.prompt.select("Choose an option", &LOGGED_OUT_ITEMS)? {
            0 => {
                self.login()?;
                Ok(Flow::Continue)
            }
            1 => {
                self.console.line("Exiting client.")?;
                Ok(Flow::Exit)
            }
            _ => {
                self.console.warn("Invalid choice. Please select a valid option.")?;
                Ok(Flow::Continue)
            }
        }
    }

    fn login(&mut self) -> Result<()> {
        self.console.banner("Logging in...")?;
        let email = self.prompt.text("   Enter Email")?;
        let password = self.prompt.password("   Enter Password")?;
        let req = AuthRequest { email, password };

        let api = &mut self.api;
        match with_spinner("Logging in...", || api.login(&req)) {
            Ok(()) => self.console.success("\nLogin successful!")?,
            Err(e) => {
                warn!(error = %e, "login failed");
                self.console.error(&format!("Login failed: {e}"))?;
            }
        }
        Ok(())
    }

    pub fn logged_in_turn(&mut self) -> Result<Flow> {
        let labels: Vec<&str> = Command::ALL.iter().map(|c| c.label()).collect();
        let choice = self.prompt.select("Available Commands", &labels)?;
        let Some(&command) = Command::ALL.get(choice) else {
            self.console.warn("Invalid choice. Please select a valid option.")?;
            return Ok(Flow::Continue);
        };

        let Some(request) = self.collect(command)? else {
            self.api.logout();
            self.console.info("\nYou have been logged out.")?;
            return Ok(Flow::Continue);
        };
        let result = {
            let api = &self.api;
            with_spinner("Waiting for server...", || perform(api, &request))
        };
        match result {
            Ok(outcome) => self.show(outcome)?,
            Err(err) => self.report(err)?,
        }
        self.console.separator()?;
        Ok(Flow::Continue)
    }

    /// Prompt for the inputs of `command`. `None` means the command sends
    /// nothing (logout).
    fn collect(&mut self, command: Command) -> Result<Option<Request>> {
        let Some(banner) = command.banner() else {
            return Ok(None);
        };
        self.console.banner(banner)?;
        let p = &mut self.prompt;
        let request = match command {
            Command::AddProduct => Request::Add(NewProduct {
                name: p.text("   Enter Name")?,
                price: p.price("   Enter Price")?,
                quantity: p.whole_number("   Enter Quantity")?,
            }),
            Command::GetProduct => Request::Get(p.text("   Enter Product ID")?),
            Command::ListProducts => Request::List,
            Command::SellProduct => Request::Sell {
                id: p.text("   Enter Product ID")?,
                quantity: p.whole_number("   Enter Quantity to Sell")?,
            },
            Command::RestockProduct => Request::Restock {
                id: p.text("   Enter Product ID")?,
                quantity: p.whole_number("   Enter Quantity to Restock")?,
            },
            Command::UpdatePrice => Request::Price {
                id: p.text("   Enter Product ID")?,
                price: p.price("   Enter New Price")?,
            },
            Command::DeleteProduct => Request::Delete(p.text("   Enter Product ID to Delete")?),
            Command::InventoryValue => Request::Value,
            Command::Logout => return Ok(None),
        };
        Ok(Some(request))
    }

    fn show(&mut self, outcome: Outcome) -> Result<()> {
        let rendered = match &outcome {
            Outcome::Product { success, product } => self.renderer.product(*success, product),
            Outcome::Products(products) => self.renderer.products(products),
            Outcome::Message(message) => self.renderer.message(message),
            Outcome::Value(value) => self.renderer.inventory_value(*value),
        };
        match rendered {
            Ok(text) => self.console.block(&text)?,
            Err(e) => self
                .console
                .error(&format!("An error occurred: failed to render response: {e}"))?,
        }
        Ok(())
    }

    /// Print a failed action. A 401 while logged in ends the session.
    fn report(&mut self, err: ApiError) -> Result<()> {
        self.console.error(&format!("An error occurred: {err}"))?;
        if err.is_unauthorized() && self.api.logout() {
            warn!("server rejected the session token");
            self.console.warn(SESSION_EXPIRED)?;
        }
        Ok(())
    }
}

fn perform(api: &ApiClient, request: &Request) -> ApiResult<Outcome> {
    let outcome = match request {
        Request::Add(product) => Outcome::Product {
            success: Some("Product added successfully."),
            product: api.add_product(product)?,
        },
        Request::Get(id) => Outcome::Product {
            success: None,
            product: api.get_product(id)?,
        },
        Request::List => Outcome::Products(api.list_products()?),
        Request::Sell { id, quantity } => Outcome::Product {
            success: Some("Sale processed successfully."),
            product: api.sell_product(id, *quantity)?,
        },
        Request::Restock { id, quantity } => Outcome::Product {
            success: Some("Product restocked successfully."),
            product: api.restock_product(id, *quantity)?,
        },
        Request::Price { id, price } => Outcome::Message(
            api.update_price(id, *price)?
                .unwrap_or_else(|| "Price updated successfully.".to_string()),
        ),
        Request::Delete(id) => Outcome::Message(
            api.delete_product(id)?
                .unwrap_or_else(|| "Product deleted successfully.".to_string()),
        ),
        Request::Value => Outcome::Value(api.inventory_value()?),
    };
    info!(?request, "action completed");
    Ok(outcome)
}
