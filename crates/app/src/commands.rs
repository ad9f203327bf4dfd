//! Subcommands of the command-line host.

use std::error::Error;

use clap::Subcommand;
use serde_json::Value;
use vigor_application::{AdminAuth, AdminClient, ResourceClient};
use vigor_domain::{ApiRequest, Page, Resource};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Request a one-time password by email
    Login {
        /// Admin email address
        email: String,
    },

    /// Complete a login with the one-time password
    Verify {
        /// Admin email address
        email: String,
        /// One-time password from the email
        otp: String,
    },

    /// End the session
    Logout,

    /// Show the stored session
    Status,

    /// Send an authenticated GET to an arbitrary API path
    Get {
        /// Path below the versioned API root, e.g. `/orders?status=pending`
        path: String,
    },

    /// List one page of a resource
    List {
        /// users, carts, orders, categories, subcategories, products,
        /// variants, images, blogs or settings
        resource: Resource,
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Items per page
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Show one item
    Show {
        /// Resource name
        resource: Resource,
        /// Item id
        id: String,
    },

    /// Delete one item
    Delete {
        /// Resource name
        resource: Resource,
        /// Item id
        id: String,
    },
}

impl Command {
    /// Runs the command, printing results to stdout.
    pub async fn execute(self, client: &AdminClient) -> Result<(), Box<dyn Error>> {
        let auth = AdminAuth::new(client.clone());
        let resources = ResourceClient::new(client.clone());

        match self {
            Self::Login { email } => {
                let message = auth.request_otp(&email).await?;
                println!("{message}");
            }
            Self::Verify { email, otp } => {
                let outcome = auth.verify_otp(&email, &otp).await?;
                println!("Logged in.");
                if let Some(resume) = outcome.resume {
                    println!("Continue at {resume}");
                }
            }
            Self::Logout => {
                auth.logout().await;
                println!("Logged out.");
            }
            Self::Status => {
                let status = client.tokens().status().await;
                println!("{}", status.display_message());
            }
            Self::Get { path } => {
                let request = get_request(&path);
                let response = client.send(&request).await?;
                println!("{}", response.text());
            }
            Self::List {
                resource,
                page,
                limit,
            } => {
                let data: Value = resources.list(resource, Page::new(page, limit)).await?;
                print_json(&data)?;
            }
            Self::Show { resource, id } => {
                let data: Value = resources.get(resource, &id).await?;
                print_json(&data)?;
            }
            Self::Delete { resource, id } => {
                let message = resources.delete(resource, &id).await?;
                println!("{message}");
            }
        }
        Ok(())
    }
}

/// Splits `path?a=1&b=2` into a GET request with query pairs.
fn get_request(target: &str) -> ApiRequest {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .fold(ApiRequest::get(path), |request, pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            request.with_query(name, value)
        })
}

fn print_json(value: &Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
