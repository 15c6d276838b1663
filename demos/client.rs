//! Calls the demo server with a self-issued token.
//!
//! Run `cargo run --example server` first, then:
//!
//! ```sh
//! API_BASE_URL=http://127.0.0.1:8000 API_JWT_SECRET=... cargo run --example client
//! ```

use mobile_api_auth::ApiClient;
use serde_json::Value;

#[actix_web::main]
async fn main() {
    let api = match ApiClient::from_env() {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Failed to initialize the API client: {e}");
            std::process::exit(1);
        }
    };

    for endpoint in ["/", "/items/42?q=shoes"] {
        match api.get::<Value>(endpoint).await {
            Ok(body) => println!("GET {endpoint} -> {body}"),
            Err(e) => eprintln!("GET {endpoint} failed: {e}"),
        }
    }
}
